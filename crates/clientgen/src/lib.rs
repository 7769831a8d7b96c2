//! # clientgen
//!
//! Generates a typed database client and embeds the native query engines it
//! needs for each target platform.
//!
//! The [`Pipeline`] ties the other crates together:
//! - defaulting and validation from `clientgen-core`
//! - client composition and engine embedding from `clientgen-codegen`
//! - target resolution and engine provisioning from `clientgen-engines`
//!
//! # Example
//!
//! ```ignore
//! use clientgen::Pipeline;
//! use clientgen_engines::{EngineCache, HostPlatform, HttpEngineSource, Provisioner};
//! use std::sync::Arc;
//!
//! let provisioner = Provisioner::new(EngineCache::default(), Arc::new(HttpEngineSource::new()?));
//! let pipeline = Pipeline::new(Arc::new(provisioner), HostPlatform::detect()?)?;
//! let report = pipeline.run_from_env(configuration).await?;
//! ```

pub mod cli;
mod pipeline;
pub mod tracing;

pub use pipeline::{GenerationReport, Pipeline, PipelineError, SkipReason, Stage};
