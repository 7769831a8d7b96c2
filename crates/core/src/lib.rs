//! Core types for clientgen
//!
//! This crate holds what every stage of the generator shares:
//! - The [`Configuration`] model handed over by the schema parser
//! - Defaulting ([`add_defaults`]) which turns it into an immutable [`GenerationConfig`]
//! - The error taxonomy used across the pipeline
//!
//! # Example
//!
//! ```
//! use clientgen_core::{Configuration, add_defaults};
//!
//! let raw: Configuration = serde_json::from_str(r#"{
//!     "generator": { "output": "./db" },
//!     "version": ""
//! }"#)?;
//! let config = add_defaults(raw, None)?;
//! assert_eq!(config.package(), "db");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod defaults;
mod error;

pub use config::{
    BinaryTarget, Configuration, Datamodel, EngineType, EnumDef, FieldDef, FieldKind,
    GenerationConfig, GeneratorConfig, ModelDef,
};
pub use defaults::{
    BINARY_TARGETS_ENV, DEFAULT_ENGINE_VERSION, DEFAULT_PACKAGE_NAME, add_defaults,
    add_defaults_from_env,
};
pub use error::{Error, Result};
