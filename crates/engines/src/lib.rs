//! Native engine provisioning for clientgen.
//!
//! This crate provides functionality to:
//! - Resolve logical binary targets ("native", "linux-musl", ...) to engine platforms
//! - Default and deduplicate the requested target list
//! - Cache engine binaries by engine name, platform and version
//! - Fetch missing engines at most once per cache key, across tasks and processes
//!
//! # Example
//!
//! ```ignore
//! use clientgen_engines::{EngineCache, HostPlatform, HttpEngineSource, Provisioner, resolve_targets};
//! use std::sync::Arc;
//!
//! let host = HostPlatform::detect()?;
//! let platforms = resolve_targets(config.binary_targets(), &host)?;
//!
//! let provisioner = Provisioner::new(EngineCache::default(), Arc::new(HttpEngineSource::new()?));
//! let paths = provisioner.ensure_all(ENGINE_NAME, &platforms, config.engine_version()).await?;
//! ```

mod cache;
pub mod platform;
mod provision;
mod source;
pub mod targets;

pub use cache::{CacheKey, EngineCache};
pub use platform::{Arch, HostPlatform, Libc, Os, ResolvedPlatform, resolve, transform_binary_target};
pub use provision::Provisioner;
pub use source::{DEFAULT_ENGINES_MIRROR, EngineSource, HttpEngineSource};
pub use targets::{TargetSet, resolve_targets, with_native_default};

/// Name of the engine embedded into generated clients.
pub const ENGINE_NAME: &str = "query-engine";
