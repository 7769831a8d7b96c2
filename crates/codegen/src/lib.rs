//! # clientgen-codegen
//!
//! Turns a [`GenerationConfig`](clientgen_core::GenerationConfig) into Rust
//! source files.
//!
//! - [`compose`] renders the client templates in order into one validated,
//!   formatted source file
//! - [`write_client`] writes it into the output directory, and
//!   [`write_ignore_file`] keeps generated files out of version control
//! - [`embed`] writes one file per engine platform that compiles the cached
//!   engine binary into the program, and [`write_engine_index`] lists the
//!   embeddings for the client
//!
//! ## Example
//!
//! ```ignore
//! use clientgen_codegen::{compose, write_client};
//!
//! let source = compose(&config)?;
//! let artifact = write_client(&config, &source)?;
//! ```

pub mod compose;
pub mod embed;
pub mod formatter;
pub mod generator;
mod naming;
pub mod templates;

pub use compose::{Composer, compose, marker};
pub use embed::{ENGINE_INDEX_FILE_NAME, EngineBinary, embed, engine_file_name, write_engine_index};
pub use generator::{
    ArtifactKind, CLIENT_FILE_NAME, GeneratedArtifact, IGNORE_FILE_NAME, write_client,
    write_ignore_file,
};
pub use templates::{TemplatePipeline, TemplateStage, standard_stages};
