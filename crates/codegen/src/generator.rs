//! Writing generated files
//!
//! Generated sources always land inside the configured output directory,
//! which is created on demand. An output path that names a source file is a
//! configuration mistake and is rejected before anything is written.

use clientgen_core::{Error, GenerationConfig, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the composed client inside the output directory.
pub const CLIENT_FILE_NAME: &str = "db_gen.rs";

/// File name of the ignore file written next to generated sources.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

const IGNORE_FILE_CONTENT: &str = "# gitignore generated by clientgen. DO NOT EDIT.\n*_gen.rs\n";

/// What a generated file contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The composed client source
    Client,
    /// An embedded engine binary for one platform
    Engine {
        /// Platform the engine was built for
        platform: String,
    },
    /// Module listing every embedded engine
    EngineIndex,
    /// Ignore rules keeping generated sources out of version control
    IgnoreFile,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Engine { platform } => write!(f, "engine ({platform})"),
            Self::EngineIndex => write!(f, "engine index"),
            Self::IgnoreFile => write!(f, "ignore file"),
        }
    }
}

/// A file written by a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Where the file was written
    pub path: PathBuf,
    /// What it contains
    pub kind: ArtifactKind,
}

/// Write the composed client source into the output directory.
///
/// # Errors
///
/// Returns a configuration error if the output path names a `.rs` file, and a
/// write error if the directory or file cannot be written.
pub fn write_client(config: &GenerationConfig, source: &str) -> Result<GeneratedArtifact> {
    let output = config.output();
    if output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("rs"))
    {
        return Err(Error::configuration(format!(
            "generator output should be a directory, got source file path {}",
            output.display()
        )));
    }

    let path = output.join(CLIENT_FILE_NAME);
    write_file(&path, source)?;

    Ok(GeneratedArtifact {
        path,
        kind: ArtifactKind::Client,
    })
}

/// Write the ignore file into the output directory.
///
/// Nothing is written when ignore files or binaries are disabled.
///
/// # Errors
///
/// Returns a write error if the directory or file cannot be written.
pub fn write_ignore_file(config: &GenerationConfig) -> Result<Option<GeneratedArtifact>> {
    if config.disable_ignore_file() || config.disable_binaries() {
        tracing::debug!("Ignore file disabled");
        return Ok(None);
    }

    let path = config.output().join(IGNORE_FILE_NAME);
    write_file(&path, IGNORE_FILE_CONTENT)?;

    Ok(Some(GeneratedArtifact {
        path,
        kind: ArtifactKind::IgnoreFile,
    }))
}

/// Write `content` to `path`, creating parent directories first.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::write(e, parent))?;
    }

    std::fs::write(path, content).map_err(|e| Error::write(e, path))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "Generated");

    Ok(())
}
