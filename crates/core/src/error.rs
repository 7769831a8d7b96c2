//! Error types shared by every clientgen stage

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for generation runs
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Invalid configuration, reported before any I/O happens
    #[error("Configuration error: {message}")]
    #[diagnostic(code(clientgen::config))]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// A named template failed to render or produced invalid source
    #[error("Template '{template}' failed: {message}")]
    #[diagnostic(
        code(clientgen::template),
        help("The fragment emitted by this template, together with everything before it, must parse as Rust")
    )]
    Template {
        /// Name of the template stage that produced the failure
        template: String,
        /// Render or parse failure, with line/column when available
        message: String,
    },

    /// An engine binary could not be provisioned
    #[error("Failed to fetch engine for '{target}': {message}")]
    #[diagnostic(
        code(clientgen::fetch),
        help("Check network access to the engines mirror; the cache is left untouched and the run can be retried")
    )]
    Fetch {
        /// Resolved platform name of the failing target
        target: String,
        /// Underlying failure
        message: String,
    },

    /// A generated artifact could not be written
    #[error("Failed to write {}", path.display())]
    #[diagnostic(
        code(clientgen::write),
        help("Check file permissions for the output directory")
    )]
    Write {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Destination of the artifact
        path: Box<Path>,
    },

    /// I/O error outside artifact writing (cache directory, lock files)
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(clientgen::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "rename", "lock")
        operation: String,
    },

    /// Configuration JSON could not be decoded
    #[error("JSON error: {0}")]
    #[diagnostic(code(clientgen::json))]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create a template error for the named stage
    #[must_use]
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error for a resolved target
    #[must_use]
    pub fn fetch(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a write error for an artifact path
    #[must_use]
    pub fn write(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Write {
            source,
            path: path.as_ref().into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }
}

/// Result type for clientgen operations
pub type Result<T> = std::result::Result<T, Error>;
