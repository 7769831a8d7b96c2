//! Generation pipeline
//!
//! A run moves through fixed stages:
//!
//! ```text
//! Defaulting -> ClientGeneration -> BinaryGeneration -> Done
//! ```
//!
//! Binary generation is skipped when binaries are disabled or the client
//! talks to a data proxy. Otherwise every target is provisioned first and
//! only then embedded, so a failed fetch leaves no embedding behind. The
//! client written by the previous stage stays in place. The engine index the
//! client declares is written last.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use clientgen_codegen::{
    Composer, EngineBinary, GeneratedArtifact, embed, write_client, write_engine_index,
    write_ignore_file,
};
use clientgen_core::{
    BINARY_TARGETS_ENV, Configuration, DEFAULT_ENGINE_VERSION, Error, GenerationConfig,
    add_defaults,
};
use clientgen_engines::{ENGINE_NAME, HostPlatform, Provisioner, ResolvedPlatform, resolve_targets};
use miette::Diagnostic;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Position of a run in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Applying defaults and validating the configuration
    Defaulting,
    /// Composing and writing the client source
    ClientGeneration,
    /// Provisioning and embedding engines
    BinaryGeneration,
    /// Finished
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaulting => write!(f, "defaulting"),
            Self::ClientGeneration => write!(f, "client generation"),
            Self::BinaryGeneration => write!(f, "binary generation"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Why binary generation did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// `disableBinaries` is set
    BinariesDisabled,
    /// The client reaches its engine through a data proxy
    DataProxy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinariesDisabled => write!(f, "binaries are disabled"),
            Self::DataProxy => write!(f, "engine type is dataproxy"),
        }
    }
}

/// A failed run, tagged with the stage that failed
#[derive(Error, Debug, Diagnostic)]
#[error("Generation failed during {stage}")]
#[diagnostic(code(clientgen::pipeline))]
pub struct PipelineError {
    /// Stage the run was in
    pub stage: Stage,
    /// What went wrong
    #[source]
    #[diagnostic_source]
    pub source: Error,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(Error) -> Self {
        move |source| Self { stage, source }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    artifacts: Vec<GeneratedArtifact>,
    platforms: Vec<String>,
    skipped: Option<SkipReason>,
}

impl GenerationReport {
    /// Every written file, the client first
    #[must_use]
    pub fn artifacts(&self) -> &[GeneratedArtifact] {
        &self.artifacts
    }

    /// Engine platforms that were embedded, in target order
    #[must_use]
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Why binary generation was skipped, if it was
    #[must_use]
    pub fn skipped(&self) -> Option<SkipReason> {
        self.skipped
    }
}

/// Drives a configuration through every stage
#[derive(Debug)]
pub struct Pipeline {
    provisioner: Arc<Provisioner>,
    host: HostPlatform,
    composer: Composer,
}

impl Pipeline {
    /// Create a pipeline with the built-in templates.
    ///
    /// # Errors
    ///
    /// Fails in [`Stage::ClientGeneration`] if the built-in template order is
    /// inconsistent.
    pub fn new(provisioner: Arc<Provisioner>, host: HostPlatform) -> Result<Self, PipelineError> {
        let composer = Composer::standard().map_err(PipelineError::at(Stage::ClientGeneration))?;
        Ok(Self::with_composer(provisioner, host, composer))
    }

    /// Create a pipeline with explicit templates.
    #[must_use]
    pub fn with_composer(provisioner: Arc<Provisioner>, host: HostPlatform, composer: Composer) -> Self {
        Self {
            provisioner,
            host,
            composer,
        }
    }

    /// Run with the target override taken from the environment.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub async fn run_from_env(&self, config: Configuration) -> Result<GenerationReport, PipelineError> {
        let targets = std::env::var(BINARY_TARGETS_ENV).ok();
        self.run(config, targets.as_deref()).await
    }

    /// Default `config`, then generate the client and its engines.
    ///
    /// `targets_override` is a comma-separated target list that replaces the
    /// configured one when it names at least one target.
    ///
    /// # Errors
    ///
    /// Returns the first failure, tagged with its stage. Invalid configuration
    /// and unknown targets fail before anything is written.
    #[instrument(skip_all, fields(output = %config.generator.output.display()))]
    pub async fn run(
        &self,
        config: Configuration,
        targets_override: Option<&str>,
    ) -> Result<GenerationReport, PipelineError> {
        info!(stage = %Stage::Defaulting, "Applying defaults");
        let config = add_defaults(config, targets_override).map_err(PipelineError::at(Stage::Defaulting))?;

        if config.engine_version() != DEFAULT_ENGINE_VERSION {
            warn!(
                expected = DEFAULT_ENGINE_VERSION,
                actual = config.engine_version(),
                "Engine version differs from the one this generator was built for"
            );
        }

        let skipped = skip_reason(&config);
        let platforms = match skipped {
            Some(_) => Vec::new(),
            None => resolve_targets(config.binary_targets(), &self.host)
                .map_err(PipelineError::at(Stage::Defaulting))?,
        };

        self.generate(&config, &platforms, skipped).await
    }

    async fn generate(
        &self,
        config: &GenerationConfig,
        platforms: &[ResolvedPlatform],
        skipped: Option<SkipReason>,
    ) -> Result<GenerationReport, PipelineError> {
        info!(stage = %Stage::ClientGeneration, package = config.package(), "Generating client");
        let source = self
            .composer
            .compose(config)
            .map_err(PipelineError::at(Stage::ClientGeneration))?;
        let client = write_client(config, &source).map_err(PipelineError::at(Stage::ClientGeneration))?;
        let mut artifacts = vec![client];
        artifacts.extend(write_ignore_file(config).map_err(PipelineError::at(Stage::ClientGeneration))?);

        if let Some(reason) = skipped {
            info!(stage = %Stage::BinaryGeneration, %reason, "Skipping engines");
        } else {
            info!(stage = %Stage::BinaryGeneration, targets = platforms.len(), "Generating engines");
            artifacts.extend(
                self.embed_engines(config, platforms)
                    .await
                    .map_err(PipelineError::at(Stage::BinaryGeneration))?,
            );
        }

        info!(stage = %Stage::Done, artifacts = artifacts.len(), "Generation complete");
        Ok(GenerationReport {
            artifacts,
            platforms: platforms.iter().map(|p| p.name().to_string()).collect(),
            skipped,
        })
    }

    async fn embed_engines(
        &self,
        config: &GenerationConfig,
        platforms: &[ResolvedPlatform],
    ) -> clientgen_core::Result<Vec<GeneratedArtifact>> {
        let version = config.engine_version();
        let paths = self
            .provisioner
            .ensure_all(ENGINE_NAME, platforms, version)
            .await?;

        let mut artifacts = platforms
            .iter()
            .zip(&paths)
            .map(|(platform, path)| {
                let binary = EngineBinary {
                    engine: ENGINE_NAME,
                    version,
                    platform,
                    path,
                };
                embed(&binary, config.package(), config.output())
            })
            .collect::<clientgen_core::Result<Vec<_>>>()?;

        artifacts.push(write_engine_index(ENGINE_NAME, platforms, config.output())?);
        Ok(artifacts)
    }
}

fn skip_reason(config: &GenerationConfig) -> Option<SkipReason> {
    if config.disable_binaries() {
        Some(SkipReason::BinariesDisabled)
    } else if !config.engine_type().requires_local_engine() {
        Some(SkipReason::DataProxy)
    } else {
        None
    }
}
