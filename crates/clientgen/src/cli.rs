//! Command-line interface

use crate::pipeline::{GenerationReport, Pipeline};
use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use clientgen_core::{BINARY_TARGETS_ENV, Configuration, Error};
use clientgen_engines::{
    DEFAULT_ENGINES_MIRROR, EngineCache, EngineSource, HostPlatform, HttpEngineSource, Provisioner,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming the engine cache directory.
pub const CACHE_DIR_ENV: &str = "CLIENTGEN_CACHE_DIR";

/// Environment variable naming the engine mirror.
pub const ENGINES_MIRROR_ENV: &str = "CLIENTGEN_ENGINES_MIRROR";

#[derive(Parser, Debug)]
#[command(name = "clientgen")]
#[command(about = "Generate a typed database client with its native engines embedded")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Generate the client and embed its engines")]
    Generate {
        #[arg(
            long,
            short = 'c',
            help = "Configuration JSON produced by the schema parser, or - for stdin"
        )]
        config: PathBuf,

        #[arg(long, env = CACHE_DIR_ENV, help = "Engine cache directory")]
        cache_dir: Option<PathBuf>,

        #[arg(
            long,
            env = ENGINES_MIRROR_ENV,
            help = "Mirror engines are downloaded from",
            default_value = DEFAULT_ENGINES_MIRROR
        )]
        engines_mirror: String,

        #[arg(
            long,
            env = BINARY_TARGETS_ENV,
            help = "Comma-separated targets replacing the configured ones"
        )]
        binary_targets: Option<String>,
    },
}

/// Parse command-line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Execute a parsed command.
///
/// # Errors
///
/// Returns a diagnostic for configuration, generation or provisioning failures.
pub async fn execute(command: Commands) -> miette::Result<GenerationReport> {
    match command {
        Commands::Generate {
            config,
            cache_dir,
            engines_mirror,
            binary_targets,
        } => {
            let configuration = load_configuration(&config)?;
            let cache = cache_dir.map_or_else(EngineCache::default, EngineCache::new);
            let source: Arc<dyn EngineSource> = Arc::new(HttpEngineSource::with_mirror(engines_mirror)?);
            let host = HostPlatform::detect()?;

            let pipeline = Pipeline::new(Arc::new(Provisioner::new(cache, source)), host)?;
            Ok(pipeline.run(configuration, binary_targets.as_deref()).await?)
        }
    }
}

/// Read a configuration document from `path`, or stdin for `-`.
///
/// # Errors
///
/// Returns an I/O error if the document cannot be read and a JSON error if it
/// does not decode.
pub fn load_configuration(path: &Path) -> Result<Configuration, Error> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).map_err(|e| Error::io_no_path(e, "read stdin"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?
    };

    Ok(serde_json::from_str(&raw)?)
}
