//! Configuration defaulting
//!
//! Runs once at the start of a generation run. The result is immutable.

use crate::config::{BinaryTarget, Configuration, GenerationConfig};
use crate::{Error, Result};
use tracing::debug;

/// Package name used when the schema does not set one
pub const DEFAULT_PACKAGE_NAME: &str = "db";

/// Engine version the generator was built against
pub const DEFAULT_ENGINE_VERSION: &str = "605197351a3c8bdd595af2d2a9bc3025bca48ea2";

/// Environment variable that replaces the configured binary targets wholesale
pub const BINARY_TARGETS_ENV: &str = "CLIENTGEN_BINARY_TARGETS";

/// Apply defaults, reading the target override from [`BINARY_TARGETS_ENV`].
///
/// # Errors
///
/// See [`add_defaults`].
pub fn add_defaults_from_env(config: Configuration) -> Result<GenerationConfig> {
    let targets_override = std::env::var(BINARY_TARGETS_ENV).ok();
    add_defaults(config, targets_override.as_deref())
}

/// Apply defaults and validate the configuration.
///
/// - A missing or blank package name becomes [`DEFAULT_PACKAGE_NAME`]
/// - A non-blank `targets_override` (comma separated) replaces the configured targets
/// - A blank version becomes [`DEFAULT_ENGINE_VERSION`]
///
/// # Errors
///
/// Returns a configuration error if the output path is empty or names a source
/// file, or if the package name is not a valid identifier.
pub fn add_defaults(
    config: Configuration,
    targets_override: Option<&str>,
) -> Result<GenerationConfig> {
    let Configuration {
        generator,
        datamodel,
        version,
        schema_path,
    } = config;

    let package = generator
        .package
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PACKAGE_NAME.to_string());
    validate_package_name(&package)?;

    if generator.output.as_os_str().is_empty() {
        return Err(Error::configuration("generator output must not be empty"));
    }
    if generator
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("rs"))
    {
        return Err(Error::configuration(format!(
            "generator output should be a directory, got source file path {}",
            generator.output.display()
        )));
    }

    let binary_targets = match targets_override.map(parse_target_list) {
        Some(targets) if !targets.is_empty() => {
            debug!(?targets, "overriding binary targets from environment");
            targets
        }
        _ => generator.binary_targets,
    };

    let engine_version = match version.trim() {
        "" => DEFAULT_ENGINE_VERSION.to_string(),
        v => v.to_string(),
    };

    Ok(GenerationConfig {
        package,
        output: generator.output,
        binary_targets,
        disable_binaries: generator.disable_binaries,
        disable_ignore_file: generator.disable_ignore_file,
        engine_type: generator.engine_type,
        engine_version,
        datamodel,
        schema_path,
    })
}

fn parse_target_list(raw: &str) -> Vec<BinaryTarget> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(BinaryTarget::new)
        .collect()
}

fn validate_package_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name != "_" {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "package name '{name}' is not a valid module identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Datamodel, EngineType, GeneratorConfig};
    use std::path::PathBuf;

    fn configuration(output: &str) -> Configuration {
        Configuration {
            generator: GeneratorConfig {
                output: PathBuf::from(output),
                package: None,
                binary_targets: vec![BinaryTarget::new("darwin")],
                disable_binaries: false,
                disable_ignore_file: false,
                engine_type: EngineType::Binary,
            },
            datamodel: Datamodel::default(),
            version: String::new(),
            schema_path: None,
        }
    }

    #[test]
    fn test_package_defaults_to_db() {
        let config = add_defaults(configuration("out"), None).unwrap();
        assert_eq!(config.package(), DEFAULT_PACKAGE_NAME);
    }

    #[test]
    fn test_blank_package_defaults_to_db() {
        let mut raw = configuration("out");
        raw.generator.package = Some("  ".to_string());
        let config = add_defaults(raw, None).unwrap();
        assert_eq!(config.package(), "db");
    }

    #[test]
    fn test_explicit_package_is_kept() {
        let mut raw = configuration("out");
        raw.generator.package = Some("store".to_string());
        let config = add_defaults(raw, None).unwrap();
        assert_eq!(config.package(), "store");
    }

    #[test]
    fn test_invalid_package_is_rejected() {
        for name in ["1db", "my-db", "_", "db.client"] {
            let mut raw = configuration("out");
            raw.generator.package = Some(name.to_string());
            let err = add_defaults(raw, None).unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "{name}");
        }
    }

    #[test]
    fn test_source_file_output_is_rejected() {
        let err = add_defaults(configuration("out/db_gen.rs"), None).unwrap_err();
        assert!(err.to_string().contains("should be a directory"));
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let err = add_defaults(configuration(""), None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_override_replaces_targets() {
        let config = add_defaults(configuration("out"), Some("linux-musl, windows,")).unwrap();
        assert_eq!(
            config.binary_targets(),
            &[BinaryTarget::new("linux-musl"), BinaryTarget::new("windows")]
        );
    }

    #[test]
    fn test_blank_override_keeps_configured_targets() {
        let config = add_defaults(configuration("out"), Some(" , ")).unwrap();
        assert_eq!(config.binary_targets(), &[BinaryTarget::new("darwin")]);
    }

    #[test]
    fn test_version_defaults_to_builtin() {
        let config = add_defaults(configuration("out"), None).unwrap();
        assert_eq!(config.engine_version(), DEFAULT_ENGINE_VERSION);

        let mut raw = configuration("out");
        raw.version = "abc123".to_string();
        let config = add_defaults(raw, None).unwrap();
        assert_eq!(config.engine_version(), "abc123");
    }
}
