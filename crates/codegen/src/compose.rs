//! Client composition
//!
//! Templates render in pipeline order into one buffer. Each fragment is
//! preceded by a marker item naming its template, and the buffer is parsed
//! after every fragment so a malformed template is reported by name. The
//! finished buffer gets one final validation and formatting pass.

use crate::formatter;
use crate::templates::TemplatePipeline;
use clientgen_core::{Error, GenerationConfig, Result};
use quote::quote;
use tracing::{debug, instrument};

/// Name used in errors from the final pass over the whole buffer.
const FINAL_PASS: &str = "<composed client>";

/// Text of the marker placed before a template's fragment.
#[must_use]
pub fn marker(template: &str) -> String {
    format!("--- template {template} ---")
}

/// Renders a template pipeline into client source
#[derive(Debug, Clone)]
pub struct Composer {
    pipeline: TemplatePipeline,
}

impl Composer {
    /// Compose with an explicit pipeline.
    #[must_use]
    pub fn new(pipeline: TemplatePipeline) -> Self {
        Self { pipeline }
    }

    /// Compose with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns a template error if the built-in order is inconsistent.
    pub fn standard() -> Result<Self> {
        TemplatePipeline::standard().map(Self::new)
    }

    /// The pipeline this composer renders
    #[must_use]
    pub fn pipeline(&self) -> &TemplatePipeline {
        &self.pipeline
    }

    /// Render every template against `config` and return the formatted source.
    ///
    /// # Errors
    ///
    /// Returns a template error naming the first template that fails to
    /// render or leaves the buffer malformed. Nothing is written.
    #[instrument(skip_all, fields(package = config.package()))]
    pub fn compose(&self, config: &GenerationConfig) -> Result<String> {
        let mut buffer = String::new();

        for stage in self.pipeline.stages() {
            let fragment = stage.render(config)?;
            let marker = marker(stage.name());

            buffer.push_str(&quote!(const _: &str = #marker;).to_string());
            buffer.push('\n');
            buffer.push_str(&fragment.to_string());
            buffer.push('\n');

            formatter::validate(&buffer).map_err(|e| Error::template(stage.name(), e))?;
            debug!(template = stage.name(), bytes = buffer.len(), "Template rendered");
        }

        formatter::format(&buffer).map_err(|e| Error::template(FINAL_PASS, e))
    }
}

/// Compose the client for `config` with the built-in templates.
///
/// # Errors
///
/// See [`Composer::compose`].
pub fn compose(config: &GenerationConfig) -> Result<String> {
    Composer::standard()?.compose(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateStage;
    use clientgen_core::{Configuration, add_defaults};
    use proc_macro2::TokenStream;

    fn config() -> GenerationConfig {
        let raw: Configuration = serde_json::from_value(serde_json::json!({
            "generator": { "output": "./db", "package": "shop" },
            "version": "abc",
        }))
        .unwrap();
        add_defaults(raw, None).unwrap()
    }

    fn unbalanced(_: &GenerationConfig) -> std::result::Result<TokenStream, String> {
        Ok("pub fn broken() -> u8 { 1 } pub struct".parse().unwrap())
    }

    fn first(_: &GenerationConfig) -> std::result::Result<TokenStream, String> {
        Ok(quote!(pub struct First;))
    }

    fn failing(_: &GenerationConfig) -> std::result::Result<TokenStream, String> {
        Err("no datasource".to_string())
    }

    #[test]
    fn test_empty_datamodel_composes() {
        let source = compose(&config()).unwrap();
        assert!(source.contains("pub const PACKAGE_NAME: &str = \"shop\";"));
        assert!(source.contains("pub const ENGINE_VERSION: &str = \"abc\";"));
        assert!(source.contains("pub struct Client"));
    }

    #[test]
    fn test_malformed_fragment_names_its_template() {
        let pipeline = TemplatePipeline::new(vec![
            TemplateStage::new("first", &[], &[], first),
            TemplateStage::new("broken", &[], &[], unbalanced),
        ])
        .unwrap();

        let err = Composer::new(pipeline).compose(&config()).unwrap_err();
        assert!(matches!(err, Error::Template { ref template, .. } if template == "broken"));
    }

    #[test]
    fn test_render_failure_names_its_template() {
        let pipeline = TemplatePipeline::new(vec![
            TemplateStage::new("first", &[], &[], first),
            TemplateStage::new("datasource", &[], &[], failing),
        ])
        .unwrap();

        let err = Composer::new(pipeline).compose(&config()).unwrap_err();
        assert_eq!(err.to_string(), "Template 'datasource' failed: no datasource");
    }

    #[test]
    fn test_markers_follow_pipeline_order() {
        let composer = Composer::standard().unwrap();
        let source = composer.compose(&config()).unwrap();

        let positions: Vec<usize> = composer
            .pipeline()
            .names()
            .map(|name| source.find(&marker(name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
