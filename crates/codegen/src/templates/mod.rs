//! Client templates
//!
//! Each template is a named stage that renders one fragment of the client.
//! Fragments are concatenated into a single file, so a template may only use
//! what an earlier template already emitted. Stages declare the symbols they
//! need and provide; [`TemplatePipeline::new`] rejects an order in which a
//! template would run before its dependencies.

mod actions;
mod client;
mod enums;
mod errors;
mod fields;
mod header;
mod mock;
mod models;
mod query;

use clientgen_core::{Error, GenerationConfig, Result};
use proc_macro2::TokenStream;
use std::collections::HashSet;
use std::fmt;

/// Renders one template into tokens, or explains why it cannot.
pub type RenderFn = fn(&GenerationConfig) -> std::result::Result<TokenStream, String>;

/// Symbols shared between templates.
pub(crate) mod symbols {
    pub const IMPORTS: &str = "imports";
    pub const PACKAGE_NAME: &str = "PACKAGE_NAME";
    pub const ENGINE_VERSION: &str = "ENGINE_VERSION";
    pub const CLIENT: &str = "Client";
    pub const ENGINE_CANDIDATE: &str = "EngineCandidate";
    pub const EXECUTOR: &str = "Executor";
    pub const ENUM_TYPES: &str = "enum types";
    pub const CLIENT_ERROR: &str = "ClientError";
    pub const CLIENT_RESULT: &str = "ClientResult";
    pub const FIELD_ENUMS: &str = "field enums";
    pub const MOCK: &str = "Mock";
    pub const MODEL_TYPES: &str = "model types";
    pub const QUERY: &str = "Query";
    pub const WHERE_PARAM: &str = "WhereParam";
    pub const SET_PARAM: &str = "SetParam";
    pub const FIELD: &str = "Field";
    pub const SORT_ORDER: &str = "SortOrder";
    pub const ACTION: &str = "Action";
    pub const MODEL_ACTIONS: &str = "model actions";
    pub const BATCH_RESULT: &str = "BatchResult";
    pub const TRANSACTION: &str = "Transaction";
}

/// A named template and its position constraints
#[derive(Clone, Copy)]
pub struct TemplateStage {
    name: &'static str,
    requires: &'static [&'static str],
    provides: &'static [&'static str],
    render: RenderFn,
}

impl TemplateStage {
    /// Declare a template.
    #[must_use]
    pub const fn new(
        name: &'static str,
        requires: &'static [&'static str],
        provides: &'static [&'static str],
        render: RenderFn,
    ) -> Self {
        Self {
            name,
            requires,
            provides,
            render,
        }
    }

    /// Template name, as it appears in markers and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Symbols an earlier template must provide
    #[must_use]
    pub fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    /// Symbols this template emits
    #[must_use]
    pub fn provides(&self) -> &'static [&'static str] {
        self.provides
    }

    /// Render the template against `config`.
    ///
    /// # Errors
    ///
    /// Returns a template error naming this template.
    pub fn render(&self, config: &GenerationConfig) -> Result<TokenStream> {
        (self.render)(config).map_err(|message| Error::template(self.name, message))
    }
}

impl fmt::Debug for TemplateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStage")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .finish_non_exhaustive()
    }
}

/// An ordered, validated list of templates
#[derive(Debug, Clone)]
pub struct TemplatePipeline {
    stages: Vec<TemplateStage>,
}

impl TemplatePipeline {
    /// Validate the order of `stages`.
    ///
    /// # Errors
    ///
    /// Returns a template error if a name repeats or a template requires a
    /// symbol no earlier template provides.
    pub fn new(stages: Vec<TemplateStage>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut provided: HashSet<&str> = HashSet::new();

        for stage in &stages {
            if !names.insert(stage.name) {
                return Err(Error::template(stage.name, "template is listed more than once"));
            }

            if let Some(missing) = stage.requires.iter().find(|s| !provided.contains(*s)) {
                return Err(Error::template(
                    stage.name,
                    format!("requires '{missing}', which no earlier template provides"),
                ));
            }

            provided.extend(stage.provides.iter().copied());
        }

        Ok(Self { stages })
    }

    /// The templates every client is composed from, in order.
    ///
    /// # Errors
    ///
    /// Returns a template error if the built-in order is inconsistent.
    pub fn standard() -> Result<Self> {
        Self::new(standard_stages())
    }

    /// Templates in render order
    #[must_use]
    pub fn stages(&self) -> &[TemplateStage] {
        &self.stages
    }

    /// Template names in render order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(TemplateStage::name)
    }
}

/// The built-in templates in render order.
#[must_use]
pub fn standard_stages() -> Vec<TemplateStage> {
    use symbols::*;

    vec![
        TemplateStage::new(
            "_header",
            &[],
            &[IMPORTS, PACKAGE_NAME, ENGINE_VERSION],
            header::render,
        ),
        TemplateStage::new(
            "client",
            &[IMPORTS],
            &[CLIENT, ENGINE_CANDIDATE, EXECUTOR],
            client::render,
        ),
        TemplateStage::new("enums", &[IMPORTS], &[ENUM_TYPES], enums::render),
        TemplateStage::new("errors", &[], &[CLIENT_ERROR, CLIENT_RESULT], errors::render),
        TemplateStage::new("fields", &[], &[FIELD_ENUMS], fields::render),
        TemplateStage::new(
            "mock",
            &[CLIENT_ERROR, CLIENT_RESULT, EXECUTOR],
            &[MOCK],
            mock::render,
        ),
        TemplateStage::new("models", &[IMPORTS, ENUM_TYPES], &[MODEL_TYPES], models::render),
        TemplateStage::new(
            "query",
            &[IMPORTS, FIELD_ENUMS],
            &[QUERY, WHERE_PARAM, SET_PARAM, FIELD, SORT_ORDER],
            query::render,
        ),
        TemplateStage::new(
            "actions/actions",
            &[CLIENT, QUERY, CLIENT_ERROR, CLIENT_RESULT, MODEL_TYPES],
            &[ACTION, MODEL_ACTIONS],
            actions::render,
        ),
        TemplateStage::new(
            "actions/create",
            &[ACTION, MODEL_ACTIONS, SET_PARAM, MODEL_TYPES],
            &[BATCH_RESULT],
            actions::create::render,
        ),
        TemplateStage::new(
            "actions/find",
            &[ACTION, MODEL_ACTIONS, WHERE_PARAM, FIELD, SORT_ORDER, BATCH_RESULT],
            &[],
            actions::find::render,
        ),
        TemplateStage::new(
            "actions/transaction",
            &[ACTION, CLIENT, QUERY],
            &[TRANSACTION],
            actions::transaction::render,
        ),
        TemplateStage::new(
            "actions/upsert",
            &[ACTION, MODEL_ACTIONS, WHERE_PARAM, SET_PARAM],
            &[],
            actions::upsert::render,
        ),
        TemplateStage::new(
            "actions/raw",
            &[ACTION, CLIENT, BATCH_RESULT],
            &[],
            actions::raw::render,
        ),
    ]
}
