//! End-to-end tests for client composition over a realistic datamodel.

use clientgen_codegen::{
    CLIENT_FILE_NAME, Composer, ENGINE_INDEX_FILE_NAME, TemplatePipeline, compose, marker, standard_stages, write_client,
};
use clientgen_core::{Configuration, Error, GenerationConfig, add_defaults};
use std::path::Path;
use tempfile::TempDir;

fn shop_config(output: &Path) -> GenerationConfig {
    let raw: Configuration = serde_json::from_value(serde_json::json!({
        "generator": { "output": output, "package": "shop" },
        "version": "abc123",
        "datamodel": {
            "enums": [
                { "name": "Role", "values": ["USER", "ADMIN"] }
            ],
            "models": [
                {
                    "name": "User",
                    "fields": [
                        { "name": "id", "type": "String", "isId": true, "isRequired": true },
                        { "name": "email", "type": "String", "isUnique": true, "isRequired": true },
                        { "name": "role", "type": "Role", "kind": "enum", "isRequired": true },
                        { "name": "type", "type": "String" },
                        { "name": "posts", "type": "Post", "kind": "object", "isList": true }
                    ]
                },
                {
                    "name": "Post",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true, "isRequired": true },
                        { "name": "createdAt", "type": "DateTime", "isRequired": true },
                        { "name": "tags", "type": "String", "isList": true },
                        { "name": "author", "type": "User", "kind": "object" }
                    ]
                }
            ]
        }
    }))
    .unwrap();
    add_defaults(raw, None).unwrap()
}

#[test]
fn composed_client_parses_and_contains_every_template() {
    let temp = TempDir::new().unwrap();
    let source = compose(&shop_config(temp.path())).unwrap();

    syn::parse_file(&source).unwrap();
    for stage in standard_stages() {
        assert!(source.contains(&marker(stage.name())), "{}", stage.name());
    }

    assert!(source.contains("pub struct User {"));
    assert!(source.contains("pub r#type: Option<String>,"));
    assert!(source.contains("pub created_at: chrono::DateTime<chrono::FixedOffset>,"));
    assert!(source.contains("pub posts: Option<Vec<Post>>,"));
    assert!(source.contains("pub author: Option<Box<User>>,"));
    assert!(source.contains("pub enum UserField {"));
    assert!(source.contains("pub fn user(&self) -> UserActions<'_>"));
    assert!(source.contains("pub fn find_unique("));
    assert!(source.contains("pub fn upsert_one("));
    assert!(source.contains("pub fn query_raw<"));
}

#[test]
fn composition_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let config = shop_config(temp.path());
    assert_eq!(compose(&config).unwrap(), compose(&config).unwrap());
}

#[test]
fn reordered_templates_are_rejected_before_rendering() {
    let mut stages = standard_stages();
    let models = stages.iter().position(|s| s.name() == "models").unwrap();
    let enums = stages.iter().position(|s| s.name() == "enums").unwrap();
    stages.swap(models, enums);

    let err = TemplatePipeline::new(stages).unwrap_err();
    assert!(matches!(err, Error::Template { ref template, .. } if template == "models"));
}

#[test]
fn unusable_schema_name_fails_its_template() {
    let temp = TempDir::new().unwrap();
    let raw: Configuration = serde_json::from_value(serde_json::json!({
        "generator": { "output": temp.path() },
        "datamodel": {
            "enums": [{ "name": "1Status", "values": ["ON"] }]
        }
    }))
    .unwrap();
    let config = add_defaults(raw, None).unwrap();

    let err = Composer::standard().unwrap().compose(&config).unwrap_err();
    assert!(matches!(err, Error::Template { ref template, .. } if template == "enums"));
}

#[test]
fn client_is_written_into_output_dir() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("generated");
    let config = shop_config(&output);

    let source = compose(&config).unwrap();
    let artifact = write_client(&config, &source).unwrap();

    assert_eq!(artifact.path, output.join(CLIENT_FILE_NAME));
    assert_eq!(std::fs::read_to_string(artifact.path).unwrap(), source);
}

fn compact(source: &str) -> String {
    source.split_whitespace().collect()
}

fn config_with_generator(output: &Path, generator: serde_json::Value) -> GenerationConfig {
    let mut generator = generator;
    generator["output"] = serde_json::json!(output);
    let raw: Configuration = serde_json::from_value(serde_json::json!({
        "generator": generator,
        "version": "abc123",
    }))
    .unwrap();
    add_defaults(raw, None).unwrap()
}

#[test]
fn client_selects_from_the_engine_index() {
    let temp = TempDir::new().unwrap();
    let source = compose(&shop_config(temp.path())).unwrap();
    let source = compact(&source);

    assert!(source.contains(&format!("#[path=\"{ENGINE_INDEX_FILE_NAME}\"]pubmodengines;")));
    assert!(source.contains(".select_engine(engines::ENGINES)"));
}

#[test]
fn static_engines_take_precedence_over_glibc_builds() {
    let temp = TempDir::new().unwrap();
    let source = compact(&compose(&shop_config(temp.path())).unwrap());

    assert!(source.contains("\"static\"=>0,"));
    assert!(source.contains(".filter(EngineCandidate::matches_host).min_by_key(EngineCandidate::precedence)"));
}

#[test]
fn client_without_engines_needs_no_index() {
    let temp = TempDir::new().unwrap();

    for generator in [
        serde_json::json!({ "disableBinaries": "true" }),
        serde_json::json!({ "engineType": "dataproxy" }),
    ] {
        let source = compose(&config_with_generator(temp.path(), generator)).unwrap();

        assert!(!source.contains(ENGINE_INDEX_FILE_NAME));
        assert!(compact(&source).contains("pubconstENGINES:&[super::EngineCandidate]=&[];"));
    }
}
