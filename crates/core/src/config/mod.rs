//! Configuration model consumed by the generator
//!
//! [`Configuration`] mirrors the JSON document produced by the schema parser.
//! It is mutable input; [`GenerationConfig`] is the immutable view produced by
//! [`crate::add_defaults`] and is what every later stage reads.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The generation request as handed over by the schema parser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Generator block of the schema
    pub generator: GeneratorConfig,

    /// Enums and models the client templates are rendered from
    #[serde(default)]
    pub datamodel: Datamodel,

    /// Expected native engine version (commit hash)
    #[serde(default)]
    pub version: String,

    /// Path of the schema the configuration was parsed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,
}

/// Generator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Output directory for generated sources
    pub output: PathBuf,

    /// Package (module) name of the generated client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Requested engine binary targets
    #[serde(default)]
    pub binary_targets: Vec<BinaryTarget>,

    /// Skip engine provisioning and embedding entirely
    #[serde(default, deserialize_with = "flag")]
    pub disable_binaries: bool,

    /// Do not write an ignore file next to the generated sources
    #[serde(default, deserialize_with = "flag")]
    pub disable_ignore_file: bool,

    /// How the generated client talks to the engine
    #[serde(default)]
    pub engine_type: EngineType,
}

/// Engine flavour requested by the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Local engine binary embedded in the client
    #[default]
    Binary,
    /// Local engine loaded as a shared library
    Library,
    /// Remote data proxy, no local engine needed
    #[serde(rename = "dataproxy")]
    DataProxy,
}

impl EngineType {
    /// Whether the generated client needs an engine binary on the local machine
    #[must_use]
    pub fn requires_local_engine(self) -> bool {
        !matches!(self, Self::DataProxy)
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Library => write!(f, "library"),
            Self::DataProxy => write!(f, "dataproxy"),
        }
    }
}

/// A logical engine platform request (e.g. "native", "linux-musl", "darwin-arm64")
///
/// Deserializes from either a plain string or an object with a `value` key,
/// which is how schema parsers report targets that may come from env vars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BinaryTarget(String);

impl BinaryTarget {
    /// Name of the target that stands for the host platform
    pub const NATIVE: &'static str = "native";

    /// Create a target from its name
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The host platform placeholder
    #[must_use]
    pub fn native() -> Self {
        Self::new(Self::NATIVE)
    }

    /// Target name as written in the schema
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the `native` placeholder
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.0 == Self::NATIVE
    }

    /// Whether the target names a darwin or windows platform
    ///
    /// Builds that only contain such targets cannot run locally on Linux,
    /// so target defaulting adds `native` for them.
    #[must_use]
    pub fn is_non_linux_os(&self) -> bool {
        self.0 == "windows" || self.0.starts_with("darwin")
    }
}

impl fmt::Display for BinaryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BinaryTarget {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for BinaryTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Plain(String),
            Object { value: String },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Plain(value) | Repr::Object { value } => Self(value),
        })
    }
}

/// Accept both JSON booleans and the strings "true"/"false".
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Bool(b) => Ok(b),
        Repr::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", got \"{other}\""
            ))),
        },
    }
}

/// Enums and models declared in the schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Datamodel {
    /// Enum declarations, in schema order
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    /// Model declarations, in schema order
    #[serde(default)]
    pub models: Vec<ModelDef>,
}

/// A schema enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnumDef {
    /// Enum name
    pub name: String,
    /// Enum values, in schema order
    pub values: Vec<String>,
}

/// A schema model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    /// Model name
    pub name: String,
    /// Fields, in schema order
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    /// Fields that hold data rather than relations
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind != FieldKind::Object)
    }
}

/// A model field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Scalar type, enum name or related model name
    #[serde(rename = "type")]
    pub field_type: String,
    /// What `field_type` refers to
    #[serde(default)]
    pub kind: FieldKind,
    /// Whether the field holds a list
    #[serde(default)]
    pub is_list: bool,
    /// Whether the field is non-nullable
    #[serde(default)]
    pub is_required: bool,
    /// Whether the field is the primary key
    #[serde(default)]
    pub is_id: bool,
    /// Whether the field carries a unique constraint
    #[serde(default)]
    pub is_unique: bool,
}

impl FieldDef {
    /// Whether the field can identify a single record
    #[must_use]
    pub fn is_unique_key(&self) -> bool {
        self.is_id || self.is_unique
    }
}

/// Kind of type a field refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Built-in scalar (String, Int, DateTime, ...)
    #[default]
    Scalar,
    /// Schema enum
    Enum,
    /// Relation to another model
    Object,
}

/// Immutable, fully defaulted configuration for one generation run
///
/// Only [`crate::add_defaults`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub(crate) package: String,
    pub(crate) output: PathBuf,
    pub(crate) binary_targets: Vec<BinaryTarget>,
    pub(crate) disable_binaries: bool,
    pub(crate) disable_ignore_file: bool,
    pub(crate) engine_type: EngineType,
    pub(crate) engine_version: String,
    pub(crate) datamodel: Datamodel,
    pub(crate) schema_path: Option<PathBuf>,
}

impl GenerationConfig {
    /// Package (module) name of the generated client
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Output directory
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Redirect generated files to `output`.
    ///
    /// The path is not re-validated here; file writers reject source-file
    /// paths themselves.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Requested targets, after any environment override
    #[must_use]
    pub fn binary_targets(&self) -> &[BinaryTarget] {
        &self.binary_targets
    }

    /// Whether engine provisioning is disabled
    #[must_use]
    pub fn disable_binaries(&self) -> bool {
        self.disable_binaries
    }

    /// Whether ignore-file writing is disabled
    #[must_use]
    pub fn disable_ignore_file(&self) -> bool {
        self.disable_ignore_file
    }

    /// Engine flavour
    #[must_use]
    pub fn engine_type(&self) -> EngineType {
        self.engine_type
    }

    /// Engine version used for cache keys and downloads
    #[must_use]
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    /// Datamodel for the client templates
    #[must_use]
    pub fn datamodel(&self) -> &Datamodel {
        &self.datamodel
    }

    /// Schema location, if the parser reported one
    #[must_use]
    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }
}
