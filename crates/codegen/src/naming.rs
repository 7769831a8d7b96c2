//! Schema names to Rust identifiers
//!
//! Schema names are free-form; everything that ends up in generated code goes
//! through here so a bad name fails the template that used it instead of
//! producing source that does not parse.

use clientgen_core::ModelDef;
use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::Ident;

/// Parse `name` as an identifier, falling back to a raw identifier for keywords.
pub(crate) fn ident(name: &str) -> Result<Ident, String> {
    syn::parse_str::<Ident>(name)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{name}")))
        .map_err(|_| format!("'{name}' cannot be used as a Rust identifier"))
}

/// Type-position identifier (`UserProfile`).
pub(crate) fn type_ident(name: &str) -> Result<Ident, String> {
    ident(&name.to_upper_camel_case())
}

/// Value-position identifier (`created_at`).
pub(crate) fn field_ident(name: &str) -> Result<Ident, String> {
    ident(&name.to_snake_case())
}

/// Every identifier generated for one model.
pub(crate) struct ModelNames {
    /// Name as declared in the schema, used on the wire
    pub name: String,
    /// Record struct
    pub ty: Ident,
    /// Field selector enum
    pub field_enum: Ident,
    /// Per-model action builder
    pub actions: Ident,
    /// Accessor on the client (`client.user()`)
    pub accessor: Ident,
}

impl ModelNames {
    pub(crate) fn new(model: &ModelDef) -> Result<Self, String> {
        let ty = type_ident(&model.name)?;
        Ok(Self {
            name: model.name.clone(),
            field_enum: ident(&format!("{ty}Field"))?,
            actions: ident(&format!("{ty}Actions"))?,
            accessor: field_ident(&model.name)?,
            ty,
        })
    }
}

/// Names for every model, failing on the first unusable one.
pub(crate) fn model_names(models: &[ModelDef]) -> Result<Vec<ModelNames>, String> {
    models.iter().map(ModelNames::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_become_raw_identifiers() {
        assert_eq!(ident("type").unwrap().to_string(), "r#type");
        assert_eq!(field_ident("match").unwrap().to_string(), "r#match");
        assert_eq!(ident("email").unwrap().to_string(), "email");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(type_ident("user_profile").unwrap().to_string(), "UserProfile");
        assert_eq!(type_ident("ADMIN").unwrap().to_string(), "Admin");
        assert_eq!(field_ident("createdAt").unwrap().to_string(), "created_at");
    }

    #[test]
    fn test_unusable_names_are_rejected() {
        assert!(ident("").is_err());
        assert!(type_ident("1st").is_err());
        assert!(ident("self").is_err());
    }

    #[test]
    fn test_model_names() {
        let model = ModelDef {
            name: "BlogPost".to_string(),
            fields: Vec::new(),
        };
        let names = ModelNames::new(&model).unwrap();
        assert_eq!(names.ty.to_string(), "BlogPost");
        assert_eq!(names.field_enum.to_string(), "BlogPostField");
        assert_eq!(names.actions.to_string(), "BlogPostActions");
        assert_eq!(names.accessor.to_string(), "blog_post");
    }
}
