//! Record structs, one per model.

use crate::naming::{field_ident, type_ident};
use clientgen_core::{Datamodel, FieldDef, FieldKind, GenerationConfig};
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let datamodel = config.datamodel();
    let mut out = TokenStream::new();

    for model in &datamodel.models {
        let ty = type_ident(&model.name)?;
        let mut fields = Vec::with_capacity(model.fields.len());

        for field in &model.fields {
            let ident = field_ident(&field.name)?;
            let field_ty = field_type(field, datamodel)
                .map_err(|e| format!("{}.{}: {e}", model.name, field.name))?;
            let wire = &field.name;
            let optional = field.kind == FieldKind::Object || (!field.is_required && !field.is_list);

            fields.push(if optional {
                quote! {
                    #[serde(rename = #wire, default, skip_serializing_if = "Option::is_none")]
                    pub #ident: #field_ty
                }
            } else {
                quote! {
                    #[serde(rename = #wire)]
                    pub #ident: #field_ty
                }
            });
        }

        out.extend(quote! {
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct #ty {
                #(#fields,)*
            }
        });
    }

    Ok(out)
}

/// Rust type of a field, wrapped for optionality and lists.
fn field_type(field: &FieldDef, datamodel: &Datamodel) -> Result<TokenStream, String> {
    let base = match field.kind {
        FieldKind::Scalar => scalar_type(&field.field_type)?,
        FieldKind::Enum => {
            if !datamodel.enums.iter().any(|e| e.name == field.field_type) {
                return Err(format!("unknown enum '{}'", field.field_type));
            }
            let ident = type_ident(&field.field_type)?;
            quote!(#ident)
        }
        FieldKind::Object => {
            if !datamodel.models.iter().any(|m| m.name == field.field_type) {
                return Err(format!("unknown model '{}'", field.field_type));
            }
            let ident = type_ident(&field.field_type)?;
            // Relations are only present when the query loaded them
            return Ok(if field.is_list {
                quote!(Option<Vec<#ident>>)
            } else {
                quote!(Option<Box<#ident>>)
            });
        }
    };

    Ok(match (field.is_list, field.is_required) {
        (true, _) => quote!(Vec<#base>),
        (false, true) => base,
        (false, false) => quote!(Option<#base>),
    })
}

fn scalar_type(name: &str) -> Result<TokenStream, String> {
    Ok(match name {
        "String" | "Decimal" => quote!(String),
        "Int" => quote!(i32),
        "BigInt" => quote!(i64),
        "Float" => quote!(f64),
        "Boolean" => quote!(bool),
        "DateTime" => quote!(chrono::DateTime<chrono::FixedOffset>),
        "Json" => quote!(serde_json::Value),
        "Bytes" => quote!(Vec<u8>),
        other => return Err(format!("unsupported scalar type '{other}'")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str, kind: FieldKind, is_list: bool, is_required: bool) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            field_type: ty.to_string(),
            kind,
            is_list,
            is_required,
            is_id: false,
            is_unique: false,
        }
    }

    fn render_type(field: &FieldDef) -> Result<String, String> {
        let datamodel: Datamodel = serde_json::from_value(serde_json::json!({
            "enums": [{ "name": "Role", "values": ["USER"] }],
            "models": [{ "name": "Post", "fields": [] }],
        }))
        .unwrap();
        field_type(field, &datamodel).map(|t| t.to_string().replace(' ', ""))
    }

    #[test]
    fn test_scalar_mapping() {
        let cases = [
            ("Int", true, "i32"),
            ("BigInt", true, "i64"),
            ("DateTime", true, "chrono::DateTime<chrono::FixedOffset>"),
            ("String", false, "Option<String>"),
        ];
        for (ty, required, expected) in cases {
            let f = field("f", ty, FieldKind::Scalar, false, required);
            assert_eq!(render_type(&f).unwrap(), expected, "{ty}");
        }
    }

    #[test]
    fn test_lists_and_relations() {
        let tags = field("tags", "String", FieldKind::Scalar, true, true);
        assert_eq!(render_type(&tags).unwrap(), "Vec<String>");

        let posts = field("posts", "Post", FieldKind::Object, true, true);
        assert_eq!(render_type(&posts).unwrap(), "Option<Vec<Post>>");

        let author = field("author", "Post", FieldKind::Object, false, true);
        assert_eq!(render_type(&author).unwrap(), "Option<Box<Post>>");

        let role = field("role", "Role", FieldKind::Enum, false, true);
        assert_eq!(render_type(&role).unwrap(), "Role");
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        let f = field("f", "Money", FieldKind::Scalar, false, true);
        assert!(render_type(&f).unwrap_err().contains("Money"));

        let f = field("f", "Status", FieldKind::Enum, false, true);
        assert!(render_type(&f).unwrap_err().contains("unknown enum"));

        let f = field("f", "Comment", FieldKind::Object, false, true);
        assert!(render_type(&f).unwrap_err().contains("unknown model"));
    }
}
