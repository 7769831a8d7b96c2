//! Field selectors, one enum per model.

use crate::naming::{ModelNames, type_ident};
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let mut out = TokenStream::new();

    for model in &config.datamodel().models {
        if model.fields.is_empty() {
            return Err(format!("model '{}' has no fields", model.name));
        }

        let names = ModelNames::new(model)?;
        let field_enum = &names.field_enum;
        let variants = model
            .fields
            .iter()
            .map(|f| type_ident(&f.name))
            .collect::<Result<Vec<_>, _>>()?;
        let wire: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();

        out.extend(quote! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum #field_enum {
                #(#variants,)*
            }

            impl #field_enum {
                /// Field name as declared in the schema.
                pub const fn as_str(self) -> &'static str {
                    match self {
                        #(#field_enum::#variants => #wire,)*
                    }
                }
            }
        });
    }

    Ok(out)
}
