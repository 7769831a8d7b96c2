//! Schema enums.

use crate::naming::type_ident;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let mut out = TokenStream::new();

    for def in &config.datamodel().enums {
        if def.values.is_empty() {
            return Err(format!("enum '{}' has no values", def.name));
        }

        let name = type_ident(&def.name)?;
        let variants = def
            .values
            .iter()
            .map(|value| type_ident(value))
            .collect::<Result<Vec<_>, _>>()?;
        let values = &def.values;

        out.extend(quote! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            pub enum #name {
                #(
                    #[serde(rename = #values)]
                    #variants,
                )*
            }

            impl #name {
                /// Every value, in schema order.
                pub const ALL: &'static [#name] = &[#(#name::#variants),*];

                /// The value as stored in the database.
                pub fn as_str(&self) -> &'static str {
                    match self {
                        #(#name::#variants => #values,)*
                    }
                }
            }

            impl std::fmt::Display for #name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        });
    }

    Ok(out)
}
