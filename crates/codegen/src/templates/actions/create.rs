//! Record creation.

use crate::naming::model_names;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(in crate::templates) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let models = model_names(&config.datamodel().models)?;
    let mut out = quote! {
        /// Number of records touched by a bulk operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
        pub struct BatchResult {
            /// Records affected
            pub count: i64,
        }
    };

    for model in &models {
        let (name, ty, actions) = (&model.name, &model.ty, &model.actions);
        out.extend(quote! {
            impl<'a> #actions<'a> {
                /// Create one record from `data`.
                pub fn create_one(&self, data: Vec<SetParam>) -> Action<'a, #ty> {
                    let mut query = Query::new(#name, "createOne");
                    query.data = data;
                    Action::new(self.client, query)
                }

                /// Create one record per entry of `rows`.
                pub fn create_many(&self, rows: Vec<Vec<SetParam>>) -> Action<'a, BatchResult> {
                    let mut query = Query::new(#name, "createMany");
                    query.rows = rows;
                    Action::new(self.client, query)
                }
            }
        });
    }

    Ok(out)
}
