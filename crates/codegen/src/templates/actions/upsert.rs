//! Create-or-update.

use crate::naming::model_names;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(in crate::templates) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let models = model_names(&config.datamodel().models)?;
    let mut out = TokenStream::new();

    for model in &models {
        let (name, ty, actions) = (&model.name, &model.ty, &model.actions);
        out.extend(quote! {
            impl<'a> #actions<'a> {
                /// Update the record matching `filter`, or create it from `create`.
                pub fn upsert_one(
                    &self,
                    filter: WhereParam,
                    create: Vec<SetParam>,
                    update: Vec<SetParam>,
                ) -> Action<'a, #ty> {
                    let mut query = Query::new(#name, "upsertOne");
                    query.filters = vec![filter];
                    query.data = create;
                    query.update = update;
                    Action::new(self.client, query)
                }
            }
        });
    }

    Ok(out)
}
