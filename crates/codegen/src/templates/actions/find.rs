//! Lookups, plus the updates and deletes that share their filters.

use crate::naming::model_names;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(in crate::templates) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let models = model_names(&config.datamodel().models)?;
    let mut out = quote! {
        impl<'a, T: DeserializeOwned> Action<'a, T> {
            /// Return at most `count` records.
            pub fn take(mut self, count: i64) -> Self {
                self.query.take = Some(count);
                self
            }

            /// Skip the first `count` records.
            pub fn skip(mut self, count: i64) -> Self {
                self.query.skip = Some(count);
                self
            }

            /// Sort by `field`.
            pub fn order_by(mut self, field: impl Field, order: SortOrder) -> Self {
                self.query.order_by.push(field.order(order));
                self
            }
        }
    };

    for model in &models {
        let (name, ty, actions) = (&model.name, &model.ty, &model.actions);
        out.extend(quote! {
            impl<'a> #actions<'a> {
                /// The record matching a unique `filter`, if any.
                pub fn find_unique(&self, filter: WhereParam) -> Action<'a, Option<#ty>> {
                    self.filtered("findUnique", vec![filter])
                }

                /// The first record matching every filter, if any.
                pub fn find_first(&self, filters: Vec<WhereParam>) -> Action<'a, Option<#ty>> {
                    self.filtered("findFirst", filters)
                }

                /// Every record matching every filter.
                pub fn find_many(&self, filters: Vec<WhereParam>) -> Action<'a, Vec<#ty>> {
                    self.filtered("findMany", filters)
                }

                /// Apply `data` to the record matching a unique `filter`.
                pub fn update_unique(&self, filter: WhereParam, data: Vec<SetParam>) -> Action<'a, Option<#ty>> {
                    let mut action: Action<'a, Option<#ty>> = self.filtered("updateOne", vec![filter]);
                    action.query.update = data;
                    action
                }

                /// Apply `data` to every matching record.
                pub fn update_many(&self, filters: Vec<WhereParam>, data: Vec<SetParam>) -> Action<'a, BatchResult> {
                    let mut action: Action<'a, BatchResult> = self.filtered("updateMany", filters);
                    action.query.update = data;
                    action
                }

                /// Delete the record matching a unique `filter`.
                pub fn delete_unique(&self, filter: WhereParam) -> Action<'a, Option<#ty>> {
                    self.filtered("deleteOne", vec![filter])
                }

                /// Delete every matching record.
                pub fn delete_many(&self, filters: Vec<WhereParam>) -> Action<'a, BatchResult> {
                    self.filtered("deleteMany", filters)
                }

                fn filtered<T: DeserializeOwned>(&self, action: &'static str, filters: Vec<WhereParam>) -> Action<'a, T> {
                    let mut query = Query::new(#name, action);
                    query.filters = filters;
                    Action::new(self.client, query)
                }
            }
        });
    }

    Ok(out)
}
