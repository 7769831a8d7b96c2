//! Batched execution.

use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(in crate::templates) fn render(_config: &GenerationConfig) -> Result<TokenStream, String> {
    Ok(quote! {
        /// Queries executed together; either all apply or none do.
        pub struct Transaction<'a> {
            client: &'a Client,
            queries: Vec<Query>,
        }

        impl Client {
            /// Start an empty transaction.
            pub fn transaction(&self) -> Transaction<'_> {
                Transaction { client: self, queries: Vec::new() }
            }
        }

        impl<'a> Transaction<'a> {
            /// Add `action` to the batch.
            pub fn add<T>(mut self, action: Action<'a, T>) -> Self {
                self.queries.push(action.query);
                self
            }

            /// Number of queries in the batch.
            pub fn len(&self) -> usize {
                self.queries.len()
            }

            /// Whether the batch is empty.
            pub fn is_empty(&self) -> bool {
                self.queries.is_empty()
            }

            /// Execute the batch, returning one raw response per query.
            pub fn exec(self) -> ClientResult<Vec<serde_json::Value>> {
                let mut query = Query::new("", "transaction");
                query.batch = self.queries;
                self.client.execute(&query)
            }
        }
    })
}
