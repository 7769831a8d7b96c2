//! Action builders: the typed surface of the client.
//!
//! `actions/actions` emits the generic [`Action`] builder and one accessor per
//! model; the sibling templates add operations to those accessors.

pub(super) mod create;
pub(super) mod find;
pub(super) mod raw;
pub(super) mod transaction;
pub(super) mod upsert;

use crate::naming::model_names;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let models = model_names(&config.datamodel().models)?;
    let actions: Vec<_> = models.iter().map(|m| &m.actions).collect();
    let accessors: Vec<_> = models.iter().map(|m| &m.accessor).collect();
    let docs: Vec<_> = models
        .iter()
        .map(|m| format!("Operations on `{}` records.", m.name))
        .collect();

    Ok(quote! {
        /// A pending query that decodes its response as `T`.
        pub struct Action<'a, T> {
            client: &'a Client,
            query: Query,
            marker: PhantomData<T>,
        }

        impl<'a, T: DeserializeOwned> Action<'a, T> {
            /// Wrap `query` for execution on `client`.
            pub fn new(client: &'a Client, query: Query) -> Self {
                Self { client, query, marker: PhantomData }
            }

            /// The query that will be sent.
            pub fn query(&self) -> &Query {
                &self.query
            }

            /// Send the query and decode the response.
            pub fn exec(self) -> ClientResult<T> {
                self.client.execute(&self.query)
            }
        }

        impl Client {
            /// Send `query` through the executor and decode the response.
            pub fn execute<T: DeserializeOwned>(&self, query: &Query) -> ClientResult<T> {
                let executor = self.executor.as_ref().ok_or(ClientError::NotConnected)?;
                let response = executor(query.to_request()).map_err(ClientError::Engine)?;
                serde_json::from_value(response).map_err(|e| ClientError::Decode(e.to_string()))
            }

            #(
                #[doc = #docs]
                pub fn #accessors(&self) -> #actions<'_> {
                    #actions { client: self }
                }
            )*
        }

        #(
            #[doc = #docs]
            pub struct #actions<'a> {
                client: &'a Client,
            }
        )*
    })
}
