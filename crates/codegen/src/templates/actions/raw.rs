//! Raw SQL.

use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(in crate::templates) fn render(_config: &GenerationConfig) -> Result<TokenStream, String> {
    Ok(quote! {
        impl Client {
            /// Run a raw query and decode each returned row as `T`.
            pub fn query_raw<T: DeserializeOwned>(
                &self,
                sql: impl Into<String>,
                params: Vec<serde_json::Value>,
            ) -> Action<'_, Vec<T>> {
                let mut query = Query::new("", "queryRaw");
                query.sql = Some(sql.into());
                query.params = params;
                Action::new(self, query)
            }

            /// Run a raw statement and return the number of affected rows.
            pub fn execute_raw(
                &self,
                sql: impl Into<String>,
                params: Vec<serde_json::Value>,
            ) -> Action<'_, BatchResult> {
                let mut query = Query::new("", "executeRaw");
                query.sql = Some(sql.into());
                query.params = params;
                Action::new(self, query)
            }
        }
    })
}
