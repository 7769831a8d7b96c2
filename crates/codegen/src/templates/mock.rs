//! In-memory executor for tests of code that uses the client.

use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(_config: &GenerationConfig) -> Result<TokenStream, String> {
    Ok(quote! {
        /// A canned response for one model action.
        #[derive(Debug, Clone)]
        pub struct Expectation {
            /// Model the query targets
            pub model: String,
            /// Action name (`findUnique`, `createOne`, ...)
            pub action: String,
            /// Response handed back to the client
            pub result: Result<serde_json::Value, String>,
        }

        /// Replays expectations in the order they were registered.
        #[derive(Debug, Default)]
        pub struct Mock {
            expectations: std::sync::Mutex<Vec<Expectation>>,
        }

        impl Mock {
            /// A mock with no expectations.
            pub fn new() -> Self {
                Self::default()
            }

            /// Answer the next `action` on `model` with `response`.
            pub fn expect(&self, model: &str, action: &str, response: serde_json::Value) {
                self.push(model, action, Ok(response));
            }

            /// Fail the next `action` on `model` with `message`.
            pub fn expect_error(&self, model: &str, action: &str, message: impl Into<String>) {
                self.push(model, action, Err(message.into()));
            }

            fn push(&self, model: &str, action: &str, result: Result<serde_json::Value, String>) {
                if let Ok(mut expectations) = self.expectations.lock() {
                    expectations.push(Expectation {
                        model: model.to_string(),
                        action: action.to_string(),
                        result,
                    });
                }
            }

            /// Consume the first expectation matching `model` and `action`.
            pub fn take(&self, model: &str, action: &str) -> ClientResult<serde_json::Value> {
                let mut expectations = self
                    .expectations
                    .lock()
                    .map_err(|_| ClientError::Mock("mock state poisoned".to_string()))?;
                let index = expectations
                    .iter()
                    .position(|e| e.model == model && e.action == action)
                    .ok_or_else(|| ClientError::Mock(format!("unexpected {} on {}", action, model)))?;
                expectations.remove(index).result.map_err(ClientError::Engine)
            }

            /// Fail if any expectation was never consumed.
            pub fn ensure_exhausted(&self) -> ClientResult<()> {
                let expectations = self
                    .expectations
                    .lock()
                    .map_err(|_| ClientError::Mock("mock state poisoned".to_string()))?;
                match expectations.first() {
                    None => Ok(()),
                    Some(e) => Err(ClientError::Mock(format!(
                        "{} expectation(s) left, first is {} on {}",
                        expectations.len(),
                        e.action,
                        e.model
                    ))),
                }
            }

            /// An executor answering from this mock.
            pub fn executor(self: std::sync::Arc<Self>) -> Executor {
                Box::new(move |request: serde_json::Value| {
                    let model = request["modelName"].as_str().unwrap_or_default();
                    let action = request["action"].as_str().unwrap_or_default();
                    self.take(model, action).map_err(|e| e.to_string())
                })
            }
        }
    })
}
