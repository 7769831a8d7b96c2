//! Errors returned by the generated client.

use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(_config: &GenerationConfig) -> Result<TokenStream, String> {
    Ok(quote! {
        /// Errors returned by client operations.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ClientError {
            /// No executor is attached to the client
            NotConnected,
            /// A unique lookup matched no record
            NotFound,
            /// The engine rejected the query
            Engine(String),
            /// The engine response did not match the expected shape
            Decode(String),
            /// A mocked call had no matching expectation
            Mock(String),
        }

        impl std::fmt::Display for ClientError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    ClientError::NotConnected => write!(f, "client is not connected to an engine"),
                    ClientError::NotFound => write!(f, "record not found"),
                    ClientError::Engine(message) => write!(f, "engine error: {}", message),
                    ClientError::Decode(message) => write!(f, "could not decode response: {}", message),
                    ClientError::Mock(message) => write!(f, "mock error: {}", message),
                }
            }
        }

        impl std::error::Error for ClientError {}

        /// Result of a client operation.
        pub type ClientResult<T> = Result<T, ClientError>;

        /// Whether `error` means the record did not exist.
        pub fn is_not_found(error: &ClientError) -> bool {
            matches!(error, ClientError::NotFound)
        }
    })
}
