//! File header: shared imports and generation metadata.

use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let package = config.package();
    let version = config.engine_version();
    let engine_type = config.engine_type().to_string();

    Ok(quote! {
        #[allow(unused_imports)]
        use serde::de::DeserializeOwned;
        #[allow(unused_imports)]
        use serde::{Deserialize, Serialize};
        #[allow(unused_imports)]
        use std::marker::PhantomData;

        /// Package the client was generated into.
        pub const PACKAGE_NAME: &str = #package;

        /// Engine version the client was generated against.
        pub const ENGINE_VERSION: &str = #version;

        /// How the client reaches its engine.
        pub const ENGINE_TYPE: &str = #engine_type;
    })
}
