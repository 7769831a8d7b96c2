//! The client handle and engine selection.

use crate::embed::ENGINE_INDEX_FILE_NAME;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let engines = if config.disable_binaries() || !config.engine_type().requires_local_engine() {
        quote! {
            /// Engines compiled into the client. None are embedded.
            pub mod engines {
                /// Engines usable on this compilation target
                pub const ENGINES: &[super::EngineCandidate] = &[];
            }
        }
    } else {
        quote! {
            /// Engines compiled into the client.
            #[path = #ENGINE_INDEX_FILE_NAME]
            pub mod engines;
        }
    };

    Ok(quote! {
        #engines

        /// An engine binary compiled into the client.
        ///
        /// Each embedded engine module exposes the constants this is built from.
        #[derive(Debug, Clone, Copy)]
        pub struct EngineCandidate {
            /// Engine platform name
            pub platform: &'static str,
            /// `target_os` the engine runs on
            pub os: &'static str,
            /// `target_arch` the engine runs on
            pub arch: &'static str,
            /// C library the engine links against
            pub libc: &'static str,
            /// The engine binary
            pub bytes: &'static [u8],
        }

        impl EngineCandidate {
            /// Describe an embedded engine.
            pub const fn new(
                platform: &'static str,
                os: &'static str,
                arch: &'static str,
                libc: &'static str,
                bytes: &'static [u8],
            ) -> Self {
                Self { platform, os, arch, libc, bytes }
            }

            /// Whether the engine was built for the running host.
            pub fn matches_host(&self) -> bool {
                self.os == std::env::consts::OS && self.arch == std::env::consts::ARCH
            }

            /// Rank among engines matching the same host, lowest first.
            ///
            /// Statically linked engines run on any libc and win over
            /// glibc builds.
            pub fn precedence(&self) -> u8 {
                match self.libc {
                    "static" => 0,
                    "none" => 1,
                    _ => 2,
                }
            }
        }

        /// Sends a serialized query to the engine and returns its response.
        pub type Executor =
            Box<dyn Fn(serde_json::Value) -> Result<serde_json::Value, String> + Send + Sync>;

        /// Entry point of the generated client.
        pub struct Client {
            datasource_url: Option<String>,
            engine: Option<EngineCandidate>,
            executor: Option<Executor>,
        }

        impl Client {
            /// A client using the embedded engine built for the running host.
            pub fn new() -> Self {
                Self {
                    datasource_url: None,
                    engine: None,
                    executor: None,
                }
                .select_engine(engines::ENGINES)
            }

            /// Override the datasource URL from the schema.
            pub fn with_datasource_url(mut self, url: impl Into<String>) -> Self {
                self.datasource_url = Some(url.into());
                self
            }

            /// Route queries through `executor`.
            pub fn with_executor(mut self, executor: Executor) -> Self {
                self.executor = Some(executor);
                self
            }

            /// Pick the engine built for the running host out of `candidates`,
            /// preferring the lowest [`EngineCandidate::precedence`].
            pub fn select_engine(mut self, candidates: &[EngineCandidate]) -> Self {
                self.engine = candidates
                    .iter()
                    .copied()
                    .filter(EngineCandidate::matches_host)
                    .min_by_key(EngineCandidate::precedence);
                self
            }

            /// The engine selected for this host, if any.
            pub fn engine(&self) -> Option<&EngineCandidate> {
                self.engine.as_ref()
            }

            /// The datasource URL override, if any.
            pub fn datasource_url(&self) -> Option<&str> {
                self.datasource_url.as_deref()
            }

            /// Whether queries can be executed.
            pub fn is_connected(&self) -> bool {
                self.executor.is_some()
            }
        }

        impl Default for Client {
            fn default() -> Self {
                Self::new()
            }
        }
    })
}
