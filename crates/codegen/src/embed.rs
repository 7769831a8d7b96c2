//! Engine embedding
//!
//! For every provisioned platform a source file is written next to the client
//! that compiles the cached engine into the program with `include_bytes!`. The
//! file is gated on the platform's `target_os`/`target_arch` so only the
//! engine matching the compilation target is linked in.
//!
//! Once every platform is embedded, [`write_engine_index`] writes the module
//! the client declares as `engines`: one `#[path]` module per embedding and an
//! `ENGINES` list the client picks its engine from.

use crate::formatter;
use crate::generator::{ArtifactKind, GeneratedArtifact, write_file};
use clientgen_core::{Error, Result};
use clientgen_engines::{Libc, ResolvedPlatform};
use proc_macro2::TokenStream;
use quote::quote;
use sha2::{Digest, Sha256};
use std::path::Path;

/// File name of the engine index inside the output directory.
pub const ENGINE_INDEX_FILE_NAME: &str = "engines_gen.rs";

/// An engine binary ready to embed
#[derive(Debug, Clone, Copy)]
pub struct EngineBinary<'a> {
    /// Engine name
    pub engine: &'a str,
    /// Engine version (commit hash)
    pub version: &'a str,
    /// Platform it was built for
    pub platform: &'a ResolvedPlatform,
    /// Location in the engine cache
    pub path: &'a Path,
}

/// File name of the embedding for `engine` on `platform`.
#[must_use]
pub fn engine_file_name(engine: &str, platform: &str) -> String {
    format!("{engine}-{platform}_gen.rs")
}

/// Write the embedding source for `binary` into `output`.
///
/// # Errors
///
/// Returns an I/O error if the cached binary cannot be read and a write error
/// if the embedding cannot be written.
#[tracing::instrument(skip_all, fields(platform = binary.platform.name()))]
pub fn embed(binary: &EngineBinary<'_>, package: &str, output: &Path) -> Result<GeneratedArtifact> {
    let bytes = std::fs::read(binary.path).map_err(|e| Error::io(e, binary.path, "read"))?;
    let sha256 = hex::encode(Sha256::digest(&bytes));

    let source = formatter::format(&render(binary, package, &sha256).to_string())
        .map_err(|e| Error::template("engine embedding", e))?;

    let path = output.join(engine_file_name(binary.engine, binary.platform.name()));
    write_file(&path, &source)?;

    tracing::debug!(bytes = bytes.len(), %sha256, "Engine embedded");
    Ok(GeneratedArtifact {
        path,
        kind: ArtifactKind::Engine {
            platform: binary.platform.name().to_string(),
        },
    })
}

/// Write the engine index for `platforms`, embedded as `engine` files.
///
/// # Errors
///
/// Returns a template error if a platform name cannot become a module name
/// and a write error if the index cannot be written.
pub fn write_engine_index(
    engine: &str,
    platforms: &[ResolvedPlatform],
    output: &Path,
) -> Result<GeneratedArtifact> {
    let modules: Vec<(TokenStream, TokenStream)> = platforms
        .iter()
        .map(|platform| -> std::result::Result<(TokenStream, TokenStream), String> {
            let file = engine_file_name(engine, platform.name());
            let module = engine_module(platform.name())?;
            let predicates = cfg_predicates(platform);
            Ok((
                quote! {
                    #[path = #file]
                    mod #module;
                },
                quote! {
                    #[cfg(all(#(#predicates),*))]
                    EngineCandidate::new(
                        #module::PLATFORM,
                        #module::OS,
                        #module::ARCH,
                        #module::LIBC,
                        #module::BYTES,
                    ),
                },
            ))
        })
        .collect::<std::result::Result<_, String>>()
        .map_err(|e| Error::template("engine index", e))?;
    let (declarations, candidates): (Vec<_>, Vec<_>) = modules.into_iter().unzip();

    let tokens = quote! {
        use super::EngineCandidate;

        #(#declarations)*

        /// Embedded engines usable on this compilation target, in target order.
        pub const ENGINES: &[EngineCandidate] = &[#(#candidates)*];
    };
    let source = formatter::format(&tokens.to_string())
        .map_err(|e| Error::template("engine index", e))?;

    let path = output.join(ENGINE_INDEX_FILE_NAME);
    write_file(&path, &source)?;

    Ok(GeneratedArtifact {
        path,
        kind: ArtifactKind::EngineIndex,
    })
}

/// Module name for the embedding of `platform` (`debian-openssl-3.0.x` becomes
/// `engine_debian_openssl_3_0_x`).
fn engine_module(platform: &str) -> std::result::Result<proc_macro2::Ident, String> {
    let name: String = platform
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    syn::parse_str(&format!("engine_{name}"))
        .map_err(|e| format!("platform '{platform}' is not a valid module name: {e}"))
}

fn cfg_predicates(platform: &ResolvedPlatform) -> Vec<TokenStream> {
    let os = platform.os().rust_target_os();
    let arch = platform.arch().rust_target_arch();

    let mut predicates = vec![quote!(target_os = #os), quote!(target_arch = #arch)];
    if platform.libc() == Libc::Glibc {
        predicates.push(quote!(target_env = "gnu"));
    }
    predicates
}

fn render(binary: &EngineBinary<'_>, package: &str, sha256: &str) -> TokenStream {
    let platform = binary.platform;
    let os = platform.os().rust_target_os();
    let arch = platform.arch().rust_target_arch();
    let libc = platform.libc().to_string();
    let predicates = cfg_predicates(platform);

    let openssl = match platform.openssl() {
        Some(version) => quote!(Some(#version)),
        None => quote!(None),
    };

    let (engine, version, name) = (binary.engine, binary.version, platform.name());
    let include = binary.path.display().to_string();

    quote! {
        #![cfg(all(#(#predicates),*))]

        /// Package the engine was generated for.
        pub const PACKAGE_NAME: &str = #package;
        /// Engine name.
        pub const ENGINE_NAME: &str = #engine;
        /// Engine version (commit hash).
        pub const ENGINE_VERSION: &str = #version;
        /// Engine platform name.
        pub const PLATFORM: &str = #name;
        /// `target_os` the engine runs on.
        pub const OS: &str = #os;
        /// `target_arch` the engine runs on.
        pub const ARCH: &str = #arch;
        /// C library the engine links against.
        pub const LIBC: &str = #libc;
        /// OpenSSL line the engine links against, if any.
        pub const OPENSSL: Option<&str> = #openssl;
        /// SHA-256 of the embedded binary.
        pub const SHA256: &str = #sha256;
        /// The engine binary.
        pub const BYTES: &[u8] = include_bytes!(#include);
    }
}
