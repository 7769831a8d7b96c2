//! Platform detection and binary target resolution.
//!
//! Handles mapping between:
//! - logical binary targets (e.g., "native", "linux-musl", "darwin-arm64")
//! - concrete engine platforms (e.g., "linux-static-x64", "debian-openssl-3.0.x")
//!
//! Generic Linux and musl engines are unreliable on several distributions, so
//! both are rewritten to the statically linked engine for the host architecture.

use clientgen_core::{BinaryTarget, Error, Result};
use std::fmt;
use tracing::debug;

/// Operating system family of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux (any libc)
    Linux,
    /// Windows
    Windows,
}

impl Os {
    /// Value of `target_os` for this OS.
    #[must_use]
    pub fn rust_target_os(self) -> &'static str {
        match self {
            Self::Darwin => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Parse from a `std::env::consts::OS` style string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" => Some(Self::Darwin),
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// CPU architecture of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x86_64
    X64,
    /// aarch64
    Arm64,
}

impl Arch {
    /// Value of `target_arch` for this architecture.
    #[must_use]
    pub fn rust_target_arch(self) -> &'static str {
        match self {
            Self::X64 => "x86_64",
            Self::Arm64 => "aarch64",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Some(Self::X64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X64 => write!(f, "x64"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}

/// C library an engine is linked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Libc {
    /// Not applicable (darwin, windows)
    None,
    /// Dynamically linked against glibc
    Glibc,
    /// Statically linked, runs on any Linux libc
    Static,
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Glibc => write!(f, "glibc"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// The platform the generator itself runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPlatform {
    /// Operating system
    pub os: Os,
    /// Architecture
    pub arch: Arch,
}

impl HostPlatform {
    /// Create a host platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the platform of the running process.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on platforms no engine is published for.
    pub fn detect() -> Result<Self> {
        let os = Os::parse(std::env::consts::OS).ok_or_else(|| {
            Error::configuration(format!(
                "no engine is available for operating system '{}'",
                std::env::consts::OS
            ))
        })?;
        let arch = Arch::parse(std::env::consts::ARCH).ok_or_else(|| {
            Error::configuration(format!(
                "no engine is available for architecture '{}'",
                std::env::consts::ARCH
            ))
        })?;
        Ok(Self { os, arch })
    }

    /// Engine platform name that `native` stands for on this host.
    #[must_use]
    pub fn static_binary_name(&self) -> String {
        match (self.os, self.arch) {
            (Os::Windows, _) => "windows".to_string(),
            (Os::Darwin, Arch::X64) => "darwin".to_string(),
            (Os::Darwin, Arch::Arm64) => "darwin-arm64".to_string(),
            (Os::Linux, arch) => format!("linux-static-{arch}"),
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// A concrete engine platform after rewrite policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPlatform {
    name: String,
    os: Os,
    arch: Arch,
    libc: Libc,
    openssl: Option<String>,
}

impl ResolvedPlatform {
    /// Engine platform name, used for cache lookups and file names.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operating system family.
    #[must_use]
    pub fn os(&self) -> Os {
        self.os
    }

    /// Architecture.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Libc variant.
    #[must_use]
    pub fn libc(&self) -> Libc {
        self.libc
    }

    /// OpenSSL series the engine links against (glibc engines only).
    #[must_use]
    pub fn openssl(&self) -> Option<&str> {
        self.openssl.as_deref()
    }

    /// Map an engine platform name to its metadata.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for names no engine is published under.
    pub fn from_name(name: &str) -> Result<Self> {
        let (os, arch, libc, openssl) = match name {
            "darwin" => (Os::Darwin, Arch::X64, Libc::None, None),
            "darwin-arm64" => (Os::Darwin, Arch::Arm64, Libc::None, None),
            "windows" => (Os::Windows, Arch::X64, Libc::None, None),
            _ => {
                if let Some(arch) = name.strip_prefix("linux-static-") {
                    let arch = Arch::parse(arch).ok_or_else(|| unknown_target(name))?;
                    (Os::Linux, arch, Libc::Static, None)
                } else if let Some(series) = name.strip_prefix("linux-arm64-openssl-") {
                    (Os::Linux, Arch::Arm64, Libc::Glibc, Some(openssl_series(name, series)?))
                } else if let Some(series) = name
                    .strip_prefix("debian-openssl-")
                    .or_else(|| name.strip_prefix("rhel-openssl-"))
                {
                    (Os::Linux, Arch::X64, Libc::Glibc, Some(openssl_series(name, series)?))
                } else {
                    return Err(unknown_target(name));
                }
            }
        };

        Ok(Self {
            name: name.to_string(),
            os,
            arch,
            libc,
            openssl,
        })
    }
}

impl fmt::Display for ResolvedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

const OPENSSL_SERIES: &[&str] = &["1.0.x", "1.1.x", "3.0.x"];

fn openssl_series(name: &str, series: &str) -> Result<String> {
    if OPENSSL_SERIES.contains(&series) {
        Ok(series.to_string())
    } else {
        Err(unknown_target(name))
    }
}

fn unknown_target(name: &str) -> Error {
    Error::configuration(format!("unknown binary target '{name}'"))
}

/// Apply the Linux rewrite policy to an engine platform name.
///
/// `linux` and any musl variant become `linux-static-<host arch>`.
#[must_use]
pub fn transform_binary_target(name: &str, host: &HostPlatform) -> String {
    if name == "linux" || name.contains("musl") {
        let rewritten = format!("linux-static-{}", host.arch);
        debug!(from = %name, to = %rewritten, "overriding binary target due to linux or musl");
        rewritten
    } else {
        name.to_string()
    }
}

/// Resolve a logical binary target to a concrete engine platform.
///
/// Pure: depends only on the target name and the host platform.
///
/// # Errors
///
/// Returns a configuration error for unknown target names.
pub fn resolve(target: &BinaryTarget, host: &HostPlatform) -> Result<ResolvedPlatform> {
    let name = if target.is_native() {
        let name = host.static_binary_name();
        debug!(%name, "swapping 'native' binary target");
        name
    } else {
        target.as_str().to_string()
    };

    ResolvedPlatform::from_name(&transform_binary_target(&name, host))
}
