//! Version-keyed cache for engine binaries.
//!
//! Engines are stored by (version, platform, engine name), so a different
//! engine version never reuses a previously cached binary.

use crate::platform::{Os, ResolvedPlatform};
use clientgen_core::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Identity of one cached engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    engine: String,
    platform: String,
    version: String,
    windows: bool,
}

impl CacheKey {
    /// Build the key for an engine on a resolved platform.
    #[must_use]
    pub fn new(engine: &str, platform: &ResolvedPlatform, version: &str) -> Self {
        Self {
            engine: engine.to_string(),
            platform: platform.name().to_string(),
            version: version.to_string(),
            windows: platform.os() == Os::Windows,
        }
    }

    /// Engine name (e.g., "query-engine").
    #[must_use]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Engine platform name.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Engine version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// File name of the unpacked binary.
    #[must_use]
    pub fn file_name(&self) -> String {
        if self.windows {
            format!("{}.exe", self.engine)
        } else {
            self.engine.clone()
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.engine, self.platform, self.version)
    }
}

/// Engine binary cache.
///
/// Default location: `~/.cache/clientgen/engines/`
///
/// Structure:
/// ```text
/// ~/.cache/clientgen/engines/
/// └── <version>/
///     └── <platform>/
///         ├── query-engine          # Unpacked binary
///         └── .query-engine.lock    # Cross-process fetch lock
/// ```
#[derive(Debug, Clone)]
pub struct EngineCache {
    root: PathBuf,
}

impl Default for EngineCache {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("clientgen")
            .join("engines");
        Self::new(cache_dir)
    }
}

impl EngineCache {
    /// Create a cache at the specified root directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one engine entry.
    #[must_use]
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.version()).join(key.platform())
    }

    /// Final path of a cached binary.
    #[must_use]
    pub fn binary_path(&self, key: &CacheKey) -> PathBuf {
        self.entry_dir(key).join(key.file_name())
    }

    /// Staging path a fetch writes to before it is renamed into place.
    ///
    /// Unique per process so concurrent generators never share a staging file.
    #[must_use]
    pub fn staging_path(&self, key: &CacheKey) -> PathBuf {
        self.entry_dir(key)
            .join(format!(".{}.{}.partial", key.file_name(), std::process::id()))
    }

    /// Lock file guarding fetches of one entry across processes.
    #[must_use]
    pub fn lock_path(&self, key: &CacheKey) -> PathBuf {
        self.entry_dir(key).join(format!(".{}.lock", key.file_name()))
    }

    /// Check if a binary is cached.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.binary_path(key).is_file()
    }

    /// Get a cached binary if it exists.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.binary_path(key);
        if path.is_file() {
            trace!(%key, ?path, "Cache hit for engine");
            Some(path)
        } else {
            trace!(%key, "Cache miss for engine");
            None
        }
    }

    /// Create the entry directory for a key.
    pub fn ensure_entry_dir(&self, key: &CacheKey) -> Result<PathBuf> {
        let dir = self.entry_dir(key);
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(e, &dir, "create_dir_all"))?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(platform: &str, version: &str) -> CacheKey {
        CacheKey::new(
            "query-engine",
            &ResolvedPlatform::from_name(platform).unwrap(),
            version,
        )
    }

    #[test]
    fn test_cache_paths() {
        let cache = EngineCache::new(PathBuf::from("/tmp/cache"));
        let key = key("linux-static-x64", "abc");

        assert_eq!(
            cache.binary_path(&key),
            PathBuf::from("/tmp/cache/abc/linux-static-x64/query-engine")
        );
        assert_eq!(
            cache.lock_path(&key),
            PathBuf::from("/tmp/cache/abc/linux-static-x64/.query-engine.lock")
        );
        assert!(cache.staging_path(&key).starts_with("/tmp/cache/abc/linux-static-x64"));
    }

    #[test]
    fn test_windows_binary_has_exe_suffix() {
        assert_eq!(key("windows", "abc").file_name(), "query-engine.exe");
        assert_eq!(key("darwin", "abc").file_name(), "query-engine");
    }

    #[test]
    fn test_version_is_part_of_the_key() {
        let temp = TempDir::new().unwrap();
        let cache = EngineCache::new(temp.path().to_path_buf());
        let old = key("darwin", "v1");
        let new = key("darwin", "v2");

        cache.ensure_entry_dir(&old).unwrap();
        std::fs::write(cache.binary_path(&old), b"engine").unwrap();

        assert_eq!(cache.get(&old), Some(cache.binary_path(&old)));
        assert!(!cache.contains(&new));
        assert_ne!(old, new);
    }

    #[test]
    fn test_directory_is_not_a_cache_hit() {
        let temp = TempDir::new().unwrap();
        let cache = EngineCache::new(temp.path().to_path_buf());
        let key = key("darwin", "v1");
        std::fs::create_dir_all(cache.binary_path(&key)).unwrap();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key("darwin-arm64", "v3").to_string(), "query-engine/darwin-arm64@v3");
    }

    #[test]
    fn test_cache_default() {
        let cache = EngineCache::default();
        assert!(cache.root().ends_with("clientgen/engines"));
    }
}
