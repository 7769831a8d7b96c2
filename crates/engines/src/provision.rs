//! Engine provisioning: make sure a cached engine exists, fetching it if not.
//!
//! Fetches are serialised per cache key twice over:
//! - within a process by an async mutex per key
//! - across processes by an exclusive lock file next to the entry
//!
//! Both are taken before the cache is re-checked, so a second requester
//! reuses the first requester's download. Waiting on the lock file happens on
//! the blocking pool, so a run waiting on another process never stalls its own
//! in-flight fetches. A fetch writes to a staging file and renames it into
//! place; the final path only ever holds a complete binary. The staging file
//! is removed on failure and when the fetch is cancelled.

use crate::cache::{CacheKey, EngineCache};
use crate::platform::ResolvedPlatform;
use crate::source::EngineSource;
use clientgen_core::{Error, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Ensures engine binaries are present in the cache.
pub struct Provisioner {
    cache: EngineCache,
    source: Arc<dyn EngineSource>,
    locks: Mutex<HashMap<CacheKey, KeyLock>>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("cache", &self.cache)
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Create a provisioner over an explicit cache and source.
    #[must_use]
    pub fn new(cache: EngineCache, source: Arc<dyn EngineSource>) -> Self {
        Self {
            cache,
            source,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The cache this provisioner fills.
    #[must_use]
    pub fn cache(&self) -> &EngineCache {
        &self.cache
    }

    /// Return the cached binary for `engine` on `platform` at `version`,
    /// fetching it first if it is not cached.
    ///
    /// # Errors
    ///
    /// Returns a fetch error naming the platform if the cache directory cannot
    /// be prepared or the source fails. No file is left at the final path.
    pub async fn ensure(
        &self,
        engine: &str,
        platform: &ResolvedPlatform,
        version: &str,
    ) -> Result<PathBuf> {
        let key = CacheKey::new(engine, platform, version);

        if let Some(path) = self.cache.get(&key) {
            debug!(%key, ?path, "Engine already cached");
            return Ok(path);
        }

        let key_lock = self.key_lock(&key)?;
        let _guard = key_lock.lock().await;

        if let Some(path) = self.cache.get(&key) {
            debug!(%key, "Engine fetched by a concurrent request");
            return Ok(path);
        }

        self.fetch_locked(&key).await.map_err(|e| into_fetch_error(e, &key))
    }

    /// Ensure every platform concurrently, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error encountered.
    pub async fn ensure_all(
        &self,
        engine: &str,
        platforms: &[ResolvedPlatform],
        version: &str,
    ) -> Result<Vec<PathBuf>> {
        futures::future::try_join_all(
            platforms
                .iter()
                .map(|platform| self.ensure(engine, platform, version)),
        )
        .await
    }

    fn key_lock(&self, key: &CacheKey) -> Result<KeyLock> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| Error::fetch(key.platform(), "engine lock table poisoned"))?;
        Ok(Arc::clone(locks.entry(key.clone()).or_default()))
    }

    async fn fetch_locked(&self, key: &CacheKey) -> Result<PathBuf> {
        self.cache.ensure_entry_dir(key)?;

        // Held until the end of the fetch; unlocks when dropped
        let _lock_file = lock_entry(self.cache.lock_path(key)).await?;

        if let Some(path) = self.cache.get(key) {
            debug!(%key, "Engine fetched by another process");
            return Ok(path);
        }

        let staging = StagingFile::new(self.cache.staging_path(key));
        let final_path = self.cache.binary_path(key);

        info!(%key, source = self.source.name(), "Engine not cached, fetching");
        self.source.fetch(key, staging.path()).await?;
        promote(staging.path(), &final_path).await?;
        staging.persisted();

        info!(%key, path = ?final_path, "Engine cached");
        Ok(final_path)
    }
}

/// Open the entry's lock file and wait for exclusive access to it.
async fn lock_entry(lock_path: PathBuf) -> Result<File> {
    tokio::task::spawn_blocking(move || -> Result<File> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(e, &lock_path, "open"))?;

        // Blocks until no other generator process holds the entry
        fs4::fs_std::FileExt::lock_exclusive(&file)
            .map_err(|e| Error::io(e, &lock_path, "lock"))?;
        Ok(file)
    })
    .await
    .map_err(|e| Error::io_no_path(std::io::Error::other(e.to_string()), "lock"))?
}

/// Staging file that is deleted unless it was promoted into the cache.
struct StagingFile {
    path: PathBuf,
    persisted: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persisted(mut self) {
        self.persisted = true;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Mark the staged binary executable and move it to its final path.
async fn promote(staging: &Path, final_path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(staging, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| Error::io(e, staging, "set_permissions"))?;
    }

    tokio::fs::rename(staging, final_path)
        .await
        .map_err(|e| Error::io(e, final_path, "rename"))
}

fn into_fetch_error(error: Error, key: &CacheKey) -> Error {
    match error {
        Error::Fetch { .. } => error,
        other => Error::fetch(key.platform(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EngineSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch(&self, key: &CacheKey, dest: &Path) -> Result<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                tokio::fs::write(dest, b"partial").await.unwrap();
                return Err(Error::fetch(key.platform(), "mirror unavailable"));
            }
            tokio::fs::write(dest, format!("engine for {key}")).await.unwrap();
            Ok(())
        }
    }

    /// Writes the staging file, then takes `delay` to finish; fails for one platform.
    struct SlowSource {
        delay: Duration,
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl EngineSource for SlowSource {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch(&self, key: &CacheKey, dest: &Path) -> Result<()> {
            if self.fail_for == Some(key.platform()) {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Err(Error::fetch(key.platform(), "mirror unavailable"));
            }
            tokio::fs::write(dest, b"partial").await.unwrap();
            tokio::time::sleep(self.delay).await;
            tokio::fs::write(dest, format!("engine for {key}")).await.unwrap();
            Ok(())
        }
    }

    fn partial_files(root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut dirs = vec![root.to_path_buf()];
        while let Some(dir) = dirs.pop() {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    dirs.push(path);
                } else if path.extension().is_some_and(|ext| ext == "partial") {
                    found.push(path);
                }
            }
        }
        found
    }

    fn provisioner(temp: &TempDir, source: &Arc<CountingSource>) -> Provisioner {
        let source: Arc<dyn EngineSource> = source.clone();
        Provisioner::new(EngineCache::new(temp.path().to_path_buf()), source)
    }

    fn platform(name: &str) -> ResolvedPlatform {
        ResolvedPlatform::from_name(name).unwrap()
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_does_not() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = provisioner(&temp, &source);

        let first = provisioner
            .ensure("query-engine", &platform("darwin"), "v1")
            .await
            .unwrap();
        let second = provisioner
            .ensure("query-engine", &platform("darwin"), "v1")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            std::fs::read_to_string(&first).unwrap(),
            "engine for query-engine/darwin@v1"
        );
    }

    #[tokio::test]
    async fn test_version_change_refetches() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = provisioner(&temp, &source);

        provisioner
            .ensure("query-engine", &platform("darwin"), "v1")
            .await
            .unwrap();
        provisioner
            .ensure("query-engine", &platform("darwin"), "v2")
            .await
            .unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_for_one_key_fetch_once() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = Arc::new(provisioner(&temp, &source));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provisioner = Arc::clone(&provisioner);
                tokio::spawn(async move {
                    provisioner
                        .ensure("query-engine", &platform("linux-static-x64"), "v1")
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_all_fetches_each_platform() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = provisioner(&temp, &source);

        let platforms = [platform("darwin"), platform("windows"), platform("linux-static-arm64")];
        let paths = provisioner
            .ensure_all("query-engine", &platforms, "v1")
            .await
            .unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths[1].ends_with("windows/query-engine.exe"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_file_behind() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::default()
        });
        let provisioner = provisioner(&temp, &source);
        let darwin = platform("darwin");

        let err = provisioner
            .ensure("query-engine", &darwin, "v1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { ref target, .. } if target == "darwin"));

        let key = CacheKey::new("query-engine", &darwin, "v1");
        let cache = provisioner.cache();
        assert!(!cache.binary_path(&key).exists());
        assert!(!cache.staging_path(&key).exists());
    }

    #[tokio::test]
    async fn test_cache_dir_failure_is_a_fetch_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let source: Arc<dyn EngineSource> = Arc::new(CountingSource::default());
        let provisioner = Provisioner::new(EngineCache::new(blocker), source);

        let err = provisioner
            .ensure("query-engine", &platform("darwin"), "v1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_runs_sharing_a_cache_in_opposite_order_complete() {
        let temp = TempDir::new().unwrap();
        let darwin_first = [platform("darwin"), platform("windows")];
        let windows_first = [platform("windows"), platform("darwin")];

        for version in ["v1", "v2", "v3", "v4", "v5"] {
            // Separate provisioners share only the lock files, like two processes
            let runs: Vec<_> = [darwin_first.clone(), windows_first.clone()]
                .into_iter()
                .map(|platforms| {
                    let source: Arc<dyn EngineSource> = Arc::new(SlowSource {
                        delay: Duration::from_millis(200),
                        fail_for: None,
                    });
                    let provisioner = Provisioner::new(EngineCache::new(temp.path().to_path_buf()), source);
                    tokio::spawn(async move {
                        provisioner.ensure_all("query-engine", &platforms, version).await
                    })
                })
                .collect();

            let finished = tokio::time::timeout(
                Duration::from_secs(5),
                futures::future::join_all(runs),
            )
            .await
            .expect("runs sharing a cache must not wait on each other forever");

            for run in finished {
                assert_eq!(run.unwrap().unwrap().len(), 2);
            }
        }
    }

    #[tokio::test]
    async fn test_cancelled_fetch_removes_its_staging_file() {
        let temp = TempDir::new().unwrap();
        let source: Arc<dyn EngineSource> = Arc::new(SlowSource {
            delay: Duration::from_secs(5),
            fail_for: Some("windows"),
        });
        let provisioner = Provisioner::new(EngineCache::new(temp.path().to_path_buf()), source);

        let err = provisioner
            .ensure_all("query-engine", &[platform("darwin"), platform("windows")], "v1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fetch { ref target, .. } if target == "windows"));
        assert!(partial_files(temp.path()).is_empty());
        let darwin = CacheKey::new("query-engine", &platform("darwin"), "v1");
        assert!(!provisioner.cache().binary_path(&darwin).exists());
    }
}
