//! Engine sources: where binaries come from on a cache miss.

use crate::cache::CacheKey;
use async_trait::async_trait;
use clientgen_core::{Error, Result};
use flate2::read::GzDecoder;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default mirror engines are downloaded from.
pub const DEFAULT_ENGINES_MIRROR: &str = "https://binaries.prisma.sh";

/// A distribution source for engine binaries.
///
/// Implementations write the unpacked binary for `key` to `dest`. They never
/// write to the final cache path; the provisioner renames `dest` into place.
#[async_trait]
pub trait EngineSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the binary for `key` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if the binary cannot be downloaded or verified.
    async fn fetch(&self, key: &CacheKey, dest: &Path) -> Result<()>;
}

/// Downloads gzipped engines over HTTPS and verifies their SHA-256.
///
/// Layout on the mirror:
/// ```text
/// <mirror>/all_commits/<version>/<platform>/<engine>[.exe].gz
/// <mirror>/all_commits/<version>/<platform>/<engine>[.exe].sha256
/// ```
#[derive(Debug, Clone)]
pub struct HttpEngineSource {
    client: Client,
    mirror: String,
}

impl HttpEngineSource {
    /// Timeout for establishing a connection.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Timeout for a whole request, body included.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

    /// Create a source for the default mirror.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be initialised.
    pub fn new() -> Result<Self> {
        Self::with_mirror(DEFAULT_ENGINES_MIRROR)
    }

    /// Create a source for a custom mirror.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be initialised.
    pub fn with_mirror(mirror: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("clientgen/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            mirror: mirror.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of the gzipped binary.
    #[must_use]
    pub fn artifact_url(&self, key: &CacheKey) -> String {
        format!("{}.gz", self.base_url(key))
    }

    /// URL of the published checksum of the unpacked binary.
    #[must_use]
    pub fn checksum_url(&self, key: &CacheKey) -> String {
        format!("{}.sha256", self.base_url(key))
    }

    fn base_url(&self, key: &CacheKey) -> String {
        format!(
            "{}/all_commits/{}/{}/{}",
            self.mirror,
            key.version(),
            key.platform(),
            key.file_name()
        )
    }

    async fn download(&self, url: &str, key: &CacheKey) -> Result<Vec<u8>> {
        debug!(%url, "Downloading engine artifact");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(key.platform(), format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::fetch(
                key.platform(),
                format!("{url} returned HTTP {}", response.status()),
            ));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::fetch(key.platform(), format!("failed to read {url}: {e}")))
    }
}

#[async_trait]
impl EngineSource for HttpEngineSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, key: &CacheKey, dest: &Path) -> Result<()> {
        info!(%key, mirror = %self.mirror, "Fetching engine");

        let expected = self.download(&self.checksum_url(key), key).await?;
        let expected = parse_checksum(&expected)
            .ok_or_else(|| Error::fetch(key.platform(), "malformed checksum file"))?;

        let compressed = self.download(&self.artifact_url(key), key).await?;
        let mut binary = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut binary)
            .map_err(|e| Error::fetch(key.platform(), format!("failed to decompress engine: {e}")))?;

        let actual = hex::encode(Sha256::digest(&binary));
        if actual != expected {
            return Err(Error::fetch(
                key.platform(),
                format!("checksum mismatch: expected {expected}, got {actual}"),
            ));
        }

        tokio::fs::write(dest, &binary)
            .await
            .map_err(|e| Error::fetch(key.platform(), format!("failed to stage engine: {e}")))?;

        debug!(%key, bytes = binary.len(), sha256 = %actual, "Engine downloaded and verified");
        Ok(())
    }
}

/// Extract the hex digest from a `sha256sum`-style file.
fn parse_checksum(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let digest = text.split_whitespace().next()?.to_lowercase();
    (digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())).then_some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ResolvedPlatform;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENGINE: &[u8] = b"\x7fELF fake engine";

    fn key(platform: &str) -> CacheKey {
        CacheKey::new(
            "query-engine",
            &ResolvedPlatform::from_name(platform).unwrap(),
            "abc123",
        )
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn mount(server: &MockServer, file: &str, status: u16, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/all_commits/abc123/{file}")))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_urls() {
        let source = HttpEngineSource::with_mirror("https://mirror.example/").unwrap();
        assert_eq!(
            source.artifact_url(&key("windows")),
            "https://mirror.example/all_commits/abc123/windows/query-engine.exe.gz"
        );
        assert_eq!(
            source.checksum_url(&key("darwin")),
            "https://mirror.example/all_commits/abc123/darwin/query-engine.sha256"
        );
    }

    #[test]
    fn test_parse_checksum() {
        let digest = "a".repeat(64);
        assert_eq!(
            parse_checksum(format!("{digest}  query-engine\n").as_bytes()),
            Some(digest.clone())
        );
        assert_eq!(parse_checksum(digest.to_uppercase().as_bytes()), Some(digest));
        assert_eq!(parse_checksum(b"not-a-digest"), None);
        assert_eq!(parse_checksum(b""), None);
    }

    #[tokio::test]
    async fn test_fetch_downloads_and_verifies() {
        let server = MockServer::start().await;
        let digest = hex::encode(Sha256::digest(ENGINE));
        mount(&server, "darwin/query-engine.sha256", 200, digest.into_bytes()).await;
        mount(&server, "darwin/query-engine.gz", 200, gzip(ENGINE)).await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("staged");
        let source = HttpEngineSource::with_mirror(server.uri()).unwrap();
        source.fetch(&key("darwin"), &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), ENGINE);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_writes_nothing() {
        let server = MockServer::start().await;
        mount(&server, "darwin/query-engine.sha256", 200, "0".repeat(64).into_bytes()).await;
        mount(&server, "darwin/query-engine.gz", 200, gzip(ENGINE)).await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("staged");
        let source = HttpEngineSource::with_mirror(server.uri()).unwrap();
        let err = source.fetch(&key("darwin"), &dest).await.unwrap_err();

        assert!(err.to_string().contains("darwin"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_missing_artifact_is_a_fetch_error() {
        let server = MockServer::start().await;
        mount(&server, "darwin/query-engine.sha256", 404, Vec::new()).await;

        let temp = TempDir::new().unwrap();
        let source = HttpEngineSource::with_mirror(server.uri()).unwrap();
        let err = source
            .fetch(&key("darwin"), &temp.path().join("staged"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fetch { .. }));
        assert!(err.to_string().contains("404"));
    }
}
