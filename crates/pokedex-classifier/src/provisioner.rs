//! Model artifact provisioning
//!
//! Provisioning runs once, before the service accepts traffic:
//! 1. If the artifact is already on disk (and matches its digest, when one is
//!    configured) nothing is fetched.
//! 2. Otherwise the artifact is streamed once into `<dest>.part`, synced,
//!    verified and renamed onto the destination. A failed or truncated
//!    transfer never leaves a file at the destination.
//! 3. The weights are loaded on a blocking thread.

use crate::model_loader::{ModelConfig, ModelSource};
use crate::resnet::ResnetClassifier;
use futures_util::StreamExt;
use pokedex_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// What `ensure_artifact` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// The artifact was already present
    Cached,
    /// The artifact was fetched
    Downloaded { bytes: u64 },
}

/// Fetches and loads the model artifact
#[derive(Debug, Clone)]
pub struct Provisioner {
    client: reqwest::Client,
}

impl Provisioner {
    /// Create a provisioner with its own HTTP client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("pokedex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::download(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a provisioner around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Make sure the artifact exists locally, then load it
    pub async fn provision(&self, config: &ModelConfig) -> Result<ResnetClassifier> {
        let status = self.ensure_artifact(config).await?;
        debug!("Artifact status: {:?}", status);

        let start = Instant::now();
        let config = config.clone();
        let classifier = tokio::task::spawn_blocking(move || ResnetClassifier::load(&config))
            .await
            .map_err(|e| Error::internal(format!("model loading task failed: {}", e)))??;

        info!("Model ready in {:.2}s", start.elapsed().as_secs_f64());
        Ok(classifier)
    }

    /// Guarantee the artifact exists at `config.weights_path`
    pub async fn ensure_artifact(&self, config: &ModelConfig) -> Result<ArtifactStatus> {
        let dest = &config.weights_path;

        let (url, expected) = match &config.source {
            ModelSource::LocalPath => {
                if tokio::fs::try_exists(dest).await? {
                    return Ok(ArtifactStatus::Cached);
                }
                return Err(Error::config(format!(
                    "Model file not found and no download URL configured: {}",
                    dest.display()
                )));
            }
            ModelSource::Remote { url, sha256 } => (url, sha256.as_deref()),
        };

        if tokio::fs::try_exists(dest).await? {
            match expected {
                None => {
                    info!("Model artifact present at {}, skipping download", dest.display());
                    return Ok(ArtifactStatus::Cached);
                }
                Some(expected) => {
                    let actual = sha256_file(dest).await?;
                    if digest_matches(&actual, expected) {
                        info!("Model artifact present at {} and verified", dest.display());
                        return Ok(ArtifactStatus::Cached);
                    }
                    warn!(
                        "Model artifact at {} has digest {} (expected {}), fetching again",
                        dest.display(),
                        actual,
                        expected
                    );
                    tokio::fs::remove_file(dest).await?;
                }
            }
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = self.download(url, dest, expected).await?;
        Ok(ArtifactStatus::Downloaded { bytes })
    }

    /// Single streaming download into a temporary file, renamed on success
    async fn download(&self, url: &str, dest: &Path, expected: Option<&str>) -> Result<u64> {
        let partial = partial_path(dest);
        info!("Downloading model artifact from {}", url);

        match self.fetch_to(url, &partial, expected).await {
            Ok(bytes) => {
                tokio::fs::rename(&partial, dest).await?;
                info!("Saved {} bytes to {}", bytes, dest.display());
                Ok(bytes)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove {}: {}", partial.display(), cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_to(&self, url: &str, partial: &Path, expected: Option<&str>) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::download(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::download(format!("{} returned {}", url, status)));
        }

        let content_length = response.content_length();
        if let Some(len) = content_length {
            debug!("Artifact size: {} bytes", len);
        }

        let mut file = tokio::fs::File::create(partial).await?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::download(format!("transfer interrupted: {}", e)))?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(len) = content_length {
            if written != len {
                return Err(Error::download(format!(
                    "truncated transfer: received {} of {} bytes",
                    written, len
                )));
            }
        }

        if let Some(expected) = expected {
            let actual = format!("{:x}", hasher.finalize());
            if !digest_matches(&actual, expected) {
                return Err(Error::download(format!(
                    "digest mismatch: expected {}, got {}",
                    expected, actual
                )));
            }
        }

        Ok(written)
    }
}

/// Hex SHA-256 of a file
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn digest_matches(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}

/// `<dest>.part` next to the destination, so the rename stays on one filesystem
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("app/model.pth")),
            PathBuf::from("app/model.pth.part")
        );
    }

    #[test]
    fn test_digest_matching_is_case_insensitive() {
        assert!(digest_matches("abcdef", "ABCDEF"));
        assert!(digest_matches("abcdef", " abcdef\n"));
        assert!(!digest_matches("abcdef", "abcdee"));
    }

    #[tokio::test]
    async fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        tokio::fs::write(&path, b"abc").await.unwrap();

        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_local_source_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig::from_local(dir.path().join("missing.safetensors"));

        let provisioner = Provisioner::new().unwrap();
        let err = provisioner.ensure_artifact(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
