//! Fetching artifact archives.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::debug;

use precache_core::{Artifact, Error, Result};

use crate::extract::unpack_tar_gz;

/// Default location of published engine artifacts.
pub const DEFAULT_STORAGE_BASE_URL: &str =
    "https://storage.googleapis.com/flutter_infra_release/flutter";

/// One artifact to place on disk.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Artifact to fetch.
    pub artifact: &'a Artifact,
    /// Engine version to fetch it for.
    pub version: &'a str,
    /// Directory the payload is unpacked into.
    pub dest: &'a Path,
    /// Prefer unsigned macOS binaries.
    pub unsigned_mac: bool,
}

/// Places an artifact's payload on disk.
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    /// Download and unpack one artifact into `request.dest`.
    async fn download(&self, request: &DownloadRequest<'_>) -> Result<()>;
}

/// Downloads `<base_url>/<version>/<artifact>.tar.gz` archives over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    base_url: String,
}

impl HttpDownloader {
    /// Create a downloader for the given storage base URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("precache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of the archive for a request.
    #[must_use]
    pub fn archive_url(&self, request: &DownloadRequest<'_>) -> String {
        archive_url(&self.base_url, request)
    }
}

/// URL of the archive for `request` under `base_url`.
///
/// macOS artifacts come from the `unsigned/` subtree when unsigned binaries
/// are accepted.
#[must_use]
pub fn archive_url(base_url: &str, request: &DownloadRequest<'_>) -> String {
    let base_url = base_url.trim_end_matches('/');
    if request.unsigned_mac && request.artifact.is_macos() {
        format!(
            "{}/{}/unsigned/{}.tar.gz",
            base_url, request.version, request.artifact.name
        )
    } else {
        format!(
            "{}/{}/{}.tar.gz",
            base_url, request.version, request.artifact.name
        )
    }
}

#[async_trait]
impl ArtifactDownloader for HttpDownloader {
    async fn download(&self, request: &DownloadRequest<'_>) -> Result<()> {
        let url = self.archive_url(request);
        debug!(%url, "Downloading artifact archive");

        let response = self.client.get(&url).send().await.map_err(|e| {
            Error::update_with_help(
                format!("Failed to download {url}: {e}"),
                "Check your network connection or set PRECACHE_STORAGE_BASE_URL",
            )
        })?;

        if !response.status().is_success() {
            return Err(Error::update_with_help(
                format!(
                    "Failed to download {} (HTTP {})",
                    request.artifact.name,
                    response.status()
                ),
                format!("Check that engine version {} is published", request.version),
            ));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::update(format!("Failed to read {url}: {e}")))?;

        let dest = request.dest.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_tar_gz(&data, &dest))
            .await
            .map_err(|e| Error::update(format!("Unpack task failed: {e}")))?
    }
}
