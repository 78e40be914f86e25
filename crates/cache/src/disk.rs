//! Stamp-file cache rooted in a directory.

use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, info, trace, warn};

use precache_core::{
    ArtifactCache, CacheSettings, Error, RequiredArtifactSet, Result, UpdateReport,
};

use crate::download::{ArtifactDownloader, DownloadRequest};

const STAMP_EXTENSION: &str = "stamp";

/// Artifact cache that records completed downloads as stamp files.
///
/// Default location: `~/.cache/precache/artifacts/`
pub struct DiskCache {
    root: PathBuf,
    version: String,
    downloader: Arc<dyn ArtifactDownloader>,
    settings: CacheSettings,
    lock: Option<File>,
}

impl std::fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCache")
            .field("root", &self.root)
            .field("version", &self.version)
            .field("settings", &self.settings)
            .field("locked", &self.lock.is_some())
            .finish_non_exhaustive()
    }
}

impl DiskCache {
    /// Create a cache at `root` tracking artifacts for engine `version`.
    #[must_use]
    pub fn new(
        root: PathBuf,
        version: impl Into<String>,
        downloader: Arc<dyn ArtifactDownloader>,
    ) -> Self {
        Self {
            root,
            version: version.into(),
            downloader,
            settings: CacheSettings::default(),
            lock: None,
        }
    }

    /// Default cache root, `<os cache dir>/precache/artifacts`.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("precache")
            .join("artifacts")
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Settings last passed to [`ArtifactCache::apply`].
    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Path of the lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("lockfile")
    }

    fn stamps_dir(&self) -> PathBuf {
        self.root.join("stamps")
    }

    /// Path of an artifact's stamp file.
    #[must_use]
    pub fn stamp_path(&self, artifact: &str) -> PathBuf {
        self.stamps_dir()
            .join(format!("{artifact}.{STAMP_EXTENSION}"))
    }

    /// Directory an artifact's payload is unpacked into.
    #[must_use]
    pub fn artifact_dir(&self, artifact: &str) -> PathBuf {
        self.root.join("artifacts").join(artifact)
    }

    /// Engine version recorded for an artifact, if it was ever fetched.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the stamp exists but cannot be read.
    pub async fn read_stamp(&self, artifact: &str) -> Result<Option<String>> {
        let path = self.stamp_path(artifact);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, &path, "read")),
        }
    }

    /// Record that an artifact is current for this cache's version.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the stamp cannot be written.
    pub async fn write_stamp(&self, artifact: &str) -> Result<()> {
        let dir = self.stamps_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io(e, &dir, "create"))?;
        let path = self.stamp_path(artifact);
        fs::write(&path, &self.version)
            .await
            .map_err(|e| Error::io(e, &path, "write"))?;
        trace!(artifact, version = %self.version, "Wrote stamp");
        Ok(())
    }

    async fn is_current(&self, artifact: &str) -> Result<bool> {
        Ok(self.read_stamp(artifact).await?.as_deref() == Some(self.version.as_str()))
    }
}

#[async_trait]
impl ArtifactCache for DiskCache {
    async fn acquire_lock(&mut self) -> Result<()> {
        if self.lock.is_some() {
            return Ok(());
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::io(e, &self.root, "create"))?;

        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| Error::io(e, &path, "open"))?;

        debug!(?path, "Waiting for artifact cache lock");
        file.lock_exclusive()
            .map_err(|e| Error::lock(format!("{}: {e}", path.display())))?;
        debug!(?path, "Acquired artifact cache lock");

        self.lock = Some(file);
        Ok(())
    }

    fn release_lock(&mut self) {
        // Closing the handle releases the advisory lock.
        if self.lock.take().is_some() {
            debug!("Released artifact cache lock");
        }
    }

    async fn clear_stamps(&mut self) -> Result<()> {
        let dir = self.stamps_dir();
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(?dir, "Cleared completion stamps");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(e, &dir, "remove")),
        }
    }

    fn apply(&mut self, settings: CacheSettings) {
        debug!(?settings, "Applying cache settings");
        self.settings = settings;
    }

    async fn is_up_to_date(&self, required: &RequiredArtifactSet) -> Result<bool> {
        for artifact in required {
            if !self.is_current(artifact.name).await? {
                debug!(artifact = artifact.name, version = %self.version, "Artifact is stale");
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn update_all(&mut self, required: &RequiredArtifactSet) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();

        for artifact in required {
            if self.is_current(artifact.name).await? {
                trace!(artifact = artifact.name, "Artifact already current");
                report.skipped.push(artifact.name.to_string());
                continue;
            }

            info!(artifact = artifact.name, version = %self.version, "Downloading artifact");
            let dest = self.artifact_dir(artifact.name);
            let request = DownloadRequest {
                artifact,
                version: &self.version,
                dest: &dest,
                unsigned_mac: self.settings.use_unsigned_mac_binaries,
            };
            if let Err(e) = self.downloader.download(&request).await {
                warn!(artifact = artifact.name, error = %e, "Artifact download failed");
                return Err(e);
            }

            self.write_stamp(artifact.name).await?;
            report.updated.push(artifact.name.to_string());
        }

        Ok(report)
    }
}
