//! Disk-backed artifact cache for precache.
//!
//! This crate implements [`precache_core::ArtifactCache`]:
//! - Completion stamps recording which engine version each artifact has
//! - A cross-process lock file so concurrent invocations don't interleave
//! - An [`ArtifactDownloader`] seam with an HTTP implementation
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── lockfile
//! ├── stamps/
//! │   └── <artifact>.stamp      # engine version the artifact was fetched for
//! └── artifacts/
//!     └── <artifact>/...        # unpacked payload
//! ```

mod disk;
mod download;
mod extract;

pub use disk::DiskCache;
pub use download::{
    ArtifactDownloader, DEFAULT_STORAGE_BASE_URL, DownloadRequest, HttpDownloader, archive_url,
};
pub use extract::unpack_tar_gz;
