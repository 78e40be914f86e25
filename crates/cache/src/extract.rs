//! Unpacking of downloaded artifact archives (gzip-compressed tarballs).

use flate2::read::GzDecoder;
use std::path::Path;
use tar::Archive;
use tracing::debug;

use precache_core::{Error, Result};

/// Unpack a `.tar.gz` payload into `dest`, replacing whatever was there.
///
/// # Errors
///
/// Returns an I/O error if `dest` cannot be recreated or the archive is
/// malformed.
pub fn unpack_tar_gz(data: &[u8], dest: &Path) -> Result<()> {
    if dest.exists() {
        std::fs::remove_dir_all(dest).map_err(|e| Error::io(e, dest, "remove"))?;
    }
    std::fs::create_dir_all(dest).map_err(|e| Error::io(e, dest, "create"))?;

    let mut archive = Archive::new(GzDecoder::new(data));
    archive.set_preserve_permissions(true);
    archive
        .unpack(dest)
        .map_err(|e| Error::io(e, dest, "unpack"))?;

    debug!(?dest, bytes = data.len(), "Unpacked artifact archive");
    Ok(())
}
