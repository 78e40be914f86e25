//! Boundary between artifact selection and the component that stores them.
//!
//! The core never downloads anything. It tells an [`ArtifactCache`] what the
//! user asked for through a single [`CacheSettings`] value and hands it the
//! resolved [`RequiredArtifactSet`].

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::Result;
use crate::resolver::RequiredArtifactSet;

/// Settings the cache needs to decide staleness and which binaries to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheSettings {
    /// Artifacts the user explicitly selected, fetched even when the cache
    /// would not consider them relevant for the host.
    pub platform_overrides: BTreeSet<String>,
    /// Treat every artifact as relevant.
    pub include_all_platforms: bool,
    /// Accept unsigned macOS binaries.
    pub use_unsigned_mac_binaries: bool,
}

impl CacheSettings {
    /// Build settings from an explicit selection and the two toggles.
    #[must_use]
    pub fn new(
        platform_overrides: BTreeSet<String>,
        include_all_platforms: bool,
        use_unsigned_mac_binaries: bool,
    ) -> Self {
        Self {
            platform_overrides,
            include_all_platforms,
            use_unsigned_mac_binaries,
        }
    }
}

/// What an update actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Artifacts that were downloaded.
    pub updated: Vec<String>,
    /// Required artifacts that were already current.
    pub skipped: Vec<String>,
}

/// Storage for fetched artifacts.
///
/// Implementations own locking, completion markers and the download itself.
/// Every method is called at most once per invocation, in the order
/// `acquire_lock`, `clear_stamps`, `apply`, `is_up_to_date`, `update_all`,
/// `release_lock`.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Take the cross-process cache lock, waiting for other holders.
    async fn acquire_lock(&mut self) -> Result<()>;

    /// Release the lock taken by [`ArtifactCache::acquire_lock`].
    ///
    /// Releasing a lock that is not held is a no-op.
    fn release_lock(&mut self);

    /// Forget which artifacts were fetched, forcing a fresh download.
    async fn clear_stamps(&mut self) -> Result<()>;

    /// Replace the cache configuration.
    fn apply(&mut self, settings: CacheSettings);

    /// Whether every artifact in `required` is present and current.
    ///
    /// Only artifacts this invocation can fetch are considered, so a
    /// successful [`ArtifactCache::update_all`] always leaves the cache up
    /// to date for the same `required` set.
    async fn is_up_to_date(&self, required: &RequiredArtifactSet) -> Result<bool>;

    /// Fetch every stale artifact in `required`.
    async fn update_all(&mut self, required: &RequiredArtifactSet) -> Result<UpdateReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_new() {
        let overrides: BTreeSet<String> = ["web".to_string()].into_iter().collect();
        let settings = CacheSettings::new(overrides.clone(), true, false);
        assert_eq!(settings.platform_overrides, overrides);
        assert!(settings.include_all_platforms);
        assert!(!settings.use_unsigned_mac_binaries);
    }

    #[test]
    fn test_settings_default_is_empty() {
        let settings = CacheSettings::default();
        assert!(settings.platform_overrides.is_empty());
        assert!(!settings.include_all_platforms);
    }
}
