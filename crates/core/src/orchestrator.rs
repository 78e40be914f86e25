//! Decides whether a fetch is needed and drives the cache through it.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::cache::{ArtifactCache, CacheSettings, UpdateReport};
use crate::resolver::RequiredArtifactSet;

/// Environment variable set by a parent process that already holds the lock.
pub const ALREADY_LOCKED_ENV: &str = "FLUTTER_ALREADY_LOCKED";

/// Whether a parent process already holds the cache lock.
#[must_use]
pub fn already_locked_from_env() -> bool {
    std::env::var(ALREADY_LOCKED_ENV).is_ok_and(|v| v == "true")
}

/// Everything one fetch needs.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Artifacts to fetch.
    pub required: RequiredArtifactSet,
    /// Settings applied to the cache before the staleness check.
    pub settings: CacheSettings,
    /// Clear completion markers first.
    pub force: bool,
    /// Skip taking the cache lock.
    pub already_locked: bool,
}

/// Result of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Nothing was stale.
    UpToDate,
    /// The updater ran.
    Updated(UpdateReport),
}

/// Runs the side-effecting part of a precache invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchOrchestrator;

impl FetchOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Lock the cache, apply `request` and update it if stale.
    ///
    /// The lock is released whether or not the update succeeds.
    ///
    /// # Errors
    ///
    /// Propagates lock, stamp and update failures from the cache unchanged.
    #[instrument(name = "fetch", skip_all, fields(required = request.required.len(), force = request.force))]
    pub async fn run<C>(&self, cache: &mut C, request: FetchRequest) -> Result<FetchOutcome>
    where
        C: ArtifactCache + ?Sized,
    {
        if request.already_locked {
            debug!("Cache lock held by parent process, not locking again");
        } else {
            cache.acquire_lock().await?;
        }

        let outcome = Self::run_locked(cache, request.required, request.settings, request.force).await;

        if !request.already_locked {
            cache.release_lock();
        }
        outcome
    }

    async fn run_locked<C>(
        cache: &mut C,
        required: RequiredArtifactSet,
        settings: CacheSettings,
        force: bool,
    ) -> Result<FetchOutcome>
    where
        C: ArtifactCache + ?Sized,
    {
        if force {
            debug!("Clearing completion stamps");
            cache.clear_stamps().await?;
        }

        cache.apply(settings);

        if cache.is_up_to_date(&required).await? {
            info!("Artifact cache already up to date");
            return Ok(FetchOutcome::UpToDate);
        }

        info!(artifacts = ?required.names(), "Updating artifact cache");
        let report = cache.update_all(&required).await?;
        Ok(FetchOutcome::Updated(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::catalog;
    use async_trait::async_trait;

    /// Records every call so tests can assert on ordering.
    #[derive(Default)]
    struct RecordingCache {
        calls: Vec<String>,
        up_to_date: bool,
        fail_update: bool,
        applied: Option<CacheSettings>,
    }

    #[async_trait]
    impl ArtifactCache for RecordingCache {
        async fn acquire_lock(&mut self) -> Result<()> {
            self.calls.push("lock".into());
            Ok(())
        }

        fn release_lock(&mut self) {
            self.calls.push("unlock".into());
        }

        async fn clear_stamps(&mut self) -> Result<()> {
            self.calls.push("clear".into());
            Ok(())
        }

        fn apply(&mut self, settings: CacheSettings) {
            self.calls.push("apply".into());
            self.applied = Some(settings);
        }

        async fn is_up_to_date(&self, _required: &RequiredArtifactSet) -> Result<bool> {
            Ok(self.up_to_date)
        }

        async fn update_all(&mut self, required: &RequiredArtifactSet) -> Result<UpdateReport> {
            self.calls.push(format!("update:{}", required.names().join(",")));
            if self.fail_update {
                return Err(Error::update("network unreachable"));
            }
            Ok(UpdateReport {
                updated: required.names().iter().map(|n| (*n).to_string()).collect(),
                skipped: Vec::new(),
            })
        }
    }

    fn required() -> RequiredArtifactSet {
        ["universal", "ios"]
            .into_iter()
            .filter_map(catalog::find)
            .copied()
            .collect()
    }

    #[tokio::test]
    async fn test_stale_cache_is_updated() {
        let mut cache = RecordingCache::default();
        let request = FetchRequest {
            required: required(),
            ..FetchRequest::default()
        };

        let outcome = FetchOrchestrator::new().run(&mut cache, request).await.unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Updated(UpdateReport {
                updated: vec!["ios".into(), "universal".into()],
                skipped: vec![],
            })
        );
        assert_eq!(cache.calls, vec!["lock", "apply", "update:ios,universal", "unlock"]);
    }

    #[tokio::test]
    async fn test_up_to_date_cache_is_left_alone() {
        let mut cache = RecordingCache {
            up_to_date: true,
            ..RecordingCache::default()
        };
        let outcome = FetchOrchestrator::new()
            .run(&mut cache, FetchRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::UpToDate);
        assert_eq!(cache.calls, vec!["lock", "apply", "unlock"]);
    }

    #[tokio::test]
    async fn test_force_clears_stamps_before_apply() {
        let mut cache = RecordingCache {
            up_to_date: true,
            ..RecordingCache::default()
        };
        let request = FetchRequest {
            force: true,
            ..FetchRequest::default()
        };
        FetchOrchestrator::new().run(&mut cache, request).await.unwrap();
        assert_eq!(cache.calls, vec!["lock", "clear", "apply", "unlock"]);
    }

    #[tokio::test]
    async fn test_already_locked_skips_lock() {
        let mut cache = RecordingCache {
            up_to_date: true,
            ..RecordingCache::default()
        };
        let request = FetchRequest {
            already_locked: true,
            ..FetchRequest::default()
        };
        FetchOrchestrator::new().run(&mut cache, request).await.unwrap();
        assert_eq!(cache.calls, vec!["apply"]);
    }

    #[tokio::test]
    async fn test_settings_are_applied() {
        let mut cache = RecordingCache {
            up_to_date: true,
            ..RecordingCache::default()
        };
        let settings = CacheSettings::new(["web".to_string()].into_iter().collect(), true, true);
        let request = FetchRequest {
            settings: settings.clone(),
            ..FetchRequest::default()
        };
        FetchOrchestrator::new().run(&mut cache, request).await.unwrap();
        assert_eq!(cache.applied, Some(settings));
    }

    #[tokio::test]
    async fn test_update_failure_propagates_and_unlocks() {
        let mut cache = RecordingCache {
            fail_update: true,
            ..RecordingCache::default()
        };
        let request = FetchRequest {
            required: required(),
            ..FetchRequest::default()
        };
        let err = FetchOrchestrator::new()
            .run(&mut cache, request)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Update { .. }));
        assert_eq!(cache.calls.last().map(String::as_str), Some("unlock"));
    }

    #[test]
    fn test_already_locked_from_env() {
        temp_env::with_var(ALREADY_LOCKED_ENV, Some("true"), || {
            assert!(already_locked_from_env());
        });
        temp_env::with_var(ALREADY_LOCKED_ENV, Some("1"), || {
            assert!(!already_locked_from_env());
        });
        temp_env::with_var(ALREADY_LOCKED_ENV, None::<&str>, || {
            assert!(!already_locked_from_env());
        });
    }
}
