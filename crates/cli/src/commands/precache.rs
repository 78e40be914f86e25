//! The precache command.
//!
//! Validates the raw arguments, resolves the required artifacts and hands
//! them to the disk cache through the fetch orchestrator.

use crate::cli::{CliError, Invocation, OkEnvelope};
use crate::config::Config;
use precache_cache::{ArtifactDownloader, DiskCache, HttpDownloader};
use precache_core::flags::USE_UNSIGNED_MAC_BINARIES;
use precache_core::orchestrator::already_locked_from_env;
use precache_core::{
    CacheSettings, Channel, FetchOrchestrator, FetchOutcome, FetchRequest, RequiredArtifactSet,
    ResolveRequest, UmbrellaSchema, conflict, resolver, selection,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// What a precache invocation did, as rendered with `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheReport {
    /// Engine version artifacts were checked against.
    pub version: String,
    /// Channel used for the stability filter.
    pub channel: Channel,
    /// Artifacts the invocation required.
    pub required: Vec<&'static str>,
    /// Result of the fetch.
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

/// Artifacts and cache settings derived from an invocation.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Artifacts to fetch.
    pub required: RequiredArtifactSet,
    /// Settings handed to the cache.
    pub settings: CacheSettings,
    /// Channel used for the stability filter.
    pub channel: Channel,
}

/// Load the umbrella table and reject conflicting arguments.
///
/// # Errors
///
/// Returns a configuration error for usage conflicts and an unexpected
/// error for a broken umbrella table.
pub fn validate_invocation(invocation: &Invocation) -> Result<UmbrellaSchema, CliError> {
    let schema = UmbrellaSchema::load()?;
    conflict::validate(&invocation.raw_args, &schema)?;
    Ok(schema)
}

/// Resolve a validated invocation without touching the cache.
///
/// # Errors
///
/// Returns a configuration error for unknown feature ids.
pub fn plan(
    invocation: &Invocation,
    schema: &UmbrellaSchema,
    config: &Config,
) -> Result<Plan, CliError> {
    let explicit = selection::explicit_selections(&invocation.flags, schema);
    let features = config.feature_flags()?;
    let channel = config.channel();

    let required = resolver::resolve(&ResolveRequest {
        flags: &invocation.flags,
        schema,
        all_platforms: invocation.cli.all_platforms,
        channel,
        features: &features,
    });
    debug!(explicit = ?explicit, required = ?required.names(), "Planned precache");

    let settings = CacheSettings::new(
        explicit,
        invocation.cli.all_platforms,
        invocation.flags.value(USE_UNSIGNED_MAC_BINARIES),
    );
    Ok(Plan {
        required,
        settings,
        channel,
    })
}

/// Run the precache command against the configured cache and storage.
///
/// # Errors
///
/// Returns a configuration error for usage conflicts or bad configuration,
/// and an update error if fetching fails.
pub async fn execute_precache(invocation: &Invocation) -> Result<String, CliError> {
    // Usage conflicts are reported before the config is even read.
    let schema = validate_invocation(invocation)?;

    let config = Config::load(invocation.cli.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok())?;
    let downloader = HttpDownloader::new(config.storage_base_url())?;
    execute_with(invocation, &schema, &config, Arc::new(downloader)).await
}

/// Run a validated invocation with an explicit config and downloader.
///
/// # Errors
///
/// See [`execute_precache`].
pub async fn execute_with(
    invocation: &Invocation,
    schema: &UmbrellaSchema,
    config: &Config,
    downloader: Arc<dyn ArtifactDownloader>,
) -> Result<String, CliError> {
    let plan = plan(invocation, schema, config)?;
    let version = config.engine_version()?.to_string();
    let mut cache = DiskCache::new(config.cache_dir(), version.clone(), downloader);
    info!(root = %cache.root().display(), %version, "Using artifact cache");

    let required = plan.required.names();
    let outcome = FetchOrchestrator::new()
        .run(
            &mut cache,
            FetchRequest {
                required: plan.required,
                settings: plan.settings,
                force: invocation.cli.force,
                already_locked: already_locked_from_env(),
            },
        )
        .await?;

    let report = PrecacheReport {
        version,
        channel: plan.channel,
        required,
        outcome,
    };
    if invocation.cli.json {
        serde_json::to_string(&OkEnvelope::new(&report))
            .map_err(|e| CliError::other(format!("Failed to serialize report: {e}")))
    } else {
        Ok(render_text(&report))
    }
}

/// Human-readable report.
#[must_use]
pub fn render_text(report: &PrecacheReport) -> String {
    match &report.outcome {
        FetchOutcome::UpToDate => "Already up-to-date.".to_string(),
        FetchOutcome::Updated(update) => {
            let mut out = String::new();
            for name in &update.updated {
                let _ = writeln!(out, "Downloaded {name} artifacts.");
            }
            let _ = write!(
                out,
                "Updated {} of {} required artifacts for engine {}.",
                update.updated.len(),
                report.required.len(),
                report.version
            );
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::try_parse_from;
    use async_trait::async_trait;
    use precache_cache::DownloadRequest;
    use precache_core::UpdateReport;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeDownloader {
        fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactDownloader for FakeDownloader {
        async fn download(&self, request: &DownloadRequest<'_>) -> precache_core::Result<()> {
            std::fs::create_dir_all(request.dest).unwrap();
            self.fetched
                .lock()
                .unwrap()
                .push(request.artifact.name.to_string());
            Ok(())
        }
    }

    fn invocation(args: &[&str]) -> Invocation {
        try_parse_from(std::iter::once("precache").chain(args.iter().copied())).unwrap()
    }

    fn schema() -> UmbrellaSchema {
        UmbrellaSchema::load().unwrap()
    }

    async fn run(inv: &Invocation, config: &Config, downloader: Arc<FakeDownloader>) -> String {
        execute_with(inv, &schema(), config, downloader).await.unwrap()
    }

    fn config(temp: &TempDir) -> Config {
        config_for(temp, "3.22.0")
    }

    fn config_for(temp: &TempDir, version: &str) -> Config {
        Config {
            engine_version: Some(version.to_string()),
            cache_dir: Some(temp.path().join("cache")),
            ..Config::default()
        }
    }

    #[test]
    fn test_plan_umbrella_negation_with_web() {
        let plan = plan(
            &invocation(&["--no-android", "--web"]),
            &schema(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(plan.required.names(), vec!["ios", "universal", "web"]);
        assert_eq!(
            plan.settings.platform_overrides.iter().collect::<Vec<_>>(),
            vec!["web"]
        );
        assert!(!plan.settings.include_all_platforms);
    }

    #[test]
    fn test_plan_rejects_conflict() {
        let err = validate_invocation(&invocation(&["--no-android", "--android_maven"]))
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "--android_maven requires --android");
    }

    #[test]
    fn test_plan_unsigned_and_all_platforms() {
        let plan = plan(
            &invocation(&["-a", "--use-unsigned-mac-binaries"]),
            &schema(),
            &Config::default(),
        )
        .unwrap();
        assert!(plan.settings.include_all_platforms);
        assert!(plan.settings.use_unsigned_mac_binaries);
        // macos stays behind its feature even with --all-platforms
        assert!(!plan.required.contains("macos"));
    }

    #[tokio::test]
    async fn test_execute_downloads_then_reports_up_to_date() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let downloader = Arc::new(FakeDownloader::default());
        let inv = invocation(&["--no-android"]);

        let out = run(&inv, &config, downloader.clone()).await;
        assert!(out.contains("Downloaded ios artifacts."));
        assert!(out.contains("Downloaded universal artifacts."));
        assert!(out.ends_with("Updated 2 of 2 required artifacts for engine 3.22.0."));

        let out = run(&inv, &config, downloader.clone()).await;
        assert_eq!(out, "Already up-to-date.");
        assert_eq!(downloader.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_execute_all_platforms_twice_is_up_to_date() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let downloader = Arc::new(FakeDownloader::default());
        let inv = invocation(&["-a"]);

        let out = run(&inv, &config, downloader.clone()).await;
        assert!(out.starts_with("Downloaded"));
        let fetched = downloader.fetched.lock().unwrap().len();

        let out = run(&inv, &config, downloader.clone()).await;
        assert_eq!(out, "Already up-to-date.");
        assert_eq!(downloader.fetched.lock().unwrap().len(), fetched);
    }

    #[tokio::test]
    async fn test_execute_version_bump_ignores_dropped_platform() {
        let temp = TempDir::new().unwrap();
        let downloader = Arc::new(FakeDownloader::default());
        run(&invocation(&["--web"]), &config_for(&temp, "3.22.0"), downloader.clone()).await;

        let bumped = config_for(&temp, "3.23.0");
        let bare = invocation(&[]);
        let out = run(&bare, &bumped, downloader.clone()).await;
        assert!(!out.contains("Downloaded web artifacts."));
        assert!(out.contains("Downloaded universal artifacts."));

        let out = run(&bare, &bumped, downloader.clone()).await;
        assert_eq!(out, "Already up-to-date.");
    }

    #[tokio::test]
    async fn test_execute_json_envelope() {
        let temp = TempDir::new().unwrap();
        let out = run(
            &invocation(&["--json", "--no-android", "--no-ios"]),
            &config(&temp),
            Arc::new(FakeDownloader::default()),
        )
        .await;

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["outcome"], "updated");
        assert_eq!(value["data"]["required"], serde_json::json!(["universal"]));
        assert_eq!(value["data"]["channel"], "stable");
    }

    #[tokio::test]
    async fn test_execute_requires_engine_version() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            engine_version: None,
            ..config(&temp)
        };
        let err = execute_with(
            &invocation(&[]),
            &schema(),
            &config,
            Arc::new(FakeDownloader::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_render_text() {
        let report = PrecacheReport {
            version: "1.0.0".to_string(),
            channel: Channel::Beta,
            required: vec!["ios", "universal"],
            outcome: FetchOutcome::Updated(UpdateReport {
                updated: vec!["ios".to_string()],
                skipped: vec!["universal".to_string()],
            }),
        };
        assert_eq!(
            render_text(&report),
            "Downloaded ios artifacts.\nUpdated 1 of 2 required artifacts for engine 1.0.0."
        );
    }
}
