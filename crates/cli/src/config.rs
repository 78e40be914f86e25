//! User configuration.
//!
//! Read from `~/.config/precache/config.toml` (or the platform equivalent,
//! or `--config`), then overridden by `PRECACHE_*` environment variables.

use precache_cache::{DEFAULT_STORAGE_BASE_URL, DiskCache};
use precache_core::{Channel, Feature, FeatureFlags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::CliError;

/// Environment variable overriding the channel.
pub const CHANNEL_ENV: &str = "PRECACHE_CHANNEL";
/// Environment variable overriding the engine version.
pub const ENGINE_VERSION_ENV: &str = "PRECACHE_ENGINE_VERSION";
/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "PRECACHE_CACHE_DIR";
/// Environment variable overriding the storage base URL.
pub const STORAGE_BASE_URL_ENV: &str = "PRECACHE_STORAGE_BASE_URL";

/// Contents of `config.toml`.
///
/// ```toml
/// channel = "stable"
/// engine_version = "3.22.0"
/// cache_dir = "/var/cache/precache"
///
/// [features]
/// macos-desktop = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Release channel.
    #[serde(default)]
    pub channel: Option<Channel>,

    /// Engine version artifacts are fetched for.
    #[serde(default)]
    pub engine_version: Option<String>,

    /// Cache root.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Base URL artifact archives are downloaded from.
    #[serde(default)]
    pub storage_base_url: Option<String>,

    /// Feature switches, keyed by feature id.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl Config {
    /// Parse config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML.
    pub fn parse(s: &str) -> Result<Self, CliError> {
        toml::from_str(s).map_err(|e| {
            CliError::config_with_help(
                format!("Failed to parse config: {e}"),
                "See the configuration section of the readme for valid keys",
            )
        })
    }

    /// Parse config from a file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Failed to read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Load configuration from `path`, or the default location when `None`.
    ///
    /// A missing default file yields defaults. A missing explicit file is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a file exists but is unreadable or
    /// malformed, or if an explicitly named file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading config");
            return Self::from_file(path);
        }

        let Some(path) = default_config_path() else {
            debug!("Could not determine config path");
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist");
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "Loading config");
        Self::from_file(&path)
    }

    /// Apply `PRECACHE_*` overrides read through `var`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown channel name.
    pub fn with_env_overrides<F>(mut self, var: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(channel) = var(CHANNEL_ENV) {
            self.channel = Some(Channel::parse(&channel).ok_or_else(|| {
                CliError::config_with_help(
                    format!("Unknown channel '{channel}' in {CHANNEL_ENV}"),
                    "Use one of: master, main, beta, stable",
                )
            })?);
        }
        if let Some(version) = var(ENGINE_VERSION_ENV) {
            self.engine_version = Some(version);
        }
        if let Some(dir) = var(CACHE_DIR_ENV) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = var(STORAGE_BASE_URL_ENV) {
            self.storage_base_url = Some(url);
        }
        Ok(self)
    }

    /// Channel, defaulting to stable.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel.unwrap_or_default()
    }

    /// Enabled features.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown feature id.
    pub fn feature_flags(&self) -> Result<FeatureFlags, CliError> {
        let mut enabled = Vec::new();
        for (id, on) in &self.features {
            let feature = Feature::parse(id).ok_or_else(|| {
                let known: Vec<&str> = Feature::ALL.iter().map(|f| f.id()).collect();
                CliError::config_with_help(
                    format!("Unknown feature '{id}'"),
                    format!("Known features: {}", known.join(", ")),
                )
            })?;
            if *on {
                enabled.push(feature);
            }
        }
        Ok(enabled.into_iter().collect())
    }

    /// Engine version artifacts are fetched for.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no version is configured.
    pub fn engine_version(&self) -> Result<&str, CliError> {
        self.engine_version.as_deref().ok_or_else(|| {
            CliError::config_with_help(
                "No engine version configured",
                format!("Set engine_version in config.toml or {ENGINE_VERSION_ENV}"),
            )
        })
    }

    /// Cache root, defaulting to the platform cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(DiskCache::default_root)
    }

    /// Storage base URL.
    #[must_use]
    pub fn storage_base_url(&self) -> &str {
        self.storage_base_url
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_BASE_URL)
    }
}

/// Default path of the config file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("precache").join("config.toml"))
}
