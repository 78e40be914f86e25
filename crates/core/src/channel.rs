//! Release channel and feature switches.
//!
//! Both are detected outside the core (configuration file, environment) and
//! passed in as plain values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::Feature;

/// Toolchain release channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Development channel, the only one that ships unstable artifacts.
    #[serde(alias = "main")]
    Master,
    /// Beta channel.
    Beta,
    /// Stable channel.
    #[default]
    Stable,
}

impl Channel {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "master" | "main" => Some(Self::Master),
            "beta" => Some(Self::Beta),
            "stable" => Some(Self::Stable),
            _ => None,
        }
    }

    /// Whether this is the unstable development channel.
    #[must_use]
    pub const fn is_unstable(self) -> bool {
        matches!(self, Self::Master)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Beta => write!(f, "beta"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Set of enabled features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    enabled: BTreeSet<Feature>,
}

impl FeatureFlags {
    /// No features enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known feature enabled.
    #[must_use]
    pub fn all() -> Self {
        Feature::ALL.into_iter().collect()
    }

    /// Enable a feature.
    #[must_use]
    pub fn with(mut self, feature: Feature) -> Self {
        self.enabled.insert(feature);
        self
    }

    /// Check whether a feature is enabled.
    #[must_use]
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Iterate over enabled features.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.enabled.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse() {
        assert_eq!(Channel::parse("master"), Some(Channel::Master));
        assert_eq!(Channel::parse("main"), Some(Channel::Master));
        assert_eq!(Channel::parse("Beta"), Some(Channel::Beta));
        assert_eq!(Channel::parse("STABLE"), Some(Channel::Stable));
        assert_eq!(Channel::parse("dev"), None);
    }

    #[test]
    fn test_only_master_is_unstable() {
        assert!(Channel::Master.is_unstable());
        assert!(!Channel::Beta.is_unstable());
        assert!(!Channel::Stable.is_unstable());
    }

    #[test]
    fn test_default_channel_is_stable() {
        assert_eq!(Channel::default(), Channel::Stable);
    }

    #[test]
    fn test_feature_flags() {
        let flags = FeatureFlags::new().with(Feature::LinuxDesktop);
        assert!(flags.is_enabled(Feature::LinuxDesktop));
        assert!(!flags.is_enabled(Feature::MacosDesktop));

        let all = FeatureFlags::all();
        assert!(Feature::ALL.iter().all(|f| all.is_enabled(*f)));
    }
}
