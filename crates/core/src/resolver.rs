//! Turns flags into the set of artifacts that must be fetched.

use std::collections::{BTreeSet, btree_set};
use tracing::{debug, trace};

use crate::catalog::{self, Artifact};
use crate::channel::{Channel, FeatureFlags};
use crate::flags::FlagSet;
use crate::umbrella::UmbrellaSchema;

/// Inputs to [`resolve`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Resolved artifact toggles.
    pub flags: &'a FlagSet,
    /// Umbrella table used to map children onto their umbrella flag.
    pub schema: &'a UmbrellaSchema,
    /// Include every artifact that survives the channel and feature filters.
    pub all_platforms: bool,
    /// Channel the toolchain is on.
    pub channel: Channel,
    /// Features currently enabled.
    pub features: &'a FeatureFlags,
}

/// Artifacts to hand to the updater, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredArtifactSet {
    artifacts: BTreeSet<Artifact>,
}

impl RequiredArtifactSet {
    /// Whether an artifact with this name is required.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.artifacts.iter().any(|a| a.name == name)
    }

    /// Artifact names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.artifacts.iter().map(|a| a.name).collect()
    }

    /// Iterate over the artifacts.
    pub fn iter(&self) -> btree_set::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    /// Number of required artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl FromIterator<Artifact> for RequiredArtifactSet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        Self {
            artifacts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RequiredArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = btree_set::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Compute the artifacts required by `request`.
///
/// Unstable artifacts are dropped off the development channel and gated
/// artifacts are dropped while their feature is off, even when requested.
/// Everything else is included when `all_platforms` is set or when the flag
/// that controls it (its umbrella, if it has one) resolves to true.
#[must_use]
pub fn resolve(request: &ResolveRequest<'_>) -> RequiredArtifactSet {
    let required: RequiredArtifactSet = catalog::catalog()
        .iter()
        .filter(|artifact| {
            if artifact.unstable && !request.channel.is_unstable() {
                trace!(artifact = artifact.name, channel = %request.channel, "Skipping unstable artifact");
                return false;
            }
            if let Some(feature) = artifact.feature
                && !request.features.is_enabled(feature)
            {
                trace!(artifact = artifact.name, %feature, "Skipping artifact behind disabled feature");
                return false;
            }
            let flag = request
                .schema
                .umbrella_of(artifact.name)
                .unwrap_or(artifact.name);
            request.all_platforms || request.flags.value(flag)
        })
        .copied()
        .collect();

    debug!(
        artifacts = ?required.names(),
        all_platforms = request.all_platforms,
        channel = %request.channel,
        "Resolved required artifacts"
    );
    required
}
