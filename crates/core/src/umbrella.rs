//! Umbrella flags that stand for a group of child artifacts.
//!
//! The table is static, but its invariants are checked when the schema is
//! loaded so a bad edit fails on startup instead of producing odd selections:
//!
//! - every child is a catalog artifact, so umbrellas cannot nest
//! - a child belongs to at most one umbrella
//! - an umbrella name never doubles as an artifact name

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::catalog::{self, Artifact};
use crate::{Error, Result};

/// An umbrella flag and the artifacts it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmbrellaGroup {
    /// Flag name of the umbrella.
    pub name: &'static str,
    /// Child artifact names, in order.
    pub children: &'static [&'static str],
}

static UMBRELLAS: [UmbrellaGroup; 1] = [UmbrellaGroup {
    name: "android",
    children: &[
        "android_gen_snapshot",
        "android_maven",
        "android_internal_build",
    ],
}];

/// Validated umbrella table plus its reverse index.
#[derive(Debug, Clone)]
pub struct UmbrellaSchema {
    groups: Vec<UmbrellaGroup>,
    child_to_umbrella: HashMap<String, String>,
}

impl UmbrellaSchema {
    /// Load the built-in umbrella table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if the table violates its invariants.
    pub fn load() -> Result<Self> {
        Self::from_groups(&UMBRELLAS, catalog::catalog())
    }

    /// Build a schema from an arbitrary table, validated against `artifacts`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if a child is unknown, listed twice,
    /// or an umbrella name collides with an artifact or another umbrella's child.
    pub fn from_groups(groups: &[UmbrellaGroup], artifacts: &[Artifact]) -> Result<Self> {
        let artifact_names: HashSet<&str> = artifacts.iter().map(|a| a.name).collect();
        let mut child_to_umbrella: HashMap<String, String> = HashMap::new();
        let mut umbrella_names: HashSet<&str> = HashSet::new();

        for group in groups {
            if !umbrella_names.insert(group.name) {
                return Err(Error::invalid_schema(format!(
                    "umbrella '{}' is declared twice",
                    group.name
                )));
            }
            if artifact_names.contains(group.name) {
                return Err(Error::invalid_schema(format!(
                    "umbrella '{}' shadows an artifact of the same name",
                    group.name
                )));
            }
            for child in group.children {
                if !artifact_names.contains(child) {
                    return Err(Error::invalid_schema(format!(
                        "umbrella '{}' lists unknown artifact '{}'",
                        group.name, child
                    )));
                }
                if let Some(previous) =
                    child_to_umbrella.insert((*child).to_string(), group.name.to_string())
                {
                    return Err(Error::invalid_schema(format!(
                        "artifact '{child}' belongs to both '{previous}' and '{}'",
                        group.name
                    )));
                }
            }
        }

        debug!(
            groups = groups.len(),
            children = child_to_umbrella.len(),
            "Loaded umbrella schema"
        );

        Ok(Self {
            groups: groups.to_vec(),
            child_to_umbrella,
        })
    }

    /// Umbrella groups, in declaration order.
    #[must_use]
    pub fn groups(&self) -> &[UmbrellaGroup] {
        &self.groups
    }

    /// Mapping from child artifact name to its umbrella name.
    #[must_use]
    pub fn child_to_umbrella(&self) -> &HashMap<String, String> {
        &self.child_to_umbrella
    }

    /// The umbrella an artifact belongs to, if any.
    #[must_use]
    pub fn umbrella_of(&self, artifact: &str) -> Option<&str> {
        self.child_to_umbrella.get(artifact).map(String::as_str)
    }
}
