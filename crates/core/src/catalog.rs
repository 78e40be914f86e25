//! Static catalog of the artifacts precache knows how to fetch.
//!
//! The catalog is a closed enumeration: every artifact is declared once,
//! in a fixed order, with its stability and optional gating feature.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature that has to be enabled before an artifact may be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// macOS desktop support.
    MacosDesktop,
    /// Linux desktop support.
    LinuxDesktop,
    /// Windows desktop support.
    WindowsDesktop,
    /// Fuchsia support.
    Fuchsia,
}

impl Feature {
    /// All known features.
    pub const ALL: [Self; 4] = [
        Self::MacosDesktop,
        Self::LinuxDesktop,
        Self::WindowsDesktop,
        Self::Fuchsia,
    ];

    /// Stable identifier used in configuration files.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MacosDesktop => "macos-desktop",
            Self::LinuxDesktop => "linux-desktop",
            Self::WindowsDesktop => "windows-desktop",
            Self::Fuchsia => "fuchsia",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|f| f.id() == normalized)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A fetchable group of platform binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Artifact {
    /// Unique name, doubles as the CLI flag name.
    pub name: &'static str,
    /// Only available on the development channel.
    pub unstable: bool,
    /// Feature that gates the artifact, if any.
    pub feature: Option<Feature>,
}

impl Artifact {
    const fn stable(name: &'static str) -> Self {
        Self {
            name,
            unstable: false,
            feature: None,
        }
    }

    const fn gated(name: &'static str, feature: Feature) -> Self {
        Self {
            name,
            unstable: false,
            feature: Some(feature),
        }
    }

    const fn unstable(name: &'static str, feature: Feature) -> Self {
        Self {
            name,
            unstable: true,
            feature: Some(feature),
        }
    }

    /// Whether the artifact contains macOS binaries.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.name == MACOS
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Name of the artifact every platform needs.
pub const UNIVERSAL: &str = "universal";

const MACOS: &str = "macos";

static ARTIFACTS: [Artifact; 11] = [
    Artifact::stable(UNIVERSAL),
    Artifact::stable("android_gen_snapshot"),
    Artifact::stable("android_maven"),
    Artifact::stable("android_internal_build"),
    Artifact::stable("ios"),
    Artifact::stable("web"),
    Artifact::gated(MACOS, Feature::MacosDesktop),
    Artifact::gated("linux", Feature::LinuxDesktop),
    Artifact::gated("windows", Feature::WindowsDesktop),
    Artifact::unstable("fuchsia", Feature::Fuchsia),
    Artifact::unstable("flutter_runner", Feature::Fuchsia),
];

/// All artifacts, in declaration order.
#[must_use]
pub fn catalog() -> &'static [Artifact] {
    &ARTIFACTS
}

/// Look up an artifact by name.
#[must_use]
pub fn find(name: &str) -> Option<&'static Artifact> {
    ARTIFACTS.iter().find(|a| a.name == name)
}
