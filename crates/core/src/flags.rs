//! Artifact toggle flags and their resolved values.
//!
//! Each flag carries both its boolean value and whether the user typed it,
//! so selection logic never has to ask the argument parser after the fact.

use std::collections::BTreeMap;

/// Declaration of a negatable artifact toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// Flag name (`--<name>`).
    pub name: &'static str,
    /// Negated long form (`--<negated>`).
    pub negated: &'static str,
    /// Value when the flag is not given.
    pub default: bool,
    /// Hidden from normal help output.
    pub hidden: bool,
    /// Help text.
    pub help: &'static str,
}

impl FlagSpec {
    const fn new(
        name: &'static str,
        negated: &'static str,
        default: bool,
        help: &'static str,
    ) -> Self {
        Self {
            name,
            negated,
            default,
            hidden: false,
            help,
        }
    }

    const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Every artifact, umbrella and option toggle, in help order.
pub static TOGGLE_FLAGS: [FlagSpec; 13] = [
    FlagSpec::new(
        "android",
        "no-android",
        true,
        "Precache artifacts for Android development.",
    ),
    FlagSpec::new(
        "android_gen_snapshot",
        "no-android_gen_snapshot",
        true,
        "Precache gen_snapshot for Android development.",
    ),
    FlagSpec::new(
        "android_maven",
        "no-android_maven",
        true,
        "Precache Gradle dependencies for Android development.",
    ),
    FlagSpec::new(
        "android_internal_build",
        "no-android_internal_build",
        false,
        "Precache dependencies for internal Android development.",
    ),
    FlagSpec::new(
        "ios",
        "no-ios",
        true,
        "Precache artifacts for iOS development.",
    ),
    FlagSpec::new(
        "web",
        "no-web",
        false,
        "Precache artifacts for web development.",
    ),
    FlagSpec::new(
        "linux",
        "no-linux",
        false,
        "Precache artifacts for Linux desktop development.",
    ),
    FlagSpec::new(
        "windows",
        "no-windows",
        false,
        "Precache artifacts for Windows desktop development.",
    ),
    FlagSpec::new(
        "macos",
        "no-macos",
        false,
        "Precache artifacts for macOS desktop development.",
    ),
    FlagSpec::new(
        "fuchsia",
        "no-fuchsia",
        false,
        "Precache artifacts for Fuchsia development.",
    ),
    FlagSpec::new(
        "universal",
        "no-universal",
        true,
        "Precache artifacts required for any development platform.",
    ),
    FlagSpec::new(
        "flutter_runner",
        "no-flutter_runner",
        false,
        "Precache the flutter runner artifacts.",
    )
    .hidden(),
    FlagSpec::new(
        "use-unsigned-mac-binaries",
        "no-use-unsigned-mac-binaries",
        false,
        "Precache the unsigned macOS binaries when available.",
    )
    .hidden(),
];

/// Name of the flag that accepts unsigned macOS binaries.
pub const USE_UNSIGNED_MAC_BINARIES: &str = "use-unsigned-mac-binaries";

/// Resolved value of a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagValue {
    /// Boolean value, default or user supplied.
    pub value: bool,
    /// Whether the user typed the flag (either polarity).
    pub explicit: bool,
}

impl FlagValue {
    /// A value the user did not type.
    #[must_use]
    pub const fn default_value(value: bool) -> Self {
        Self {
            value,
            explicit: false,
        }
    }

    /// A value the user typed.
    #[must_use]
    pub const fn explicit(value: bool) -> Self {
        Self {
            value,
            explicit: true,
        }
    }
}

/// Resolved values for every artifact toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    values: BTreeMap<String, FlagValue>,
}

impl Default for FlagSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FlagSet {
    /// All flags at their declared defaults, none explicit.
    #[must_use]
    pub fn with_defaults() -> Self {
        let values = TOGGLE_FLAGS
            .iter()
            .map(|spec| (spec.name.to_string(), FlagValue::default_value(spec.default)))
            .collect();
        Self { values }
    }

    /// Override a flag value.
    pub fn set(&mut self, name: impl Into<String>, value: FlagValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style [`FlagSet::set`] with an explicit value.
    #[must_use]
    pub fn with_explicit(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set(name, FlagValue::explicit(value));
        self
    }

    /// Look up a flag.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FlagValue> {
        self.values.get(name).copied()
    }

    /// Boolean value of a flag; unknown flags are false.
    #[must_use]
    pub fn value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.value)
    }

    /// Whether the user typed the flag.
    #[must_use]
    pub fn is_explicit(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.explicit)
    }

    /// Typed by the user and resolving to true.
    #[must_use]
    pub fn explicitly_true(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.explicit && f.value)
    }
}
