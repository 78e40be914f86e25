//! Error types for artifact selection and fetch orchestration.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for precache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// An umbrella flag was negated while one of its children was requested.
    #[error("--{child} requires --{umbrella}")]
    #[diagnostic(
        code(precache::usage::conflict),
        help("Remove the umbrella negation or the child flag")
    )]
    UsageConflict {
        /// The child artifact flag the user passed
        child: String,
        /// The umbrella flag the child depends on
        umbrella: String,
    },

    /// The static umbrella table violates its invariants
    #[error("Invalid umbrella schema: {message}")]
    #[diagnostic(code(precache::schema::invalid))]
    InvalidSchema {
        /// Which invariant was violated
        message: String,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(precache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The external updater failed to fetch artifacts
    #[error("Artifact update failed: {message}")]
    #[diagnostic(code(precache::update))]
    Update {
        /// Error message from the updater
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// The cache lock could not be acquired
    #[error("Failed to lock artifact cache: {message}")]
    #[diagnostic(
        code(precache::lock),
        help("Another precache process may be holding the lock")
    )]
    Lock {
        /// Error message describing the lock failure
        message: String,
    },

    /// I/O error while touching the cache
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(precache::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create")
        operation: String,
    },
}

impl Error {
    /// Create a usage conflict error
    #[must_use]
    pub fn usage_conflict(child: impl Into<String>, umbrella: impl Into<String>) -> Self {
        Self::UsageConflict {
            child: child.into(),
            umbrella: umbrella.into(),
        }
    }

    /// Create an invalid schema error
    #[must_use]
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: msg.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an update error
    #[must_use]
    pub fn update(msg: impl Into<String>) -> Self {
        Self::Update {
            message: msg.into(),
            help: None,
        }
    }

    /// Create an update error with help text
    #[must_use]
    pub fn update_with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Update {
            message: msg.into(),
            help: Some(help.into()),
        }
    }

    /// Create a lock error
    #[must_use]
    pub fn lock(msg: impl Into<String>) -> Self {
        Self::Lock {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }
}

/// Result type for precache operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_conflict_message_names_umbrella() {
        let err = Error::usage_conflict("android_maven", "android");
        assert_eq!(err.to_string(), "--android_maven requires --android");
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/stamps",
            "read",
        );
        assert_eq!(err.to_string(), "I/O read failed: /tmp/stamps");
    }

    #[test]
    fn test_update_with_help() {
        let err = Error::update_with_help("HTTP 404", "Check the engine version");
        match err {
            Error::Update { message, help } => {
                assert_eq!(message, "HTTP 404");
                assert_eq!(help.as_deref(), Some("Check the engine version"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
