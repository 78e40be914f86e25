use crate::tracing::LogLevel;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use miette::{Diagnostic, Report};
use precache_core::flags::{TOGGLE_FLAGS, FlagSpec};
use precache_core::{FlagSet, FlagValue};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Usage or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Artifact update or unexpected error exit code
pub const EXIT_UPDATE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Usage or configuration error (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(precache::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Artifact update error (exit code 3)
    #[error("Update failed: {message}")]
    #[diagnostic(code(precache::cli::update))]
    Update {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(precache::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new update error
    #[must_use]
    pub fn update(message: impl Into<String>, help: Option<String>) -> Self {
        Self::Update {
            message: message.into(),
            help,
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Update { .. } => "update",
            Self::Other { .. } => "other",
        }
    }
}

/// Convert `precache_core::Error` to the matching `CliError` variant.
///
/// - Usage conflicts and configuration problems -> Config (exit code 2)
/// - Updater failures -> Update (exit code 3)
/// - Lock, I/O and schema failures -> Other (exit code 3)
impl From<precache_core::Error> for CliError {
    fn from(err: precache_core::Error) -> Self {
        match err {
            precache_core::Error::UsageConflict { .. } => Self::config_with_help(
                err.to_string(),
                "Remove the umbrella negation or the child flag",
            ),
            precache_core::Error::Configuration { message } => Self::config(message),
            precache_core::Error::Update { message, help } => Self::update(message, help),
            precache_core::Error::Lock { .. } => Self::other_with_help(
                err.to_string(),
                "Another precache process may be holding the lock",
            ),
            precache_core::Error::Io {
                ref source,
                ref path,
                ref operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::other_with_help(
                    format!("I/O {operation} failed{path_str}: {source}"),
                    "Check file permissions and ensure the path exists",
                )
            }
            precache_core::Error::InvalidSchema { .. } => Self::other(err.to_string()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Update { .. } | CliError::Other { .. } => EXIT_UPDATE,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.code(),
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Fetch a toolchain's platform binaries ahead of time.
///
/// Artifact toggles (`--ios`, `--no-android`, ...) are generated from the
/// artifact flag table and added by [`command`].
#[derive(Parser, Debug)]
#[command(name = "precache")]
#[command(about = "Populate the toolchain's cache of binary artifacts")]
#[command(
    long_about = "Populate the toolchain's cache of binary artifacts.\n\nIf no explicit platform flags are given, this downloads the artifacts for every platform enabled by default."
)]
#[command(version)]
pub struct Cli {
    /// Precache artifacts for all host platforms.
    #[arg(short = 'a', long = "all-platforms")]
    pub all_platforms: bool,

    /// Force re-downloading of artifacts.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON envelope instead of text.
    #[arg(long, help = "Emit JSON envelope instead of text")]
    pub json: bool,

    /// Path to the configuration file.
    #[arg(long, env = "PRECACHE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// A fully parsed invocation.
#[derive(Debug)]
pub struct Invocation {
    /// Global options.
    pub cli: Cli,
    /// Artifact toggles with their explicitness.
    pub flags: FlagSet,
    /// Argument tokens as typed, without the program name.
    pub raw_args: Vec<String>,
}

fn artifact_args(spec: &'static FlagSpec) -> [Arg; 2] {
    [
        Arg::new(spec.name)
            .long(spec.name)
            .help(spec.help)
            .action(ArgAction::SetTrue)
            .hide(spec.hidden)
            .overrides_with(spec.negated),
        Arg::new(spec.negated)
            .long(spec.negated)
            .action(ArgAction::SetTrue)
            .hide(true)
            .overrides_with(spec.name),
    ]
}

/// Build the full command: global options plus one negatable toggle per
/// artifact flag.
#[must_use]
pub fn command() -> clap::Command {
    TOGGLE_FLAGS
        .iter()
        .fold(Cli::command(), |cmd, spec| cmd.args(artifact_args(spec)))
        .after_help("Every platform toggle can be negated with --no-<flag>.")
}

fn typed(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Read artifact toggles out of `matches`.
///
/// A flag is explicit when either polarity was typed; with both typed the
/// last one wins.
#[must_use]
pub fn flag_set_from_matches(matches: &ArgMatches) -> FlagSet {
    let mut flags = FlagSet::with_defaults();
    for spec in &TOGGLE_FLAGS {
        if typed(matches, spec.name) {
            flags.set(spec.name, FlagValue::explicit(true));
        } else if typed(matches, spec.negated) {
            flags.set(spec.name, FlagValue::explicit(false));
        }
    }
    flags
}

/// Parse `args` (including the program name).
///
/// # Errors
///
/// Returns clap's error for unknown flags, `--help` and `--version`.
pub fn try_parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let raw_args = args
        .iter()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let matches = command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    let flags = flag_set_from_matches(&matches);
    Ok(Invocation {
        cli,
        flags,
        raw_args,
    })
}

/// Parse the process arguments, exiting on clap errors.
#[must_use]
pub fn parse() -> Invocation {
    try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}
