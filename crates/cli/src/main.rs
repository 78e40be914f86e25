//! precache binary.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use precache::cli::{self, CliError, EXIT_OK, Invocation, exit_code_for, render_error};
use precache::commands;
use precache::tracing::{TracingConfig, TracingFormat, init_tracing};

/// Exit code when the runtime cannot start.
const EXIT_FATAL: i32 = 1;

fn main() {
    // Tracing may be unusable during a panic, so write straight to stderr.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let invocation = cli::parse();

    let tracing_config = TracingConfig {
        format: if invocation.cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Pretty
        },
        level: invocation.cli.level.into(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("Warning: {e}");
    }

    // reqwest is built without a default crypto provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let exit_code = run_with_tokio(&invocation);
    std::process::exit(exit_code);
}

/// Create tokio runtime and run the command
fn run_with_tokio(invocation: &Invocation) -> i32 {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return EXIT_FATAL;
        }
    };

    match rt.block_on(run(invocation)) {
        Ok(output) => {
            println!("{output}");
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, invocation.cli.json);
            exit_code_for(&err)
        }
    }
}

async fn run(invocation: &Invocation) -> Result<String, CliError> {
    tracing::debug!(args = ?invocation.raw_args, "Running precache");
    commands::execute_precache(invocation).await
}
