//! pgprobe - check that PostgreSQL is reachable from outside the cluster.
//!
//! Configuration comes from `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`,
//! `POSTGRES_USER` and `POSTGRES_PASSWORD`. Exits 0 when every check passes
//! and 1 otherwise.

use std::process::ExitCode;

use pgprobe_core::logging::{init_logging, LogConfig};
use pgprobe_core::{run_probe, LiveConnector, ProcessEnv};

fn main() -> ExitCode {
    // Held until return so buffered log lines are flushed.
    let _logging_guard = init_logging(LogConfig::new());

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting pgprobe");

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create tokio runtime");
            println!("✗ Unexpected error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    let outcome = runtime.block_on(run_probe(&ProcessEnv, &LiveConnector, stdout.lock()));

    tracing::debug!(outcome = ?outcome, "Finished");
    ExitCode::from(outcome.exit_code())
}
