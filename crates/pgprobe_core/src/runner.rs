//! The probe flow: configure, connect, diagnose, report.

use std::io::Write;

use crate::error::ProbeError;
use crate::models::ProbeSettings;
use crate::report::Reporter;
use crate::services::connection::{Connector, DiagnosticSession};
use crate::services::diagnostics::DiagnosticService;
use crate::services::env::EnvSource;

/// Final result of a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connected and every diagnostic query succeeded
    Passed,
    /// Configuration, connection or query failure
    Failed,
}

impl ProbeOutcome {
    /// Process exit status: 0 on success, 1 otherwise.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Passed
    }
}

/// Run the whole probe, writing human-readable output to `out`.
///
/// Configuration is read and checked before the connector is touched. Every
/// error is terminal: it is printed, logged, and turned into
/// [`ProbeOutcome::Failed`].
pub async fn run_probe<E, C, W>(env: &E, connector: &C, out: W) -> ProbeOutcome
where
    E: EnvSource,
    C: Connector,
    W: Write,
{
    let mut reporter = Reporter::new(out);

    let outcome = match probe(env, connector, &mut reporter).await {
        Ok(()) => ProbeOutcome::Passed,
        Err(err) => {
            tracing::error!(
                category = err.category(),
                hint = ?err.hint(),
                error = %err,
                "Probe failed"
            );

            let written = if err.is_config() {
                reporter.config_error(&err)
            } else if err.is_operational() {
                reporter.connection_failed(&err)
            } else {
                reporter.unexpected(&err)
            };
            if let Err(e) = written {
                tracing::error!(error = %e, "Failed to write failure report");
            }
            ProbeOutcome::Failed
        }
    };

    if let Err(e) = reporter.flush() {
        tracing::error!(error = %e, "Failed to flush output");
        return ProbeOutcome::Failed;
    }
    outcome
}

async fn probe<E, C, W>(env: &E, connector: &C, reporter: &mut Reporter<W>) -> Result<(), ProbeError>
where
    E: EnvSource,
    C: Connector,
    W: Write,
{
    let settings = ProbeSettings::from_env(env)?;
    reporter.attempting(&settings.connection)?;

    let session = connector.connect(&settings.connection, &settings.password).await?;
    reporter.connected()?;

    let report = match DiagnosticService::run(&session).await {
        Ok(report) => report,
        Err(e) => {
            session.close().await;
            return Err(e);
        }
    };

    reporter.report(&report)?;
    session.close().await;
    reporter.passed()?;
    Ok(())
}
