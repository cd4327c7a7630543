//! Diagnostic query sequence.

use std::time::Instant;

use crate::error::ProbeError;
use crate::models::{ProbeReport, VECTOR_EXTENSION};
use crate::services::connection::DiagnosticSession;

/// Runs the diagnostic queries on an open session.
pub struct DiagnosticService;

impl DiagnosticService {
    /// Run version, extension and identity checks, in that order.
    ///
    /// The first failing query aborts the sequence. A missing extension is
    /// reported in the result, not as an error.
    pub async fn run(session: &impl DiagnosticSession) -> Result<ProbeReport, ProbeError> {
        let start = Instant::now();

        let version = session.server_version().await?;
        tracing::debug!(version = %version, "Server version");

        let extension = session.extension(VECTOR_EXTENSION).await?;
        if extension.is_installed() {
            tracing::debug!(extension = VECTOR_EXTENSION, version = ?extension.version(), "Extension found");
        } else {
            tracing::warn!(extension = VECTOR_EXTENSION, "Extension not installed");
        }

        let identity = session.connection_identity().await?;
        tracing::debug!(
            server_addr = ?identity.server_addr,
            server_port = ?identity.server_port,
            database = %identity.database,
            user = %identity.user,
            "Connection identity"
        );

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, "Diagnostics completed");

        Ok(ProbeReport { version, extension, identity, elapsed_ms })
    }
}
