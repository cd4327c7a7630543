//! Human-readable probe output.
//!
//! Everything the user sees on stdout is written here. Logs go to stderr and
//! never mix with this text.

use std::fmt::Display;
use std::io::{self, Write};

use crate::error::ProbeError;
use crate::models::{ConnectionConfig, ConnectionIdentity, ExtensionStatus, ProbeReport};

/// Cluster inspection commands printed after a connection failure.
pub const TROUBLESHOOTING: [&str; 4] = [
    "1. Check if NodePort service is running: kubectl get svc -n carimbo-vip postgres-nodeport",
    "2. Check if PostgreSQL pod is running: kubectl get pods -n carimbo-vip -l app=postgres",
    "3. Check pg_hba.conf: kubectl exec -n carimbo-vip <pod-name> -- cat /var/lib/postgresql/data/pg_hba.conf",
    "4. Verify password: kubectl get secret -n carimbo-vip postgres-password -o jsonpath='{.data.password}' | base64 -d",
];

/// Writes probe output to any [`Write`] sink.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Missing or invalid configuration, reported before any connection attempt.
    pub fn config_error(&mut self, err: &ProbeError) -> io::Result<()> {
        writeln!(self.out, "ERROR: {err}")?;
        if let Some(hint) = err.hint() {
            writeln!(self.out, "{hint}")?;
        }
        Ok(())
    }

    /// The target we are about to dial.
    pub fn attempting(&mut self, config: &ConnectionConfig) -> io::Result<()> {
        writeln!(self.out, "Attempting to connect to PostgreSQL...")?;
        writeln!(self.out, "  Host: {}", config.host)?;
        writeln!(self.out, "  Port: {}", config.port)?;
        writeln!(self.out, "  Database: {}", config.database)?;
        writeln!(self.out, "  User: {}", config.username)?;
        writeln!(self.out)
    }

    pub fn connected(&mut self) -> io::Result<()> {
        writeln!(self.out, "✓ Connection successful!")
    }

    /// Version, extension status and connection info.
    pub fn report(&mut self, report: &ProbeReport) -> io::Result<()> {
        writeln!(self.out, "✓ PostgreSQL version: {}", report.version)?;
        self.extension(&report.extension)?;
        self.identity(&report.identity)
    }

    fn extension(&mut self, status: &ExtensionStatus) -> io::Result<()> {
        match status {
            ExtensionStatus::Installed { version, .. } => {
                writeln!(self.out, "✓ pgvector extension installed: {version}")
            }
            ExtensionStatus::Missing { .. } => writeln!(self.out, "⚠ pgvector extension not found"),
        }
    }

    fn identity(&mut self, identity: &ConnectionIdentity) -> io::Result<()> {
        writeln!(self.out, "✓ Connection info:")?;
        writeln!(self.out, "    Server address: {}", or_none(identity.server_addr.as_ref()))?;
        writeln!(self.out, "    Server port: {}", or_none(identity.server_port.as_ref()))?;
        writeln!(self.out, "    Database: {}", identity.database)?;
        writeln!(self.out, "    User: {}", identity.user)
    }

    pub fn passed(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "✓ All tests passed!")
    }

    /// Connection-level failure followed by the troubleshooting steps.
    pub fn connection_failed(&mut self, err: &ProbeError) -> io::Result<()> {
        writeln!(self.out, "✗ Connection failed: {err}")?;
        writeln!(self.out)?;
        writeln!(self.out, "Troubleshooting:")?;
        for line in TROUBLESHOOTING {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    pub fn unexpected(&mut self, err: &ProbeError) -> io::Result<()> {
        writeln!(self.out, "✗ Unexpected error: {err}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// NULL columns print as `None`.
fn or_none<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "None".to_string(), ToString::to_string)
}
