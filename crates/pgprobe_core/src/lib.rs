//! Connectivity probe for a PostgreSQL database reached from outside its cluster.
//!
//! - **error**: Error taxonomy separating configuration, connection and query failures
//! - **models**: Connection settings and diagnostic results
//! - **services**: Environment loading, the tokio-postgres connection, diagnostic queries
//! - **report**: Human-readable output
//! - **runner**: The end-to-end probe flow
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod runner;
pub mod services;

#[cfg(test)]
mod testing;

pub use error::ProbeError;
pub use models::{
    ConnectionConfig, ConnectionIdentity, ConnectionOptions, ExtensionStatus, Password,
    ProbeReport, ProbeSettings, ServerVersion,
};
pub use report::Reporter;
pub use runner::{run_probe, ProbeOutcome};
pub use services::{Connector, DiagnosticService, DiagnosticSession, LiveConnector, ProcessEnv};
