//! Results of the diagnostic queries.

use std::fmt;
use std::net::IpAddr;

/// Name of the vector-search extension the probe looks for.
pub const VECTOR_EXTENSION: &str = "vector";

/// Output of `SELECT version()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion(pub String);

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an extension is installed in the connected database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionStatus {
    /// Row found in `pg_extension`
    Installed {
        /// Extension name
        name: String,
        /// Installed version (e.g., "0.7.4")
        version: String,
    },
    /// No row in `pg_extension`
    Missing {
        /// Extension name that was looked up
        name: String,
    },
}

impl ExtensionStatus {
    /// Check if the extension is installed.
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }

    /// Get the installed version, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Installed { version, .. } => Some(version),
            Self::Missing { .. } => None,
        }
    }
}

/// Connection identity as seen by the server.
///
/// These are the server's own values and usually differ from what the client
/// asked for: a NodePort client dials the node address, while the server
/// reports the pod address and its internal port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    /// `inet_server_addr()`; NULL over a Unix socket
    pub server_addr: Option<IpAddr>,
    /// `inet_server_port()`; NULL over a Unix socket
    pub server_port: Option<i32>,
    /// `current_database()`
    pub database: String,
    /// `current_user`
    pub user: String,
}

/// Everything gathered by a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub version: ServerVersion,
    pub extension: ExtensionStatus,
    pub identity: ConnectionIdentity,
    /// Time spent running the diagnostic queries
    pub elapsed_ms: u64,
}
