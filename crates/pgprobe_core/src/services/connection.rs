//! Single database connection for the probe, built on tokio-postgres.
//!
//! Provides:
//! - A bounded connection attempt (driver timeout plus an outer deadline)
//! - The read-only diagnostic queries behind [`DiagnosticSession`]
//! - Orderly shutdown of the connection driver task

use crate::error::ProbeError;
use crate::models::{
    ConnectionConfig, ConnectionIdentity, ExtensionStatus, Password, ServerVersion,
};

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls, Row};

const SERVER_VERSION_SQL: &str = "SELECT version()";

const EXTENSION_SQL: &str = "SELECT extname, extversion FROM pg_extension WHERE extname = $1";

const IDENTITY_SQL: &str =
    "SELECT inet_server_addr(), inet_server_port(), current_database(), current_user";

// ============================================================================
// Traits
// ============================================================================

/// Opens a [`DiagnosticSession`] against a configured server.
pub trait Connector {
    type Session: DiagnosticSession;

    /// Connect, failing after `config.options.connect_timeout_secs`.
    fn connect(
        &self,
        config: &ConnectionConfig,
        password: &Password,
    ) -> impl Future<Output = Result<Self::Session, ProbeError>>;
}

/// The read-only queries the probe runs on an open connection.
pub trait DiagnosticSession: Sized {
    /// `SELECT version()`.
    fn server_version(&self) -> impl Future<Output = Result<ServerVersion, ProbeError>>;

    /// Look up an extension in `pg_extension`. Absence is not an error.
    fn extension(&self, name: &str) -> impl Future<Output = Result<ExtensionStatus, ProbeError>>;

    /// Address, port, database and user as bound on the server side.
    fn connection_identity(&self) -> impl Future<Output = Result<ConnectionIdentity, ProbeError>>;

    /// Release the connection.
    fn close(self) -> impl Future<Output = ()>;
}

// ============================================================================
// LiveConnector
// ============================================================================

/// Connects over TCP with tokio-postgres.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveConnector;

impl Connector for LiveConnector {
    type Session = LiveSession;

    async fn connect(
        &self,
        config: &ConnectionConfig,
        password: &Password,
    ) -> Result<LiveSession, ProbeError> {
        let connect_timeout = Duration::from_secs(u64::from(config.options.connect_timeout_secs));

        // Build tokio-postgres config
        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.username);
        pg_config.password(password.expose());
        pg_config.application_name(&config.options.application_name);
        pg_config.connect_timeout(connect_timeout);
        pg_config.ssl_mode(SslMode::Disable);

        tracing::debug!(
            url = %config.display_url(),
            timeout_secs = config.options.connect_timeout_secs,
            "Connecting"
        );

        // The driver timeout only covers the socket; the deadline covers startup and auth too.
        let (client, connection) =
            match tokio::time::timeout(connect_timeout, pg_config.connect(NoTls)).await {
                Ok(result) => result.map_err(ProbeError::from_connect_error)?,
                Err(_) => {
                    return Err(ProbeError::connection(format!(
                        "timeout expired after {}s connecting to {}:{}",
                        config.options.connect_timeout_secs, config.host, config.port
                    )))
                }
            };

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Connection driver stopped with error");
            }
        });

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connection established"
        );

        Ok(LiveSession { client, driver })
    }
}

// ============================================================================
// LiveSession
// ============================================================================

/// An open tokio-postgres connection.
///
/// The driver task ends once the client is dropped.
pub struct LiveSession {
    client: Client,
    driver: JoinHandle<()>,
}

impl LiveSession {
    /// Run a query expected to produce exactly one row.
    async fn fetch_one(&self, sql: &str) -> Result<Row, ProbeError> {
        tracing::debug!(sql, "Executing diagnostic query");
        self.client
            .query_opt(sql, &[])
            .await?
            .ok_or_else(|| ProbeError::internal(format!("Query returned no rows: {sql}")))
    }
}

impl DiagnosticSession for LiveSession {
    async fn server_version(&self) -> Result<ServerVersion, ProbeError> {
        let row = self.fetch_one(SERVER_VERSION_SQL).await?;
        Ok(ServerVersion(column(&row, 0)?))
    }

    async fn extension(&self, name: &str) -> Result<ExtensionStatus, ProbeError> {
        tracing::debug!(sql = EXTENSION_SQL, extension = name, "Executing diagnostic query");
        let row = self.client.query_opt(EXTENSION_SQL, &[&name]).await?;

        match row {
            Some(row) => Ok(ExtensionStatus::Installed {
                name: column(&row, 0)?,
                version: column(&row, 1)?,
            }),
            None => Ok(ExtensionStatus::Missing { name: name.to_string() }),
        }
    }

    async fn connection_identity(&self) -> Result<ConnectionIdentity, ProbeError> {
        let row = self.fetch_one(IDENTITY_SQL).await?;
        Ok(ConnectionIdentity {
            server_addr: column::<Option<IpAddr>>(&row, 0)?,
            server_port: column::<Option<i32>>(&row, 1)?,
            database: column(&row, 2)?,
            user: column(&row, 3)?,
        })
    }

    async fn close(self) {
        drop(self.client);
        if let Err(e) = self.driver.await {
            tracing::warn!(error = %e, "Connection driver task failed");
        }
        tracing::debug!("Connection closed");
    }
}

/// Decode a column, treating a type mismatch as an unexpected error rather
/// than a connection problem.
fn column<'a, T>(row: &'a Row, idx: usize) -> Result<T, ProbeError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(idx).map_err(|e| {
        ProbeError::internal_with_source(format!("Unexpected value in column {idx}"), e)
    })
}
