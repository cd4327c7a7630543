//! Connection configuration and credentials.
//!
//! An empty host is rejected by [`ConnectionConfig::validate`]; there is no
//! fallback to the local Unix socket as libpq does for `host=''`.

use std::fmt;

/// Default host: the cluster node exposing the NodePort.
pub const DEFAULT_HOST: &str = "192.168.7.200";
/// Default port: the PostgreSQL NodePort.
pub const DEFAULT_PORT: u16 = 30432;
/// Default database name.
pub const DEFAULT_DATABASE: &str = "carimbo";
/// Default login user.
pub const DEFAULT_USER: &str = "postgres";

/// Upper bound on how long a connection attempt may take.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 10;

/// Additional connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Connection timeout in seconds
    pub connect_timeout_secs: u32,
    /// Application name sent to PostgreSQL
    pub application_name: String,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            application_name: "pgprobe".to_string(),
        }
    }
}

/// Where and as whom to connect.
///
/// Note: the password is kept in [`Password`], never in this struct, so the
/// config can be logged freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database name (1-63 chars)
    pub database: String,
    /// Login username
    pub username: String,
    /// Additional options
    pub options: ConnectionOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration with default options.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            options: ConnectionOptions::default(),
        }
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout_secs(mut self, secs: u32) -> Self {
        self.options.connect_timeout_secs = secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host is required".to_string());
        }
        if self.port == 0 {
            return Err("Port must be between 1 and 65535".to_string());
        }
        if self.database.is_empty() || self.database.len() > 63 {
            return Err("Database name must be 1-63 characters".to_string());
        }
        if self.username.is_empty() {
            return Err("Username is required".to_string());
        }
        if self.options.connect_timeout_secs == 0 {
            return Err("Connection timeout must be at least one second".to_string());
        }
        Ok(())
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!("postgresql://{}@{}:{}/{}", self.username, self.host, self.port, self.database)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_DATABASE, DEFAULT_USER)
    }
}

/// A database password.
///
/// `Debug` and `Display` are redacted so the value cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wrap a password. Returns `None` for an empty value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Expose the secret to the driver.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Everything needed to run the probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Target database
    pub connection: ConnectionConfig,
    /// Login password
    pub password: Password,
}
