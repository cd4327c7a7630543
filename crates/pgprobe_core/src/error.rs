//! Error types for the connectivity probe.
//!
//! Errors are split into configuration problems, detected before any network
//! activity, and runtime problems. Runtime problems are further split into the
//! operational class (the server could not be reached or refused us) and
//! everything else.

use thiserror::Error;

/// Main error type for pgprobe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Missing or malformed configuration.
    #[error("{message}")]
    Config {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
    },

    /// Database connection failed.
    #[error("{message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication failed.
    #[error("{message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
    },

    /// A diagnostic query was rejected by the server.
    #[error("{message}")]
    Query {
        /// PostgreSQL error message.
        message: String,
        /// Additional detail from PostgreSQL.
        detail: Option<String>,
        /// PostgreSQL hint.
        hint: Option<String>,
        /// PostgreSQL error code (e.g., "42883").
        code: Option<String>,
    },

    /// Unexpected internal error.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ProbeError {
    // ========== Constructors ==========

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), hint: None }
    }

    /// Create a new config error with an actionable hint.
    pub fn config_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config { message: message.into(), hint: Some(hint.into()) }
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a new connection error with source.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            hint: Some("Check username and password".to_string()),
        }
    }

    /// Create a new query error with PostgreSQL details.
    pub fn query(
        message: impl Into<String>,
        detail: Option<String>,
        hint: Option<String>,
        code: Option<String>,
    ) -> Self {
        Self::Query { message: message.into(), detail, hint, code }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create a new internal error with source.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Box::new(source)) }
    }

    // ========== Methods ==========

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Check if this error belongs to the operational class.
    ///
    /// Operational errors get the troubleshooting block. Authentication
    /// failures are included: they surface at connect time just like an
    /// unreachable host.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Authentication { .. })
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "Config",
            Self::Connection { .. } => "Connection",
            Self::Authentication { .. } => "Authentication",
            Self::Query { .. } => "Query",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            Self::Connection { .. } => Some("Check that the database server is reachable"),
            Self::Authentication { hint, .. } => hint.as_deref(),
            Self::Query { hint, .. } => hint.as_deref(),
            Self::Internal { .. } => None,
        }
    }

    /// Get PostgreSQL error code (if applicable).
    pub fn pg_code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ========== Error Conversions ==========

impl ProbeError {
    /// Classify an error returned while establishing a connection.
    ///
    /// Nothing has been queried yet, so every failure here is operational:
    /// 28xxx becomes `Authentication`, anything else (too many clients, no
    /// CONNECT privilege, unknown database, refused socket) becomes `Connection`.
    pub fn from_connect_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message().to_string();
            let code_str = db_err.code().code();

            if code_str == "28P01" {
                return ProbeError::Authentication {
                    message,
                    hint: Some("Invalid password - check your credentials".to_string()),
                };
            }
            if code_str.starts_with("28") {
                return ProbeError::Authentication {
                    message,
                    hint: Some(
                        "Authentication failed - check pg_hba.conf and the user name".to_string(),
                    ),
                };
            }
            return ProbeError::Connection { message, source: Some(Box::new(err)) };
        }

        ProbeError::from(err)
    }
}

/// Convert from tokio_postgres::Error to ProbeError.
///
/// Used for errors on an established connection. Connect-time errors go
/// through [`ProbeError::from_connect_error`].
impl From<tokio_postgres::Error> for ProbeError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message().to_string();
            let code_str = db_err.code().code();

            // Connection exceptions (08xxx) and operator intervention (57P0x:
            // admin/crash shutdown) mean the connection is gone.
            if code_str.starts_with("08") || code_str.starts_with("57P0") {
                return ProbeError::Connection { message, source: Some(Box::new(err)) };
            }
            return ProbeError::Query {
                message,
                detail: db_err.detail().map(String::from),
                hint: db_err.hint().map(String::from),
                code: Some(code_str.to_string()),
            };
        }

        if err.is_closed() {
            return ProbeError::Connection {
                message: "server closed the connection unexpectedly".to_string(),
                source: Some(Box::new(err)),
            };
        }

        // I/O failures, timeouts and protocol errors: the server was not reached.
        ProbeError::Connection { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Convert from std::io::Error to ProbeError.
///
/// Only report output goes through `std::io`, so a failure here is unexpected.
impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Internal { message: format!("I/O error: {err}"), source: Some(Box::new(err)) }
    }
}
