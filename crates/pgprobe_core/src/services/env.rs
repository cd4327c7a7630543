//! Configuration loading from environment variables.
//!
//! Settings come from pluggable sources:
//!
//! - **ProcessEnv**: the real process environment
//! - **MapEnv**: a fixed in-memory map, used by tests and embedders
//!
//! Every variable except `POSTGRES_PASSWORD` falls back to a default.

use crate::error::ProbeError;
use crate::models::connection::{
    ConnectionConfig, Password, ProbeSettings, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_USER,
};

use std::collections::HashMap;

/// Server host variable.
pub const HOST_VAR: &str = "POSTGRES_HOST";
/// Server port variable.
pub const PORT_VAR: &str = "POSTGRES_PORT";
/// Database name variable.
pub const DATABASE_VAR: &str = "POSTGRES_DB";
/// Login user variable.
pub const USER_VAR: &str = "POSTGRES_USER";
/// Password variable. Required.
pub const PASSWORD_VAR: &str = "POSTGRES_PASSWORD";

// ============================================================================
// EnvSource Trait
// ============================================================================

/// A source of configuration variables.
pub trait EnvSource {
    /// Look up a variable. Unset and non-unicode values are both `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Reads the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn name(&self) -> &'static str {
        "ProcessEnv"
    }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn name(&self) -> &'static str {
        "MapEnv"
    }
}

// ============================================================================
// Settings
// ============================================================================

impl ProbeSettings {
    /// Build settings from an environment source.
    ///
    /// Fails with a config error, before anything touches the network. The
    /// port is parsed first, then the password is checked, then the
    /// connection config is validated.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ProbeError> {
        let host = env.get(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env.get(PORT_VAR) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        let database = env.get(DATABASE_VAR).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let username = env.get(USER_VAR).unwrap_or_else(|| DEFAULT_USER.to_string());

        let password = env.get(PASSWORD_VAR).and_then(Password::new).ok_or_else(|| {
            ProbeError::config_with_hint(
                format!("{PASSWORD_VAR} environment variable is not set"),
                format!("Set it with: export {PASSWORD_VAR}='your-password'"),
            )
        })?;

        let connection = ConnectionConfig::new(host, port, database, username);
        connection.validate().map_err(ProbeError::config)?;

        tracing::debug!(
            source = env.name(),
            url = %connection.display_url(),
            "Settings loaded"
        );

        Ok(Self { connection, password })
    }
}

fn parse_port(raw: &str) -> Result<u16, ProbeError> {
    raw.trim().parse::<u16>().map_err(|e| {
        ProbeError::config_with_hint(
            format!("{PORT_VAR} is not a valid port number: {raw:?} ({e})"),
            format!("Set {PORT_VAR} to a number between 1 and 65535"),
        )
    })
}
