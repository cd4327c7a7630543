//! Backend services for pgprobe.
//!
//! - `env` - Settings from environment variables
//! - `connection` - Single tokio-postgres connection and the diagnostic queries
//! - `diagnostics` - The ordered diagnostic sequence

pub mod connection;
pub mod diagnostics;
pub mod env;

pub use connection::{Connector, DiagnosticSession, LiveConnector, LiveSession};
pub use diagnostics::DiagnosticService;
pub use env::{EnvSource, MapEnv, ProcessEnv};
