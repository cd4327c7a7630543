//! Data models for pgprobe.
//!
//! - `connection` - ConnectionConfig, Password, ProbeSettings
//! - `diagnostics` - ServerVersion, ExtensionStatus, ConnectionIdentity, ProbeReport

pub mod connection;
pub mod diagnostics;

pub use connection::{ConnectionConfig, ConnectionOptions, Password, ProbeSettings};
pub use diagnostics::{
    ConnectionIdentity, ExtensionStatus, ProbeReport, ServerVersion, VECTOR_EXTENSION,
};
