//! Structured logging to stderr.
//!
//! Provides:
//! - Non-blocking stderr output, so stdout carries only the probe report
//! - Build-type conditional log levels
//! - Colors only when stderr is a terminal
//! - Environment variable override via PGPROBE_LOG or RUST_LOG

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Primary log filter variable.
pub const LOG_ENV: &str = "PGPROBE_LOG";

/// Logging configuration.
pub struct LogConfig {
    /// Whether stderr is a terminal (enables ANSI colors)
    pub is_tty: bool,
    /// Optional custom log filter
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Create a new logging configuration.
    pub fn new() -> Self {
        Self { is_tty: atty::is(atty::Stream::Stderr), log_filter: None }
    }

    /// Set custom log filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that must be held until the process is about to exit.
///
/// Dropping this guard flushes pending log entries.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
}

/// Initialize logging with the given configuration.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    let env_filter = build_env_filter(config.log_filter.as_deref());

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(config.is_tty)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    LoggingGuard { _worker_guard: guard }
}

/// Build the environment filter from config or defaults.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    // Priority: custom filter > PGPROBE_LOG > RUST_LOG > default
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Get the default log filter based on build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "info,pgprobe=debug,pgprobe_core=debug,tokio_postgres=warn"
    }
    #[cfg(not(debug_assertions))]
    {
        "warn,tokio_postgres=error"
    }
}
