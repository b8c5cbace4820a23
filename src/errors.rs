//! Error types for the speedtest sensor
//!
//! Every variant here is terminal: the pipeline stops and the error is rendered
//! as the error-shaped PRTG document. Rate limiting is the only transient
//! condition and it is handled inside the invoker; it only surfaces here once
//! the retry ceiling is reached.

/// Terminal failures of a sensor run
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The supplied source address is not an IPv4 or IPv6 literal
    #[error("Invalid IP address: '{0}'")]
    InvalidIp(String),

    /// Command line could not be parsed
    #[error("Invalid arguments: {0}")]
    Usage(String),

    /// Settings file or environment could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The speedtest executable could not be started
    #[error("Failed to launch speedtest: {0}")]
    Launch(#[from] std::io::Error),

    /// Speedtest kept reporting rate limiting until the attempt ceiling
    #[error("Speedtest rate limited (429) after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Speedtest exited with a non-zero code other than the rate-limit signal
    #[error("Speedtest failed with exit code {code}")]
    ToolFailed { code: i32 },

    /// Speedtest was terminated without an exit code (e.g. killed by a signal)
    #[error("Speedtest terminated without an exit code")]
    ToolTerminated,

    /// Speedtest exited successfully but wrote nothing
    #[error("Speedtest returned no output")]
    EmptyOutput,

    /// Speedtest output was not valid JSON
    #[error("Speedtest returned malformed output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    /// Output parsed but a required record is missing or empty
    #[error("Speedtest returned incomplete data: missing {missing}")]
    IncompleteData { missing: &'static str },

    /// Anything else caught at the outermost level
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SensorError {
    /// Short machine-friendly label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            SensorError::InvalidIp(_) => "invalid_ip",
            SensorError::Usage(_) => "usage",
            SensorError::Config(_) => "config",
            SensorError::Launch(_) => "launch",
            SensorError::RetriesExhausted { .. } => "retries_exhausted",
            SensorError::ToolFailed { .. } => "tool_failed",
            SensorError::ToolTerminated => "tool_terminated",
            SensorError::EmptyOutput => "empty_output",
            SensorError::MalformedOutput(_) => "malformed_output",
            SensorError::IncompleteData { .. } => "incomplete_data",
            SensorError::Unexpected(_) => "unexpected",
        }
    }
}

/// Convenience `Result` alias for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;
