//! Configuration and emission error model.

use thiserror::Error;

/// Result type used across the crate.
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Errors raised while configuring loggers or writing records.
///
/// Configuration errors are raised synchronously by
/// [`LogConfigurator::configure`](crate::LogConfigurator::configure); the
/// registry is left exactly as it was when one of them is returned.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A date/time pattern or record template could not be parsed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A severity name or number is not one of the known levels.
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// A timezone designator could not be parsed.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Configuration overrides did not deserialize back into a config.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A handler failed to write a record.
    #[error("handler write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock poisoning in the registry or a logger.
    #[error("logger state lock poisoned")]
    Poisoned,
}

impl LoggingError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn invalid_level(msg: impl Into<String>) -> Self {
        Self::InvalidLevel(msg.into())
    }

    pub fn invalid_timezone(msg: impl Into<String>) -> Self {
        Self::InvalidTimezone(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
