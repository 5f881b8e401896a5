//! Severity levels.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LoggingError, LoggingResult};

/// Ordered severity of a record, and minimum severity of a logger or handler.
///
/// `NotSet` on a logger means "inherit from the nearest ancestor"; on a
/// handler it lets every record through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Severity {
    #[default]
    NotSet = 0,
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::NotSet,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Canonical upper-case name, as rendered in `levelname`.
    pub fn name(self) -> &'static str {
        match self {
            Self::NotSet => "NOTSET",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Numeric value, as rendered in `levelno`.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Parse a level name. Case-insensitive; accepts `WARN` and `FATAL`.
    pub fn from_name(name: &str) -> LoggingResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(Self::NotSet),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            _ => Err(LoggingError::invalid_level(format!(
                "unknown level name '{name}'"
            ))),
        }
    }

    /// Parse one of the standard numeric values (0, 10, 20, 30, 40, 50).
    pub fn from_number(value: u32) -> LoggingResult<Self> {
        Self::ALL
            .into_iter()
            .find(|level| u32::from(level.number()) == value)
            .ok_or_else(|| LoggingError::invalid_level(format!("unknown level number {value}")))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(number) => Self::from_number(number),
            Err(_) => Self::from_name(s),
        }
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

/// A level as written in configuration: a name or a number.
///
/// Kept unvalidated until configuration time so that a bad value surfaces as
/// [`LoggingError::InvalidLevel`] from the configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Number(u32),
    Name(String),
}

impl LevelSpec {
    pub fn resolve(&self) -> LoggingResult<Severity> {
        match self {
            Self::Number(value) => Severity::from_number(*value),
            Self::Name(name) => name.parse(),
        }
    }
}

impl Default for LevelSpec {
    fn default() -> Self {
        Self::Name(Severity::Info.name().to_string())
    }
}

impl From<Severity> for LevelSpec {
    fn from(level: Severity) -> Self {
        Self::Name(level.name().to_string())
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<u32> for LevelSpec {
    fn from(value: u32) -> Self {
        Self::Number(value)
    }
}
