//! `basic-logging` — console logging configuration.
//!
//! One call wires a named logger to a console handler that writes one JSON
//! object (or one text line) per record, with timezone-aware,
//! microsecond-precision timestamps in UTC by default:
//!
//! ```no_run
//! use basic_logging::{LoggingConfig, configure_logging};
//!
//! let log = configure_logging(&LoggingConfig::new("app").with_level("INFO"))?;
//! log.info("hello");
//! // {"timestamp":"2024-05-01 10:00:00.123456+0000","level":"INFO","name":"app",...,"message":"hello"}
//! # Ok::<(), basic_logging::LoggingError>(())
//! ```
//!
//! Loggers live in a [`LoggerRegistry`]; pass one to [`LogConfigurator`] to
//! keep configuration out of process-wide state. [`init`] routes `tracing`
//! events into the global registry.

/// Logger configuration options.
pub mod config;
/// Applying configurations to loggers.
pub mod configure;
/// Error model.
pub mod error;
/// JSON and text record formatting.
pub mod formatter;
/// Output sinks.
pub mod handler;
/// Severity levels.
pub mod level;
/// Log records.
pub mod record;
/// Named logger hierarchy.
pub mod registry;
/// `%(field)s` record templates.
pub mod template;
/// Timestamp patterns and timezones.
pub mod time;

/// `tracing` integration (event bridge layer).
pub mod tracing;

pub use config::{LoggingConfig, deep_merge};
pub use configure::{LogConfigurator, configure_logging};
pub use error::{LoggingError, LoggingResult};
pub use formatter::{FormatterConfig, RecordFormatter};
pub use handler::{ConsoleTarget, Handler, StreamHandler};
pub use level::{LevelSpec, Severity};
pub use record::LogRecord;
pub use registry::{HandlerOrigin, Logger, LoggerRegistry, ROOT_LOGGER};
pub use template::{RecordField, Template};
pub use time::{TimeFormat, TimeZoneSpec};
pub use self::tracing::RegistryLayer;

/// Route `tracing` events into the process-wide logger registry.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
