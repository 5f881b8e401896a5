//! Log records and the `tracing` field visitor that fills them.

use core::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};

use crate::level::Severity;

/// Field holding the human-readable message in `tracing` events.
pub(crate) const MESSAGE_FIELD: &str = "message";

/// A single emitted event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Creation instant, truncated to microseconds.
    pub created: DateTime<Utc>,
    pub level: Severity,
    /// Dotted name of the logger the record was emitted on.
    pub name: String,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub module: Option<String>,
    pub process: u32,
    pub thread_name: String,
    /// Structured extras attached by the caller.
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Build a record stamped with the current time and thread.
    pub fn new(name: impl Into<String>, level: Severity, message: impl Into<String>) -> Self {
        let current = std::thread::current();
        Self {
            created: Utc::now().trunc_subsecs(6),
            level,
            name: name.into(),
            message: message.into(),
            file: None,
            line: None,
            module: None,
            process: std::process::id(),
            thread_name: current.name().unwrap_or("unnamed").to_string(),
            fields: Map::new(),
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created.trunc_subsecs(6);
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// File name without its directories, as rendered in `filename`.
    pub fn filename(&self) -> Option<&str> {
        self.file
            .as_deref()
            .map(|path| path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path))
    }
}

/// Collects the fields of a `tracing` event.
///
/// The `message` field becomes the record message; everything else is kept as
/// a structured extra.
#[derive(Debug, Default)]
pub(crate) struct FieldVisitor {
    pub message: Option<String>,
    pub fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == MESSAGE_FIELD {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return;
        }
        // Raw identifiers arrive with their prefix.
        let key = name.strip_prefix("r#").unwrap_or(name);
        self.fields.insert(key.to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        // `log` crate metadata is carried on the record itself.
        if field.name().starts_with("log.") {
            return;
        }
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_strips_directories() {
        let record = LogRecord::new("app", Severity::Info, "hi").with_location("src/app/main.rs", 7);
        assert_eq!(record.filename(), Some("main.rs"));
        assert_eq!(record.line, Some(7));
    }

    #[test]
    fn module_is_carried_on_the_record() {
        let record = LogRecord::new("app", Severity::Info, "hi").with_module("app::server");
        assert_eq!(record.module.as_deref(), Some("app::server"));
    }

    #[test]
    fn created_is_truncated_to_microseconds() {
        let record = LogRecord::new("app", Severity::Info, "hi");
        assert_eq!(record.created.timestamp_subsec_nanos() % 1_000, 0);
    }
}
