//! Configuration options for a logger.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LoggingError, LoggingResult};
use crate::formatter::{FormatterConfig, default_rename_fields};
use crate::handler::{ConsoleTarget, Handler};
use crate::level::LevelSpec;
use crate::registry::ROOT_LOGGER;
use crate::template::{DEFAULT_TEMPLATE, Template};
use crate::time::{DEFAULT_TIME_FORMAT, TimeFormat, TimeZoneSpec};

/// Options for [`LogConfigurator::configure`](crate::LogConfigurator::configure).
///
/// Level, time format and template are kept as written and validated when
/// the configuration is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logger to configure; empty for the root logger.
    pub name: String,
    pub level: LevelSpec,
    pub time_format: String,
    pub timezone: TimeZoneSpec,
    /// `%(field)s` template: text layout, or field selection in JSON mode.
    pub template: String,
    pub json: bool,
    pub rename_fields: HashMap<String, String>,
    pub static_fields: Map<String, Value>,
    /// Console stream, or `None` to attach no console handler.
    pub console: Option<ConsoleTarget>,
    /// Minimum level of the console handler; defaults to `level`.
    pub console_level: Option<LevelSpec>,
    /// Attached after the console handler, unmodified.
    #[serde(skip)]
    pub extra_handlers: Vec<Arc<dyn Handler>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: ROOT_LOGGER.to_string(),
            level: LevelSpec::default(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            timezone: TimeZoneSpec::Utc,
            template: DEFAULT_TEMPLATE.to_string(),
            json: true,
            rename_fields: default_rename_fields(),
            static_fields: Map::new(),
            console: Some(ConsoleTarget::Stdout),
            console_level: None,
            extra_handlers: Vec::new(),
        }
    }
}

impl LoggingConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json(input: &str) -> LoggingResult<Self> {
        serde_json::from_str(input).map_err(|e| LoggingError::invalid_config(e.to_string()))
    }

    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    pub fn with_timezone(mut self, timezone: TimeZoneSpec) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_rename_fields(mut self, rename_fields: HashMap<String, String>) -> Self {
        self.rename_fields = rename_fields;
        self
    }

    pub fn with_static_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.static_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_console(mut self, console: Option<ConsoleTarget>) -> Self {
        self.console = console;
        self
    }

    pub fn with_console_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.console_level = Some(level.into());
        self
    }

    pub fn with_extra_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.extra_handlers.push(handler);
        self
    }

    /// Validate the time format and template into a formatter description.
    pub fn formatter_config(&self) -> LoggingResult<FormatterConfig> {
        Ok(FormatterConfig {
            time_format: TimeFormat::new(self.time_format.as_str())?,
            timezone: self.timezone,
            template: Template::parse(self.template.as_str())?,
            json: self.json,
            rename_fields: self.rename_fields.clone(),
            static_fields: self.static_fields.clone(),
        })
    }

    /// Deep-merge `overrides` into this configuration.
    ///
    /// Nested objects merge key by key; any other value replaces what was
    /// there. Extra handlers are carried over unchanged.
    pub fn merged_with(&self, overrides: Value) -> LoggingResult<Self> {
        let mut base =
            serde_json::to_value(self).map_err(|e| LoggingError::invalid_config(e.to_string()))?;
        deep_merge(&mut base, overrides);

        let mut merged: Self =
            serde_json::from_value(base).map_err(|e| LoggingError::invalid_config(e.to_string()))?;
        merged.extra_handlers = self.extra_handlers.clone();
        Ok(merged)
    }
}

/// Merge `other` into `base`, recursing where both sides are objects.
pub fn deep_merge(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Object(base), Value::Object(other)) => {
            for (key, value) in other {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::level::Severity;

    #[test]
    fn deep_merge_merges_nested_objects() {
        let mut base = json!({"foo": "bar", "more": {"cond": "true", "last": 424}});
        deep_merge(
            &mut base,
            json!({"num": 23, "foo": "not-bar", "more": {"additional": 333}}),
        );
        assert_eq!(
            base,
            json!({"foo": "not-bar", "more": {"cond": "true", "last": 424, "additional": 333}, "num": 23})
        );
    }

    #[test]
    fn deep_merge_replaces_non_objects() {
        let mut base = json!({"l0": {"l1": "L1", "l2": "L2"}});
        deep_merge(&mut base, json!({"l0": {"l2": {"l3": "L3"}}}));
        deep_merge(&mut base, json!({"foo": "bar"}));
        assert_eq!(base, json!({"l0": {"l1": "L1", "l2": {"l3": "L3"}}, "foo": "bar"}));
    }

    #[test]
    fn overrides_apply_to_typed_config() {
        let config = LoggingConfig::new("app")
            .merged_with(json!({"console_level": "ERROR", "rename_fields": {"message": "@msg"}}))
            .unwrap();
        assert_eq!(config.name, "app");
        assert_eq!(config.console_level, Some(LevelSpec::from("ERROR")));
        assert_eq!(config.rename_fields.get("message").map(String::as_str), Some("@msg"));
        assert_eq!(config.rename_fields.get("asctime").map(String::as_str), Some("timestamp"));
    }

    #[test]
    fn bad_overrides_are_config_errors() {
        let err = LoggingConfig::default()
            .merged_with(json!({"timezone": "Mars/Olympus"}))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_override_keys_are_config_errors() {
        let err = LoggingConfig::new("app")
            .merged_with(json!({"handlers": {"console": {"level": "ERROR"}}}))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidConfig(_)));

        let err = LoggingConfig::new("app")
            .merged_with(json!({"levle": "DEBUG"}))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidConfig(_)));

        assert!(matches!(
            LoggingConfig::from_json(r#"{"name": "svc", "jsn": false}"#),
            Err(LoggingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn parses_from_json_with_defaults() {
        let config = LoggingConfig::from_json(r#"{"name": "svc", "level": 10, "console": "stderr"}"#).unwrap();
        assert_eq!(config.level.resolve().unwrap(), Severity::Debug);
        assert_eq!(config.console, Some(ConsoleTarget::Stderr));
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert!(config.json);
    }
}
