//! Record formatting: one JSON object or one text line per record.

use std::collections::HashMap;
use std::io;

use serde_json::{Map, Value};

use crate::record::LogRecord;
use crate::template::{RecordField, Template};
use crate::time::{TimeFormat, TimeZoneSpec};

/// Default key renames for JSON output.
pub fn default_rename_fields() -> HashMap<String, String> {
    HashMap::from([
        (RecordField::Asctime.key().to_string(), "timestamp".to_string()),
        (RecordField::LevelName.key().to_string(), "level".to_string()),
    ])
}

/// Immutable description of how records are rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterConfig {
    pub time_format: TimeFormat,
    pub timezone: TimeZoneSpec,
    pub template: Template,
    pub json: bool,
    /// JSON only: template key → emitted key.
    pub rename_fields: HashMap<String, String>,
    /// JSON only: written at the start of every object.
    pub static_fields: Map<String, Value>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            timezone: TimeZoneSpec::Utc,
            template: Template::default(),
            json: true,
            rename_fields: default_rename_fields(),
            static_fields: Map::new(),
        }
    }
}

/// Converts records into their emitted string form (without the newline).
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    config: FormatterConfig,
    /// Template fields paired with their emitted JSON keys.
    json_keys: Vec<(RecordField, String)>,
}

impl RecordFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        let json_keys: Vec<(RecordField, String)> = config
            .template
            .fields()
            .into_iter()
            .map(|field| {
                let key = config
                    .rename_fields
                    .get(field.key())
                    .cloned()
                    .unwrap_or_else(|| field.key().to_string());
                (field, key)
            })
            .collect();

        if config.json {
            for key in config.static_fields.keys() {
                if json_keys.iter().any(|(_, k)| k == key) {
                    tracing::warn!(key = %key, "static field is overridden by a record field");
                }
            }
        }

        Self { config, json_keys }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Render the record timestamp with the configured pattern and timezone.
    pub fn format_time(&self, record: &LogRecord) -> io::Result<String> {
        self.config
            .time_format
            .format(&record.created, &self.config.timezone)
            .map_err(|_| io::Error::other("timestamp could not be rendered"))
    }

    pub fn format(&self, record: &LogRecord) -> io::Result<String> {
        let asctime = if self.config.template.uses(RecordField::Asctime) {
            self.format_time(record)?
        } else {
            String::new()
        };

        if !self.config.json {
            return Ok(self.config.template.render(record, &asctime));
        }

        let mut object = self.config.static_fields.clone();
        for (field, key) in &self.json_keys {
            object.insert(key.clone(), field.value(record, &asctime));
        }
        for (key, value) in &record.fields {
            if self.json_keys.iter().any(|(_, k)| k == key) {
                tracing::debug!(key = %key, "extra field shadows a record field; skipping it");
                continue;
            }
            object.insert(key.clone(), value.clone());
        }

        Ok(serde_json::to_string(&object)?)
    }
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new(FormatterConfig::default())
    }
}
