//! `%(field)s` record templates.
//!
//! A template drives both output modes: in text mode it is the line layout,
//! in JSON mode the fields it references are the fields emitted.

use core::fmt;
use core::str::FromStr;

use serde_json::Value;

use crate::error::{LoggingError, LoggingResult};
use crate::record::LogRecord;

/// Default record template.
pub const DEFAULT_TEMPLATE: &str =
    "%(asctime)s %(levelname)s %(name)s [%(filename)s:%(lineno)d] %(message)s";

/// A record attribute that templates can reference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RecordField {
    Asctime,
    Created,
    LevelName,
    LevelNo,
    Name,
    Message,
    Filename,
    LineNo,
    Module,
    Process,
    ThreadName,
}

impl RecordField {
    pub const ALL: [RecordField; 11] = [
        RecordField::Asctime,
        RecordField::Created,
        RecordField::LevelName,
        RecordField::LevelNo,
        RecordField::Name,
        RecordField::Message,
        RecordField::Filename,
        RecordField::LineNo,
        RecordField::Module,
        RecordField::Process,
        RecordField::ThreadName,
    ];

    /// Key used in templates and, before renaming, in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Self::Asctime => "asctime",
            Self::Created => "created",
            Self::LevelName => "levelname",
            Self::LevelNo => "levelno",
            Self::Name => "name",
            Self::Message => "message",
            Self::Filename => "filename",
            Self::LineNo => "lineno",
            Self::Module => "module",
            Self::Process => "process",
            Self::ThreadName => "threadName",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Created | Self::LevelNo | Self::LineNo | Self::Process
        )
    }

    /// Value of this field for `record`; `asctime` is the pre-rendered timestamp.
    pub fn value(self, record: &LogRecord, asctime: &str) -> Value {
        match self {
            Self::Asctime => Value::from(asctime),
            Self::Created => {
                let micros = record.created.timestamp_micros();
                Value::from(micros as f64 / 1_000_000.0)
            }
            Self::LevelName => Value::from(record.level.name()),
            Self::LevelNo => Value::from(record.level.number()),
            Self::Name => Value::from(display_name(&record.name)),
            Self::Message => Value::from(record.message.as_str()),
            Self::Filename => Value::from(record.filename().unwrap_or("(unknown file)")),
            Self::LineNo => Value::from(record.line.unwrap_or(0)),
            Self::Module => Value::from(record.module.as_deref().unwrap_or("(unknown module)")),
            Self::Process => Value::from(record.process),
            Self::ThreadName => Value::from(record.thread_name.as_str()),
        }
    }
}

/// The root logger is registered under the empty name but rendered as `root`.
pub(crate) fn display_name(name: &str) -> &str {
    if name.is_empty() { "root" } else { name }
}

impl FromStr for RecordField {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| LoggingError::invalid_format(format!("unknown record field '{s}'")))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Conversion {
    Str,
    Int,
    Repr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        field: RecordField,
        left_align: bool,
        width: usize,
        conversion: Conversion,
    },
}

/// A parsed, validated template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> LoggingResult<Self> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self { source, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Referenced fields in order of first appearance.
    pub fn fields(&self) -> Vec<RecordField> {
        let mut fields = Vec::new();
        for segment in &self.segments {
            if let Segment::Field { field, .. } = segment {
                if !fields.contains(field) {
                    fields.push(*field);
                }
            }
        }
        fields
    }

    pub fn uses(&self, field: RecordField) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field { field: f, .. } if *f == field))
    }

    /// Render `record` as a text line.
    pub fn render(&self, record: &LogRecord, asctime: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    field,
                    left_align,
                    width,
                    conversion,
                } => {
                    let text = convert(&field.value(record, asctime), *conversion);
                    pad_into(&mut out, &text, *width, *left_align);
                }
            }
        }
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        // The default template is known to be valid.
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: parse_segments(DEFAULT_TEMPLATE).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(source: &str) -> LoggingResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(pos) = rest.find('%') {
        literal.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        if let Some(after) = rest.strip_prefix('%') {
            literal.push('%');
            rest = after;
            continue;
        }

        let Some(after_paren) = rest.strip_prefix('(') else {
            return Err(LoggingError::invalid_format(format!(
                "placeholder without a field name in '{source}'"
            )));
        };
        let Some(close) = after_paren.find(')') else {
            return Err(LoggingError::invalid_format(format!(
                "unterminated placeholder in '{source}'"
            )));
        };
        let field: RecordField = after_paren[..close].parse()?;
        rest = &after_paren[close + 1..];

        let left_align = match rest.strip_prefix('-') {
            Some(after) => {
                rest = after;
                true
            }
            None => false,
        };
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let width = if digits == 0 {
            0
        } else {
            rest[..digits].parse::<usize>().map_err(|e| {
                LoggingError::invalid_format(format!("bad width in '{source}': {e}"))
            })?
        };
        rest = &rest[digits..];

        let mut chars = rest.chars();
        let conversion = match chars.next() {
            Some('s') => Conversion::Str,
            Some('r') => Conversion::Repr,
            Some('d') if field.is_numeric() => Conversion::Int,
            Some('d') => {
                return Err(LoggingError::invalid_format(format!(
                    "'%({})d' requires a numeric field",
                    field.key()
                )));
            }
            Some(other) => {
                return Err(LoggingError::invalid_format(format!(
                    "unsupported conversion '{other}' in '{source}'"
                )));
            }
            None => {
                return Err(LoggingError::invalid_format(format!(
                    "missing conversion after '%({})' in '{source}'",
                    field.key()
                )));
            }
        };
        rest = chars.as_str();

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Field {
            field,
            left_align,
            width,
            conversion,
        });
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn convert(value: &Value, conversion: Conversion) -> String {
    match (conversion, value) {
        (Conversion::Int, Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{}", f.trunc() as i64),
            _ => n.to_string(),
        },
        (Conversion::Repr, Value::String(s)) => format!("'{s}'"),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}

fn pad_into(out: &mut String, text: &str, width: usize, left_align: bool) {
    let len = text.chars().count();
    let fill = width.saturating_sub(len);
    if !left_align {
        out.extend(std::iter::repeat_n(' ', fill));
    }
    out.push_str(text);
    if left_align {
        out.extend(std::iter::repeat_n(' ', fill));
    }
}
