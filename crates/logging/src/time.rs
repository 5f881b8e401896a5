//! Timestamp patterns and timezone selection.
//!
//! Patterns are strftime strings as understood by `chrono`, with one
//! adjustment: `%f` renders the six-digit microsecond fraction instead of
//! chrono's nanoseconds, so `%Y-%m-%d %H:%M:%S.%f%z` produces
//! `2024-05-01 10:00:00.123456+0000`.

use core::fmt::{self, Write as _};
use core::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LoggingError, LoggingResult};

/// Default timestamp pattern: date, time, microseconds and UTC offset.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%f%z";

/// A validated timestamp pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat {
    source: String,
    pattern: String,
}

impl TimeFormat {
    /// Validate `source` and translate it to a chrono pattern.
    pub fn new(source: impl Into<String>) -> LoggingResult<Self> {
        let source = source.into();
        let pattern = translate(&source);

        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(LoggingError::invalid_format(format!(
                "'{source}' is not a valid date/time pattern"
            )));
        }

        let format = Self { source, pattern };
        // Parse-only specifiers (e.g. `%#z`) pass item parsing but cannot render.
        if format.format(&DateTime::<Utc>::UNIX_EPOCH, &TimeZoneSpec::Utc).is_err() {
            return Err(LoggingError::invalid_format(format!(
                "'{}' cannot be used to render timestamps",
                format.source
            )));
        }

        Ok(format)
    }

    /// The pattern as supplied by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render `instant` in `zone`.
    pub fn format(&self, instant: &DateTime<Utc>, zone: &TimeZoneSpec) -> Result<String, fmt::Error> {
        match zone {
            TimeZoneSpec::Utc => self.format_in(instant, &Utc),
            TimeZoneSpec::Local => self.format_in(instant, &Local),
            TimeZoneSpec::Fixed(offset) => self.format_in(instant, offset),
        }
    }

    fn format_in<Tz>(&self, instant: &DateTime<Utc>, zone: &Tz) -> Result<String, fmt::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        let items = StrftimeItems::new(&self.pattern);
        write!(out, "{}", instant.with_timezone(zone).format_with_items(items))?;
        Ok(out)
    }

    /// Parse a string produced by [`TimeFormat::format`] back into an instant.
    ///
    /// Patterns without an offset are read as UTC.
    pub fn parse(&self, rendered: &str) -> LoggingResult<DateTime<FixedOffset>> {
        match DateTime::parse_from_str(rendered, &self.pattern) {
            Ok(parsed) => Ok(parsed),
            Err(with_offset) => NaiveDateTime::parse_from_str(rendered, &self.pattern)
                .map(|naive| naive.and_utc().fixed_offset())
                .map_err(|_| {
                    LoggingError::invalid_format(format!(
                        "'{rendered}' does not match '{}': {with_offset}",
                        self.source
                    ))
                }),
        }
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            source: DEFAULT_TIME_FORMAT.to_string(),
            pattern: translate(DEFAULT_TIME_FORMAT),
        }
    }
}

fn translate(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 4);
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('f') => out.push_str("%6f"),
            Some(next) => {
                out.push('%');
                out.push(next);
            }
            // Trailing '%' is left for chrono to reject.
            None => out.push('%'),
        }
    }

    out
}

/// Timezone in which timestamps are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeZoneSpec {
    #[default]
    Utc,
    /// The host's local timezone, with its proper offset.
    Local,
    Fixed(FixedOffset),
}

impl FromStr for TimeZoneSpec {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "gmt" => return Ok(Self::Utc),
            "local" => return Ok(Self::Local),
            _ => {}
        }

        parse_offset(trimmed)
            .map(Self::Fixed)
            .ok_or_else(|| LoggingError::invalid_timezone(format!("'{s}'")))
    }
}

/// Parse `+HH`, `+HHMM` or `+HH:MM` (and the `-` forms).
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl TryFrom<String> for TimeZoneSpec {
    type Error = LoggingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeZoneSpec> for String {
    fn from(zone: TimeZoneSpec) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => f.write_str("UTC"),
            Self::Local => f.write_str("local"),
            Self::Fixed(offset) => fmt::Display::fmt(offset, f),
        }
    }
}
