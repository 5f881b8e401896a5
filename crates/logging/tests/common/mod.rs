#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use basic_logging::{Handler, LogRecord};
use chrono::{DateTime, NaiveDate, Utc};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory console stand-in.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("utf-8 log output")
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("line is valid JSON"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Handler that keeps every record it receives.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub records: Mutex<Vec<LogRecord>>,
}

impl RecordingHandler {
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }
}

impl Handler for RecordingHandler {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub fn instant(year: i32, month: u32, day: u32, micros: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_micro_opt(3, 3, 3, micros))
        .expect("valid test instant")
        .and_utc()
}
