//! Output sinks.

use core::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::MakeWriter;

use crate::formatter::RecordFormatter;
use crate::level::Severity;
use crate::record::LogRecord;

/// A sink that receives records.
///
/// Loggers call [`Handler::write`] only for records at or above
/// [`Handler::level`].
pub trait Handler: Send + Sync + fmt::Debug {
    fn write(&self, record: &LogRecord) -> io::Result<()>;

    fn level(&self) -> Severity {
        Severity::NotSet
    }
}

/// Formats records and writes each as one line to a [`MakeWriter`].
pub struct StreamHandler<W> {
    writer: W,
    formatter: RecordFormatter,
    level: Severity,
}

impl<W> StreamHandler<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    pub fn new(writer: W, formatter: RecordFormatter) -> Self {
        Self {
            writer,
            formatter,
            level: Severity::NotSet,
        }
    }

    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    pub fn formatter(&self) -> &RecordFormatter {
        &self.formatter
    }
}

impl StreamHandler<ConsoleWriter> {
    /// Handler writing to standard output or standard error.
    pub fn console(target: ConsoleTarget, formatter: RecordFormatter) -> Self {
        Self::new(ConsoleWriter(target), formatter)
    }
}

impl<W> Handler for StreamHandler<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let mut buffer = self.formatter.format(record)?.into_bytes();
        buffer.push(b'\n');
        // One write per record so concurrent lines do not interleave.
        let mut writer = self.writer.make_writer();
        writer.write_all(&buffer)?;
        writer.flush()
    }

    fn level(&self) -> Severity {
        self.level
    }
}

impl<W> fmt::Debug for StreamHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("writer", &core::any::type_name::<W>())
            .field("formatter", &self.formatter)
            .field("level", &self.level)
            .finish()
    }
}

/// Console stream a console handler writes to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// [`MakeWriter`] over the process console.
#[derive(Debug, Copy, Clone)]
pub struct ConsoleWriter(ConsoleTarget);

impl ConsoleWriter {
    pub fn target(&self) -> ConsoleTarget {
        self.0
    }
}

/// Locked console stream.
pub enum ConsoleStream {
    Stdout(io::StdoutLock<'static>),
    Stderr(io::StderrLock<'static>),
}

impl Write for ConsoleStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(out) => out.write(buf),
            Self::Stderr(err) => err.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.write_all(buf),
            Self::Stderr(err) => err.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::Stderr(err) => err.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = ConsoleStream;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0 {
            ConsoleTarget::Stdout => ConsoleStream::Stdout(io::stdout().lock()),
            ConsoleTarget::Stderr => ConsoleStream::Stderr(io::stderr().lock()),
        }
    }
}
