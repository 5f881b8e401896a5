//! Bridge from `tracing` events to registry loggers.
//!
//! Each event goes to the logger named after its target, with `::` turned
//! into `.` so that module paths line up with the dotted logger hierarchy.

use core::borrow::Borrow;

use ::tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::level::Severity;
use crate::record::{FieldVisitor, LogRecord};
use crate::registry::LoggerRegistry;

/// [`Layer`] that hands `tracing` events to a [`LoggerRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryLayer<R = &'static LoggerRegistry> {
    registry: R,
}

impl<R> RegistryLayer<R>
where
    R: Borrow<LoggerRegistry>,
{
    pub fn new(registry: R) -> Self {
        Self { registry }
    }
}

impl RegistryLayer {
    /// Layer over [`LoggerRegistry::global`].
    pub fn global() -> Self {
        Self::new(LoggerRegistry::global())
    }
}

/// Logger name for a `tracing` target.
pub fn logger_name(target: &str) -> String {
    target.replace("::", ".")
}

impl<S, R> Layer<S> for RegistryLayer<R>
where
    S: Subscriber,
    R: Borrow<LoggerRegistry> + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Severity::from(metadata.level());
        let name = logger_name(metadata.target());

        let Ok(logger) = self.registry.borrow().get_logger(&name) else {
            return;
        };
        if !logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let message = visitor
            .message
            .unwrap_or_else(|| metadata.target().to_owned());

        let mut record = LogRecord::new(name, level, message).with_fields(visitor.fields);
        record.file = metadata.file().map(str::to_owned);
        record.line = metadata.line();
        record.module = metadata.module_path().map(str::to_owned);

        // Write failures cannot be reported from inside a subscriber.
        let _ = logger.handle(&record);
    }
}

/// Route `tracing` events into the process-wide registry.
///
/// Events are pre-filtered by `RUST_LOG` when it is set; otherwise every
/// event reaches the registry and logger levels decide. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    let _ = tracing_subscriber::registry()
        .with(RegistryLayer::global().with_filter(filter))
        .try_init();
}
