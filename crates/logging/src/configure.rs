//! Wiring a configuration onto a logger.

use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use crate::config::LoggingConfig;
use crate::error::LoggingResult;
use crate::formatter::RecordFormatter;
use crate::handler::{ConsoleTarget, Handler, StreamHandler};
use crate::level::{LevelSpec, Severity};
use crate::registry::{Logger, LoggerRegistry};
use crate::template::display_name;

/// Applies [`LoggingConfig`]s to the loggers of one registry.
#[derive(Debug, Clone, Copy)]
pub struct LogConfigurator<'r> {
    registry: &'r LoggerRegistry,
}

impl<'r> LogConfigurator<'r> {
    pub fn new(registry: &'r LoggerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r LoggerRegistry {
        self.registry
    }

    /// Configure `config.name`: console handler, extra handlers and level.
    ///
    /// Handlers attached by an earlier configuration of the same logger are
    /// replaced, so repeated calls never duplicate output. Handlers added
    /// directly with [`Logger::add_handler`] are kept. On error nothing is
    /// changed.
    pub fn configure(&self, config: &LoggingConfig) -> LoggingResult<Arc<Logger>> {
        self.apply(config, |target, formatter, level| {
            Arc::new(StreamHandler::console(target, formatter).with_level(level))
        })
    }

    /// Like [`LogConfigurator::configure`], but the console handler writes to
    /// `writer` instead of the process console.
    pub fn configure_with_writer<W>(
        &self,
        config: &LoggingConfig,
        writer: W,
    ) -> LoggingResult<Arc<Logger>>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.apply(config, move |_, formatter, level| {
            Arc::new(StreamHandler::new(writer, formatter).with_level(level))
        })
    }

    fn apply<F>(&self, config: &LoggingConfig, console: F) -> LoggingResult<Arc<Logger>>
    where
        F: FnOnce(ConsoleTarget, RecordFormatter, Severity) -> Arc<dyn Handler>,
    {
        let level = config.level.resolve()?;
        let console_level = config
            .console_level
            .as_ref()
            .map(LevelSpec::resolve)
            .transpose()?
            .unwrap_or(level);
        let formatter = RecordFormatter::new(config.formatter_config()?);

        let mut handlers: Vec<Arc<dyn Handler>> =
            Vec::with_capacity(config.extra_handlers.len() + 1);
        if let Some(target) = config.console {
            handlers.push(console(target, formatter, console_level));
        }
        handlers.extend(config.extra_handlers.iter().cloned());

        let logger = self.registry.get_logger(&config.name)?;
        let replaced = logger.apply_configuration(level, handlers)?;

        tracing::debug!(
            logger = display_name(logger.name()),
            level = %level,
            json = config.json,
            replaced,
            extra_handlers = config.extra_handlers.len(),
            "logger configured"
        );

        Ok(logger)
    }
}

impl LogConfigurator<'static> {
    /// Configurator over [`LoggerRegistry::global`].
    pub fn global() -> Self {
        Self::new(LoggerRegistry::global())
    }
}

/// Configure a logger in the process-wide registry.
///
/// ```no_run
/// use basic_logging::{LoggingConfig, configure_logging};
///
/// let logger = configure_logging(&LoggingConfig::new("app").with_level("INFO"))?;
/// logger.info("hello");
/// # Ok::<(), basic_logging::LoggingError>(())
/// ```
pub fn configure_logging(config: &LoggingConfig) -> LoggingResult<Arc<Logger>> {
    LogConfigurator::global().configure(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoggingError;

    #[test]
    fn invalid_level_leaves_registry_untouched() {
        let registry = LoggerRegistry::new();
        let err = LogConfigurator::new(&registry)
            .configure(&LoggingConfig::new("x").with_level("BOGUS"))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidLevel(_)));
        assert!(!registry.contains("x"));
    }

    #[test]
    fn invalid_time_format_leaves_existing_logger_unchanged() {
        let registry = LoggerRegistry::new();
        let configurator = LogConfigurator::new(&registry);
        let logger = configurator
            .configure(&LoggingConfig::new("x").with_level("DEBUG").with_console(None))
            .unwrap();

        let err = configurator
            .configure(&LoggingConfig::new("x").with_level("ERROR").with_time_format("%Y-%"))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFormat(_)));
        assert_eq!(logger.level().unwrap(), Severity::Debug);
        assert!(logger.handlers().unwrap().is_empty());
    }

    #[test]
    fn unrenderable_time_format_fails_at_configuration() {
        let registry = LoggerRegistry::new();
        let configurator = LogConfigurator::new(&registry);
        assert!(std::ptr::eq(configurator.registry(), &registry));

        let err = configurator
            .configure(&LoggingConfig::new("x").with_time_format("%Y %#z"))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFormat(_)));
        assert!(!registry.contains("x"));
    }

    #[test]
    fn console_opt_out_attaches_only_extras() {
        let registry = LoggerRegistry::new();
        let logger = LogConfigurator::new(&registry)
            .configure(&LoggingConfig::new("x").with_console(None))
            .unwrap();
        assert!(logger.handlers().unwrap().is_empty());
        assert_eq!(logger.level().unwrap(), Severity::Info);
    }
}
