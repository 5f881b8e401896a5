//! Named logger registry.
//!
//! Loggers form a dotted hierarchy (`app.db` is a child of `app`) under a root
//! logger registered as `""`. Records propagate from a logger to the handlers
//! of its ancestors unless propagation is switched off, and a logger whose
//! level is `NotSet` inherits the level of its nearest configured ancestor.

use std::collections::HashMap;
use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, LazyLock, RwLock};

use serde_json::{Map, Value};

use crate::error::{LoggingError, LoggingResult};
use crate::handler::Handler;
use crate::level::Severity;
use crate::record::LogRecord;

/// Name under which the root logger is registered.
pub const ROOT_LOGGER: &str = "";

static GLOBAL: LazyLock<LoggerRegistry> = LazyLock::new(LoggerRegistry::new);

/// Who attached a handler; configuration only replaces its own handlers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandlerOrigin {
    Configurator,
    Caller,
}

#[derive(Debug, Clone)]
struct HandlerEntry {
    handler: Arc<dyn Handler>,
    origin: HandlerOrigin,
}

#[derive(Debug)]
struct LoggerState {
    level: Severity,
    propagate: bool,
    handlers: Vec<HandlerEntry>,
}

/// A named logger.
#[derive(Debug)]
pub struct Logger {
    name: String,
    state: RwLock<LoggerState>,
    parent: RwLock<Option<Arc<Logger>>>,
}

impl Logger {
    fn new(name: String, level: Severity, parent: Option<Arc<Logger>>) -> Self {
        Self {
            name,
            state: RwLock::new(LoggerState {
                level,
                propagate: true,
                handlers: Vec::new(),
            }),
            parent: RwLock::new(parent),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_LOGGER
    }

    pub fn level(&self) -> LoggingResult<Severity> {
        Ok(self.state.read().map_err(|_| LoggingError::Poisoned)?.level)
    }

    pub fn set_level(&self, level: Severity) -> LoggingResult<()> {
        self.state.write().map_err(|_| LoggingError::Poisoned)?.level = level;
        Ok(())
    }

    /// Own level, or the nearest ancestor's when this logger is `NotSet`.
    pub fn effective_level(&self) -> LoggingResult<Severity> {
        let level = self.level()?;
        if level != Severity::NotSet {
            return Ok(level);
        }
        match self.parent()? {
            Some(parent) => parent.effective_level(),
            None => Ok(Severity::NotSet),
        }
    }

    pub fn is_enabled_for(&self, level: Severity) -> bool {
        self.effective_level()
            .map(|threshold| level >= threshold)
            .unwrap_or(false)
    }

    pub fn propagate(&self) -> LoggingResult<bool> {
        Ok(self.state.read().map_err(|_| LoggingError::Poisoned)?.propagate)
    }

    pub fn set_propagate(&self, propagate: bool) -> LoggingResult<()> {
        self.state.write().map_err(|_| LoggingError::Poisoned)?.propagate = propagate;
        Ok(())
    }

    pub fn parent(&self) -> LoggingResult<Option<Arc<Logger>>> {
        Ok(self.parent.read().map_err(|_| LoggingError::Poisoned)?.clone())
    }

    fn set_parent(&self, parent: Arc<Logger>) -> LoggingResult<()> {
        *self.parent.write().map_err(|_| LoggingError::Poisoned)? = Some(parent);
        Ok(())
    }

    /// Append a caller-owned handler. Configuration never removes it.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) -> LoggingResult<()> {
        self.state
            .write()
            .map_err(|_| LoggingError::Poisoned)?
            .handlers
            .push(HandlerEntry {
                handler,
                origin: HandlerOrigin::Caller,
            });
        Ok(())
    }

    /// Remove every handler, whoever attached it.
    pub fn clear_handlers(&self) -> LoggingResult<()> {
        self.state
            .write()
            .map_err(|_| LoggingError::Poisoned)?
            .handlers
            .clear();
        Ok(())
    }

    pub fn handlers(&self) -> LoggingResult<Vec<Arc<dyn Handler>>> {
        let state = self.state.read().map_err(|_| LoggingError::Poisoned)?;
        Ok(state.handlers.iter().map(|e| Arc::clone(&e.handler)).collect())
    }

    pub fn handler_origins(&self) -> LoggingResult<Vec<HandlerOrigin>> {
        let state = self.state.read().map_err(|_| LoggingError::Poisoned)?;
        Ok(state.handlers.iter().map(|e| e.origin).collect())
    }

    /// Swap out the configurator's handlers and set the level in one step.
    pub(crate) fn apply_configuration(
        &self,
        level: Severity,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> LoggingResult<usize> {
        let mut state = self.state.write().map_err(|_| LoggingError::Poisoned)?;
        let before = state.handlers.len();
        state
            .handlers
            .retain(|e| e.origin == HandlerOrigin::Caller);
        let removed = before - state.handlers.len();
        state
            .handlers
            .extend(handlers.into_iter().map(|handler| HandlerEntry {
                handler,
                origin: HandlerOrigin::Configurator,
            }));
        state.level = level;
        Ok(removed)
    }

    /// Pass `record` to this logger's handlers and, while propagating, to
    /// every ancestor's. Every eligible handler is tried; the first write
    /// error is returned.
    pub fn handle(&self, record: &LogRecord) -> LoggingResult<()> {
        let mut first_error = None;
        let (handlers, mut propagate) = self.snapshot()?;
        dispatch(&handlers, record, &mut first_error);

        let mut next = self.parent()?;
        while propagate {
            let Some(logger) = next else { break };
            let (handlers, logger_propagates) = logger.snapshot()?;
            dispatch(&handlers, record, &mut first_error);
            propagate = logger_propagates;
            next = logger.parent()?;
        }

        match first_error {
            Some(err) => Err(LoggingError::Io(err)),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> LoggingResult<(Vec<Arc<dyn Handler>>, bool)> {
        let state = self.state.read().map_err(|_| LoggingError::Poisoned)?;
        let handlers = state.handlers.iter().map(|e| Arc::clone(&e.handler)).collect();
        Ok((handlers, state.propagate))
    }

    /// Emit `message` with structured `fields` if `level` is enabled.
    #[track_caller]
    pub fn log_with(
        &self,
        level: Severity,
        message: impl Into<String>,
        fields: Map<String, Value>,
    ) -> LoggingResult<()> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }
        let location = Location::caller();
        let module = Path::new(location.file())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());

        let mut record = LogRecord::new(self.name.clone(), level, message)
            .with_location(location.file(), location.line())
            .with_fields(fields);
        record.module = module;
        self.handle(&record)
    }

    #[track_caller]
    pub fn log(&self, level: Severity, message: impl Into<String>) -> LoggingResult<()> {
        self.log_with(level, message, Map::new())
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        let _ = self.log(Severity::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        let _ = self.log(Severity::Info, message);
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        let _ = self.log(Severity::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        let _ = self.log(Severity::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        let _ = self.log(Severity::Critical, message);
    }
}

fn dispatch(
    handlers: &[Arc<dyn Handler>],
    record: &LogRecord,
    first_error: &mut Option<std::io::Error>,
) {
    for handler in handlers {
        if record.level < handler.level() {
            continue;
        }
        if let Err(err) = handler.write(record) {
            first_error.get_or_insert(err);
        }
    }
}

/// Registry of named loggers.
///
/// Pass a registry explicitly where isolation matters (tests, embedded
/// use); [`LoggerRegistry::global`] is the process-wide default.
#[derive(Debug)]
pub struct LoggerRegistry {
    root: Arc<Logger>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        let root = Arc::new(Logger::new(ROOT_LOGGER.to_string(), Severity::Warning, None));
        let loggers = HashMap::from([(ROOT_LOGGER.to_string(), Arc::clone(&root))]);
        Self {
            root,
            loggers: RwLock::new(loggers),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static LoggerRegistry {
        &GLOBAL
    }

    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    /// Fetch the logger called `name`, creating it on first use.
    ///
    /// `"root"` and `""` both name the root logger.
    pub fn get_logger(&self, name: &str) -> LoggingResult<Arc<Logger>> {
        let name = normalize(name);
        {
            let loggers = self.loggers.read().map_err(|_| LoggingError::Poisoned)?;
            if let Some(logger) = loggers.get(name) {
                return Ok(Arc::clone(logger));
            }
        }

        let mut loggers = self.loggers.write().map_err(|_| LoggingError::Poisoned)?;
        if let Some(logger) = loggers.get(name) {
            return Ok(Arc::clone(logger));
        }

        let parent = ancestors(name)
            .find_map(|ancestor| loggers.get(ancestor).cloned())
            .unwrap_or_else(|| Arc::clone(&self.root));
        let logger = Arc::new(Logger::new(name.to_string(), Severity::NotSet, Some(parent)));

        // Existing descendants whose nearest ancestor was further up now hang
        // off the new logger.
        let prefix = format!("{name}.");
        for existing in loggers.values() {
            if !existing.name.starts_with(&prefix) {
                continue;
            }
            let closer = existing
                .parent()?
                .map_or(true, |current| current.name.len() < name.len());
            if closer {
                existing.set_parent(Arc::clone(&logger))?;
            }
        }

        loggers.insert(name.to_string(), Arc::clone(&logger));
        Ok(logger)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers
            .read()
            .map(|loggers| loggers.contains_key(normalize(name)))
            .unwrap_or(false)
    }

    pub fn names(&self) -> LoggingResult<Vec<String>> {
        let loggers = self.loggers.read().map_err(|_| LoggingError::Poisoned)?;
        let mut names: Vec<String> = loggers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> &str {
    let name = name.trim();
    if name == "root" { ROOT_LOGGER } else { name }
}

/// Proper ancestors of a dotted name, nearest first (root excluded).
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    let mut current = name;
    std::iter::from_fn(move || {
        let idx = current.rfind('.')?;
        current = &current[..idx];
        Some(current)
    })
    .filter(|ancestor| !ancestor.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct Collecting {
        messages: Mutex<Vec<String>>,
        level: Severity,
    }

    impl Handler for Collecting {
        fn write(&self, record: &LogRecord) -> io::Result<()> {
            self.messages.lock().unwrap().push(record.message.clone());
            Ok(())
        }

        fn level(&self) -> Severity {
            self.level
        }
    }

    #[test]
    fn ancestors_are_listed_nearest_first() {
        assert_eq!(ancestors("a.b.c").collect::<Vec<_>>(), vec!["a.b", "a"]);
        assert_eq!(ancestors("a").count(), 0);
    }

    #[test]
    fn root_has_warning_level_and_both_names() {
        let registry = LoggerRegistry::new();
        let root = registry.get_logger("root").unwrap();
        assert!(root.is_root());
        assert!(Arc::ptr_eq(&root, &registry.get_logger("").unwrap()));
        assert_eq!(root.level().unwrap(), Severity::Warning);
    }

    #[test]
    fn children_inherit_level_and_propagate_to_parent() {
        let registry = LoggerRegistry::new();
        let parent = registry.get_logger("app").unwrap();
        parent.set_level(Severity::Debug).unwrap();
        let sink = Arc::new(Collecting::default());
        parent.add_handler(sink.clone()).unwrap();

        let child = registry.get_logger("app.db.pool").unwrap();
        assert_eq!(child.effective_level().unwrap(), Severity::Debug);
        child.debug("connected");

        assert_eq!(*sink.messages.lock().unwrap(), vec!["connected".to_string()]);
    }

    #[test]
    fn intermediate_loggers_are_spliced_into_the_hierarchy() {
        let registry = LoggerRegistry::new();
        let leaf = registry.get_logger("a.b.c").unwrap();
        assert!(leaf.parent().unwrap().unwrap().is_root());

        let middle = registry.get_logger("a.b").unwrap();
        assert!(Arc::ptr_eq(&leaf.parent().unwrap().unwrap(), &middle));
    }

    #[test]
    fn propagation_can_be_switched_off() {
        let registry = LoggerRegistry::new();
        let root_sink = Arc::new(Collecting::default());
        registry.root().add_handler(root_sink.clone()).unwrap();

        let logger = registry.get_logger("quiet").unwrap();
        logger.set_propagate(false).unwrap();
        logger.error("lost");

        assert!(root_sink.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn names_are_sorted_and_handlers_can_be_cleared() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("b.child").unwrap();
        registry.get_logger("a").unwrap();
        assert_eq!(registry.names().unwrap(), vec!["", "a", "b.child"]);

        let sink = Arc::new(Collecting::default());
        logger.add_handler(sink.clone()).unwrap();
        logger.clear_handlers().unwrap();
        logger.error("dropped");

        assert!(logger.handlers().unwrap().is_empty());
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_level_filters_records() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc").unwrap();
        logger.set_level(Severity::Debug).unwrap();
        let sink = Arc::new(Collecting {
            level: Severity::Error,
            ..Collecting::default()
        });
        logger.add_handler(sink.clone()).unwrap();

        logger.info("skipped");
        logger.error("kept");

        assert_eq!(*sink.messages.lock().unwrap(), vec!["kept".to_string()]);
    }
}
