//! Logger facade
//!
//! A [`Logger`] is a cheap handle around a shared [`TeeRouter`]. Handles
//! derived with [`Logger::with_fields`] or [`Logger::named`] share the sinks
//! and only differ in the context they stamp onto records.

use super::{
    error::Result,
    fields::{Field, FieldValue, Fields},
    level_gate::LevelGate,
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::LoggerMetrics,
    router::{RouteOutcome, TeeRouter},
    sink::Sink,
};
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Invoked after a `Fatal` record has been delivered and the sinks flushed.
///
/// The default hook exits the process with status 1.
pub type FatalHook = Arc<dyn Fn(&str) + Send + Sync>;

struct LoggerCore {
    router: TeeRouter,
    service: String,
    development: bool,
    on_fatal: Option<FatalHook>,
}

#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    name: Arc<str>,
    fields: Arc<Fields>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    #[inline]
    pub fn gate(&self) -> LevelGate {
        self.core.router.gate()
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.gate().enabled(level)
    }

    #[inline]
    pub fn is_debug_enabled(&self) -> bool {
        self.enabled(LogLevel::Debug)
    }

    #[inline]
    pub fn is_info_enabled(&self) -> bool {
        self.enabled(LogLevel::Info)
    }

    #[inline]
    pub fn is_warn_enabled(&self) -> bool {
        self.enabled(LogLevel::Warn)
    }

    #[inline]
    pub fn is_error_enabled(&self) -> bool {
        self.enabled(LogLevel::Error)
    }

    #[inline]
    pub fn is_dpanic_enabled(&self) -> bool {
        self.enabled(LogLevel::DPanic)
    }

    #[inline]
    pub fn is_panic_enabled(&self) -> bool {
        self.enabled(LogLevel::Panic)
    }

    #[inline]
    pub fn is_fatal_enabled(&self) -> bool {
        self.enabled(LogLevel::Fatal)
    }

    pub fn service(&self) -> &str {
        &self.core.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Context fields stamped on every record from this handle
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.core.router.sink_names()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.core.router.metrics()
    }

    /// A handle that appends `fields` to every record; `self` is unchanged.
    ///
    /// ```
    /// use tee_logger::{field, Logger};
    ///
    /// let root = Logger::builder().service("orders").build();
    /// let request = root.with_fields([field("requestId", "r-1")]);
    ///
    /// assert!(root.fields().is_empty());
    /// assert_eq!(request.fields().len(), 1);
    /// ```
    #[must_use]
    pub fn with_fields<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        let mut merged = (*self.fields).clone();
        merged.extend(fields);
        Logger {
            core: Arc::clone(&self.core),
            name: Arc::clone(&self.name),
            fields: Arc::new(merged),
        }
    }

    /// A child handle whose logger name is `<parent>.<name>`
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let name: Arc<str> = if name.is_empty() {
            Arc::clone(&self.name)
        } else if self.name.is_empty() {
            Arc::from(name)
        } else {
            Arc::from(format!("{}.{}", self.name, name))
        };
        Logger {
            core: Arc::clone(&self.core),
            name,
            fields: Arc::clone(&self.fields),
        }
    }

    /// Route one record and report how the sinks took it.
    ///
    /// Unlike [`Logger::log`], this never panics or exits for
    /// `Panic`/`Fatal` records.
    #[track_caller]
    pub fn emit<I>(&self, level: LogLevel, message: impl Into<String>, fields: I) -> RouteOutcome
    where
        I: IntoIterator<Item = Field>,
    {
        self.emit_at(level, message.into(), fields, Location::caller())
    }

    fn emit_at<I>(
        &self,
        level: LogLevel,
        message: String,
        fields: I,
        caller: &'static Location<'static>,
    ) -> RouteOutcome
    where
        I: IntoIterator<Item = Field>,
    {
        if !self.enabled(level) {
            self.metrics().record_filtered();
            return RouteOutcome::Filtered;
        }

        let mut all_fields = (*self.fields).clone();
        all_fields.extend(fields);

        let mut record = LogRecord::new(level, message)
            .with_service(self.core.service.as_str())
            .with_logger_name(&*self.name)
            .with_fields(all_fields)
            .with_caller(caller);

        if level.is_panic_class() {
            record.stack_trace = Some(Backtrace::force_capture().to_string());
        }

        self.core.router.route(&record)
    }

    /// Emit a record, then apply the severity's side effect: `Panic` (and
    /// `DPanic` in development mode) panics, `Fatal` runs the fatal hook.
    ///
    /// Sink errors are reported on stderr and in [`Logger::metrics`], never
    /// to the caller.
    #[track_caller]
    pub fn log<I>(&self, level: LogLevel, message: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        let caller = Location::caller();
        let message = message.into();

        if !level.is_panic_class() {
            self.emit_at(level, message, fields, caller);
            return;
        }

        self.emit_at(level, message.clone(), fields, caller);
        self.flush_quietly();

        match level {
            LogLevel::DPanic if self.core.development => panic!("{}", message),
            LogLevel::Panic => panic!("{}", message),
            LogLevel::Fatal => match self.core.on_fatal {
                Some(ref hook) => hook(&message),
                None => std::process::exit(1),
            },
            _ => {}
        }
    }

    #[track_caller]
    #[inline]
    pub fn debug<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Debug, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn info<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Info, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn warn<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    #[inline]
    pub fn error<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Error, message, fields);
    }

    /// Logs at `DPanic`; panics afterwards only in development mode
    #[track_caller]
    #[inline]
    pub fn dpanic<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::DPanic, message, fields);
    }

    /// Logs at `Panic`, then panics with the message
    #[track_caller]
    #[inline]
    pub fn panic<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Panic, message, fields);
    }

    /// Logs at `Fatal`, then terminates the process (or runs the fatal hook)
    #[track_caller]
    #[inline]
    pub fn fatal<I: IntoIterator<Item = Field>>(&self, message: impl Into<String>, fields: I) {
        self.log(LogLevel::Fatal, message, fields);
    }

    /// Flush every sink
    ///
    /// # Errors
    ///
    /// Returns the first sink failure; every sink is attempted regardless.
    pub fn flush(&self) -> Result<()> {
        match self.core.router.flush().into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }

    fn flush_quietly(&self) {
        for failure in self.core.router.flush() {
            eprintln!(
                "[LOGGER ERROR] Failed to flush sink '{}': {}",
                failure.sink, failure.error
            );
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("service", &self.core.service)
            .field("name", &self.name)
            .field("min_level", &self.gate().min_level())
            .field("sinks", &self.sink_names())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Builder for constructing a Logger with a fluent API
///
/// Sinks receive records in the order they were added.
///
/// # Example
/// ```
/// use tee_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .service("orders")
///     .min_level(LogLevel::Debug)
///     .sink(ConsoleSink::new())
///     .field("region", "eu-west-1")
///     .build();
///
/// assert!(logger.is_debug_enabled());
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    service: String,
    name: String,
    sinks: Vec<Box<dyn Sink>>,
    fields: Fields,
    development: bool,
    on_fatal: Option<FatalHook>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            service: String::new(),
            name: crate::config::DEFAULT_LOGGER_NAME.to_string(),
            sinks: Vec::new(),
            fields: Fields::new(),
            development: false,
            on_fatal: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Service tag stamped on every record
    #[must_use = "builder methods return a new value"]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Root logger name
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Field bound to the root handle
    #[must_use = "builder methods return a new value"]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field::new(key, value));
        self
    }

    /// In development mode `DPanic` records panic after delivery
    #[must_use = "builder methods return a new value"]
    pub fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Replace the default `exit(1)` that follows a `Fatal` record
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.on_fatal = Some(hook);
        self
    }

    pub fn build(self) -> Logger {
        let router = TeeRouter::with_sinks(LevelGate::new(self.min_level), self.sinks);
        Logger {
            core: Arc::new(LoggerCore {
                router,
                service: self.service,
                development: self.development,
                on_fatal: self.on_fatal,
            }),
            name: Arc::from(self.name),
            fields: Arc::new(self.fields),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::fields::field;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct Capture {
        lines: Arc<Mutex<Vec<Value>>>,
    }

    impl Capture {
        fn records(&self) -> Vec<Value> {
            self.lines.lock().clone()
        }
    }

    impl Sink for Capture {
        fn write(&mut self, line: &[u8]) -> Result<()> {
            self.lines.lock().push(serde_json::from_slice(line)?);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn logger_with(capture: &Capture, level: LogLevel) -> Logger {
        Logger::builder()
            .service("orders")
            .min_level(level)
            .sink(capture.clone())
            .build()
    }

    #[test]
    fn test_debug_disabled_at_info() {
        let capture = Capture::default();
        let logger = logger_with(&capture, LogLevel::Info);

        assert!(!logger.is_debug_enabled());
        logger.debug("not shown", [field("expensive", 1)]);

        assert!(capture.records().is_empty());
        assert_eq!(logger.metrics().filtered_count(), 1);
    }

    #[test]
    fn test_record_carries_service_name_and_caller() {
        let capture = Capture::default();
        let logger = logger_with(&capture, LogLevel::Debug);

        logger.info("order placed", [field("orderId", 42)]);

        let records = capture.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["message"], "order placed");
        assert_eq!(record["service"], "orders");
        assert_eq!(record["logger"], "root");
        assert_eq!(record["orderId"], 42);

        let caller = record["caller"].as_str().unwrap();
        assert!(caller.starts_with("core/logger.rs:"), "got {}", caller);
    }

    #[test]
    fn test_with_fields_does_not_touch_parent() {
        let capture = Capture::default();
        let root = logger_with(&capture, LogLevel::Info);
        let child = root.with_fields([field("requestId", "abc")]);

        child.info("child", [field("step", 1)]);
        root.info("root", []);

        let records = capture.records();
        assert_eq!(records[0]["requestId"], "abc");
        assert_eq!(records[0]["step"], 1);
        assert!(records[1].get("requestId").is_none());
        assert!(root.fields().is_empty());
        assert_eq!(
            child.fields().get("requestId"),
            Some(&FieldValue::String("abc".to_string()))
        );
    }

    #[test]
    fn test_bound_fields_come_before_call_fields() {
        let capture = Capture::default();
        let logger = Logger::builder()
            .sink(capture.clone())
            .field("region", "eu")
            .build()
            .with_fields([field("requestId", "r1")]);

        logger.warn("slow", [field("ms", 900)]);

        let record = capture.records().remove(0);
        let keys: Vec<String> = record.as_object().unwrap().keys().cloned().collect();
        let tail: Vec<&str> = keys.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["region", "requestId", "ms"]);
    }

    #[test]
    fn test_named_derivation() {
        let capture = Capture::default();
        let logger = logger_with(&capture, LogLevel::Info).named("http").named("auth");

        logger.info("login", []);

        assert_eq!(logger.name(), "root.http.auth");
        assert_eq!(capture.records()[0]["logger"], "root.http.auth");
    }

    #[test]
    fn test_emit_reports_outcome() {
        let capture = Capture::default();
        let logger = logger_with(&capture, LogLevel::Warn);

        assert!(logger.emit(LogLevel::Info, "quiet", []).is_filtered());
        let outcome = logger.emit(LogLevel::Error, "loud", []);
        assert!(matches!(outcome, RouteOutcome::Delivered { sinks: 1, .. }));
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_fatal_delivers_then_runs_hook() {
        let capture = Capture::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_hook = Arc::clone(&seen);
        let lines = Arc::clone(&capture.lines);

        let logger = Logger::builder()
            .sink(capture.clone())
            .on_fatal(Arc::new(move |message: &str| {
                assert_eq!(message, "cannot continue");
                seen_in_hook.store(lines.lock().len(), Ordering::SeqCst);
            }))
            .build();

        logger.fatal("cannot continue", [field("code", 3)]);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        let record = capture.records().remove(0);
        assert_eq!(record["level"], "FATAL");
        assert!(record["stackTrace"].is_string());
    }

    #[test]
    fn test_panic_delivers_before_panicking() {
        let capture = Capture::default();
        let logger = logger_with(&capture, LogLevel::Info);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("invariant broken", []);
        }));

        assert!(result.is_err());
        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "PANIC");
    }

    #[test]
    fn test_dpanic_only_panics_in_development() {
        let capture = Capture::default();
        let production = logger_with(&capture, LogLevel::Info);
        production.dpanic("tolerated", []);

        let development = Logger::builder()
            .sink(capture.clone())
            .development(true)
            .build();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            development.dpanic("not tolerated", []);
        }));

        assert!(result.is_err());
        assert_eq!(capture.records().len(), 2);
        assert_eq!(capture.records()[0]["level"], "DPANIC");
    }

    #[test]
    fn test_failing_sink_is_invisible_to_caller() {
        struct Broken;

        impl Sink for Broken {
            fn write(&mut self, _line: &[u8]) -> Result<()> {
                Err(LoggerError::writer("broken"))
            }

            fn flush(&mut self) -> Result<()> {
                Err(LoggerError::writer("broken"))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let capture = Capture::default();
        let logger = Logger::builder()
            .sink(Broken)
            .sink(capture.clone())
            .build();

        logger.error("still here", []);

        assert_eq!(capture.records().len(), 1);
        assert_eq!(logger.metrics().failed_writes(), 1);
        assert!(logger.flush().is_err());
    }
}
