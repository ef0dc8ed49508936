//! Log record structure

use super::fields::Fields;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::panic::Location;

/// One emitted log event, built fresh per call and consumed by the encoder.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub fields: Fields,
    pub service: String,
    pub logger_name: String,
    pub caller: Option<&'static Location<'static>>,
    pub stack_trace: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: Fields::new(),
            service: String::new(),
            logger_name: String::new(),
            caller: None,
            stack_trace: None,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    #[must_use]
    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: &'static Location<'static>) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Caller in short `dir/file.rs:line` form
    pub fn short_caller(&self) -> Option<String> {
        self.caller.map(short_caller)
    }
}

/// Trim a source location to its last two path components plus line.
pub fn short_caller(location: &Location<'_>) -> String {
    let file = location.file();
    let mut separators = file.rmatch_indices(['/', '\\']);
    let short = match (separators.next(), separators.next()) {
        (Some(_), Some((idx, _))) => &file[idx + 1..],
        _ => file,
    };
    format!("{}:{}", short, location.line())
}
