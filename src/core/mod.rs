//! Core logger types and traits

pub mod encoder;
pub mod error;
pub mod fields;
pub mod level_gate;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod router;
pub mod sink;

pub use encoder::{encode, LINE_DELIMITER};
pub use error::{LoggerError, Result};
pub use fields::{field, Field, FieldValue, Fields};
pub use level_gate::LevelGate;
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{FatalHook, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use router::{RouteOutcome, SinkFailure, TeeRouter};
pub use sink::Sink;
