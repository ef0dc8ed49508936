//! # tee_logger
//!
//! Structured JSON logging that tees every record to the console, a
//! rotating file and a TCP log collector behind one severity gate.
//!
//! ## Features
//!
//! - **One encoding per record**: each admitted record is encoded once as a
//!   single-line JSON object and written to every sink, newline-terminated
//! - **Isolated sinks**: a failing or panicking sink never stops the others
//!   and never reaches the calling code
//! - **Environment configuration**: `SERVICE_NAME` and `LOGGING_*` keys
//! - **Thread safe**: a [`Logger`] is a cheap `Clone + Send + Sync` handle
//!
//! ## Example
//!
//! ```no_run
//! use tee_logger::{field, Logger};
//!
//! # fn main() -> tee_logger::Result<()> {
//! let logger = Logger::from_env()?;
//! let requests = logger.named("http").with_fields([field("region", "eu-west-1")]);
//!
//! requests.info("request served", [field("status", 200), field("ms", 12)]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::core::{
        field, Field, FieldValue, Fields, LevelGate, LogLevel, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, Result, RouteOutcome, Sink,
    };
    pub use crate::sinks::{
        ConsoleSink, RotatingFileSink, RotationPolicy, StreamOptions, TcpStreamSink,
    };
}

pub use config::Config;
pub use core::{
    field, FatalHook, Field, FieldValue, Fields, LevelGate, LogLevel, LogRecord, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, Result, RouteOutcome, Sink, SinkFailure, TeeRouter,
};
pub use sinks::{ConsoleSink, RotatingFileSink, RotationPolicy, StreamOptions, TcpStreamSink};
