//! Formatting macros
//!
//! Shorthand for records that carry only a formatted message. The caller
//! recorded on the record is the macro invocation site.
//!
//! # Examples
//!
//! ```
//! use tee_logger::prelude::*;
//! use tee_logger::info;
//!
//! let logger = Logger::builder().service("orders").build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a formatted message at an explicit level.
///
/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::builder().build();
/// use tee_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), ::std::iter::empty::<$crate::Field>())
    };
}

/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::builder().min_level(LogLevel::Debug).build();
/// use tee_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::builder().build();
/// use tee_logger::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
