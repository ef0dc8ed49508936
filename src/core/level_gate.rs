//! Severity threshold shared by the router and the logger facade

use super::log_level::LogLevel;

/// Minimum severity a record needs to reach any sink.
///
/// The threshold is fixed at construction, so queries from concurrent
/// emission calls need no synchronization. The gate is `Copy` and can be
/// handed to code that wants to skip building expensive fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelGate {
    min_level: LogLevel,
}

impl LevelGate {
    pub const fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    #[inline]
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
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
}
