//! Logger configuration resolved from environment-style key/value settings
//!
//! Resolution never fails: missing or malformed values fall back to their
//! defaults. Consistency checks run later, when the logger is built
//! (see [`Config::validate`]).

use crate::core::{field, LogLevel, Logger, LoggerBuilder, LoggerError, Result};
use crate::sinks::rotating_file::{RotationPolicy, DEFAULT_MAX_AGE, DEFAULT_MAX_BACKUPS};
use crate::sinks::tcp_stream::StreamOptions;
use crate::sinks::{ConsoleSink, RotatingFileSink, TcpStreamSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const SERVICE_NAME: &str = "SERVICE_NAME";
pub const LOGGING_CONSOLE_ENABLED: &str = "LOGGING_CONSOLE_ENABLED";
pub const LOGGING_FILE_ENABLED: &str = "LOGGING_FILE_ENABLED";
pub const LOGGING_FILE_BASE_PATH: &str = "LOGGING_FILE_BASE_PATH";
pub const LOGGING_LEVEL: &str = "LOGGING_LEVEL";
pub const LOGGING_STREAM_ENABLED: &str = "LOGGING_STREAM_ENABLED";
pub const LOGGING_STREAM_HOST: &str = "LOGGING_STREAM_HOST";
pub const LOGGING_STREAM_PORT: &str = "LOGGING_STREAM_PORT";

pub const LOGGING_FILE_MAX_SIZE_MB: &str = "LOGGING_FILE_MAX_SIZE_MB";
pub const LOGGING_FILE_MAX_BACKUPS: &str = "LOGGING_FILE_MAX_BACKUPS";
pub const LOGGING_FILE_MAX_AGE_DAYS: &str = "LOGGING_FILE_MAX_AGE_DAYS";
pub const LOGGING_FILE_COMPRESS: &str = "LOGGING_FILE_COMPRESS";
pub const LOGGING_STREAM_CONNECT_TIMEOUT_MS: &str = "LOGGING_STREAM_CONNECT_TIMEOUT_MS";
pub const LOGGING_STREAM_RECONNECT: &str = "LOGGING_STREAM_RECONNECT";
pub const LOGGING_LOGGER_NAME: &str = "LOGGING_LOGGER_NAME";

pub const DEFAULT_LOGGER_NAME: &str = "root";

const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Resolved logger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub service_name: String,
    pub logger_name: String,
    pub min_level: LogLevel,

    pub console_enabled: bool,

    pub file_enabled: bool,
    pub file_base_path: String,
    pub file_rotation: RotationPolicy,

    pub stream_enabled: bool,
    pub stream_host: String,
    pub stream_port: String,
    pub stream_options: StreamOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
            min_level: LogLevel::Info,
            console_enabled: false,
            file_enabled: false,
            file_base_path: String::new(),
            file_rotation: RotationPolicy::default(),
            stream_enabled: false,
            stream_host: String::new(),
            stream_port: String::new(),
            stream_options: StreamOptions::default(),
        }
    }
}

impl Config {
    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an explicit set of key/value pairs
    ///
    /// ```
    /// use tee_logger::{Config, LogLevel};
    ///
    /// let config = Config::from_vars([
    ///     ("SERVICE_NAME", "orders"),
    ///     ("LOGGING_CONSOLE_ENABLED", "true"),
    ///     ("LOGGING_LEVEL", "debug"),
    /// ]);
    /// assert!(config.console_enabled);
    /// assert_eq!(config.min_level, LogLevel::Debug);
    /// ```
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Resolve using any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).unwrap_or_default();
        let flag = |key: &str| lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(false);
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = RotationPolicy::default();
        let file_rotation = RotationPolicy {
            max_bytes: number(LOGGING_FILE_MAX_SIZE_MB)
                .filter(|mb| *mb > 0)
                .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
                .unwrap_or(defaults.max_bytes),
            max_backups: number(LOGGING_FILE_MAX_BACKUPS)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(DEFAULT_MAX_BACKUPS),
            max_age: number(LOGGING_FILE_MAX_AGE_DAYS)
                .and_then(|days| days.checked_mul(SECS_PER_DAY))
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_MAX_AGE),
            compress: lookup(LOGGING_FILE_COMPRESS)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.compress),
        };

        let stream_defaults = StreamOptions::default();
        let stream_options = StreamOptions {
            connect_timeout: number(LOGGING_STREAM_CONNECT_TIMEOUT_MS)
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(stream_defaults.connect_timeout),
            reconnect_on_error: flag(LOGGING_STREAM_RECONNECT),
        };

        let logger_name = lookup(LOGGING_LOGGER_NAME)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOGGER_NAME.to_string());

        Self {
            service_name: text(SERVICE_NAME),
            logger_name,
            min_level: lookup(LOGGING_LEVEL)
                .and_then(|v| v.parse().ok())
                .unwrap_or(LogLevel::Info),
            console_enabled: flag(LOGGING_CONSOLE_ENABLED),
            file_enabled: flag(LOGGING_FILE_ENABLED),
            file_base_path: text(LOGGING_FILE_BASE_PATH),
            file_rotation,
            stream_enabled: flag(LOGGING_STREAM_ENABLED),
            stream_host: text(LOGGING_STREAM_HOST),
            stream_port: text(LOGGING_STREAM_PORT),
            stream_options,
        }
    }

    /// `{file_base_path}/{service_name}.log`
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(self.file_base_path.trim()).join(format!("{}.log", self.service_name.trim()))
    }

    /// Stream port as a number, if it is one
    pub fn stream_port_number(&self) -> Result<u16> {
        self.stream_port.trim().parse::<u16>().map_err(|_| {
            LoggerError::config(
                "stream",
                format!(
                    "{} '{}' is not a valid port",
                    LOGGING_STREAM_PORT, self.stream_port
                ),
            )
        })
    }

    /// Check the invariants the enabled sinks depend on
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] naming the offending sink
    pub fn validate(&self) -> Result<()> {
        if self.file_enabled {
            if self.file_base_path.trim().is_empty() {
                return Err(LoggerError::config(
                    "file",
                    format!("{} must be set when file logging is enabled", LOGGING_FILE_BASE_PATH),
                ));
            }
            if self.service_name.trim().is_empty() {
                return Err(LoggerError::config(
                    "file",
                    format!("{} must be set when file logging is enabled", SERVICE_NAME),
                ));
            }
        }

        if self.stream_enabled {
            if self.stream_host.trim().is_empty() {
                return Err(LoggerError::config(
                    "stream",
                    format!("{} must be set when stream logging is enabled", LOGGING_STREAM_HOST),
                ));
            }
            self.stream_port_number()?;
        }

        Ok(())
    }

    /// Number of sinks this configuration enables
    pub fn enabled_sinks(&self) -> usize {
        [self.console_enabled, self.file_enabled, self.stream_enabled]
            .iter()
            .filter(|enabled| **enabled)
            .count()
    }
}

impl LoggerBuilder {
    /// Builder preloaded with every sink `config` enables
    ///
    /// Sinks are constructed in order (console, file, stream). The first
    /// failure aborts and no partially built logger is returned.
    ///
    /// # Errors
    ///
    /// Returns the validation error, the file open error or the dial error
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut builder = LoggerBuilder::new()
            .service(config.service_name.as_str())
            .name(config.logger_name.as_str())
            .min_level(config.min_level);

        if config.console_enabled {
            builder = builder.sink(ConsoleSink::new());
        }

        if config.file_enabled {
            builder = builder.sink(RotatingFileSink::with_policy(
                config.file_path(),
                config.file_rotation.clone(),
            )?);
        }

        if config.stream_enabled {
            let port = config.stream_port_number()?;
            builder = builder.sink(TcpStreamSink::connect(
                config.stream_host.trim(),
                port,
                config.stream_options.clone(),
            )?);
        }

        Ok(builder)
    }
}

impl Logger {
    /// Build a logger from resolved settings and announce it on its sinks
    ///
    /// # Errors
    ///
    /// See [`LoggerBuilder::from_config`]
    pub fn from_config(config: &Config) -> Result<Logger> {
        let logger = LoggerBuilder::from_config(config)?.build();
        logger.info(
            "logger initialized",
            [field("sinks", logger.sink_names().join(","))],
        );
        Ok(logger)
    }

    /// Shorthand for `Logger::from_config(&Config::from_env())`
    pub fn from_env() -> Result<Logger> {
        Self::from_config(&Config::from_env())
    }
}

/// Boolean literals accepted for flags; anything else is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
