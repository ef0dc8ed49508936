//! JSON record encoder
//!
//! Every sink receives the same encoded bytes: one JSON object per record,
//! without a trailing line terminator. Sinks append [`LINE_DELIMITER`].
//!
//! Key layout, in order:
//!
//! ```text
//! timestamp, level, logger, caller?, message, stackTrace?, service, <fields...>
//! ```
//!
//! Fields override `service` on collision. A field named like one of the
//! core keys is written as `field.<key>` so the core keys stay intact.

use super::error::Result;
use super::log_record::LogRecord;
use serde_json::{Map, Value};

/// Record boundary on every sink, including the TCP stream.
pub const LINE_DELIMITER: u8 = b'\n';

pub const TIMESTAMP_KEY: &str = "timestamp";
pub const LEVEL_KEY: &str = "level";
pub const LOGGER_KEY: &str = "logger";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "message";
pub const STACKTRACE_KEY: &str = "stackTrace";
pub const SERVICE_KEY: &str = "service";

const RESERVED_KEYS: [&str; 6] = [
    TIMESTAMP_KEY,
    LEVEL_KEY,
    LOGGER_KEY,
    CALLER_KEY,
    MESSAGE_KEY,
    STACKTRACE_KEY,
];

/// ISO-8601, UTC, millisecond precision
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Build the JSON object for a record.
pub fn to_json_object(record: &LogRecord) -> Map<String, Value> {
    let mut obj = Map::new();

    obj.insert(
        TIMESTAMP_KEY.to_string(),
        Value::String(record.timestamp.format(TIMESTAMP_FORMAT).to_string()),
    );
    obj.insert(
        LEVEL_KEY.to_string(),
        Value::String(record.level.to_str().to_string()),
    );
    obj.insert(
        LOGGER_KEY.to_string(),
        Value::String(record.logger_name.clone()),
    );
    if let Some(caller) = record.short_caller() {
        obj.insert(CALLER_KEY.to_string(), Value::String(caller));
    }
    obj.insert(
        MESSAGE_KEY.to_string(),
        Value::String(record.message.clone()),
    );
    if record.level.is_panic_class() {
        if let Some(ref trace) = record.stack_trace {
            obj.insert(STACKTRACE_KEY.to_string(), Value::String(trace.clone()));
        }
    }
    obj.insert(
        SERVICE_KEY.to_string(),
        Value::String(record.service.clone()),
    );

    for field in &record.fields {
        let key = if RESERVED_KEYS.contains(&field.key.as_str()) {
            format!("field.{}", field.key)
        } else {
            field.key.clone()
        };
        obj.insert(key, field.value.to_json_value());
    }

    obj
}

/// Encode a record into its canonical single-line JSON form.
pub fn encode(record: &LogRecord) -> Result<Vec<u8>> {
    let obj = to_json_object(record);
    Ok(serde_json::to_vec(&Value::Object(obj))?)
}
