//! Sink trait for log output destinations

use super::error::Result;

/// Destination for encoded records.
///
/// `line` is one encoded record without terminator; implementations append
/// [`LINE_DELIMITER`](super::encoder::LINE_DELIMITER). The router serializes
/// calls on each sink, so `write` never runs concurrently with itself.
pub trait Sink: Send {
    fn write(&mut self, line: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
