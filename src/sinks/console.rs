//! Console sink implementation

use crate::core::{Result, Sink, LINE_DELIMITER};
use std::io::{self, Write};

/// Writes each record as one line on standard output.
///
/// The process stdout handle is shared and never closed by the logger.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    _private: (),
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, line: &[u8]) -> Result<()> {
        // Holding the stdout lock keeps the line intact against println! elsewhere.
        let mut out = io::stdout().lock();
        out.write_all(line)?;
        out.write_all(&[LINE_DELIMITER])?;
        out.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_sink_writes() {
        let mut sink = ConsoleSink::new();
        assert_eq!(sink.name(), "console");
        assert!(sink.write(br#"{"message":"console sink test"}"#).is_ok());
        assert!(sink.flush().is_ok());
    }
}
