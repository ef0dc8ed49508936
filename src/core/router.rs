//! Level-gated fan-out of encoded records to every sink

use super::{
    encoder,
    error::LoggerError,
    level_gate::LevelGate,
    log_record::LogRecord,
    metrics::LoggerMetrics,
    sink::Sink,
};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A sink that rejected a record
#[derive(Debug)]
pub struct SinkFailure {
    pub sink: String,
    pub error: LoggerError,
}

/// Result of routing one record
#[derive(Debug)]
pub enum RouteOutcome {
    /// Below the threshold; no sink was invoked
    Filtered,
    /// Handed to `sinks` sinks, of which `failures` rejected it
    Delivered {
        sinks: usize,
        failures: Vec<SinkFailure>,
    },
}

impl RouteOutcome {
    pub fn is_filtered(&self) -> bool {
        matches!(self, RouteOutcome::Filtered)
    }

    pub fn failures(&self) -> &[SinkFailure] {
        match self {
            RouteOutcome::Filtered => &[],
            RouteOutcome::Delivered { failures, .. } => failures,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

struct SinkSlot {
    name: String,
    sink: Mutex<Box<dyn Sink>>,
}

/// Holds the active sinks and the level gate.
///
/// Sinks are written in the order they were added. Each sink sits behind its
/// own mutex: concurrent records never interleave bytes on one sink, while
/// different sinks are not held up by each other's locks.
pub struct TeeRouter {
    gate: LevelGate,
    sinks: Vec<SinkSlot>,
    metrics: LoggerMetrics,
}

impl TeeRouter {
    pub fn new(gate: LevelGate) -> Self {
        Self {
            gate,
            sinks: Vec::new(),
            metrics: LoggerMetrics::new(),
        }
    }

    pub fn with_sinks(gate: LevelGate, sinks: Vec<Box<dyn Sink>>) -> Self {
        let mut router = Self::new(gate);
        for sink in sinks {
            router.add_sink(sink);
        }
        router
    }

    /// Append a sink; only possible while the router is exclusively owned.
    pub fn add_sink(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(SinkSlot {
            name: sink.name().to_string(),
            sink: Mutex::new(sink),
        });
    }

    #[inline]
    pub fn gate(&self) -> LevelGate {
        self.gate
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|slot| slot.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Gate, encode once, then write to every sink.
    ///
    /// A failing or panicking sink does not stop delivery to the others.
    pub fn route(&self, record: &LogRecord) -> RouteOutcome {
        if !self.gate.enabled(record.level) {
            self.metrics.record_filtered();
            return RouteOutcome::Filtered;
        }

        self.metrics.record_routed();

        let line = match encoder::encode(record) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to encode record: {}", e);
                self.metrics.record_failures(self.sinks.len());
                return RouteOutcome::Delivered {
                    sinks: 0,
                    failures: vec![SinkFailure {
                        sink: "encoder".to_string(),
                        error: e,
                    }],
                };
            }
        };

        let failures = self.write_encoded(&line);
        self.metrics.record_failures(failures.len());

        RouteOutcome::Delivered {
            sinks: self.sinks.len(),
            failures,
        }
    }

    /// Write an already encoded line to every sink, bypassing the gate.
    pub fn write_encoded(&self, line: &[u8]) -> Vec<SinkFailure> {
        let mut failures = Vec::new();

        for (idx, slot) in self.sinks.iter().enumerate() {
            let mut sink = slot.sink.lock();
            let result = catch_unwind(AssertUnwindSafe(|| sink.write(line)));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Sink #{} ({}) failed: {}",
                        idx, slot.name, e
                    );
                    failures.push(SinkFailure {
                        sink: slot.name.clone(),
                        error: e,
                    });
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(panic_info.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Sink #{} ({}) panicked: {}. \
                         Other sinks continue to function.",
                        idx, slot.name, panic_msg
                    );
                    failures.push(SinkFailure {
                        sink: slot.name.clone(),
                        error: LoggerError::sink_panicked(&slot.name, panic_msg),
                    });
                }
            }
        }

        failures
    }

    /// Flush every sink, collecting failures.
    pub fn flush(&self) -> Vec<SinkFailure> {
        let mut failures = Vec::new();

        for slot in &self.sinks {
            let mut sink = slot.sink.lock();
            match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(SinkFailure {
                    sink: slot.name.clone(),
                    error: e,
                }),
                Err(panic_info) => failures.push(SinkFailure {
                    sink: slot.name.clone(),
                    error: LoggerError::sink_panicked(
                        &slot.name,
                        panic_message(panic_info.as_ref()),
                    ),
                }),
            }
        }

        failures
    }
}

impl Drop for TeeRouter {
    fn drop(&mut self) {
        for failure in self.flush() {
            eprintln!(
                "[LOGGER ERROR] Failed to flush sink '{}' during shutdown: {}",
                failure.sink, failure.error
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
