//! Built-in sinks

pub mod console;
pub mod rotating_file;
pub mod tcp_stream;

pub use console::ConsoleSink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};
pub use tcp_stream::{StreamOptions, TcpStreamSink};
