//! TCP stream sink for a remote log collector
//!
//! Wire format: newline-delimited JSON. Every record is sent as the encoded
//! object followed by a single `\n`; the encoder never emits a raw newline
//! inside a record, so the collector splits the stream on `\n`.

use crate::core::{LoggerError, Result, Sink, LINE_DELIMITER};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection behaviour of [`TcpStreamSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Upper bound for a whole dial: resolution plus every address tried
    pub connect_timeout: Duration,
    /// When false, the first write error leaves the sink permanently
    /// disconnected. When true, a failed write triggers one reconnect and
    /// one resend, and a disconnected sink redials once per write.
    pub reconnect_on_error: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_on_error: false,
        }
    }
}

impl StreamOptions {
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }
}

/// Sink that streams records over one persistent TCP connection
///
/// # Example
///
/// ```no_run
/// use tee_logger::sinks::{StreamOptions, TcpStreamSink};
///
/// let sink = TcpStreamSink::connect("logs.internal", 5170, StreamOptions::default())
///     .expect("collector reachable");
/// assert_eq!(sink.address(), "logs.internal:5170");
/// ```
pub struct TcpStreamSink {
    stream: Option<TcpStream>,
    host: String,
    port: u16,
    address: String,
    options: StreamOptions,
}

impl TcpStreamSink {
    /// Dial `host:port`, failing if no address answers within the timeout
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ConnectError`] if resolution or every dial fails
    pub fn connect(host: &str, port: u16, options: StreamOptions) -> Result<Self> {
        let address = join_host_port(host, port);
        let stream = dial(host, port, options.connect_timeout)
            .map_err(|e| LoggerError::connect(address.clone(), e))?;

        Ok(Self {
            stream: Some(stream),
            host: host.to_string(),
            port,
            address,
            options,
        })
    }

    /// `host:port` as dialed
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn redial(&mut self) -> Result<&mut TcpStream> {
        let stream = dial(&self.host, self.port, self.options.connect_timeout)
            .map_err(|e| LoggerError::connect(self.address.clone(), e))?;
        Ok(self.stream.insert(stream))
    }
}

impl Sink for TcpStreamSink {
    fn write(&mut self, line: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line);
        frame.push(LINE_DELIMITER);

        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None if self.options.reconnect_on_error => self.redial()?,
            None => return Err(LoggerError::stream_disconnected(&self.address)),
        };

        let err = match stream.write_all(&frame) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        // The connection is unusable from here on
        self.stream = None;

        if !self.options.reconnect_on_error {
            return Err(LoggerError::io_operation(
                "writing to log collector",
                format!("connection to {} lost", self.address),
                err,
            ));
        }

        match self.redial() {
            Ok(stream) => {
                if let Err(resend_err) = stream.write_all(&frame) {
                    self.stream = None;
                    return Err(resend_err.into());
                }
                Ok(())
            }
            Err(reconnect_err) => Err(LoggerError::writer(format!(
                "Failed to send log and reconnect: {} (reconnect: {})",
                err, reconnect_err
            ))),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut stream) = self.stream {
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stream"
    }
}

impl Drop for TcpStreamSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Resolve and connect within one overall `timeout`
fn dial(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let deadline = Instant::now() + timeout;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs = resolve(host, port, timeout)?;
    connect_any(&addrs, deadline)
}

/// Name resolution has no timeout of its own, so it runs on a helper thread
/// that is abandoned once `timeout` passes.
fn resolve(host: &str, port: u16, timeout: Duration) -> io::Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let (tx, rx) = mpsc::channel();
    let target = host.to_string();
    thread::Builder::new()
        .name("log-stream-resolver".to_string())
        .spawn(move || {
            let result = (target.as_str(), port)
                .to_socket_addrs()
                .map(|addrs| addrs.collect::<Vec<_>>());
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("resolving {} timed out", host),
        )),
    }
}

/// Try each address in turn; every attempt only gets the time left
/// before `deadline`.
fn connect_any(addrs: &[SocketAddr], deadline: Instant) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect to {} timed out", addr),
            ));
        }

        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("localhost", 80), "localhost:80");
        assert_eq!(join_host_port("::1", 9000), "[::1]:9000");
        assert_eq!(join_host_port("[::1]", 9000), "[::1]:9000");
    }

    #[test]
    fn test_default_options() {
        let options = StreamOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert!(!options.reconnect_on_error);
    }

    #[test]
    fn test_write_delivers_newline_framed_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(socket);
            let mut first = Vec::new();
            let mut second = Vec::new();
            reader.read_until(b'\n', &mut first).unwrap();
            reader.read_until(b'\n', &mut second).unwrap();
            (first, second)
        });

        let mut sink = TcpStreamSink::connect("127.0.0.1", port, StreamOptions::default()).unwrap();
        assert!(sink.is_connected());
        sink.write(br#"{"message":"one"}"#).unwrap();
        sink.write(br#"{"message":"two"}"#).unwrap();
        sink.flush().unwrap();

        let (first, second) = server.join().unwrap();
        assert_eq!(first, b"{\"message\":\"one\"}\n");
        assert_eq!(second, b"{\"message\":\"two\"}\n");
    }

    #[test]
    fn test_connect_to_closed_port_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let timeout = Duration::from_millis(500);
        let started = Instant::now();
        let result = TcpStreamSink::connect(
            "127.0.0.1",
            port,
            StreamOptions::default().with_connect_timeout(timeout),
        );

        assert!(matches!(result, Err(LoggerError::ConnectError { .. })));
        assert!(started.elapsed() < timeout + Duration::from_secs(1));
    }

    #[test]
    fn test_expired_deadline_skips_remaining_addresses() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let started = Instant::now();
        let result = connect_any(&[addr, addr, addr], Instant::now());

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_dial_shares_one_deadline_across_addresses() {
        // Non-routable addresses normally hang until the timeout expires
        let unroutable: SocketAddr = "10.255.255.1:9".parse().unwrap();
        let addrs = [unroutable; 4];
        let timeout = Duration::from_millis(300);

        let started = Instant::now();
        let _ = connect_any(&addrs, Instant::now() + timeout);

        assert!(
            started.elapsed() < timeout + Duration::from_millis(500),
            "dial took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_connect_falls_through_to_live_address() {
        let dead = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let live = listener.local_addr().unwrap();

        let stream = connect_any(&[dead, live], Instant::now() + Duration::from_secs(2)).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), live);
    }

    #[test]
    fn test_resolve_ip_literal_and_hostname() {
        let timeout = Duration::from_secs(2);
        assert_eq!(
            resolve("::1", 80, timeout).unwrap(),
            vec!["[::1]:80".parse::<SocketAddr>().unwrap()]
        );
        assert!(!resolve("localhost", 80, timeout).unwrap().is_empty());
    }

    #[test]
    fn test_broken_connection_stays_broken() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut sink = TcpStreamSink::connect("127.0.0.1", port, StreamOptions::default()).unwrap();
        let (socket, _) = listener.accept().unwrap();
        drop(socket);

        let mut failed = false;
        for _ in 0..200 {
            if sink.write(b"{}").is_err() {
                failed = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(failed, "writes to a closed peer should eventually fail");
        assert!(!sink.is_connected());
        assert!(matches!(
            sink.write(b"{}"),
            Err(LoggerError::StreamDisconnected { .. })
        ));
    }

    #[test]
    fn test_reconnect_on_error_resumes_delivery() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        let options = StreamOptions::default().with_reconnect(true);
        let mut sink = TcpStreamSink::connect("127.0.0.1", port, options).unwrap();

        thread::spawn(move || {
            let (first, _) = listener.accept().unwrap();
            drop(first);

            let (second, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(second);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let _ = tx.send(line);
        });

        let mut received = None;
        for _ in 0..200 {
            let _ = sink.write(b"{\"message\":\"ping\"}");
            if let Ok(line) = rx.recv_timeout(Duration::from_millis(10)) {
                received = Some(line);
                break;
            }
        }

        assert_eq!(received.as_deref(), Some("{\"message\":\"ping\"}\n"));
        assert!(sink.is_connected());
    }
}
