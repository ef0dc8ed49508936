//! Rotating file sink
//!
//! Appends records to `<dir>/<service>.log`. When the next record would push
//! the file past `max_bytes`, the file is rolled:
//!
//! ```text
//! orders.log        active file
//! orders.log.1.gz   newest backup
//! orders.log.2.gz
//! ...
//! orders.log.7.gz   oldest retained backup
//! ```
//!
//! Backups beyond `max_backups` are deleted, as is any backup whose
//! modification time is older than `max_age`.

use crate::core::{LoggerError, Result, Sink, LINE_DELIMITER};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_BACKUPS: usize = 7;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const COMPRESSED_SUFFIX: &str = ".gz";
const TEMP_SUFFIX: &str = ".tmp";

/// Rotation thresholds for [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use tee_logger::sinks::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(3)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(false);
///
/// assert_eq!(policy.max_backups, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPolicy {
    /// Size at which the active file is rolled
    pub max_bytes: u64,
    /// Maximum number of rotated files to keep; 0 discards rotated files
    pub max_backups: usize,
    /// Backups older than this are deleted; `Duration::ZERO` disables the check
    pub max_age: Duration,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: DEFAULT_MAX_AGE,
            compress: true,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// File sink with size-based rotation, retention and compression
///
/// # Examples
///
/// ```no_run
/// use tee_logger::sinks::{RotatingFileSink, RotationPolicy};
///
/// let sink = RotatingFileSink::for_service("/var/log/app", "orders", RotationPolicy::default())
///     .expect("log directory is writable");
/// assert!(sink.path().ends_with("orders.log"));
/// ```
pub struct RotatingFileSink {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    rotations: u64,
}

impl RotatingFileSink {
    /// Create a rotating file sink with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Open `<dir>/<service>.log`
    pub fn for_service<P: AsRef<Path>>(
        dir: P,
        service: &str,
        policy: RotationPolicy,
    ) -> Result<Self> {
        Self::with_policy(dir.as_ref().join(format!("{}.log", service)), policy)
    }

    /// Create a rotating file sink with a custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let (file, current_size) = Self::open_active(&base_path)?;

        let sink = Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            rotations: 0,
        };
        sink.enforce_retention();

        Ok(sink)
    }

    fn open_active(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((file, size))
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size > 0 && self.current_size + incoming > self.policy.max_bytes
    }

    /// Roll the active file into the backup chain and open a fresh one
    fn rotate(&mut self) -> Result<()> {
        // Release the handle before renaming
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.policy.max_backups == 0 {
            fs::remove_file(&self.base_path).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to discard rotated file: {}", e),
                )
            })?;
        } else {
            self.shift_backups()?;

            let backup = self.backup_path(1);
            if self.base_path.exists() {
                fs::rename(&self.base_path, &backup).map_err(|e| {
                    LoggerError::file_rotation(
                        self.base_path.display().to_string(),
                        format!("Failed to rotate current log file: {}", e),
                    )
                })?;

                if self.policy.compress {
                    self.compress_file(&backup)?;
                }
            }
        }

        let (file, size) = Self::open_active(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        self.rotations += 1;

        self.enforce_retention();
        Ok(())
    }

    /// Move backup `i` to `i + 1`, dropping whatever falls off the end
    fn shift_backups(&self) -> Result<()> {
        let max = self.policy.max_backups;
        remove_if_exists(&self.backup_path(max));
        remove_if_exists(&self.compressed_path(max));

        for i in (1..max).rev() {
            for (from, to) in [
                (self.compressed_path(i), self.compressed_path(i + 1)),
                (self.backup_path(i), self.backup_path(i + 1)),
            ] {
                if from.exists() {
                    fs::rename(&from, &to).map_err(|e| {
                        LoggerError::file_rotation(
                            from.display().to_string(),
                            format!("Failed to rotate backup files: {}", e),
                        )
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Apply the backup cap and the age limit to every backup on disk,
    /// including ones left behind by a run with a larger cap.
    fn enforce_retention(&self) {
        self.prune_excess();
        self.prune_expired();
    }

    /// Delete backups whose index is beyond `max_backups`
    fn prune_excess(&self) {
        for (index, path) in self.scan_backups() {
            if index > self.policy.max_backups {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARN] Failed to remove excess backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    /// Delete backups older than `max_age`
    fn prune_expired(&self) {
        if self.policy.max_age.is_zero() {
            return;
        }
        let Some(cutoff) = SystemTime::now().checked_sub(self.policy.max_age) else {
            return;
        };

        for path in self.backups() {
            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);

            if expired {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARN] Failed to remove expired backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    /// `<name>.<index>`
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .base_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "app.log".into());
        name.push(format!(".{}", index));
        self.base_path.with_file_name(name)
    }

    /// `<name>.<index>.gz`
    fn compressed_path(&self, index: usize) -> PathBuf {
        append_suffix(&self.backup_path(index), COMPRESSED_SUFFIX)
    }

    /// Gzip `path` into `path.gz`, removing the original only once the
    /// compressed file is complete.
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, Read};

        let gz_path = append_suffix(path, COMPRESSED_SUFFIX);
        let temp_gz_path = append_suffix(&gz_path, TEMP_SUFFIX);

        let input = File::open(path).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to open file for compression: {}", path.display()),
                e,
            )
        })?;
        let mut reader = BufReader::with_capacity(64 * 1024, input);

        let output = File::create(&temp_gz_path).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!(
                    "Failed to create temporary compressed file: {}",
                    temp_gz_path.display()
                ),
                e,
            )
        })?;
        let mut encoder = flate2::write::GzEncoder::new(
            BufWriter::with_capacity(64 * 1024, output),
            flate2::Compression::default(),
        );

        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| {
                let _ = fs::remove_file(&temp_gz_path);
                LoggerError::io_operation(
                    "compress log file",
                    format!("Failed to read from file: {}", path.display()),
                    e,
                )
            })?;

            if bytes_read == 0 {
                break;
            }

            encoder.write_all(&buffer[..bytes_read]).map_err(|e| {
                let _ = fs::remove_file(&temp_gz_path);
                LoggerError::io_operation("compress log file", "Failed to compress data chunk", e)
            })?;
        }

        encoder
            .finish()
            .and_then(|mut inner| inner.flush())
            .map_err(|e| {
                let _ = fs::remove_file(&temp_gz_path);
                LoggerError::io_operation("compress log file", "Failed to finish compression", e)
            })?;

        fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
            let _ = fs::remove_file(&temp_gz_path);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to rename compressed file to: {}", gz_path.display()),
                e,
            )
        })?;

        if let Err(e) = fs::remove_file(path) {
            // Both copies exist now; the plain one is shifted out with the chain.
            eprintln!(
                "[LOGGER WARN] Compression succeeded but failed to remove original file {}: {}",
                path.display(),
                e
            );
        }

        Ok(())
    }

    /// Existing backup files, newest first
    pub fn backups(&self) -> Vec<PathBuf> {
        self.scan_backups().into_iter().map(|(_, path)| path).collect()
    }

    /// Every `<name>.<N>` and `<name>.<N>.gz` next to the active file,
    /// ordered by index with the compressed copy first
    fn scan_backups(&self) -> Vec<(usize, PathBuf)> {
        let Some(name) = self.base_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };

        let prefix = format!("{}.", name);
        let mut found: Vec<(usize, bool, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let rest = file_name.to_str()?.strip_prefix(&prefix)?;
                let (digits, plain) = match rest.strip_suffix(COMPRESSED_SUFFIX) {
                    Some(digits) => (digits, false),
                    None => (rest, true),
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let index = digits.parse::<usize>().ok()?;
                Some((index, plain, entry.path()))
            })
            .collect();

        found.sort();
        found
            .into_iter()
            .map(|(index, _, path)| (index, path))
            .collect()
    }

    /// Bytes in the active file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Path of the active file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Number of rotations performed by this sink
    #[must_use]
    pub fn rotation_count(&self) -> u64 {
        self.rotations
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write(&mut self, line: &[u8]) -> Result<()> {
        let incoming = line.len() as u64 + 1;

        if self.should_rotate(incoming) {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARN] Log rotation failed: {}. Continuing with current file.",
                    e
                );

                if self.writer.is_none() {
                    let (file, _) = Self::open_active(&self.base_path).map_err(|reopen_err| {
                        eprintln!(
                            "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                            reopen_err
                        );
                        e
                    })?;
                    self.writer = Some(BufWriter::new(file));
                }

                // Let the file outgrow the limit rather than retry on every write
                self.current_size = 0;
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;

        if let Err(e) = write_line(writer, line) {
            return Err(LoggerError::file_sink(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            ));
        }

        self.current_size += incoming;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

/// Line and terminator leave the buffer in one flush, so the record is on
/// disk before the call returns.
fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> std::io::Result<()> {
    writer.write_all(line)?;
    writer.write_all(&[LINE_DELIMITER])?;
    writer.flush()
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER WARN] Failed to remove oldest backup {}: {}",
                path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn line(tag: usize, len: usize) -> Vec<u8> {
        let mut line = format!("{{\"n\":{}}}", tag).into_bytes();
        line.resize(len, b' ');
        line
    }

    fn gunzip(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_default_policy() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_bytes, 100 * 1024 * 1024);
        assert_eq!(policy.max_backups, 7);
        assert_eq!(policy.max_age, Duration::from_secs(30 * 86_400));
        assert!(policy.compress);
    }

    #[test]
    fn test_rotation_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_size(1024)
            .with_max_backups(3)
            .with_max_age(Duration::ZERO)
            .with_compression(false);

        assert_eq!(policy.max_bytes, 1024);
        assert_eq!(policy.max_backups, 3);
        assert!(policy.max_age.is_zero());
        assert!(!policy.compress);
    }

    #[test]
    fn test_for_service_path_and_directory_creation() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("logs").join("app");

        let sink = RotatingFileSink::for_service(&nested, "orders", RotationPolicy::default())
            .unwrap();

        assert_eq!(sink.path(), nested.join("orders.log"));
        assert!(sink.path().exists());
        assert_eq!(sink.current_size(), 0);
    }

    #[test]
    fn test_unwritable_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let result = RotatingFileSink::new(blocker.join("app.log"));
        assert!(result.is_err());
    }

    #[test]
    fn test_reopen_appends_and_tracks_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.log");
        fs::write(&path, b"existing\n").unwrap();

        let mut sink = RotatingFileSink::new(&path).unwrap();
        assert_eq!(sink.current_size(), 9);

        sink.write(b"appended").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
        assert_eq!(sink.current_size(), 18);
    }

    #[test]
    fn test_rotation_compresses_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");
        let policy = RotationPolicy::new().with_max_size(100);

        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        let first = line(1, 60);
        let second = line(2, 60);

        sink.write(&first).unwrap();
        assert_eq!(sink.rotation_count(), 0);

        sink.write(&second).unwrap();
        assert_eq!(sink.rotation_count(), 1);

        let backup = dir.path().join("svc.log.1.gz");
        assert!(backup.exists());
        assert!(!dir.path().join("svc.log.1").exists());

        let mut expected = first.clone();
        expected.push(b'\n');
        assert_eq!(gunzip(&backup).as_bytes(), expected.as_slice());

        let mut active = second.clone();
        active.push(b'\n');
        assert_eq!(fs::read(&path).unwrap(), active);
    }

    #[test]
    fn test_retains_at_most_max_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");
        let policy = RotationPolicy::new().with_max_size(100).with_max_backups(7);

        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        for i in 0..9 {
            sink.write(&line(i, 60)).unwrap();
        }
        assert_eq!(sink.rotation_count(), 8);

        let compressed: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".gz"))
            .collect();
        assert_eq!(compressed.len(), 7);
        assert!(!dir.path().join("svc.log.8.gz").exists());

        // Newest backup holds the record written just before the last roll
        assert!(gunzip(&dir.path().join("svc.log.1.gz")).starts_with("{\"n\":7}"));
        assert!(gunzip(&dir.path().join("svc.log.7.gz")).starts_with("{\"n\":1}"));
        assert!(fs::read_to_string(&path).unwrap().starts_with("{\"n\":8}"));
    }

    #[test]
    fn test_uncompressed_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.log");
        let policy = RotationPolicy::new()
            .with_max_size(50)
            .with_max_backups(2)
            .with_compression(false);

        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        for i in 0..5 {
            sink.write(&line(i, 40)).unwrap();
        }

        assert!(dir.path().join("plain.log.1").exists());
        assert!(dir.path().join("plain.log.2").exists());
        assert!(!dir.path().join("plain.log.3").exists());
        assert_eq!(sink.backups().len(), 2);
    }

    #[test]
    fn test_zero_backups_discards_rotated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nobackup.log");
        let policy = RotationPolicy::new().with_max_size(50).with_max_backups(0);

        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        for i in 0..3 {
            sink.write(&line(i, 40)).unwrap();
        }

        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert!(fs::read_to_string(&path).unwrap().starts_with("{\"n\":2}"));
    }

    #[test]
    fn test_expired_backups_are_pruned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aged.log");

        let stale = dir.path().join("aged.log.2.gz");
        let fresh = dir.path().join("aged.log.1.gz");
        fs::write(&stale, b"old").unwrap();
        fs::write(&fresh, b"new").unwrap();

        let forty_days_ago = SystemTime::now() - Duration::from_secs(40 * 86_400);
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(forty_days_ago)
            .unwrap();

        let sink = RotatingFileSink::with_policy(&path, RotationPolicy::default()).unwrap();

        assert!(!stale.exists());
        assert!(fresh.exists());
        assert_eq!(sink.backups(), vec![fresh]);
    }

    #[test]
    fn test_lowered_cap_removes_backups_from_earlier_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");

        {
            let policy = RotationPolicy::new().with_max_size(100);
            let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
            for i in 0..9 {
                sink.write(&line(i, 60)).unwrap();
            }
        }
        fs::write(dir.path().join("svc.log.12"), b"stray").unwrap();

        let policy = RotationPolicy::new().with_max_size(100).with_max_backups(2);
        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        assert_eq!(sink.backups().len(), 2);
        assert!(!dir.path().join("svc.log.12").exists());

        for i in 9..13 {
            sink.write(&line(i, 60)).unwrap();
        }

        let compressed = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".gz"))
            .count();
        assert_eq!(compressed, 2);
        assert_eq!(
            sink.backups(),
            vec![dir.path().join("svc.log.1.gz"), dir.path().join("svc.log.2.gz")]
        );
    }

    #[test]
    fn test_expired_backups_beyond_cap_index_are_pruned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aged.log");
        let stale = dir.path().join("aged.log.9");
        fs::write(&stale, b"old").unwrap();

        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(40 * 86_400))
            .unwrap();

        let policy = RotationPolicy::default().with_max_backups(20);
        let sink = RotatingFileSink::with_policy(&path, policy).unwrap();

        assert!(!stale.exists());
        assert!(sink.backups().is_empty());
    }

    #[test]
    fn test_backup_scan_ignores_unrelated_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");
        for name in ["svc.log.1.gz.tmp", "svc.log.old", "svc.log.", "other.log.1", "svc.log.2"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let sink = RotatingFileSink::with_policy(&path, RotationPolicy::default()).unwrap();

        assert_eq!(sink.backups(), vec![dir.path().join("svc.log.2")]);
        assert!(dir.path().join("svc.log.1.gz.tmp").exists());
    }

    #[test]
    fn test_oversized_record_is_written_to_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let policy = RotationPolicy::new().with_max_size(10);

        let mut sink = RotatingFileSink::with_policy(&path, policy).unwrap();
        sink.write(&line(1, 64)).unwrap();

        assert_eq!(sink.rotation_count(), 0);
        assert_eq!(sink.current_size(), 65);
    }
}
