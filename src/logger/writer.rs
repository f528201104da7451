//! Log writer module
//!
//! Thread-safe log sinks: stdout/stderr by default, append-mode files when
//! configured. Lifecycle and error lines get a local timestamp prefix;
//! access lines are written as formatted.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Info and access log target
    access: LogTarget,
    /// Error log target
    error: LogTarget,
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };

        let error = match error_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stderr,
        };

        Ok(Self { access, error })
    }

    /// Write a pre-formatted access log line
    pub fn write_access(&self, message: &str) {
        write_to_target(&self.access, message);
    }

    /// Write a timestamped line to the error log
    pub fn write_error(&self, message: &str) {
        write_to_target(&self.error, &timestamped(message));
    }

    /// Write a timestamped line to the info (access) log
    pub fn write_info(&self, message: &str) {
        write_to_target(&self.access, &timestamped(message));
    }
}

/// Prefix a message the way lifecycle lines are printed: `2024/01/31 12:00:00 message`
pub fn timestamped(message: &str) -> String {
    format!("{} {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

fn write_to_target(target: &LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => println!("{message}"),
        LogTarget::Stderr => eprintln!("{message}"),
        LogTarget::File(file) => {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if `init()` has been called
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target_appends() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");

        let writer =
            LogWriter::new(access.to_str(), error.to_str()).unwrap();
        writer.write_access("GET /index.html 200");
        writer.write_error("[ERROR] boom");
        writer.write_access("GET /app.js 200");

        let access_text = std::fs::read_to_string(&access).unwrap();
        assert_eq!(access_text, "GET /index.html 200\nGET /app.js 200\n");

        let error_text = std::fs::read_to_string(&error).unwrap();
        assert!(error_text.ends_with(" [ERROR] boom\n"));
    }

    #[test]
    fn test_timestamped_prefix() {
        let line = timestamped("Serve 0.0.0.0:80");
        // "YYYY/MM/DD HH:MM:SS " is 20 characters
        assert_eq!(line.len(), 20 + "Serve 0.0.0.0:80".len());
        assert!(line.ends_with(" Serve 0.0.0.0:80"));
    }
}
