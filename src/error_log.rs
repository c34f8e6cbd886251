//! # Error Log Module
//!
//! Sink per i messaggi di errore dell'ottimizzatore.
//!
//! Ogni chiamata fallita di `Optimizer::optimize` produce esattamente una riga
//! nel sink. L'implementazione di default (`FileErrorLog`) scrive righe con
//! timestamp in append su file, e duplica il messaggio su `tracing`.
//!
//! ## Formato riga:
//! ```text
//! [19/Oct/2026 14:03:11] Source file (/photos/missing.png) does not exist
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Receives plain-text error messages
pub trait ErrorLog: Send + Sync {
    fn log_error(&self, message: &str);
}

/// Append-only, timestamped error log on disk
#[derive(Debug, Clone)]
pub struct FileErrorLog {
    path: PathBuf,
}

impl FileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format a message the way it lands in the file
    pub fn format_line(message: &str) -> String {
        format!("{} {}\n", chrono::Local::now().format("[%d/%b/%Y %H:%M:%S]"), message)
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl ErrorLog for FileErrorLog {
    fn log_error(&self, message: &str) {
        if message.is_empty() {
            return;
        }

        error!("{}", message);

        if let Err(e) = self.append(&Self::format_line(message)) {
            warn!("Failed to write error log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_timestamped_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log = FileErrorLog::new(temp_dir.path().join("nested").join("debug.log"));

        log.log_error("first failure");
        log.log_error("second failure");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first failure"));
        assert!(lines[1].ends_with("] second failure"));
    }

    #[test]
    fn test_empty_message_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let log = FileErrorLog::new(temp_dir.path().join("debug.log"));

        log.log_error("");
        assert!(!log.path().exists());
    }

    #[test]
    fn test_line_format() {
        let line = FileErrorLog::format_line("boom");
        // [dd/Mon/YYYY HH:MM:SS] boom
        assert_eq!(line.find(']'), Some(21));
        assert_eq!(&line[3..4], "/");
        assert!(line.ends_with(" boom\n"));
    }

    #[test]
    fn test_unwritable_log_does_not_panic() {
        let temp_dir = TempDir::new().unwrap();
        // A directory in place of the log file
        let log = FileErrorLog::new(temp_dir.path());
        log.log_error("still fine");
    }
}
