//! Append-only session log
//!
//! One shared file collects everything a session does: our own records,
//! every line the tor child prints, and the banner separating runs. Writers
//! from any thread or task append through the same sink; the lock is held
//! only for the write and flush of a single record, so records never
//! interleave mid-line.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;

use crate::constants;

#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogSink {
    /// Open the log file in append mode, creating it (and its directory)
    /// if needed
    pub fn open(path: &Path) -> io::Result<LogSink> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LogSink {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the banner that separates sessions in the shared file
    pub fn init_session(&self) -> io::Result<()> {
        let started = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self.lock();
        writeln!(file)?;
        writeln!(file, "{}", constants::SESSION_DELIMITER)?;
        writeln!(file, "TorTray Session Started: {started}")?;
        writeln!(file, "{}", constants::SESSION_DELIMITER)?;
        file.flush()
    }

    /// Append one timestamped record
    pub fn append(&self, line: &str) -> io::Result<()> {
        let stamp = Local::now().format("%b %d %H:%M:%S%.3f");
        let mut file = self.lock();
        writeln!(file, "{stamp} {line}")?;
        file.flush()
    }

    /// Truncate the log, leaving a single marker record
    pub fn clear(&self) -> io::Result<()> {
        let cleared = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self.lock();
        file.set_len(0)?;
        writeln!(file, "Logs cleared: {cleared}")?;
        file.flush()
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        // A poisoned lock means another writer panicked mid-record; the
        // handle itself is still good for appending
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
