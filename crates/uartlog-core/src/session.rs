//! Log session manager and record writer.
//!
//! A session is the lifecycle of one open log file. The state machine has two
//! states, Closed (initial) and Open; a non-blank line opens a freshly-named
//! file, idle expiry closes it. Reopening always derives a new name from the
//! current local time — a reopen within the same second collides on the name
//! and truncates, an accepted limitation.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use crate::sanitize::SanitizedLine;

/// Error type for session failures. All variants are non-fatal at the
/// per-line level; the triggering line is rerouted to the unlogged path.
#[derive(Debug)]
pub enum SessionError {
    /// The log file could not be created. The session stays Closed and the
    /// next non-blank line retries.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A record could not be written to the open file.
    Write(std::io::Error),
    /// No session is open at the moment a line must be recorded.
    Closed,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Open { path, source } => {
                write!(f, "failed to open logfile '{}': {}", path.display(), source)
            }
            SessionError::Write(e) => write!(f, "failed to write log record: {}", e),
            SessionError::Closed => write!(f, "no log session is open"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Write(e)
    }
}

/// Where an accepted line ended up.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Appended to the open log file.
    Logged,
    /// No session was available; the caller surfaces the line on stdout so
    /// it is not silently lost.
    Unlogged,
}

/// Derives the log file name for a session opened at `now` (local time).
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("UARTLog-{}.log", now.format("%Y-%m-%d_%H%M%S"))
}

/// Formats one log record: 10-digit epoch seconds, 6-digit microseconds.
pub fn format_record(now: DateTime<Utc>, text: &str) -> String {
    format!(
        "({:010}.{:06}) uart {}\n",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        text
    )
}

/// Formats the stdout fallback for a line that could not be logged. The
/// double space after the marker matches the historical output.
pub fn unlogged_line(text: &str) -> String {
    format!("UNLOGGED --  {}", text)
}

/// The single log session. The file handle is present iff the session is
/// Open.
pub struct LogSession {
    log_dir: PathBuf,
    file: Option<File>,
}

impl LogSession {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Closed → Open: creates a file named from `now`. A no-op when already
    /// Open. On failure the session remains Closed.
    pub fn open_at(&mut self, now: DateTime<Local>) -> Result<(), SessionError> {
        if self.file.is_some() {
            return Ok(());
        }
        let path = self.log_dir.join(log_file_name(now));
        let file = File::create(&path).map_err(|source| SessionError::Open {
            path: path.clone(),
            source,
        })?;
        info!("Enabling logfile '{}'", path.display());
        self.file = Some(file);
        Ok(())
    }

    /// Open → Closed: flushes and releases the handle. Idempotent.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                warn!("Failed to flush logfile on close: {}", e);
            }
        }
    }

    /// Appends one record to the open file. The timestamp is the moment the
    /// line was accepted, captured by the caller before the write.
    pub fn append(&mut self, line: &SanitizedLine, now: DateTime<Utc>) -> Result<(), SessionError> {
        let file = self.file.as_mut().ok_or(SessionError::Closed)?;
        file.write_all(format_record(now, &line.text).as_bytes())?;
        Ok(())
    }

    /// Routes one accepted non-blank line: ensures the session is Open, then
    /// appends. Returns `Unlogged` when no session could be opened or the
    /// write failed, so the caller can surface the line instead.
    pub fn record(&mut self, line: &SanitizedLine, now: DateTime<Utc>) -> LineOutcome {
        if self.file.is_none()
            && let Err(e) = self.open_at(now.with_timezone(&Local))
        {
            warn!("{}", e);
            return LineOutcome::Unlogged;
        }
        match self.append(line, now) {
            Ok(()) => LineOutcome::Logged,
            Err(e) => {
                warn!("{}", e);
                LineOutcome::Unlogged
            }
        }
    }
}
