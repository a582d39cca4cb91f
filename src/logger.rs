//! Custom logging module.
//!
//! This module provides the logger installed by the command-line tool. It
//! writes formatted entries to stderr, so they never mix with the rows
//! printed on stdout, and can forward them to a callback.

use crate::error::AppError;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

type Callback = Box<dyn Fn(String) + Send + Sync>;

/// Format a log record into a string for display
///
pub fn format_log(record: &Record) -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let level_str = match record.level() {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    format!("{} {} {}", timestamp, level_str, record.args())
}

/// Logger writing to stderr above a level, optionally capturing entries
///
pub struct CustomLogger {
    level: LevelFilter,
    stderr: bool,
    log_callback: Mutex<Option<Callback>>,
}

impl CustomLogger {
    pub fn new(level: LevelFilter) -> Self {
        CustomLogger {
            level,
            stderr: true,
            log_callback: Mutex::new(None),
        }
    }

    /// Logger that only forwards to its callback.
    ///
    pub fn silent(level: LevelFilter) -> Self {
        CustomLogger {
            stderr: false,
            ..CustomLogger::new(level)
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn set_log_callback(&self, callback: Callback) {
        *self
            .log_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    /// Install as the global logger. The logger lives for the rest of the
    /// process.
    ///
    pub fn init(self) -> Result<(), AppError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self))).map_err(|e| AppError::Logger(e.to_string()))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let formatted = format_log(record);
        if self.stderr {
            // Nothing sensible to do when stderr is gone
            let _ = writeln!(std::io::stderr(), "{}", formatted);
        }
        let callback = self
            .log_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(ref cb) = *callback {
            cb(formatted);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
