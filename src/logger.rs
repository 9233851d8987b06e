//! Custom logging module.
//!
//! This module provides a custom logger implementation that captures log entries
//! and forwards them to a callback, either the console's log pane or stderr
//! when running headless.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Most entries kept for the log pane.
pub const LOG_CAPACITY: usize = 500;

/// Log lines shared between the logger and the render loop.
pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

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

/// Return an empty shared buffer.
///
pub fn log_buffer() -> LogBuffer {
    Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)))
}

/// Append a line, dropping the oldest once the buffer is full.
///
pub fn push_entry(buffer: &LogBuffer, entry: String) {
    if let Ok(mut entries) = buffer.lock() {
        if entries.len() >= LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

/// Custom logger that hands formatted records to a callback
///
pub struct CustomLogger {
    level: LevelFilter,
    log_callback: Arc<Mutex<Option<Box<dyn Fn(String) + Send + Sync>>>>,
}

impl CustomLogger {
    pub fn new(level: LevelFilter) -> Self {
        CustomLogger {
            level,
            log_callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Logger whose records land in the given buffer.
    ///
    pub fn buffered(level: LevelFilter, buffer: LogBuffer) -> Self {
        let logger = CustomLogger::new(level);
        logger.set_log_callback(Box::new(move |entry| push_entry(&buffer, entry)));
        logger
    }

    /// Logger that writes to stderr, for headless subcommands.
    ///
    pub fn stderr(level: LevelFilter) -> Self {
        let logger = CustomLogger::new(level);
        logger.set_log_callback(Box::new(|entry| eprintln!("{}", entry)));
        logger
    }

    pub fn set_log_callback(&self, callback: Box<dyn Fn(String) + Send + Sync>) {
        if let Ok(mut guard) = self.log_callback.lock() {
            *guard = Some(callback);
        }
    }

    /// Install as the global logger.
    ///
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && !metadata.target().starts_with("hyper")
            && !metadata.target().starts_with("reqwest")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(callback) = self.log_callback.lock() {
                if let Some(ref cb) = *callback {
                    cb(format_log(record));
                }
            }
        }
    }

    fn flush(&self) {}
}
