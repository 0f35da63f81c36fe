//! In-memory logger

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// Logger that keeps every message in memory
///
/// Handy in tests to assert that a missing secret produced a warning or a
/// conversion failure produced an error.
///
/// # Example
///
/// ```
/// use unixsecrets_core::logging::{Logger, LogLevel, MemoryLogger};
///
/// let logger = MemoryLogger::new();
/// logger.warn("Secret 'redis-url' not found");
/// assert_eq!(logger.count(LogLevel::Warn), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages in the order they were logged
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// Messages recorded at exactly `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Number of messages recorded at exactly `level`
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|(l, _)| *l == level).count()
    }

    /// Whether any message at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.records.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
