use std::sync::Mutex;

/// Destination for the messages produced while downloading.
pub trait LogSink {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Keeps every message in memory, in the order it was logged.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Severity, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, severity: Severity, message: &str) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((severity, message.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn warning(&self, message: &str) {
        (**self).warning(message);
    }

    fn error(&self, message: &str) {
        (**self).error(message);
    }
}
