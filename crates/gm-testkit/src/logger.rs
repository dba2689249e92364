use std::cell::RefCell;

use gm_ports::{Kv, LogLevel, Logger};

/// One record captured by [`FakeLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    pub kv: Vec<(String, String)>,
}

/// A [`Logger`] that records every call for later assertion instead of
/// writing anywhere, grounded on the original's `fake_logger_port`.
#[derive(Debug, Default)]
pub struct FakeLogger {
    records: RefCell<Vec<LogRecord>>,
}

impl FakeLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().clone()
    }

    pub fn contains_event(&self, component: &str, message: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| r.component == component && r.message == message)
    }
}

impl Logger for FakeLogger {
    fn log(&self, level: LogLevel, component: &str, message: &str, kv: &[Kv<'_>]) {
        self.records.borrow_mut().push(LogRecord {
            level,
            component: component.to_string(),
            message: message.to_string(),
            kv: kv.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
    }
}
