use std::cell::RefCell;

use gm_ports::{Diagnostics, Kv};

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    pub component: String,
    pub event: String,
    pub kv: Vec<(String, String)>,
}

/// A [`Diagnostics`] sink that records every emitted breadcrumb.
#[derive(Debug, Default)]
pub struct FakeDiagnostics {
    events: RefCell<Vec<DiagnosticEvent>>,
}

impl FakeDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.borrow().clone()
    }

    pub fn count_of(&self, event: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.event == event).count()
    }
}

impl Diagnostics for FakeDiagnostics {
    fn emit(&self, component: &str, event: &str, kv: &[Kv<'_>]) {
        self.events.borrow_mut().push(DiagnosticEvent {
            component: component.to_string(),
            event: event.to_string(),
            kv: kv.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_of_counts_matching_events_only() {
        let diag = FakeDiagnostics::new();
        diag.emit("journal", "journal_nff_retry", &[]);
        diag.emit("cache", "rebuild_prep_failed", &[]);
        diag.emit("journal", "journal_nff_retry", &[]);
        assert_eq!(diag.count_of("journal_nff_retry"), 2);
        assert_eq!(diag.count_of("rebuild_prep_failed"), 1);
    }
}
