use std::cell::RefCell;

use gm_ports::{Kv, Metrics};

#[derive(Debug, Clone, PartialEq)]
pub struct CounterCall {
    pub name: String,
    pub value: u64,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeCall {
    pub name: String,
    pub value: f64,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingCall {
    pub name: String,
    pub value: u64,
    pub tags: Vec<(String, String)>,
}

/// A [`Metrics`] sink that records every counter/gauge/timing call,
/// grounded on the original's `fake_metrics_port`.
#[derive(Debug, Default)]
pub struct FakeMetrics {
    counters: RefCell<Vec<CounterCall>>,
    gauges: RefCell<Vec<GaugeCall>>,
    timings: RefCell<Vec<TimingCall>>,
}

impl FakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> Vec<CounterCall> {
        self.counters.borrow().clone()
    }

    pub fn gauges(&self) -> Vec<GaugeCall> {
        self.gauges.borrow().clone()
    }

    pub fn timings(&self) -> Vec<TimingCall> {
        self.timings.borrow().clone()
    }

    /// Sum of every counter increment recorded under `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .borrow()
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.value)
            .sum()
    }
}

fn owned(tags: &[Kv<'_>]) -> Vec<(String, String)> {
    tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

impl Metrics for FakeMetrics {
    fn counter_add(&self, name: &str, value: u64, tags: &[Kv<'_>]) {
        self.counters.borrow_mut().push(CounterCall {
            name: name.to_string(),
            value,
            tags: owned(tags),
        });
    }

    fn gauge_set(&self, name: &str, value: f64, tags: &[Kv<'_>]) {
        self.gauges.borrow_mut().push(GaugeCall {
            name: name.to_string(),
            value,
            tags: owned(tags),
        });
    }

    fn timing_ms(&self, name: &str, value: u64, tags: &[Kv<'_>]) {
        self.timings.borrow_mut().push(TimingCall {
            name: name.to_string(),
            value,
            tags: owned(tags),
        });
    }
}
