use super::sampler::RuntimeSampler;
use std::collections::BTreeMap;

/// Counter incremented once per poll.
pub const POLL_COUNT: &str = "PollCount";
/// Gauge set to a fresh random number in `[0, 1)` on every poll.
pub const RANDOM_VALUE: &str = "RandomValue";

/// The agent's in-memory view of everything it will report.
///
/// Gauges are overwritten on every poll; counters survive across polls and
/// only ever grow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    gauges: BTreeMap<String, f64>,
    counters: BTreeMap<String, i64>,
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one poll cycle against `sampler`.
    pub fn poll(&mut self, sampler: &mut dyn RuntimeSampler) {
        for (name, value) in sampler.sample() {
            self.set_gauge(name, value);
        }
        self.set_gauge(RANDOM_VALUE, rand::random::<f64>());
        self.add_counter(POLL_COUNT, 1);
    }

    pub fn set_gauge(&mut self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }

    pub fn add_counter(&mut self, name: &str, delta: i64) {
        let total = self.counters.entry(name.to_string()).or_insert(0);
        *total = total.saturating_add(delta);
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).copied()
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    pub fn gauges(&self) -> &BTreeMap<String, f64> {
        &self.gauges
    }

    pub fn counters(&self) -> &BTreeMap<String, i64> {
        &self.counters
    }

    /// Total number of values a report will send.
    pub fn len(&self) -> usize {
        self.gauges.len() + self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
