//! Minimal metric instrumentation shared across polydb's components.
//!
//! A [`Registry`] hands out named, labelled [`Counter`] and [`DurationHistogram`]
//! instances that components hold onto for their lifetime. There is no export
//! path (Prometheus, OTLP, ...) here — wiring a registry up to an exporter is
//! a front-end concern and out of scope for the engine core.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

/// A monotonically increasing counter, e.g. "migrator batches written".
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Increment by `delta`.
    pub fn inc(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value.
    pub fn fetch(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Records observed durations, e.g. lock wait time or migration batch latency.
#[derive(Debug, Default)]
pub struct DurationHistogram {
    inner: Mutex<DurationHistogramState>,
}

#[derive(Debug, Default)]
struct DurationHistogramState {
    count: u64,
    total: Duration,
}

impl DurationHistogram {
    /// Record one observed duration.
    pub fn record(&self, d: Duration) {
        let mut state = self.inner.lock();
        state.count += 1;
        state.total += d;
    }

    /// Number of observations recorded so far.
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Mean observed duration, or `None` if nothing has been recorded.
    pub fn mean(&self) -> Option<Duration> {
        let state = self.inner.lock();
        (state.count > 0).then(|| state.total / state.count as u32)
    }
}

/// A set of `(name, value)` labels attached to a metric instance.
pub type Attributes = BTreeMap<&'static str, String>;

/// Registry of named metric instruments, keyed by `(name, attributes)`.
#[derive(Debug, Default)]
pub struct Registry {
    counters: Mutex<BTreeMap<(&'static str, Attributes), Arc<Counter>>>,
    histograms: Mutex<BTreeMap<(&'static str, Attributes), Arc<DurationHistogram>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or create a named counter with the given attributes.
    pub fn register_counter(&self, name: &'static str, attributes: Attributes) -> Arc<Counter> {
        Arc::clone(
            self.counters
                .lock()
                .entry((name, attributes))
                .or_insert_with(|| Arc::new(Counter::default())),
        )
    }

    /// Fetch or create a named duration histogram with the given attributes.
    pub fn register_duration_histogram(
        &self,
        name: &'static str,
        attributes: Attributes,
    ) -> Arc<DurationHistogram> {
        Arc::clone(
            self.histograms
                .lock()
                .entry((name, attributes))
                .or_insert_with(|| Arc::new(DurationHistogram::default())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_by_name_and_attributes() {
        let registry = Registry::new();
        let mut attrs = Attributes::new();
        attrs.insert("adapter", "s1".to_string());

        let a = registry.register_counter("migrator.rows", attrs.clone());
        let b = registry.register_counter("migrator.rows", attrs);
        a.inc(5);
        b.inc(2);
        assert_eq!(a.fetch(), 7);
    }

    #[test]
    fn histogram_tracks_mean() {
        let hist = DurationHistogram::default();
        assert_eq!(hist.mean(), None);
        hist.record(Duration::from_millis(100));
        hist.record(Duration::from_millis(200));
        assert_eq!(hist.count(), 2);
        assert_eq!(hist.mean(), Some(Duration::from_millis(150)));
    }
}
