//! Time functionality for polydb.
//!
//! The TEMPERATURE partition function's background reclassification task and
//! the DDL Orchestrator's audit timestamps both need a clock. Routing through
//! a [`TimeProvider`] trait object instead of calling `Utc::now()` directly
//! lets tests fast-forward or freeze time deterministically.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::{fmt::Debug, sync::Arc};

/// A point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(DateTime<Utc>);

impl Time {
    /// Construct from a [`DateTime<Utc>`].
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The underlying [`DateTime<Utc>`].
    pub fn date_time(&self) -> DateTime<Utc> {
        self.0
    }

    /// Duration elapsed between `earlier` and `self`; zero if `earlier` is in the future.
    pub fn checked_duration_since(&self, earlier: Time) -> Option<Duration> {
        let delta = self.0 - earlier.0;
        (delta >= Duration::zero()).then_some(delta)
    }

    /// `self + duration`.
    pub fn checked_add(&self, duration: Duration) -> Option<Time> {
        self.0.checked_add_signed(duration).map(Time)
    }
}

/// Anything that can produce the current time.
///
/// Production code uses [`SystemProvider`]; tests use [`MockProvider`] to
/// control the clock precisely (needed for the TEMPERATURE sliding window).
pub trait TimeProvider: Debug + Send + Sync {
    /// Current time.
    fn now(&self) -> Time;
}

/// [`TimeProvider`] backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider {}

impl SystemProvider {
    /// Create a new instance.
    pub fn new() -> Self {
        Self {}
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        Time(Utc::now())
    }
}

/// [`TimeProvider`] that returns a fixed, settable time; used in tests.
#[derive(Debug)]
pub struct MockProvider {
    now: RwLock<Time>,
}

impl MockProvider {
    /// Create a new mock frozen at `now`.
    pub fn new(now: Time) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the mock clock forward.
    pub fn set(&self, now: Time) {
        *self.now.write() = now;
    }

    /// Advance the mock clock by `duration`.
    pub fn inc(&self, duration: Duration) {
        let mut guard = self.now.write();
        *guard = guard.checked_add(duration).expect("time overflow in test");
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.read()
    }
}

/// Convenience alias used throughout polydb for an injected clock.
pub type TimeProviderRef = Arc<dyn TimeProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_advances() {
        let t0 = Time::from_datetime(Utc::now());
        let mock = MockProvider::new(t0);
        assert_eq!(mock.now(), t0);

        mock.inc(Duration::seconds(60));
        let t1 = mock.now();
        assert_eq!(t1.checked_duration_since(t0), Some(Duration::seconds(60)));
    }
}
