//! TEMPERATURE access tracking and reclassification.
//!
//! The wrapper itself routes values by delegating entirely to its inner
//! scheme (see [`crate::strategy::target`]); what lives here is the piece
//! TEMPERATURE actually adds: counting per-partition accesses over a sliding
//! window and periodically re-labeling partitions hot or cold.

use catalog_types::{PartitionGroupId, PartitionId, TemperatureConfig};
use parking_lot::Mutex;
use poly_time::{Time, TimeProviderRef};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

/// Access counters for one TEMPERATURE-partitioned entity.
///
/// Counts are reset at the start of each `frequency_interval_sec` window;
/// [`AccessTracker::reclassify`] reads the just-closed window's counts and
/// starts a new one.
#[derive(Debug)]
pub struct AccessTracker {
    clock: TimeProviderRef,
    inner: Mutex<TrackerState>,
}

#[derive(Debug)]
struct TrackerState {
    window_start: Time,
    counts: HashMap<PartitionId, u64>,
}

/// One partition's new group assignment after a reclassification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclassification {
    pub partition_id: PartitionId,
    pub new_group_id: PartitionGroupId,
}

impl AccessTracker {
    pub fn new(clock: TimeProviderRef) -> Self {
        let window_start = clock.now();
        Self {
            clock,
            inner: Mutex::new(TrackerState {
                window_start,
                counts: HashMap::new(),
            }),
        }
    }

    /// Record one read or write touching `partition_id`.
    pub fn record_access(&self, partition_id: PartitionId) {
        let mut state = self.inner.lock();
        *state.counts.entry(partition_id).or_insert(0) += 1;
    }

    /// Whether a full `frequency_interval_sec` window has elapsed since the
    /// last reclassification.
    pub fn window_elapsed(&self, config: &TemperatureConfig) -> bool {
        let state = self.inner.lock();
        let elapsed = self
            .clock
            .now()
            .checked_duration_since(state.window_start)
            .unwrap_or_default();
        elapsed.num_seconds() >= i64::from(config.frequency_interval_sec)
    }

    /// Decide new hot/cold group membership for every partition currently
    /// known to the tracker, then start a fresh counting window.
    ///
    /// Uses a two-threshold hysteresis band rather than a single cutoff: a
    /// cold partition is promoted to hot only once it ranks inside the top
    /// `hot_in_pct` by access count, but a partition already hot is demoted
    /// back to cold only once it falls outside the (usually wider)
    /// `hot_out_pct` band. A partition ranking between the two stays exactly
    /// where it already was, which is what keeps a partition hovering at the
    /// boundary from flipping group every window.
    ///
    /// `current_groups` is each partition's present group; only partitions
    /// whose computed membership differs are returned. Partitions not yet
    /// seen this window are treated as having zero accesses — they rank
    /// last and are never candidates for promotion.
    pub fn reclassify(
        &self,
        config: &TemperatureConfig,
        current_groups: &[(PartitionId, PartitionGroupId)],
    ) -> Vec<Reclassification> {
        let mut state = self.inner.lock();
        let total_partitions = current_groups.len().max(1);

        let mut by_count: Vec<(PartitionId, u64, PartitionGroupId)> = current_groups
            .iter()
            .map(|(id, group)| (*id, state.counts.get(id).copied().unwrap_or(0), *group))
            .collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.get().cmp(&b.0.get())));

        let mut out = Vec::new();
        for (rank, (partition_id, _, current_group)) in by_count.into_iter().enumerate() {
            let rank_pct = ((rank + 1) * 100) as f64 / total_partitions as f64;
            let currently_hot = current_group == config.hot_group_id;
            let should_be_hot = if currently_hot {
                rank_pct <= config.hot_out_pct as f64
            } else {
                rank_pct <= config.hot_in_pct as f64
            };
            let target_group = if should_be_hot {
                config.hot_group_id
            } else {
                config.cold_group_id
            };
            if target_group != current_group {
                out.push(Reclassification {
                    partition_id,
                    new_group_id: target_group,
                });
            }
        }

        state.counts.clear();
        state.window_start = self.clock.now();
        out
    }
}

/// How often the background reclassification loop should poll, independent
/// of any one entity's own `frequency_interval_sec` (which may be much
/// longer); the loop just needs to notice a window has closed promptly.
pub const RECLASSIFY_POLL_INTERVAL: StdDuration = StdDuration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;
    use poly_time::MockProvider;
    use std::sync::Arc;

    fn config(hot_in_pct: u8) -> TemperatureConfig {
        TemperatureConfig {
            hot_group_id: PartitionGroupId::new(1),
            cold_group_id: PartitionGroupId::new(2),
            hot_in_pct,
            hot_out_pct: hot_in_pct,
            frequency_interval_sec: 60,
            cost_indication: 0.0,
        }
    }

    #[test]
    fn most_accessed_partitions_become_hot() {
        let clock: TimeProviderRef = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let tracker = AccessTracker::new(clock);
        let p1 = PartitionId::new(1);
        let p2 = PartitionId::new(2);
        let p3 = PartitionId::new(3);
        for _ in 0..10 {
            tracker.record_access(p1);
        }
        tracker.record_access(p2);

        let groups = vec![
            (p1, PartitionGroupId::new(2)),
            (p2, PartitionGroupId::new(2)),
            (p3, PartitionGroupId::new(2)),
        ];
        let changes = tracker.reclassify(&config(34), &groups);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].partition_id, p1);
        assert_eq!(changes[0].new_group_id, PartitionGroupId::new(1));
    }

    #[test]
    fn reclassify_resets_the_window() {
        let clock: TimeProviderRef = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let tracker = AccessTracker::new(clock);
        let p1 = PartitionId::new(1);
        let p2 = PartitionId::new(2);
        tracker.record_access(p1);
        let before = vec![(p1, PartitionGroupId::new(2)), (p2, PartitionGroupId::new(2))];
        let first = tracker.reclassify(&config(50), &before);
        assert_eq!(first, vec![Reclassification { partition_id: p1, new_group_id: PartitionGroupId::new(1) }]);

        // Reflect the promotion and re-run with no accesses in the new window.
        let after = vec![(p1, PartitionGroupId::new(1)), (p2, PartitionGroupId::new(2))];
        let again = tracker.reclassify(&config(50), &after);
        assert!(again.is_empty());
    }

    #[test]
    fn a_partition_between_the_two_thresholds_keeps_its_current_group() {
        let clock: TimeProviderRef = Arc::new(MockProvider::new(Time::from_datetime(chrono::Utc::now())));
        let tracker = AccessTracker::new(clock);
        let p1 = PartitionId::new(1);
        let p2 = PartitionId::new(2);
        let p3 = PartitionId::new(3);
        // p1 most accessed (rank ~33%), p2 in the middle (~67%), p3 least (100%).
        for _ in 0..10 {
            tracker.record_access(p1);
        }
        for _ in 0..5 {
            tracker.record_access(p2);
        }

        let config = TemperatureConfig {
            hot_group_id: PartitionGroupId::new(1),
            cold_group_id: PartitionGroupId::new(2),
            hot_in_pct: 40,
            hot_out_pct: 70,
            frequency_interval_sec: 60,
            cost_indication: 0.0,
        };
        // p2 is already hot: its ~67% rank is above hot_in_pct (wouldn't earn
        // promotion from cold) but still inside hot_out_pct, so it keeps its
        // group instead of being demoted — the hysteresis band in action.
        let groups = vec![
            (p1, PartitionGroupId::new(2)),
            (p2, PartitionGroupId::new(1)),
            (p3, PartitionGroupId::new(2)),
        ];
        let changes = tracker.reclassify(&config, &groups);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].partition_id, p1);
        assert_eq!(changes[0].new_group_id, PartitionGroupId::new(1));
    }
}
