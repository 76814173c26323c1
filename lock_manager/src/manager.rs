//! The shared/exclusive lock table over logical entities, with strict
//! two-phase locking: a transaction's locks are only released together, at
//! commit or rollback, never individually mid-transaction.

use crate::{
    error::{DeadlockSnafu, Result},
    graph::WaitForGraph,
    mode::LockMode,
};
use catalog_types::{EntityId, TransactionId};
use metric::{DurationHistogram, Registry};
use observability_deps::tracing::{debug, warn};
use parking_lot::Mutex;
use poly_time::TimeProviderRef;
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::Notify;

#[derive(Debug)]
struct Waiter {
    tx: TransactionId,
    mode: LockMode,
    notify: Arc<Notify>,
}

#[derive(Debug, Default)]
struct Entry {
    holders: Vec<(TransactionId, LockMode)>,
    waiters: VecDeque<Waiter>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: hashbrown::HashMap<EntityId, Entry>,
    wait_for: WaitForGraph,
}

/// Shared/exclusive lock manager over logical entity ids, with deadlock
/// detection performed eagerly (a request that would create a cycle in the
/// wait-for graph is refused rather than left to block forever).
#[derive(Debug)]
pub struct LockManager {
    inner: Mutex<Inner>,
    clock: TimeProviderRef,
    wait_duration: Arc<DurationHistogram>,
}

impl LockManager {
    pub fn new(clock: TimeProviderRef, metrics: &Registry) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
            wait_duration: metrics.register_duration_histogram("lock_manager.wait", Default::default()),
        }
    }

    /// Acquire `mode` on `entity` for `tx`, blocking until granted.
    ///
    /// Re-entrant: if `tx` already holds a lock on `entity` that satisfies
    /// `mode`, this returns immediately. A `Shared` holder requesting
    /// `Exclusive` is an upgrade, granted immediately if `tx` is the sole
    /// holder and otherwise queued like any other request.
    pub async fn acquire(&self, tx: TransactionId, entity: EntityId, mode: LockMode) -> Result<()> {
        loop {
            let notify = {
                let mut inner = self.inner.lock();
                let entry = inner.entries.entry(entity).or_default();

                if let Some(held) = entry.holders.iter_mut().find(|(t, _)| *t == tx) {
                    if held.1.satisfies(mode) {
                        return Ok(());
                    }
                    let sole_holder = entry.holders.len() == 1;
                    if sole_holder && entry.waiters.is_empty() {
                        entry.holders[0].1 = LockMode::Exclusive;
                        return Ok(());
                    }
                } else if entry.waiters.is_empty()
                    && entry
                        .holders
                        .iter()
                        .all(|(_, held_mode)| held_mode.compatible_with(mode))
                {
                    entry.holders.push((tx, mode));
                    return Ok(());
                }

                let blockers: Vec<TransactionId> = entry
                    .holders
                    .iter()
                    .filter(|(t, _)| *t != tx)
                    .map(|(t, _)| *t)
                    .chain(entry.waiters.iter().map(|w| w.tx))
                    .collect();

                inner.wait_for.insert_edges(tx, &blockers);
                if inner.wait_for.has_cycle_from(tx) {
                    inner.wait_for.remove_all_edges_from(tx);
                    warn!(?tx, ?entity, "lock request would deadlock, refusing");
                    return DeadlockSnafu { transaction: tx, entity }.fail();
                }

                let notify = Arc::new(Notify::new());
                inner.entries.entry(entity).or_default().waiters.push_back(Waiter {
                    tx,
                    mode,
                    notify: Arc::clone(&notify),
                });
                notify
            };

            let wait_start = self.clock.now();
            notify.notified().await;
            if let Some(elapsed) = self.clock.now().checked_duration_since(wait_start) {
                if let Ok(std_elapsed) = elapsed.to_std() {
                    self.wait_duration.record(std_elapsed);
                }
            }
        }
    }

    /// Acquire every `(entity, mode)` pair in `requests` for `tx`, in
    /// ascending entity-id order, so two transactions requesting overlapping
    /// entity sets always try to acquire them in the same order and never
    /// deadlock against each other purely from request ordering. If a
    /// request partway through the batch fails (deadlock), every lock this
    /// call itself acquired is released before the error is returned — locks
    /// `tx` already held coming in are left untouched.
    pub async fn lock(&self, tx: TransactionId, requests: &[(EntityId, LockMode)]) -> Result<()> {
        let mut ordered: Vec<(EntityId, LockMode)> = requests.to_vec();
        ordered.sort_by_key(|(entity, _)| entity.get());

        let mut acquired_by_this_call = Vec::with_capacity(ordered.len());
        for (entity, mode) in ordered {
            let already_held = self.holds(tx, entity);
            if let Err(err) = self.acquire(tx, entity, mode).await {
                self.unlock(tx, &acquired_by_this_call);
                return Err(err);
            }
            if !already_held {
                acquired_by_this_call.push(entity);
            }
        }
        Ok(())
    }

    /// Whether `tx` currently holds any lock (shared or exclusive) on
    /// `entity`.
    fn holds(&self, tx: TransactionId, entity: EntityId) -> bool {
        self.inner
            .lock()
            .entries
            .get(&entity)
            .is_some_and(|entry| entry.holders.iter().any(|(t, _)| *t == tx))
    }

    /// Release `tx`'s locks on exactly `entities`, waking any waiter this
    /// unblocks on each. Unlike [`Self::release_all`], locks `tx` holds on
    /// entities outside this list are left untouched and `tx` is not
    /// considered finished.
    pub fn unlock(&self, tx: TransactionId, entities: &[EntityId]) {
        let mut inner = self.inner.lock();
        for &entity in entities {
            let Some(entry) = inner.entries.get_mut(&entity) else {
                continue;
            };
            entry.holders.retain(|(t, _)| *t != tx);
            Self::wake_eligible_waiters(entry);
        }
        debug!(?tx, count = entities.len(), "released selected locks");
    }

    /// Release every lock `tx` holds, and wake any waiter this unblocks.
    /// Called exactly once per transaction, at commit or rollback.
    pub fn release_all(&self, tx: TransactionId) {
        let mut inner = self.inner.lock();
        inner.wait_for.remove_all_edges_from(tx);
        inner.wait_for.remove_all_edges_to(tx);

        let entities: Vec<EntityId> = inner.entries.keys().copied().collect();
        for entity in entities {
            let entry = inner.entries.get_mut(&entity).expect("just listed");
            entry.holders.retain(|(t, _)| *t != tx);
            entry.waiters.retain(|w| w.tx != tx);
            Self::wake_eligible_waiters(entry);
        }
        debug!(?tx, "released all locks");
    }

    /// Grant the front of the waiter queue repeatedly while doing so stays
    /// compatible with the (possibly now-empty) holder set. FIFO order is
    /// preserved: a blocked waiter is never skipped over.
    fn wake_eligible_waiters(entry: &mut Entry) {
        while let Some(front) = entry.waiters.front() {
            let can_grant = entry
                .holders
                .iter()
                .all(|(_, held_mode)| held_mode.compatible_with(front.mode));
            if !can_grant {
                break;
            }
            let waiter = entry.waiters.pop_front().expect("front just checked");
            entry.holders.push((waiter.tx, waiter.mode));
            waiter.notify.notify_one();
            if waiter.mode == LockMode::Exclusive {
                break;
            }
        }
    }

    /// Snapshot of the current wait-for graph, for tests and diagnostics.
    pub fn debug_wait_for_edges(&self) -> Vec<(TransactionId, TransactionId)> {
        self.inner.lock().wait_for.debug_wait_for_edges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_helpers::timeout::timeout_panic;

    fn manager() -> LockManager {
        test_helpers::maybe_start_logging();
        LockManager::new(
            Arc::new(poly_time::SystemProvider::new()),
            &Registry::new(),
        )
    }

    #[tokio::test]
    async fn shared_locks_coexist() {
        let lm = manager();
        let e = EntityId::new(1);
        lm.acquire(TransactionId::new(1), e, LockMode::Shared).await.unwrap();
        lm.acquire(TransactionId::new(2), e, LockMode::Shared).await.unwrap();
    }

    #[tokio::test]
    async fn reacquiring_same_mode_is_a_no_op() {
        let lm = manager();
        let e = EntityId::new(1);
        let tx = TransactionId::new(1);
        lm.acquire(tx, e, LockMode::Shared).await.unwrap();
        lm.acquire(tx, e, LockMode::Shared).await.unwrap();
    }

    #[tokio::test]
    async fn sole_holder_upgrades_without_blocking() {
        let lm = manager();
        let e = EntityId::new(1);
        let tx = TransactionId::new(1);
        lm.acquire(tx, e, LockMode::Shared).await.unwrap();
        lm.acquire(tx, e, LockMode::Exclusive).await.unwrap();
    }

    #[tokio::test]
    async fn release_wakes_a_waiting_exclusive_request() {
        let lm = Arc::new(manager());
        let e = EntityId::new(1);
        let holder = TransactionId::new(1);
        let waiter = TransactionId::new(2);

        lm.acquire(holder, e, LockMode::Exclusive).await.unwrap();

        let lm2 = Arc::clone(&lm);
        let handle = tokio::spawn(async move { lm2.acquire(waiter, e, LockMode::Exclusive).await });

        tokio::task::yield_now().await;
        lm.release_all(holder);
        timeout_panic(Duration::from_secs(5), async { handle.await.unwrap().unwrap() }).await;
    }

    #[tokio::test]
    async fn direct_cycle_is_refused_as_deadlock() {
        let lm = Arc::new(manager());
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);
        let tx1 = TransactionId::new(1);
        let tx2 = TransactionId::new(2);

        lm.acquire(tx1, e1, LockMode::Exclusive).await.unwrap();
        lm.acquire(tx2, e2, LockMode::Exclusive).await.unwrap();

        let lm2 = Arc::clone(&lm);
        // tx2 now waits on tx1 (holds e1); this adds the tx2 -> tx1 edge.
        let _handle = tokio::spawn(async move { lm2.acquire(tx2, e1, LockMode::Exclusive).await });
        tokio::task::yield_now().await;

        // tx1 -> tx2 would close the cycle: refused rather than left to block.
        let result = lm.acquire(tx1, e2, LockMode::Exclusive).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn batch_lock_acquires_every_request() {
        let lm = manager();
        let tx = TransactionId::new(1);
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);

        lm.lock(tx, &[(e2, LockMode::Shared), (e1, LockMode::Exclusive)]).await.unwrap();

        // Both entities are now held, in ascending-id acquisition order.
        lm.acquire(tx, e1, LockMode::Exclusive).await.unwrap();
        lm.acquire(tx, e2, LockMode::Shared).await.unwrap();
    }

    #[tokio::test]
    async fn batch_lock_rolls_back_what_it_acquired_on_failure() {
        let lm = Arc::new(manager());
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);
        let e3 = EntityId::new(3);
        let tx1 = TransactionId::new(1);
        let tx2 = TransactionId::new(2);

        lm.acquire(tx1, e3, LockMode::Exclusive).await.unwrap();
        lm.acquire(tx2, e2, LockMode::Exclusive).await.unwrap();

        let lm2 = Arc::clone(&lm);
        // tx2 now waits on tx1 for e3, adding the tx2 -> tx1 edge.
        let _handle = tokio::spawn(async move { lm2.acquire(tx2, e3, LockMode::Exclusive).await });
        tokio::task::yield_now().await;

        // e1 is free and acquired first; e2 (held by tx2) would add tx1 -> tx2,
        // closing the cycle, so the whole batch fails and e1 must be released.
        let result = lm.lock(tx1, &[(e1, LockMode::Exclusive), (e2, LockMode::Exclusive)]).await;
        assert!(result.is_err());

        let other = TransactionId::new(3);
        lm.acquire(other, e1, LockMode::Exclusive).await.unwrap();
    }

    #[tokio::test]
    async fn unlock_releases_only_the_named_entities() {
        let lm = manager();
        let tx = TransactionId::new(1);
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);

        lm.acquire(tx, e1, LockMode::Exclusive).await.unwrap();
        lm.acquire(tx, e2, LockMode::Exclusive).await.unwrap();

        lm.unlock(tx, &[e1]);

        // e1 was released: another transaction can now take it.
        let other = TransactionId::new(2);
        lm.acquire(other, e1, LockMode::Exclusive).await.unwrap();

        // e2 was untouched: tx still holds it, so re-acquiring is a no-op.
        lm.acquire(tx, e2, LockMode::Exclusive).await.unwrap();
    }
}
