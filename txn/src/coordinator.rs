//! Per-transaction bookkeeping: statement scopes, adapter participants, and
//! the commit/rollback fan-out. Locks are acquired through the shared
//! [`LockManager`] and released exactly once, at commit or rollback —
//! strict two-phase locking end to end.

use std::collections::HashSet;
use std::sync::Arc;

use catalog::Catalog;
use catalog_types::{sequence_names, AdapterId, EntityId, TransactionId};
use lock_manager::{LockManager, LockMode};
use observability_deps::tracing::{info, warn};
use parking_lot::Mutex;

use crate::error::{AdapterFailedSnafu, Result, UnknownTransactionSnafu};
use snafu::{IntoError, OptionExt, ResultExt};

#[derive(Debug)]
struct TxState {
    /// The catalog generation visible to this transaction since `begin`.
    snapshot_generation: u64,
    participants: HashSet<AdapterId>,
    next_statement: u32,
}

/// Creates transactions, tracks their adapter participants and statement
/// scopes, and drives commit/rollback across both the lock manager and
/// every adapter touched.
#[derive(Debug)]
pub struct TransactionCoordinator {
    catalog: Arc<Catalog>,
    locks: Arc<LockManager>,
    open: Mutex<std::collections::HashMap<TransactionId, TxState>>,
}

impl TransactionCoordinator {
    pub fn new(catalog: Arc<Catalog>, locks: Arc<LockManager>) -> Self {
        Self {
            catalog,
            locks,
            open: Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Start a new transaction, recording the catalog generation it will
    /// observe until commit or rollback.
    pub fn begin(&self) -> TransactionId {
        let tx = TransactionId::new(self.catalog.sequences().next_val(sequence_names::TRANSACTION));
        let generation = self.catalog.current_snapshot().generation();
        self.open.lock().insert(
            tx,
            TxState {
                snapshot_generation: generation,
                participants: HashSet::new(),
                next_statement: 0,
            },
        );
        tx
    }

    /// The catalog generation `tx` has been observing since `begin`.
    pub fn snapshot_generation(&self, tx: TransactionId) -> Result<u64> {
        let open = self.open.lock();
        let state = open.get(&tx).context(UnknownTransactionSnafu { tx })?;
        Ok(state.snapshot_generation)
    }

    /// Allocate a new statement (execution scope) within `tx`.
    pub fn new_statement(&self, tx: TransactionId) -> Result<u32> {
        let mut open = self.open.lock();
        let state = open.get_mut(&tx).context(UnknownTransactionSnafu { tx })?;
        let id = state.next_statement;
        state.next_statement += 1;
        Ok(id)
    }

    /// Acquire `mode` on `entity` for `tx`, recording it as a participant
    /// has no meaning for locks (they are released independently of
    /// adapters); this only forwards to the lock manager.
    pub async fn lock(&self, tx: TransactionId, entity: EntityId, mode: LockMode) -> Result<()> {
        self.locks.acquire(tx, entity, mode).await?;
        Ok(())
    }

    /// Acquire `mode` on every entity in `requests` for `tx`, as one ordered
    /// batch — see [`LockManager::lock`] for the ordering and rollback
    /// guarantees. Used by statements that touch more than one entity
    /// (multi-table DML, an operation spanning several placements) so their
    /// locking order is consistent across transactions.
    pub async fn lock_many(&self, tx: TransactionId, requests: &[(EntityId, LockMode)]) -> Result<()> {
        self.locks.lock(tx, requests).await?;
        Ok(())
    }

    /// Release `tx`'s locks on exactly `entities`, ahead of commit or
    /// rollback. Other entities `tx` holds are left untouched.
    pub fn unlock(&self, tx: TransactionId, entities: &[EntityId]) {
        self.locks.unlock(tx, entities);
    }

    /// Record that `tx` has written to or read from `adapter`, so commit and
    /// rollback know to call into it.
    pub fn add_participant(&self, tx: TransactionId, adapter: AdapterId) -> Result<()> {
        let mut open = self.open.lock();
        let state = open.get_mut(&tx).context(UnknownTransactionSnafu { tx })?;
        state.participants.insert(adapter);
        Ok(())
    }

    /// Commit `tx`: ask every participant adapter to commit, release all
    /// locks, and forget the transaction. A participant failure leaves the
    /// remaining participants uncommitted from the coordinator's point of
    /// view — the caller is expected to treat this as a fatal error for the
    /// whole transaction, since partial commit is never acceptable.
    pub async fn commit(&self, tx: TransactionId) -> Result<()> {
        let participants = self.take_participants(tx)?;
        for adapter_id in &participants {
            if let Some(handle) = self.catalog.adapter_handle(*adapter_id) {
                handle
                    .commit(tx)
                    .await
                    .context(AdapterFailedSnafu { tx, adapter: *adapter_id, phase: "commit" })?;
            }
        }
        self.locks.release_all(tx);
        info!(?tx, participants = participants.len(), "transaction committed");
        Ok(())
    }

    /// Roll back `tx`: ask every participant to roll back (best-effort —
    /// every participant is attempted even if one fails), release all
    /// locks, and forget the transaction.
    pub async fn rollback(&self, tx: TransactionId) -> Result<()> {
        let participants = self.take_participants(tx)?;
        let mut first_error = None;
        for adapter_id in &participants {
            if let Some(handle) = self.catalog.adapter_handle(*adapter_id) {
                if let Err(source) = handle.rollback(tx).await {
                    warn!(?tx, adapter = ?adapter_id, %source, "adapter rollback failed");
                    first_error.get_or_insert(
                        AdapterFailedSnafu { tx, adapter: *adapter_id, phase: "rollback" }.into_error(source),
                    );
                }
            }
        }
        self.locks.release_all(tx);
        info!(?tx, "transaction rolled back");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn take_participants(&self, tx: TransactionId) -> Result<HashSet<AdapterId>> {
        let mut open = self.open.lock();
        let state = open.remove(&tx).context(UnknownTransactionSnafu { tx })?;
        Ok(state.participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metric::Registry;
    use std::sync::Arc;

    fn coordinator() -> TransactionCoordinator {
        let catalog = Arc::new(Catalog::new());
        let locks = Arc::new(LockManager::new(Arc::new(poly_time::SystemProvider::new()), &Registry::new()));
        TransactionCoordinator::new(catalog, locks)
    }

    #[tokio::test]
    async fn begin_then_commit_releases_locks() {
        let coord = coordinator();
        let tx = coord.begin();
        let entity = EntityId::new(1);
        coord.lock(tx, entity, LockMode::Exclusive).await.unwrap();
        coord.commit(tx).await.unwrap();

        let tx2 = coord.begin();
        coord.lock(tx2, entity, LockMode::Exclusive).await.unwrap();
    }

    #[tokio::test]
    async fn statements_increment_per_transaction() {
        let coord = coordinator();
        let tx = coord.begin();
        assert_eq!(coord.new_statement(tx).unwrap(), 0);
        assert_eq!(coord.new_statement(tx).unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_on_unknown_transaction_fails() {
        let coord = coordinator();
        let result = coord.commit(TransactionId::new(999)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn lock_many_acquires_every_requested_entity() {
        let coord = coordinator();
        let tx = coord.begin();
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);
        coord.lock_many(tx, &[(e1, LockMode::Shared), (e2, LockMode::Exclusive)]).await.unwrap();
        coord.commit(tx).await.unwrap();

        let tx2 = coord.begin();
        coord.lock(tx2, e1, LockMode::Exclusive).await.unwrap();
        coord.lock(tx2, e2, LockMode::Exclusive).await.unwrap();
    }

    #[tokio::test]
    async fn unlock_releases_selected_entities_before_commit() {
        let coord = coordinator();
        let tx = coord.begin();
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);
        coord.lock(tx, e1, LockMode::Exclusive).await.unwrap();
        coord.lock(tx, e2, LockMode::Exclusive).await.unwrap();

        coord.unlock(tx, &[e1]);

        let tx2 = coord.begin();
        coord.lock(tx2, e1, LockMode::Exclusive).await.unwrap();
    }
}
