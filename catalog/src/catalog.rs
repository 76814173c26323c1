//! The mutable catalog: an `ArcSwap`-backed pointer to the current
//! [`Snapshot`], published atomically on every committed change, plus the
//! id sequences and deployed adapter handles that sit alongside it.

use arc_swap::ArcSwap;
use catalog_types::{sequence_names, AdapterId, SequenceStore};
use observability_deps::tracing::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::Adapter;
use crate::builder::SnapshotBuilder;
use crate::snapshot::Snapshot;

/// Owns the current snapshot pointer and the engine-wide id sequences.
/// Cloning a `Catalog` handle is cheap (everything inside is already
/// `Arc`-backed); every clone observes the same published snapshot stream.
#[derive(Debug)]
pub struct Catalog {
    current: Arc<ArcSwap<Snapshot>>,
    sequences: Arc<SequenceStore>,
    adapters: Arc<RwLock<HashMap<AdapterId, Arc<dyn Adapter>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::default())),
            sequences: Arc::new(SequenceStore::new()),
            adapters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The current published snapshot. Cheap: an `Arc` clone under the hood.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn sequences(&self) -> &SequenceStore {
        &self.sequences
    }

    /// Start a builder against the snapshot currently published, for a
    /// caller about to stage a batch of mutations.
    pub fn new_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder::from_snapshot(&self.current_snapshot())
    }

    /// Publish `next` as the current snapshot. The DDL orchestrator calls
    /// this only after invariant checks on `next` have passed; readers
    /// never observe a half-applied change because the swap is the single
    /// point where a new snapshot becomes visible.
    pub fn publish(&self, next: Snapshot) -> Arc<Snapshot> {
        let generation = next.generation();
        let arced = Arc::new(next);
        self.current.store(Arc::clone(&arced));
        info!(generation, "published new catalog snapshot");
        arced
    }

    pub fn register_adapter(&self, id: AdapterId, handle: Arc<dyn Adapter>) {
        self.adapters.write().insert(id, handle);
    }

    pub fn unregister_adapter(&self, id: AdapterId) {
        self.adapters.write().remove(&id);
    }

    pub fn adapter_handle(&self, id: AdapterId) -> Option<Arc<dyn Adapter>> {
        self.adapters.read().get(&id).cloned()
    }

    pub fn next_adapter_id(&self) -> AdapterId {
        AdapterId::new(self.sequences.next_val(sequence_names::ADAPTER))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{Namespace, NamespaceKind};

    #[test]
    fn publish_is_visible_to_every_handle() {
        let catalog = Catalog::new();
        let mut builder = catalog.new_builder();
        builder.insert_namespace(Namespace {
            id: catalog_types::NamespaceId::new(1),
            name: "public".to_string(),
            kind: NamespaceKind::Relational,
            owner: "admin".to_string(),
        });
        catalog.publish(builder.build());

        let snapshot = catalog.current_snapshot();
        assert_eq!(snapshot.generation(), 1);
        assert!(snapshot.namespace_by_name("public").is_ok());
    }

    #[test]
    fn sequences_are_monotonic_across_publishes() {
        let catalog = Catalog::new();
        let a = catalog.next_adapter_id();
        let b = catalog.next_adapter_id();
        assert_ne!(a, b);
    }
}
