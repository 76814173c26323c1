//! Id newtypes used across the catalog.
//!
//! Cross-references between logical entities, columns, placements,
//! partitions and allocations are plain ids, never pointers — see the
//! "arena + id" design note: this removes cycle hazards between the
//! catalog's tagged union of entities and keeps snapshots cheap to clone.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicI64, Ordering},
};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Construct from a raw id. Callers get raw ids only from a
            /// [`SequenceStore`] or from catalog lookups, never by guessing.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw numeric id.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(NamespaceId);
id_type!(EntityId);
id_type!(ColumnId);
id_type!(AdapterId);
id_type!(PlacementId);
id_type!(PartitionId);
id_type!(PartitionGroupId);
id_type!(IndexId);
id_type!(ConstraintId);
id_type!(TransactionId);

/// An engine-owned, named source of monotonically increasing ids.
///
/// Replaces the thread-local `NEXTVAL` counters of the source system: one
/// `SequenceStore` lives inside the catalog and is persisted across restarts
/// by serializing its current values alongside the catalog itself.
#[derive(Debug, Default)]
pub struct SequenceStore {
    sequences: Mutex<HashMap<&'static str, AtomicI64>>,
}

/// Well-known sequence names, one per id space.
pub mod sequence_names {
    pub const NAMESPACE: &str = "namespace";
    pub const ENTITY: &str = "entity";
    pub const COLUMN: &str = "column";
    pub const ADAPTER: &str = "adapter";
    pub const PLACEMENT: &str = "placement";
    pub const PARTITION: &str = "partition";
    pub const PARTITION_GROUP: &str = "partition_group";
    pub const INDEX: &str = "index";
    pub const CONSTRAINT: &str = "constraint";
    pub const TRANSACTION: &str = "transaction";
}

impl SequenceStore {
    /// Create a fresh sequence store, all sequences starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and return the next id for `name`.
    pub fn next_val(&self, name: &'static str) -> i64 {
        let mut guard = self.sequences.lock();
        let counter = guard.entry(name).or_insert_with(|| AtomicI64::new(1));
        counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Current (last allocated) value for `name`, without allocating.
    pub fn current_val(&self, name: &'static str) -> i64 {
        let guard = self.sequences.lock();
        guard
            .get(name)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(1)
    }

    /// Restore a sequence's counter, e.g. after deserializing the catalog.
    pub fn restore(&self, name: &'static str, value: i64) {
        let mut guard = self.sequences.lock();
        guard.insert(name, AtomicI64::new(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_store_is_monotonic_per_name() {
        let seq = SequenceStore::new();
        assert_eq!(seq.next_val(sequence_names::ENTITY), 1);
        assert_eq!(seq.next_val(sequence_names::ENTITY), 2);
        assert_eq!(seq.next_val(sequence_names::COLUMN), 1);
        assert_eq!(seq.next_val(sequence_names::ENTITY), 3);
    }

    #[test]
    fn restore_resumes_from_checkpoint() {
        let seq = SequenceStore::new();
        seq.restore(sequence_names::NAMESPACE, 42);
        assert_eq!(seq.next_val(sequence_names::NAMESPACE), 42);
        assert_eq!(seq.next_val(sequence_names::NAMESPACE), 43);
    }
}
