//! The partitioning scheme attached to an entity.
//!
//! This module only carries the *data*: which function, which column, which
//! partition/group ids and their qualifiers. The `partition_fn` crate owns
//! the *behavior* — `target(value) -> PartitionId`, validation, and the
//! minimal-placement-cover search — so this struct stays a pure value type
//! the catalog can snapshot and serialize without pulling in routing logic.

use crate::ids::{ColumnId, PartitionGroupId, PartitionId};

/// One partition's qualifier: what values route to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    /// LIST: an explicit set of equality values (canonical string form).
    List(Vec<String>),
    /// RANGE: an inclusive-low/exclusive-high bound, already canonicalized
    /// (low <= high) at construction time.
    Range { low: String, high: String },
    /// The catch-all partition for values matched by no other qualifier.
    Unbound,
}

/// One horizontal slice of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPartition {
    pub id: PartitionId,
    pub group_id: PartitionGroupId,
    pub qualifiers: Vec<Qualifier>,
    pub is_unbound: bool,
}

/// TEMPERATURE-specific configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureConfig {
    pub hot_group_id: PartitionGroupId,
    pub cold_group_id: PartitionGroupId,
    pub hot_in_pct: u8,
    pub hot_out_pct: u8,
    pub frequency_interval_sec: u32,
    /// Opaque cost indication surfaced to the router's tie-break only;
    /// the engine does not interpret its scale.
    pub cost_indication: f64,
}

/// The partitioning scheme of one logical entity.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionProperty {
    /// Not partitioned: one implicit partition.
    None { partition_id: PartitionId },
    Hash {
        partition_column_id: ColumnId,
        partition_ids: Vec<PartitionId>,
    },
    List {
        partition_column_id: ColumnId,
        partition_ids: Vec<PartitionId>,
        unbound_partition_id: Option<PartitionId>,
    },
    Range {
        partition_column_id: ColumnId,
        partition_ids: Vec<PartitionId>,
        unbound_partition_id: Option<PartitionId>,
    },
    /// Wraps an inner HASH/LIST/RANGE scheme; only the group membership of
    /// each partition (hot/cold) is temperature-specific.
    Temperature {
        inner: Box<PartitionProperty>,
        config: TemperatureConfig,
    },
}

impl PartitionProperty {
    /// All partition ids this entity currently has, regardless of scheme.
    pub fn partition_ids(&self) -> Vec<PartitionId> {
        match self {
            PartitionProperty::None { partition_id } => vec![*partition_id],
            PartitionProperty::Hash { partition_ids, .. } => partition_ids.clone(),
            PartitionProperty::List {
                partition_ids,
                unbound_partition_id,
                ..
            }
            | PartitionProperty::Range {
                partition_ids,
                unbound_partition_id,
                ..
            } => {
                let mut ids = partition_ids.clone();
                if let Some(u) = unbound_partition_id {
                    ids.push(*u);
                }
                ids
            }
            PartitionProperty::Temperature { inner, .. } => inner.partition_ids(),
        }
    }

    /// The column driving routing decisions, if any (`None` for unpartitioned
    /// entities).
    pub fn partition_column_id(&self) -> Option<ColumnId> {
        match self {
            PartitionProperty::None { .. } => None,
            PartitionProperty::Hash {
                partition_column_id,
                ..
            }
            | PartitionProperty::List {
                partition_column_id,
                ..
            }
            | PartitionProperty::Range {
                partition_column_id,
                ..
            } => Some(*partition_column_id),
            PartitionProperty::Temperature { inner, .. } => inner.partition_column_id(),
        }
    }

    /// Whether the entity has more than one partition.
    pub fn is_partitioned(&self) -> bool {
        self.partition_ids().len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_has_exactly_one_partition() {
        let p = PartitionProperty::None {
            partition_id: PartitionId::new(1),
        };
        assert_eq!(p.partition_ids(), vec![PartitionId::new(1)]);
        assert!(!p.is_partitioned());
    }

    #[test]
    fn temperature_delegates_partition_ids_to_inner() {
        let inner = PartitionProperty::Hash {
            partition_column_id: ColumnId::new(9),
            partition_ids: vec![PartitionId::new(1), PartitionId::new(2)],
        };
        let temp = PartitionProperty::Temperature {
            inner: Box::new(inner),
            config: TemperatureConfig {
                hot_group_id: PartitionGroupId::new(1),
                cold_group_id: PartitionGroupId::new(2),
                hot_in_pct: 10,
                hot_out_pct: 15,
                frequency_interval_sec: 600,
                cost_indication: 0.0,
            },
        };
        assert_eq!(
            temp.partition_ids(),
            vec![PartitionId::new(1), PartitionId::new(2)]
        );
        assert!(temp.is_partitioned());
    }
}
