//! The `PartitionFunction` trait and the HASH/LIST/RANGE strategies.
//!
//! Every implementation is a pure, stateless strategy object: no partition
//! function holds per-entity state, it only interprets the `PartitionProperty`
//! value it is handed.

use crate::{
    error::{self, Result},
    value::{canonicalize, compare_canonical},
};
use catalog_types::{PartitionId, PartitionProperty, PolyType, Qualifier};
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

/// A partition-routing strategy: deterministic, total, and — per spec — free
/// of side effects.
pub trait PartitionFunction: std::fmt::Debug + Send + Sync {
    /// Whether a column of this type may be used as the partition column.
    fn supports_column_of_type(&self, poly_type: PolyType) -> bool;

    /// Whether this scheme needs a designated catch-all partition.
    fn requires_unbound_partition_group(&self) -> bool;

    /// Given the total number of partitions, how many belong to one group
    /// under this function's default grouping (identity for HASH/LIST/RANGE,
    /// overridden by the TEMPERATURE wrapper).
    fn number_of_partitions_per_group(&self, total: usize) -> usize {
        total
    }

    /// Validate a fully-built `PartitionProperty` against this function's
    /// rules. Called once at DDL time, not on every route.
    fn validate(&self, property: &PartitionProperty) -> Result<()>;
}

/// `target = partitionIds[hash(value) mod n]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashPartitionFn;

fn sip_hash(value: &str) -> u64 {
    let mut hasher = SipHasher13::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl PartitionFunction for HashPartitionFn {
    fn supports_column_of_type(&self, _poly_type: PolyType) -> bool {
        true
    }

    fn requires_unbound_partition_group(&self) -> bool {
        false
    }

    fn validate(&self, property: &PartitionProperty) -> Result<()> {
        match property {
            PartitionProperty::Hash { partition_ids, .. } if !partition_ids.is_empty() => Ok(()),
            PartitionProperty::Hash { .. } => {
                error::MissingUnboundPartitionSnafu { count: 0usize }.fail()
            }
            _ => unreachable!("HashPartitionFn.validate called with non-HASH property"),
        }
    }
}

impl HashPartitionFn {
    /// `target = partitionIds[hash(value) mod n]`.
    pub fn target(&self, property: &PartitionProperty, value: Option<&str>) -> Result<PartitionId> {
        let partition_ids = match property {
            PartitionProperty::Hash { partition_ids, .. } => partition_ids,
            _ => unreachable!("HashPartitionFn.target called with non-HASH property"),
        };
        let canonical = canonicalize(value);
        let bucket = (sip_hash(&canonical) as usize) % partition_ids.len();
        Ok(partition_ids[bucket])
    }
}

/// `target = partition whose qualifiers contain value, else the unbound partition`.
/// `PartitionProperty::List` itself only carries partition ids; qualifiers
/// live on the catalog's `AllocationPartition` rows and are passed in
/// explicitly to `target_with_qualifiers`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListPartitionFn;

impl ListPartitionFn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route using the qualifiers attached to each candidate partition.
    /// `partitions` must be index-aligned with the ids returned by
    /// `PartitionProperty::partition_ids()` for the same entity.
    pub fn target_with_qualifiers(
        &self,
        property: &PartitionProperty,
        partitions: &[(PartitionId, &[Qualifier])],
        value: Option<&str>,
    ) -> Result<PartitionId> {
        let unbound = match property {
            PartitionProperty::List {
                unbound_partition_id,
                ..
            } => *unbound_partition_id,
            _ => unreachable!("ListPartitionFn used with non-LIST property"),
        };
        let canonical = canonicalize(value);
        for (id, qualifiers) in partitions {
            for q in *qualifiers {
                if let Qualifier::List(values) = q {
                    if values.iter().any(|v| v == &canonical) {
                        return Ok(*id);
                    }
                }
            }
        }
        unbound.ok_or(error::Error::Unroutable { value: canonical })
    }
}

impl PartitionFunction for ListPartitionFn {
    fn supports_column_of_type(&self, poly_type: PolyType) -> bool {
        !matches!(poly_type, PolyType::Json | PolyType::Array(_))
    }

    fn requires_unbound_partition_group(&self) -> bool {
        true
    }

    fn validate(&self, property: &PartitionProperty) -> Result<()> {
        match property {
            PartitionProperty::List {
                unbound_partition_id,
                ..
            } => {
                if unbound_partition_id.is_none() {
                    return error::MissingUnboundPartitionSnafu { count: 0usize }.fail();
                }
                Ok(())
            }
            _ => unreachable!("ListPartitionFn.validate called with non-LIST property"),
        }
    }
}

/// `target = unique partition whose [low, high) contains value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangePartitionFn;

impl RangePartitionFn {
    /// Canonicalize a raw `(low, high)` pair, swapping if given in reverse
    /// order, so bounds are always stored low-first.
    pub fn canonicalize_bounds(low: &str, high: &str) -> (String, String) {
        if compare_canonical(low, high) == std::cmp::Ordering::Greater {
            (high.to_string(), low.to_string())
        } else {
            (low.to_string(), high.to_string())
        }
    }

    pub fn target_with_qualifiers(
        &self,
        property: &PartitionProperty,
        partitions: &[(PartitionId, &[Qualifier])],
        value: Option<&str>,
    ) -> Result<PartitionId> {
        let unbound = match property {
            PartitionProperty::Range {
                unbound_partition_id,
                ..
            } => *unbound_partition_id,
            _ => unreachable!("RangePartitionFn used with non-RANGE property"),
        };
        let canonical = canonicalize(value);
        for (id, qualifiers) in partitions {
            for q in *qualifiers {
                if let Qualifier::Range { low, high } = q {
                    // lower-inclusive, upper-exclusive
                    let above_low = compare_canonical(&canonical, low) != std::cmp::Ordering::Less;
                    let below_high =
                        compare_canonical(&canonical, high) == std::cmp::Ordering::Less;
                    if above_low && below_high {
                        return Ok(*id);
                    }
                }
            }
        }
        unbound.ok_or(error::Error::Unroutable { value: canonical })
    }
}

impl PartitionFunction for RangePartitionFn {
    fn supports_column_of_type(&self, poly_type: PolyType) -> bool {
        poly_type.is_orderable()
    }

    fn requires_unbound_partition_group(&self) -> bool {
        true
    }

    fn validate(&self, property: &PartitionProperty) -> Result<()> {
        match property {
            PartitionProperty::Range {
                unbound_partition_id,
                ..
            } => {
                if unbound_partition_id.is_none() {
                    return error::MissingUnboundPartitionSnafu { count: 0usize }.fail();
                }
                Ok(())
            }
            _ => unreachable!("RangePartitionFn.validate called with non-RANGE property"),
        }
    }
}

/// Validate a set of RANGE qualifiers are pairwise disjoint, after
/// canonicalizing each pair's bounds.
pub fn validate_range_qualifiers(qualifiers: &[(PartitionId, String, String)]) -> Result<()> {
    for i in 0..qualifiers.len() {
        let (_, a_low, a_high) = &qualifiers[i];
        if compare_canonical(a_low, a_high) == std::cmp::Ordering::Greater {
            return error::InvalidRangeBoundsSnafu {
                low: a_low.clone(),
                high: a_high.clone(),
            }
            .fail();
        }
        for j in (i + 1)..qualifiers.len() {
            let (_, b_low, b_high) = &qualifiers[j];
            let disjoint = compare_canonical(a_high, b_low) != std::cmp::Ordering::Greater
                || compare_canonical(b_high, a_low) != std::cmp::Ordering::Greater;
            if !disjoint {
                return error::OverlappingRangeQualifiersSnafu {
                    a_low: a_low.clone(),
                    a_high: a_high.clone(),
                    b_low: b_low.clone(),
                    b_high: b_high.clone(),
                }
                .fail();
            }
        }
    }
    Ok(())
}

/// Validate a set of LIST qualifiers are pairwise disjoint.
pub fn validate_list_qualifiers(qualifiers: &[(PartitionId, Vec<String>)]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for (_, values) in qualifiers {
        for v in values {
            if !seen.insert(v.clone()) {
                return error::DuplicateListQualifierSnafu { value: v.clone() }.fail();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_property(ids: Vec<i64>) -> PartitionProperty {
        PartitionProperty::Hash {
            partition_column_id: catalog_types::ColumnId::new(1),
            partition_ids: ids.into_iter().map(PartitionId::new).collect(),
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let f = HashPartitionFn;
        let prop = hash_property(vec![1, 2, 3]);
        let t1 = f.target(&prop, Some("hans")).unwrap();
        let t2 = f.target(&prop, Some("hans")).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn hash_null_routes_to_sentinel_bucket() {
        let f = HashPartitionFn;
        let prop = hash_property(vec![1, 2, 3]);
        let t1 = f.target(&prop, None).unwrap();
        let t2 = f.target(&prop, None).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn range_bounds_canonicalize_swapped_order() {
        let (low, high) = RangePartitionFn::canonicalize_bounds("10", "6");
        assert_eq!((low.as_str(), high.as_str()), ("6", "10"));
    }

    #[test]
    fn range_lower_inclusive_upper_exclusive() {
        let f = RangePartitionFn;
        let p1 = PartitionId::new(1);
        let p2 = PartitionId::new(2);
        let prop = PartitionProperty::Range {
            partition_column_id: catalog_types::ColumnId::new(1),
            partition_ids: vec![p1, p2],
            unbound_partition_id: None,
        };
        let q1 = vec![Qualifier::Range {
            low: "4".into(),
            high: "5".into(),
        }];
        let q2 = vec![Qualifier::Range {
            low: "6".into(),
            high: "10".into(),
        }];
        let partitions: Vec<(PartitionId, &[Qualifier])> = vec![(p1, &q1), (p2, &q2)];
        assert_eq!(
            f.target_with_qualifiers(&prop, &partitions, Some("6")).unwrap(),
            p2
        );
        assert_eq!(
            f.target_with_qualifiers(&prop, &partitions, Some("7")).unwrap(),
            p2
        );
        assert!(f.target_with_qualifiers(&prop, &partitions, Some("10")).is_err());
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let p1 = PartitionId::new(1);
        let p2 = PartitionId::new(2);
        let err = validate_range_qualifiers(&[
            (p1, "0".to_string(), "10".to_string()),
            (p2, "5".to_string(), "15".to_string()),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn list_value_not_in_any_qualifier_is_unbound() {
        let f = ListPartitionFn::new();
        let unbound = PartitionId::new(99);
        let p1 = PartitionId::new(1);
        let prop = PartitionProperty::List {
            partition_column_id: catalog_types::ColumnId::new(1),
            partition_ids: vec![p1],
            unbound_partition_id: Some(unbound),
        };
        let q1 = vec![Qualifier::List(vec!["a".into(), "b".into()])];
        let partitions: Vec<(PartitionId, &[Qualifier])> = vec![(p1, &q1)];
        assert_eq!(
            f.target_with_qualifiers(&prop, &partitions, Some("zzz")).unwrap(),
            unbound
        );
    }
}
