//! Choosing the relevant placements for one partition: the minimal
//! sufficient set of column placements covering a requested column set,
//! preferring the adapter carrying the most of those columns — fewer
//! adapters touched means fewer cross-store joins downstream in the router.

use catalog_types::{AdapterId, ColumnId, PlacementId};
use std::collections::{BTreeSet, HashMap};

/// One placement's available columns, as seen by the router for a single
/// partition (i.e. already filtered to placements that actually carry an
/// allocation entity for that partition).
#[derive(Debug, Clone)]
pub struct PlacementCandidate {
    pub placement_id: PlacementId,
    pub adapter_id: AdapterId,
    pub adapter_is_persistent: bool,
    pub columns: BTreeSet<ColumnId>,
}

/// A greedy-set-cover score for one candidate at one step of the search:
/// most newly-covered columns wins, ties broken by persistent-adapter
/// preference, then by the lowest adapter id (stable across runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    newly_covered: usize,
    persistent: bool,
    adapter_id_desc: std::cmp::Reverse<i64>,
}

/// The result of covering one partition's needed columns: which placements
/// were chosen, and which placement supplies each column.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    pub placements: Vec<PlacementId>,
    pub column_source: HashMap<ColumnId, PlacementId>,
}

/// Greedy minimal-set-cover: pick candidates one at a time, always the one
/// covering the most still-uncovered needed columns, until everything is
/// covered or no remaining candidate adds coverage.
///
/// Returns `None` if `needed_columns` cannot be fully covered by `candidates`
/// — the caller (the router) turns that into `cancelQuery` or a fallback.
pub fn cover(candidates: &[PlacementCandidate], needed_columns: &BTreeSet<ColumnId>) -> Option<Coverage> {
    let mut remaining: BTreeSet<ColumnId> = needed_columns.clone();
    let mut result = Coverage::default();
    let mut used: BTreeSet<PlacementId> = BTreeSet::new();

    while !remaining.is_empty() {
        let pick = candidates
            .iter()
            .filter(|c| !used.contains(&c.placement_id))
            .map(|c| {
                let newly_covered = c.columns.intersection(&remaining).count();
                (
                    Score {
                        newly_covered,
                        persistent: c.adapter_is_persistent,
                        adapter_id_desc: std::cmp::Reverse(c.adapter_id.get()),
                    },
                    c,
                )
            })
            .max_by_key(|(score, _)| *score);

        match pick {
            Some((score, candidate)) if score.newly_covered > 0 => {
                used.insert(candidate.placement_id);
                result.placements.push(candidate.placement_id);
                for col in candidate.columns.intersection(&remaining).copied().collect::<Vec<_>>() {
                    result.column_source.insert(col, candidate.placement_id);
                    remaining.remove(&col);
                }
            }
            _ => return None,
        }
    }
    Some(result)
}

/// Whether a single placement already covers every needed column — the
/// "full replication" fast path the router prefers over a multi-placement
/// cover when one is available.
pub fn single_placement_cover(
    candidates: &[PlacementCandidate],
    needed_columns: &BTreeSet<ColumnId>,
) -> Option<PlacementId> {
    candidates
        .iter()
        .filter(|c| needed_columns.is_subset(&c.columns))
        .max_by_key(|c| {
            (
                c.columns.len(),
                c.adapter_is_persistent,
                std::cmp::Reverse(c.adapter_id.get()),
            )
        })
        .map(|c| c.placement_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(placement: i64, adapter: i64, persistent: bool, cols: &[i64]) -> PlacementCandidate {
        PlacementCandidate {
            placement_id: PlacementId::new(placement),
            adapter_id: AdapterId::new(adapter),
            adapter_is_persistent: persistent,
            columns: cols.iter().map(|c| ColumnId::new(*c)).collect(),
        }
    }

    #[test]
    fn single_placement_covers_when_possible() {
        let a = candidate(1, 1, true, &[1, 2, 3]);
        let b = candidate(2, 2, true, &[1, 2]);
        let needed: BTreeSet<_> = [1, 2].into_iter().map(ColumnId::new).collect();
        let picked = single_placement_cover(&[a, b], &needed);
        assert_eq!(picked, Some(PlacementId::new(1)));
    }

    #[test]
    fn cover_splits_across_two_placements_when_needed() {
        let a = candidate(1, 1, true, &[1, 2]);
        let b = candidate(2, 2, true, &[3]);
        let needed: BTreeSet<_> = [1, 2, 3].into_iter().map(ColumnId::new).collect();
        let result = cover(&[a, b], &needed).expect("should cover");
        assert_eq!(result.placements.len(), 2);
        assert_eq!(result.column_source.len(), 3);
    }

    #[test]
    fn cover_returns_none_when_uncoverable() {
        let a = candidate(1, 1, true, &[1]);
        let needed: BTreeSet<_> = [1, 2].into_iter().map(ColumnId::new).collect();
        assert!(cover(&[a], &needed).is_none());
    }
}
