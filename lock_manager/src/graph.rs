//! The wait-for graph used to detect deadlocks before a transaction is
//! allowed to block: an edge `a -> b` means `a` is waiting on a resource
//! held (or queued ahead of it) by `b`. A cycle means granting the request
//! that just added the edge would deadlock.

use catalog_types::TransactionId;
use hashbrown::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct WaitForGraph {
    edges: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge from `from` to every transaction in `to`.
    pub fn insert_edges(&mut self, from: TransactionId, to: &[TransactionId]) {
        let set = self.edges.entry(from).or_default();
        for t in to {
            if *t != from {
                set.insert(*t);
            }
        }
    }

    /// Remove every outgoing edge from `tx`, e.g. once its request is
    /// granted or it gives up waiting.
    pub fn remove_all_edges_from(&mut self, tx: TransactionId) {
        self.edges.remove(&tx);
    }

    /// Remove every edge pointing at `tx`, e.g. once it releases its locks
    /// and can no longer block anyone.
    pub fn remove_all_edges_to(&mut self, tx: TransactionId) {
        for set in self.edges.values_mut() {
            set.remove(&tx);
        }
    }

    /// Whether there is a cycle reachable by following edges starting at
    /// `start` — i.e. whether `start` is waiting, directly or transitively,
    /// on itself.
    pub fn has_cycle_from(&self, start: TransactionId) -> bool {
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            let Some(neighbors) = self.edges.get(&node) else {
                continue;
            };
            for next in neighbors {
                if *next == start {
                    return true;
                }
                if visited.insert(*next) {
                    stack.push(*next);
                }
            }
        }
        false
    }

    /// All edges currently in the graph, for tests and diagnostics.
    pub fn debug_wait_for_edges(&self) -> Vec<(TransactionId, TransactionId)> {
        let mut out: Vec<_> = self
            .edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to)))
            .collect();
        out.sort_by_key(|(a, b)| (a.get(), b.get()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i64) -> TransactionId {
        TransactionId::new(id)
    }

    #[test]
    fn detects_direct_cycle() {
        let mut g = WaitForGraph::new();
        g.insert_edges(tx(1), &[tx(2)]);
        g.insert_edges(tx(2), &[tx(1)]);
        assert!(g.has_cycle_from(tx(1)));
    }

    #[test]
    fn detects_transitive_cycle() {
        let mut g = WaitForGraph::new();
        g.insert_edges(tx(1), &[tx(2)]);
        g.insert_edges(tx(2), &[tx(3)]);
        g.insert_edges(tx(3), &[tx(1)]);
        assert!(g.has_cycle_from(tx(1)));
    }

    #[test]
    fn no_cycle_in_a_chain() {
        let mut g = WaitForGraph::new();
        g.insert_edges(tx(1), &[tx(2)]);
        g.insert_edges(tx(2), &[tx(3)]);
        assert!(!g.has_cycle_from(tx(1)));
    }

    #[test]
    fn remove_all_edges_to_breaks_cycle() {
        let mut g = WaitForGraph::new();
        g.insert_edges(tx(1), &[tx(2)]);
        g.insert_edges(tx(2), &[tx(1)]);
        g.remove_all_edges_to(tx(1));
        assert!(!g.has_cycle_from(tx(2)));
    }
}
