//! Selectable placement-cover policies. Both resolve the same
//! [`partition_fn::placements`] search; they differ only in what counts
//! as an acceptable cover for one partition.

/// How the router resolves which placements cover a partition's needed
/// columns when no single placement happens to carry all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPolicy {
    /// Require one placement that carries every needed column; when none
    /// does, fan out to a minimal multi-placement cover and join the
    /// results on the primary key.
    FullReplication,
    /// Never split columns across adapters for one partition: only a
    /// single placement covering everything is acceptable. If none
    /// covers, routing is cancelled rather than falling back to a join.
    Icarus,
}

impl Default for RouterPolicy {
    fn default() -> Self {
        RouterPolicy::FullReplication
    }
}
