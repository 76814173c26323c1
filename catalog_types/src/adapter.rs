//! Static adapter descriptors — the data half of the adapter registry.
//! The behavioral half (the async lifecycle/execution contract) lives in the
//! `catalog` crate, which needs `async-trait` and is not a pure data model.

use crate::{ids::AdapterId, keys::IndexMethod};

/// How an adapter process is deployed relative to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Embedded,
    Docker,
    Remote,
}

/// Read-only capability description of a deployed adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterDescriptor {
    pub id: AdapterId,
    pub unique_name: String,
    pub is_persistent: bool,
    pub deploy_mode: DeployMode,
    pub available_index_methods: Vec<IndexMethod>,
    /// SOURCE adapters export read-only, externally-owned structure: DDL
    /// that modifies structure on these adapters is rejected.
    pub is_data_read_only: bool,
}

impl AdapterDescriptor {
    pub fn supports_index_method(&self, method: IndexMethod) -> bool {
        self.available_index_methods.contains(&method)
    }
}
