//! Namespaces and logical entities.

use crate::{
    column::LogicalColumn,
    ids::{EntityId, NamespaceId},
    keys::{ForeignKey, Index, PrimaryKey, UniqueConstraint},
};

/// The kind of a namespace; fixes which `LogicalEntity` variants it may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    Relational,
    Document,
    Graph,
}

/// `{id, name, kind, owner}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    pub kind: NamespaceKind,
    pub owner: String,
}

/// How a materialized view is kept up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    OnCommit,
    Manual,
    Interval { seconds: u32 },
}

/// A relational table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<LogicalColumn>,
    pub primary_key: PrimaryKey,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub indexes: Vec<Index>,
    /// `true` for a SOURCE-exported table: structural DDL is rejected.
    pub is_source: bool,
    /// `Some` for a materialized view: the scan it was defined over (kept as
    /// an opaque serialized plan — the IR itself is a router/optimizer
    /// collaborator, not reproduced here) plus its refresh policy.
    pub materialized_view: Option<MaterializedViewDef>,
}

/// A materialized view's defining query and refresh policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedViewDef {
    pub defining_plan: Vec<u8>,
    pub refresh_policy: RefreshPolicy,
}

/// A document collection; documents have no fixed column set, so only
/// identity and options are tracked in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub indexes: Vec<Index>,
}

/// A graph, internally realized over four tables: nodes, edges, and their
/// property tables. The mapping is preserved so graph DDL can be rewritten
/// to table DDL on the four backing entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Graph {
    pub nodes_table: EntityId,
    pub edges_table: EntityId,
    pub node_props_table: EntityId,
    pub edge_props_table: EntityId,
}

/// A logical entity: tagged union over the three namespace kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalEntityKind {
    Table(Table),
    Collection(Collection),
    Graph(Graph),
}

/// A user-visible table/collection/graph identified by `(namespace, name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalEntity {
    pub id: EntityId,
    pub namespace_id: NamespaceId,
    pub name: String,
    pub kind: LogicalEntityKind,
}

impl LogicalEntity {
    /// `Some` only for `Table`; document collections and graphs don't carry
    /// a flat column list here (a graph's columns live on its backing tables).
    pub fn as_table(&self) -> Option<&Table> {
        match &self.kind {
            LogicalEntityKind::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.kind {
            LogicalEntityKind::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.as_table().map(|t| t.is_source).unwrap_or(false)
    }
}
