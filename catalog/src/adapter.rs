//! The behavioral half of the adapter registry: the async lifecycle and
//! execution contract every backend store/source must implement. The data
//! half — `AdapterDescriptor`, capability flags — lives in `catalog_types`.

use async_trait::async_trait;
use catalog_types::{
    AllocationColumn, AllocationPlacement, EntityId, Index, LogicalColumn, LogicalEntity,
    PartitionId, PolyType, TransactionId,
};

/// One row of a scan result, as opaque cell values keyed by physical
/// position. Value encoding is a router/execution collaborator; the adapter
/// contract only needs to move bytes.
pub type Row = Vec<Option<Vec<u8>>>;

/// A pull-based cursor over an adapter's scan result, mirroring the
/// `nextBatch(n) -> rows[]` / `close()` contract: migration and execution
/// both iterate large results this way rather than materializing them.
#[async_trait]
pub trait RowStream: Send {
    async fn next_batch(&mut self, n: usize) -> Result<Vec<Row>, AdapterError>;
    async fn close(&mut self);
}

#[derive(Debug, Clone, snafu::Snafu)]
#[snafu(display("adapter error: {message}"))]
pub struct AdapterError {
    pub message: String,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// An opaque physical scan description the router hands to an adapter.
/// Query planning itself is out of scope here; the adapter only needs
/// enough to run it.
#[derive(Debug, Clone)]
pub struct PhysicalScan {
    pub placement: AllocationPlacement,
    pub partition_ids: Vec<PartitionId>,
    pub projected_columns: Vec<AllocationColumn>,
}

/// One target of a migrator write: a batch of rows bound for one
/// (placement, partition), upserted by primary key so the same batch can be
/// replayed idempotently after a retry.
#[derive(Debug, Clone)]
pub struct WriteBatch {
    pub placement: AllocationPlacement,
    pub partition_id: PartitionId,
    pub columns: Vec<AllocationColumn>,
    /// Positions within `columns` that make up the primary key, used by the
    /// adapter to upsert rather than blind-insert.
    pub pk_positions: Vec<usize>,
    pub rows: Vec<Row>,
}

/// The async lifecycle and execution contract a backend store or source
/// adapter implements. `STORE` adapters implement every method; `SOURCE`
/// adapters reject the structural-DDL half (reflected in
/// `AdapterDescriptor::is_data_read_only`, checked by the DDL orchestrator
/// before ever calling these).
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    async fn create_table(
        &self,
        tx: TransactionId,
        entity: &LogicalEntity,
        partition_ids: &[PartitionId],
    ) -> Result<(), AdapterError>;

    async fn drop_table(
        &self,
        tx: TransactionId,
        entity: &LogicalEntity,
        partition_ids: &[PartitionId],
    ) -> Result<(), AdapterError>;

    async fn truncate(&self, tx: TransactionId, entity: &LogicalEntity) -> Result<(), AdapterError>;

    async fn add_column(
        &self,
        tx: TransactionId,
        entity: &LogicalEntity,
        column: &LogicalColumn,
    ) -> Result<(), AdapterError>;

    async fn drop_column(&self, tx: TransactionId, alloc_column: &AllocationColumn) -> Result<(), AdapterError>;

    async fn update_column_type(
        &self,
        tx: TransactionId,
        alloc_column: &AllocationColumn,
        new_type: PolyType,
        old_type: PolyType,
    ) -> Result<(), AdapterError>;

    async fn add_index(
        &self,
        tx: TransactionId,
        index: &Index,
        partition_ids: &[PartitionId],
    ) -> Result<(), AdapterError>;

    async fn drop_index(
        &self,
        tx: TransactionId,
        index: &Index,
        partition_ids: &[PartitionId],
    ) -> Result<(), AdapterError>;

    async fn create_collection(&self, tx: TransactionId, entity: &LogicalEntity) -> Result<(), AdapterError>;

    async fn create_graph(&self, tx: TransactionId, entity: &LogicalEntity) -> Result<(), AdapterError>;

    async fn drop_graph(&self, tx: TransactionId, entity: &LogicalEntity) -> Result<(), AdapterError>;

    async fn scan(&self, tx: TransactionId, plan: PhysicalScan) -> Result<Box<dyn RowStream>, AdapterError>;

    /// Upsert `batch` by primary key. The data migrator is the only caller:
    /// it always includes the PK columns in the projection so this stays
    /// idempotent across a retried batch.
    async fn write_batch(&self, tx: TransactionId, batch: WriteBatch) -> Result<(), AdapterError>;

    /// Commit/rollback this adapter's participation in `tx`. A no-op for
    /// adapters without their own transaction semantics.
    async fn commit(&self, tx: TransactionId) -> Result<(), AdapterError>;
    async fn rollback(&self, tx: TransactionId) -> Result<(), AdapterError>;
}
