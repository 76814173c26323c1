//! The client-facing result shape: a cursor-based protocol where every
//! query response carries `{rowType, rows[], hasMore}` and supports batched
//! `fetchNext(batchSize)`. Front-ends (PostgreSQL wire, JDBC/Avatica) are
//! collaborators this only describes the contract for; none is implemented
//! here.

use catalog::{AdapterError, Row, RowStream};
use catalog_types::{ColumnId, PolyType};

/// One column of a result set's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub column_id: ColumnId,
    pub name: String,
    pub poly_type: PolyType,
}

/// One page of a query result: the rows fetched so far plus whether more
/// remain. `row_type` only needs to be sent with the first page; later
/// pages repeat it for a stateless client.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub row_type: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub has_more: bool,
}

/// Wraps one or more adapter `RowStream`s behind a single
/// `fetch_next(batch_size)` call, concatenating them in order. This is the
/// shape a routed `UnionAll`/`JoinOnPrimaryKey` scan ultimately presents to
/// a client: the fan-out is invisible past this point.
pub struct Cursor {
    row_type: Vec<ColumnMeta>,
    streams: Vec<Box<dyn RowStream>>,
    current: usize,
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("row_type", &self.row_type)
            .field("remaining_streams", &(self.streams.len() - self.current))
            .finish()
    }
}

impl Cursor {
    pub fn new(row_type: Vec<ColumnMeta>, streams: Vec<Box<dyn RowStream>>) -> Self {
        Self { row_type, streams, current: 0 }
    }

    /// Pull up to `batch_size` rows, advancing through `streams` in order
    /// once the current one is exhausted. `has_more` is only false once
    /// every stream has reported empty.
    pub async fn fetch_next(&mut self, batch_size: usize) -> Result<QueryResult, AdapterError> {
        let mut rows = Vec::with_capacity(batch_size);
        while rows.len() < batch_size && self.current < self.streams.len() {
            let remaining = batch_size - rows.len();
            let batch = self.streams[self.current].next_batch(remaining).await?;
            if batch.is_empty() {
                self.streams[self.current].close().await;
                self.current += 1;
                continue;
            }
            rows.extend(batch);
        }
        Ok(QueryResult { row_type: self.row_type.clone(), rows, has_more: self.current < self.streams.len() })
    }

    pub async fn close(&mut self) {
        for stream in &mut self.streams[self.current..] {
            stream.close().await;
        }
        self.current = self.streams.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FixedStream {
        batches: Vec<Vec<Row>>,
    }

    #[async_trait]
    impl RowStream for FixedStream {
        async fn next_batch(&mut self, n: usize) -> Result<Vec<Row>, AdapterError> {
            if self.batches.is_empty() {
                return Ok(Vec::new());
            }
            let batch = self.batches.remove(0);
            Ok(batch.into_iter().take(n).collect())
        }

        async fn close(&mut self) {}
    }

    fn meta() -> Vec<ColumnMeta> {
        vec![ColumnMeta { column_id: ColumnId::new(1), name: "id".into(), poly_type: PolyType::BigInt }]
    }

    #[tokio::test]
    async fn fetch_next_concatenates_across_streams() {
        let a: Box<dyn RowStream> = Box::new(FixedStream { batches: vec![vec![vec![Some(b"1".to_vec())]]] });
        let b: Box<dyn RowStream> = Box::new(FixedStream { batches: vec![vec![vec![Some(b"2".to_vec())]]] });
        let mut cursor = Cursor::new(meta(), vec![a, b]);

        let page = cursor.fetch_next(10).await.unwrap();
        assert_eq!(page.rows.len(), 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn fetch_next_respects_batch_size_across_calls() {
        let a: Box<dyn RowStream> =
            Box::new(FixedStream { batches: vec![vec![vec![Some(b"1".to_vec())], vec![Some(b"2".to_vec())]]] });
        let mut cursor = Cursor::new(meta(), vec![a]);

        let first = cursor.fetch_next(1).await.unwrap();
        assert_eq!(first.rows.len(), 1);
        assert!(first.has_more);
    }
}
