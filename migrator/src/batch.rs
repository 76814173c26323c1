//! Row-oriented to column-oriented transposition and value-to-partition
//! routing for one batch of rows pulled from a source adapter.

use catalog::Row;
use catalog_types::{AllocationColumn, ColumnId, PartitionId, PartitionProperty, Qualifier};
use partition_fn::Strategy;
use std::collections::HashMap;

use crate::error::Result;

/// Rows per batch read from the source and per prepared statement issued to
/// the target, matching the default the engine exposes as
/// `DATA_MIGRATOR_BATCH_SIZE`.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Render one cell's raw bytes as the canonical string `target()` expects,
/// with a NULL cell mapped to `None` (routed as NULL by the partition
/// function, not as the literal string `"NULL"`).
fn cell_as_str(cell: &Option<Vec<u8>>) -> Option<String> {
    cell.as_ref().map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Split `rows` (each row positioned per `source_columns`) into one group
/// per target partition id, using the partition column's position in
/// `source_columns` to look up each row's routing value. Every row is
/// transposed on the way out from `source_columns`' physical order to
/// `target_columns`' logical-column-id order, since a source and target
/// placement can list the same logical columns in different physical
/// positions (or the target can carry a different column subset) — the
/// prepared statement issued to the target adapter must see its own order.
///
/// `partitions` carries the qualifiers needed by LIST/RANGE; HASH/NONE
/// ignore it.
pub fn route_rows(
    rows: Vec<Row>,
    source_columns: &[AllocationColumn],
    target_columns: &[AllocationColumn],
    partition_column_position: Option<usize>,
    strategy: &Strategy,
    property: &PartitionProperty,
    partitions: &[(PartitionId, &[Qualifier])],
) -> Result<HashMap<PartitionId, Vec<Row>>> {
    let mut out: HashMap<PartitionId, Vec<Row>> = HashMap::new();
    for row in rows {
        let value = partition_column_position
            .and_then(|pos| row.get(pos))
            .and_then(cell_as_str);
        let target = partition_fn::target(strategy, property, partitions, value.as_deref())?;
        let projected = project_row(&row, source_columns, target_columns);
        out.entry(target).or_default().push(projected);
    }
    Ok(out)
}

/// Re-key one row from `source_columns`' physical order to
/// `target_columns`' order via the shared logical `ColumnId`. A target
/// column with no matching source column (dropped projection, a column the
/// target placement carries that the source scan didn't fetch) comes out as
/// `NULL` rather than shifting every later column over.
fn project_row(row: &Row, source_columns: &[AllocationColumn], target_columns: &[AllocationColumn]) -> Row {
    let by_column: HashMap<ColumnId, &Option<Vec<u8>>> =
        source_columns.iter().zip(row.iter()).map(|(col, cell)| (col.column_id, cell)).collect();
    target_columns
        .iter()
        .map(|col| by_column.get(&col.column_id).copied().cloned().unwrap_or(None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{ColumnId, PlacementId};

    #[test]
    fn hash_routing_splits_rows_by_bucket() {
        let property = PartitionProperty::Hash {
            partition_column_id: ColumnId::new(1),
            partition_ids: vec![PartitionId::new(1), PartitionId::new(2), PartitionId::new(3)],
        };
        let strategy = Strategy::Hash(partition_fn::HashPartitionFn);
        let columns = vec![AllocationColumn {
            placement_id: PlacementId::new(1),
            column_id: ColumnId::new(1),
            physical_name: None,
            physical_position: 0,
        }];
        let rows = vec![
            vec![Some(b"hans".to_vec())],
            vec![Some(b"bob".to_vec())],
        ];
        let grouped = route_rows(rows, &columns, &columns, Some(0), &strategy, &property, &[]).unwrap();
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), 2);
    }

    #[test]
    fn rows_are_reprojected_onto_the_target_column_order() {
        let property = PartitionProperty::Hash {
            partition_column_id: ColumnId::new(1),
            partition_ids: vec![PartitionId::new(1)],
        };
        let strategy = Strategy::Hash(partition_fn::HashPartitionFn);

        // Source placement carries (name, id); target placement carries the
        // same two logical columns in the opposite physical order.
        let source_columns = vec![
            AllocationColumn { placement_id: PlacementId::new(1), column_id: ColumnId::new(2), physical_name: None, physical_position: 0 },
            AllocationColumn { placement_id: PlacementId::new(1), column_id: ColumnId::new(1), physical_name: None, physical_position: 1 },
        ];
        let target_columns = vec![
            AllocationColumn { placement_id: PlacementId::new(2), column_id: ColumnId::new(1), physical_name: None, physical_position: 0 },
            AllocationColumn { placement_id: PlacementId::new(2), column_id: ColumnId::new(2), physical_name: None, physical_position: 1 },
        ];

        let rows = vec![vec![Some(b"hans".to_vec()), Some(b"1".to_vec())]];
        let grouped = route_rows(rows, &source_columns, &target_columns, Some(1), &strategy, &property, &[]).unwrap();

        let row = grouped.into_values().next().unwrap().into_iter().next().unwrap();
        assert_eq!(row, vec![Some(b"1".to_vec()), Some(b"hans".to_vec())]);
    }

    #[test]
    fn a_target_only_column_comes_out_as_null() {
        let property = PartitionProperty::Hash {
            partition_column_id: ColumnId::new(1),
            partition_ids: vec![PartitionId::new(1)],
        };
        let strategy = Strategy::Hash(partition_fn::HashPartitionFn);

        let source_columns = vec![AllocationColumn {
            placement_id: PlacementId::new(1),
            column_id: ColumnId::new(1),
            physical_name: None,
            physical_position: 0,
        }];
        let target_columns = vec![
            AllocationColumn { placement_id: PlacementId::new(2), column_id: ColumnId::new(1), physical_name: None, physical_position: 0 },
            AllocationColumn { placement_id: PlacementId::new(2), column_id: ColumnId::new(3), physical_name: None, physical_position: 1 },
        ];

        let rows = vec![vec![Some(b"hans".to_vec())]];
        let grouped = route_rows(rows, &source_columns, &target_columns, Some(0), &strategy, &property, &[]).unwrap();

        let row = grouped.into_values().next().unwrap().into_iter().next().unwrap();
        assert_eq!(row, vec![Some(b"hans".to_vec()), None]);
    }
}
