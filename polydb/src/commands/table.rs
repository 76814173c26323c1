//! `polydb table ...`: `CREATE TABLE`, `ALTER TABLE ADD/DROP COLUMN`,
//! `ADD/DROP/MODIFY PLACEMENT`, `PARTITION BY`/`MERGE PARTITIONS`, `ADD
//! CONSTRAINT ... PRIMARY KEY|UNIQUE|FOREIGN KEY` (index form), `TRUNCATE`
//! and `DROP TABLE`.

use ddl::{ColumnSpec, PartitionSpec};

use crate::commands::types::{parse_column, parse_index_method, resolve_adapter, resolve_column, resolve_entity};
use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// CREATE TABLE namespace.name(col:TYPE ...) PRIMARY KEY(...)
    Create {
        /// NAMESPACE.NAME
        entity: String,
        /// repeatable NAME:TYPE
        #[clap(long = "column")]
        columns: Vec<String>,
        #[clap(long = "primary-key")]
        primary_key: Vec<String>,
        /// unique_name of a STORE adapter to place the table on; repeatable
        #[clap(long = "store")]
        stores: Vec<String>,
    },
    /// ALTER TABLE namespace.name ADD COLUMN c TYPE
    AddColumn {
        entity: String,
        column: String,
        #[clap(long)]
        not_null_default: Option<String>,
    },
    /// ALTER TABLE namespace.name DROP COLUMN c
    DropColumn { entity: String, column: String },
    /// ALTER TABLE namespace.name ADD PLACEMENT ON STORE s
    AddPlacement {
        entity: String,
        store: String,
        #[clap(long = "column")]
        columns: Vec<String>,
        /// allow a manually column-scoped placement to carry the primary key
        #[clap(long)]
        allow_manual_pk: bool,
    },
    /// ALTER TABLE namespace.name DROP PLACEMENT ON STORE s
    DropPlacement { entity: String, store: String },
    /// ALTER TABLE namespace.name PARTITION BY HASH(col) PARTITIONS n
    PartitionByHash { entity: String, column: String, partitions: usize },
    /// ALTER TABLE namespace.name MERGE PARTITIONS
    MergePartitions { entity: String },
    /// ALTER TABLE namespace.name ADD CONSTRAINT name UNIQUE|PRIMARY KEY|INDEX (cols) [USING method]
    AddIndex {
        entity: String,
        name: String,
        #[clap(long = "column")]
        columns: Vec<String>,
        #[clap(long, default_value = "btree")]
        method: String,
        #[clap(long)]
        unique: bool,
    },
    /// TRUNCATE TABLE namespace.name
    Truncate { entity: String },
    /// DROP TABLE namespace.name
    Drop { entity: String },
}

pub async fn command(engine: &Engine, config: Config) -> Result<()> {
    let tx = engine.coordinator().begin();
    let result = run(engine, tx, config).await;
    match &result {
        Ok(()) => engine.coordinator().commit(tx).await?,
        Err(_) => engine.coordinator().rollback(tx).await?,
    }
    result
}

async fn run(engine: &Engine, tx: catalog_types::TransactionId, config: Config) -> Result<()> {
    match config.command {
        Command::Create { entity, columns, primary_key, stores } => {
            let snapshot = engine.catalog().current_snapshot();
            let (namespace, name) = entity.split_once('.').ok_or_else(|| crate::error::Error::Usage {
                message: format!("\"{entity}\" must be NAMESPACE.NAME"),
            })?;
            let namespace_id = snapshot.namespace_by_name(namespace)?.id;
            let column_specs: Result<Vec<ColumnSpec>> =
                columns.iter().map(|c| parse_column(c).map(|(name, ty)| ColumnSpec::new(name, ty))).collect();
            let adapters: Result<Vec<_>> = stores.iter().map(|s| resolve_adapter(&snapshot, s)).collect();
            let entity_id = engine
                .ddl()
                .create_table(tx, namespace_id, name, column_specs?, &primary_key, &adapters?)
                .await?;
            println!("table {entity} created (id {})", entity_id.get());
        }
        Command::AddColumn { entity, column, not_null_default } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let (name, poly_type) = parse_column(&column)?;
            let mut spec = ColumnSpec::new(name, poly_type);
            if let Some(default) = not_null_default {
                spec = spec.not_null(default);
            }
            let column_id = engine.ddl().add_column(tx, entity_id, spec).await?;
            println!("column added (id {})", column_id.get());
        }
        Command::DropColumn { entity, column } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let column_id = resolve_column(&snapshot, entity_id, &column)?;
            engine.ddl().drop_column(tx, entity_id, column_id).await?;
            println!("column {column} dropped");
        }
        Command::AddPlacement { entity, store, columns, allow_manual_pk } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let adapter_id = resolve_adapter(&snapshot, &store)?;
            let column_ids = if columns.is_empty() {
                None
            } else {
                Some(
                    columns
                        .iter()
                        .map(|c| resolve_column(&snapshot, entity_id, c))
                        .collect::<Result<Vec<_>>>()?,
                )
            };
            let placement_id =
                engine.ddl().add_placement(tx, entity_id, adapter_id, column_ids, None, allow_manual_pk).await?;
            println!("placement {} added on {store}", placement_id.get());
        }
        Command::DropPlacement { entity, store } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let adapter_id = resolve_adapter(&snapshot, &store)?;
            let placement_id = snapshot
                .placements_of(entity_id)
                .into_iter()
                .find(|p| p.adapter_id == adapter_id)
                .ok_or_else(|| crate::error::Error::Usage { message: format!("no placement on \"{store}\"") })?
                .id;
            engine.ddl().drop_placement(tx, entity_id, placement_id).await?;
            println!("placement dropped from {store}");
        }
        Command::PartitionByHash { entity, column, partitions } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let column_id = resolve_column(&snapshot, entity_id, &column)?;
            engine.ddl().partition_entity(tx, entity_id, column_id, PartitionSpec::Hash { count: partitions }).await?;
            println!("{entity} partitioned by HASH({column}) into {partitions} partitions");
        }
        Command::MergePartitions { entity } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            engine.ddl().merge_partitions(tx, entity_id).await?;
            println!("{entity} partitions merged");
        }
        Command::AddIndex { entity, name, columns, method, unique } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            let method = parse_index_method(&method)?;
            let column_ids: Vec<_> =
                columns.iter().map(|c| resolve_column(&snapshot, entity_id, c)).collect::<Result<Vec<_>>>()?;
            let index_id = engine.ddl().add_index(tx, entity_id, &name, column_ids, method, unique).await?;
            println!("index {name} added (id {})", index_id.get());
        }
        Command::Truncate { entity } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            engine.ddl().truncate_entity(tx, entity_id).await?;
            println!("{entity} truncated");
        }
        Command::Drop { entity } => {
            let snapshot = engine.catalog().current_snapshot();
            let entity_id = resolve_entity(&snapshot, &entity)?;
            engine.ddl().drop_entity(tx, entity_id).await?;
            println!("{entity} dropped");
        }
    }
    Ok(())
}
