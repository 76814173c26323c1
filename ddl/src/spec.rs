//! Input shapes for schema-change operations: the parts of a `CREATE
//! TABLE`/`ALTER TABLE` statement the orchestrator needs once the DDL
//! surface has been parsed into ids and values, not raw SQL text.

use catalog_types::PolyType;

/// One column of a `CREATE TABLE`/`ADD COLUMN`, before an id is assigned.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub poly_type: PolyType,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub collection_type: Option<PolyType>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, poly_type: PolyType) -> Self {
        Self {
            name: name.into(),
            poly_type,
            nullable: true,
            default_value: None,
            collection_type: None,
        }
    }

    pub fn not_null(mut self, default_value: impl Into<String>) -> Self {
        self.nullable = false;
        self.default_value = Some(default_value.into());
        self
    }
}

/// How `PARTITION BY` divides an entity's rows. The catch-all partition LIST
/// and RANGE require is added automatically; it is never named here.
#[derive(Debug, Clone)]
pub enum PartitionSpec {
    Hash {
        count: usize,
    },
    List {
        groups: Vec<Vec<String>>,
    },
    Range {
        bounds: Vec<(String, String)>,
    },
    Temperature {
        inner: Box<PartitionSpec>,
        hot_in_pct: u8,
        hot_out_pct: u8,
        frequency_interval_sec: u32,
        cost_indication: f64,
    },
}

impl PartitionSpec {
    /// The registry name this spec resolves through. TEMPERATURE always
    /// wraps one of the other three, so this recurses to the inner scheme —
    /// `Strategy` itself has no `Temperature` variant.
    pub fn function_name(&self) -> &'static str {
        match self {
            PartitionSpec::Hash { .. } => partition_fn::registry::names::HASH,
            PartitionSpec::List { .. } => partition_fn::registry::names::LIST,
            PartitionSpec::Range { .. } => partition_fn::registry::names::RANGE,
            PartitionSpec::Temperature { inner, .. } => inner.function_name(),
        }
    }
}
