//! Small parsers shared across subcommands for turning CLI strings into
//! catalog types, without pulling in a real SQL grammar: the DDL surface
//! this engine exposes is structured flags, not parsed statements.

use catalog::Snapshot;
use catalog_types::{AdapterId, ColumnId, EntityId, PolyType};

use crate::error::{Error, Result};

/// Splits `namespace.entity` and resolves it against `snapshot`.
pub fn resolve_entity(snapshot: &Snapshot, qualified: &str) -> Result<EntityId> {
    let (namespace, name) = qualified.split_once('.').ok_or_else(|| Error::Usage {
        message: format!("\"{qualified}\" must be NAMESPACE.ENTITY"),
    })?;
    let ns = snapshot.namespace_by_name(namespace)?;
    Ok(snapshot.entity_by_name(ns.id, name)?.id)
}

pub fn resolve_adapter(snapshot: &Snapshot, unique_name: &str) -> Result<AdapterId> {
    snapshot
        .adapters()
        .find(|a| a.unique_name == unique_name)
        .map(|a| a.id)
        .ok_or_else(|| Error::Usage { message: format!("no adapter named \"{unique_name}\"") })
}

pub fn resolve_column(snapshot: &Snapshot, entity_id: EntityId, name: &str) -> Result<ColumnId> {
    snapshot
        .columns_of_entity(entity_id)
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .ok_or_else(|| Error::Usage { message: format!("no column named \"{name}\"") })
}

/// Parses `name:TYPE`, e.g. `id:BIGINT` or `tags:ARRAY<TEXT>`.
pub fn parse_column(spec: &str) -> Result<(String, PolyType)> {
    let (name, ty) = spec.split_once(':').ok_or_else(|| Error::Usage {
        message: format!("column spec \"{spec}\" must be NAME:TYPE"),
    })?;
    Ok((name.to_string(), parse_poly_type(ty)?))
}

pub fn parse_poly_type(s: &str) -> Result<PolyType> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("ARRAY<").and_then(|rest| rest.strip_suffix('>')) {
        return Ok(PolyType::Array(Box::new(parse_poly_type(inner)?)));
    }
    match s.to_ascii_uppercase().as_str() {
        "BOOLEAN" => Ok(PolyType::Boolean),
        "TINYINT" => Ok(PolyType::TinyInt),
        "SMALLINT" => Ok(PolyType::SmallInt),
        "INTEGER" | "INT" => Ok(PolyType::Integer),
        "BIGINT" => Ok(PolyType::BigInt),
        "DECIMAL" => Ok(PolyType::Decimal),
        "REAL" => Ok(PolyType::Real),
        "DOUBLE" => Ok(PolyType::Double),
        "VARCHAR" => Ok(PolyType::Varchar),
        "TEXT" => Ok(PolyType::Text),
        "DATE" => Ok(PolyType::Date),
        "TIME" => Ok(PolyType::Time),
        "TIMESTAMP" => Ok(PolyType::Timestamp),
        "BINARY" => Ok(PolyType::Binary),
        "JSON" => Ok(PolyType::Json),
        other => Err(Error::Usage { message: format!("unknown type \"{other}\"") }),
    }
}

pub fn parse_namespace_kind(s: &str) -> Result<catalog_types::NamespaceKind> {
    use catalog_types::NamespaceKind::*;
    match s.to_ascii_uppercase().as_str() {
        "RELATIONAL" => Ok(Relational),
        "DOCUMENT" => Ok(Document),
        "GRAPH" => Ok(Graph),
        other => Err(Error::Usage { message: format!("unknown namespace kind \"{other}\"") }),
    }
}

pub fn parse_index_method(s: &str) -> Result<catalog_types::IndexMethod> {
    use catalog_types::IndexMethod::*;
    match s.to_ascii_uppercase().as_str() {
        "BTREE" => Ok(BTree),
        "HASH" => Ok(Hash),
        other => Err(Error::Usage { message: format!("unknown index method \"{other}\"") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_column() {
        let (name, ty) = parse_column("id:BIGINT").unwrap();
        assert_eq!(name, "id");
        assert_eq!(ty, PolyType::BigInt);
    }

    #[test]
    fn parses_nested_array_column() {
        let (_, ty) = parse_column("tags:ARRAY<TEXT>").unwrap();
        assert_eq!(ty, PolyType::Array(Box::new(PolyType::Text)));
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_column("id").is_err());
    }
}
