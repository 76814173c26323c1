//! Immutable registry of the built-in partition functions.
//!
//! There is no plugin mechanism for partition functions (unlike adapters),
//! so this is deliberately `static`-friendly: one process-wide instance,
//! constructed once, never mutated.

use crate::function::{HashPartitionFn, ListPartitionFn, RangePartitionFn};
use crate::strategy::Strategy;
use catalog_types::PolyType;

/// Well-known partition function names, as they appear in DDL.
pub mod names {
    pub const HASH: &str = "HASH";
    pub const LIST: &str = "LIST";
    pub const RANGE: &str = "RANGE";
    pub const TEMPERATURE: &str = "TEMPERATURE";
}

/// Looks up a [`Strategy`] by its DDL name and checks column-type support.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartitionFunctionRegistry;

impl PartitionFunctionRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a DDL-level partition function name to its `Strategy`.
    /// `TEMPERATURE` is not resolvable here: it always wraps one of the
    /// other three and is constructed by the caller once the inner scheme
    /// is known.
    pub fn resolve(&self, name: &str) -> Option<Strategy> {
        match name {
            names::HASH => Some(Strategy::Hash(HashPartitionFn)),
            names::LIST => Some(Strategy::List(ListPartitionFn::new())),
            names::RANGE => Some(Strategy::Range(RangePartitionFn)),
            _ => None,
        }
    }

    /// All DDL-level names this registry can resolve.
    pub fn known_names(&self) -> &'static [&'static str] {
        &[names::HASH, names::LIST, names::RANGE, names::TEMPERATURE]
    }

    /// Whether `name` is a registered function that additionally supports
    /// `poly_type` as its partition column type.
    pub fn supports(&self, name: &str, poly_type: PolyType) -> bool {
        self.resolve(name)
            .map(|s| s.supports_column_of_type(poly_type))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names() {
        let registry = PartitionFunctionRegistry::new();
        assert!(registry.resolve(names::HASH).is_some());
        assert!(registry.resolve(names::LIST).is_some());
        assert!(registry.resolve(names::RANGE).is_some());
        assert!(registry.resolve("BOGUS").is_none());
    }

    #[test]
    fn range_rejects_json_columns() {
        let registry = PartitionFunctionRegistry::new();
        assert!(!registry.supports(names::RANGE, PolyType::Json));
        assert!(registry.supports(names::RANGE, PolyType::Integer));
    }
}
