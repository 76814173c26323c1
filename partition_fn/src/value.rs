//! Canonical value representation shared by routing and migration.
//!
//! Every partition-column cell — whatever its `PolyType` — is reduced to a
//! canonical string before a partition function sees it, the same
//! representation the data migrator uses when redistributing rows.

use std::cmp::Ordering;

/// The canonical string substituted for a SQL `NULL` partition-column value.
/// Chosen to be impossible to produce from ordinary column data.
pub const NULL_SENTINEL: &str = "\u{0}__polydb_null__";

/// Canonicalize a possibly-absent value.
pub fn canonicalize(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NULL_SENTINEL.to_string(),
    }
}

/// Order two canonical values. Numeric strings compare numerically (so RANGE
/// partitioning on an integer column behaves as expected); anything else
/// falls back to lexicographic order.
pub fn compare_canonical(a: &str, b: &str) -> Ordering {
    match (a.parse::<i128>(), b.parse::<i128>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(a), Err(_)) => match b.parse::<f64>() {
            Ok(b) => (a as f64).partial_cmp(&b).unwrap_or(Ordering::Equal),
            Err(_) => a.to_string().cmp(&b.to_string()),
        },
        _ => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_compare_numerically() {
        assert_eq!(compare_canonical("9", "10"), Ordering::Less);
        assert_eq!(compare_canonical("10", "9"), Ordering::Greater);
    }

    #[test]
    fn null_canonicalizes_to_sentinel() {
        assert_eq!(canonicalize(None), NULL_SENTINEL);
        assert_eq!(canonicalize(Some("x")), "x");
    }
}
