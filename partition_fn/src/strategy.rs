//! Ties a [`PartitionProperty`] to the concrete strategy that interprets it,
//! and dispatches `target()` uniformly — including through the TEMPERATURE
//! wrapper, which delegates entirely to its inner scheme and only routes
//! within the current hot/cold assignment.
//!
//! A closed enum rather than a trait object: the set of strategies is fixed,
//! so matching avoids open-hierarchy dynamic dispatch for what is really a
//! small, stable set of cases.

use crate::{
    error::{self, Result},
    function::{HashPartitionFn, ListPartitionFn, PartitionFunction, RangePartitionFn},
};
use catalog_types::{PartitionId, PartitionProperty, PolyType, Qualifier, TemperatureConfig};

/// The concrete strategy driving one entity's `PartitionProperty`.
#[derive(Debug, Clone, Copy, Default)]
pub enum Strategy {
    #[default]
    None,
    Hash(HashPartitionFn),
    List(ListPartitionFn),
    Range(RangePartitionFn),
}

impl Strategy {
    pub fn supports_column_of_type(&self, poly_type: PolyType) -> bool {
        match self {
            Strategy::None => true,
            Strategy::Hash(f) => f.supports_column_of_type(poly_type),
            Strategy::List(f) => f.supports_column_of_type(poly_type),
            Strategy::Range(f) => f.supports_column_of_type(poly_type),
        }
    }

    pub fn requires_unbound_partition_group(&self) -> bool {
        match self {
            Strategy::None => false,
            Strategy::Hash(f) => f.requires_unbound_partition_group(),
            Strategy::List(f) => f.requires_unbound_partition_group(),
            Strategy::Range(f) => f.requires_unbound_partition_group(),
        }
    }
}

/// Validate a `PartitionProperty` end to end, including the TEMPERATURE
/// wrapper's own configuration.
pub fn validate(strategy: &Strategy, property: &PartitionProperty) -> Result<()> {
    match property {
        PartitionProperty::None { .. } => Ok(()),
        PartitionProperty::Hash { .. } => match strategy {
            Strategy::Hash(f) => f.validate(property),
            _ => error::Error::Unroutable {
                value: "strategy/property mismatch".to_string(),
            }
            .fail(),
        },
        PartitionProperty::List { .. } => match strategy {
            Strategy::List(f) => f.validate(property),
            _ => error::Error::Unroutable {
                value: "strategy/property mismatch".to_string(),
            }
            .fail(),
        },
        PartitionProperty::Range { .. } => match strategy {
            Strategy::Range(f) => f.validate(property),
            _ => error::Error::Unroutable {
                value: "strategy/property mismatch".to_string(),
            }
            .fail(),
        },
        PartitionProperty::Temperature { inner, config } => {
            validate_temperature_config(config, inner.partition_ids().len())?;
            validate(strategy, inner)
        }
    }
}

fn validate_temperature_config(config: &TemperatureConfig, total_partitions: usize) -> Result<()> {
    if config.hot_in_pct > 100 {
        return error::InvalidTemperaturePercentageSnafu {
            pct: config.hot_in_pct as u16,
        }
        .fail();
    }
    if config.hot_out_pct > 100 {
        return error::InvalidTemperaturePercentageSnafu {
            pct: config.hot_out_pct as u16,
        }
        .fail();
    }
    if config.hot_group_id == config.cold_group_id {
        return error::TemperatureGroupsNotDistinctSnafu.fail();
    }
    let _ = total_partitions; // hot+cold group membership is checked by the catalog
                              // against live partitions, not here: this function only
                              // validates the static configuration.
    Ok(())
}

/// Route one value, including through a TEMPERATURE wrapper.
///
/// `partitions` supplies each candidate partition's qualifiers (needed by
/// LIST/RANGE, ignored by HASH); it should cover every partition id in
/// `property.partition_ids()`.
pub fn target(
    strategy: &Strategy,
    property: &PartitionProperty,
    partitions: &[(PartitionId, &[Qualifier])],
    value: Option<&str>,
) -> Result<PartitionId> {
    match property {
        PartitionProperty::None { partition_id } => Ok(*partition_id),
        PartitionProperty::Hash { .. } => match strategy {
            Strategy::Hash(f) => f.target(property, value),
            _ => unreachable!("Strategy::Hash required for a HASH property"),
        },
        PartitionProperty::List { .. } => match strategy {
            Strategy::List(f) => f.target_with_qualifiers(property, partitions, value),
            _ => unreachable!("Strategy::List required for a LIST property"),
        },
        PartitionProperty::Range { .. } => match strategy {
            Strategy::Range(f) => f.target_with_qualifiers(property, partitions, value),
            _ => unreachable!("Strategy::Range required for a RANGE property"),
        },
        PartitionProperty::Temperature { inner, .. } => target(strategy, inner, partitions, value),
    }
}
