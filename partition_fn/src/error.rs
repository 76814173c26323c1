use catalog_types::PolyType;
use snafu::Snafu;

/// Errors raised while validating or routing a partitioning scheme: bad
/// qualifier, unsupported column type, duplicate partition name, or an
/// unroutable value.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("column type {column_type:?} is not supported by this partition function"))]
    UnsupportedColumnType { column_type: PolyType },

    #[snafu(display("RANGE qualifiers overlap: [{a_low}, {a_high}) and [{b_low}, {b_high})"))]
    OverlappingRangeQualifiers {
        a_low: String,
        a_high: String,
        b_low: String,
        b_high: String,
    },

    #[snafu(display("LIST qualifier value \"{value}\" is assigned to more than one partition"))]
    DuplicateListQualifier { value: String },

    #[snafu(display(
        "partitioning scheme requires exactly one unbound partition, found {count}"
    ))]
    MissingUnboundPartition { count: usize },

    #[snafu(display("RANGE qualifier has low > high after canonicalization: {low} > {high}"))]
    InvalidRangeBounds { low: String, high: String },

    #[snafu(display("value \"{value}\" did not match any partition and no unbound partition exists"))]
    Unroutable { value: String },

    #[snafu(display("temperature hotInPct/hotOutPct must be in [0, 100], got {pct}"))]
    InvalidTemperaturePercentage { pct: u16 },

    #[snafu(display("temperature hot and cold group ids must differ"))]
    TemperatureGroupsNotDistinct,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
