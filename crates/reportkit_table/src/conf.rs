//! Table constants and default presets.

use crate::spec::SpecAggregatePolicy;

/// Number of header rows every report table carries.
pub const N_HEADER_ROWS: usize = 2;
/// Column-spec marker that becomes the summary label cell of the aggregate row.
pub const C_MARKER_SUMMARY: &str = "통계";
/// Column-spec marker copied verbatim into the aggregate row.
pub const C_MARKER_LITERAL: &str = "-";
/// Decimal digits used when formatting averages.
pub const N_DIGITS_AGGREGATE: usize = 2;
/// Leading cells of an even row that span its odd continuation row.
pub const N_CELLS_ROW_SPAN_DOUBLE: usize = 3;
/// Text rendered for averages over an empty row set.
pub const C_AGGREGATE_EMPTY_TEXT: &str = "-";

/// Build default aggregate policy.
pub fn derive_default_aggregate_policy() -> SpecAggregatePolicy {
    SpecAggregatePolicy::default()
}
