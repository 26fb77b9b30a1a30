//! `reportkit_table` v1:
//! Grouped-header table kernel shared by every report view.
//!
//! Layers:
//! - `conf`       : constants and default presets
//! - `spec`       : models/options/report
//! - `error`      : top-level error types
//! - `merge`      : header merge-region calculation and its scoped cache
//! - `header`     : header render plan
//! - `aggregate`  : trailing average row
//! - `project`    : body cell projection (flat and double-row layouts)
//! - `frame`      : row ingestion from Polars DataFrame / IPC bytes
//! - `definition` : JSON report definitions
//! - `view`       : per-report session tying the layers together
pub mod aggregate;
pub mod conf;
pub mod definition;
pub mod error;
pub mod frame;
pub mod header;
pub mod merge;
pub mod project;
pub mod spec;
pub mod view;

pub use aggregate::{
    build_aggregate_row, build_aggregate_row_with_report, calculate_mean, coerce_to_f64,
    format_fixed,
};
pub use conf::{
    C_MARKER_LITERAL, C_MARKER_SUMMARY, N_CELLS_ROW_SPAN_DOUBLE, N_DIGITS_AGGREGATE,
    N_HEADER_ROWS,
};
pub use definition::{SpecColumnWidth, SpecReportDefinition, derive_report_definition_from_json};
pub use error::TableError;
pub use frame::{derive_records_from_dataframe, derive_records_from_ipc_bytes};
pub use header::{build_header_plan, plan_header_row_from_regions, plan_header_row0_live};
pub use merge::{MergeRegionCache, compute_merge_regions};
pub use project::{derive_body_rows_flat, project_double_rows, project_rows};
pub use spec::{
    EnumCellValue, EnumColumnSpecEntry, EnumTableWarning, SpecAggregateCell, SpecAggregatePolicy,
    SpecBodyCell, SpecBodyRow, SpecHeaderCellPlan, SpecHeaderMatrix, SpecMergeRegion,
    SpecTableReport, TypeAggregateRow, TypeRecord, format_number_text,
};
pub use view::{ReportView, SpecTableView};
