//! `reportkit_io_xlsx` v1:
//! Spreadsheet export of grouped-header report tables.
//!
//! Layers:
//! - `conf`   : Excel limits and default style presets
//! - `spec`   : cell formats, export options, workbook plan and report
//! - `error`  : export error types
//! - `util`   : pure planning helpers (merge notation, aggregate placement)
//! - `writer` : rust_xlsxwriter kernel, export guard and download sinks
pub mod conf;
pub mod error;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_EXPORT_REPORTS_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_COLUMN_DEFAULT, TUP_EXCEL_ILLEGAL, derive_default_style_table,
    derive_export_options_from_definition,
};
pub use error::ExportError;
pub use spec::{
    EnumCellRole, SpecCellFormat, SpecSheetCell, SpecSheetMerge, SpecStyleTable,
    SpecWorkbookInput, SpecWorkbookPlan, SpecXlsxExportOptions, SpecXlsxReport,
};
pub use util::{
    derive_a1_range, derive_column_letters, derive_column_widths, derive_workbook_plan_json,
    plan_aggregate_placement, plan_header_merges, plan_workbook, sanitize_sheet_name,
    select_non_overlapping_merges,
};
pub use writer::{DownloadSink, FileDownloadSink, MemoryDownloadSink, XlsxExporter};
