//! XLSX constants and default preset factories.

use reportkit_table::SpecReportDefinition;

use crate::spec::{SpecCellFormat, SpecStyleTable, SpecXlsxExportOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Column width used when no `wscols` hint covers a column.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 12.0;
/// Per-export reports an exporter keeps before dropping the oldest.
pub const N_EXPORT_REPORTS_MAX: usize = 64;

/// Build the default per-role cell formats.
pub fn derive_default_style_table() -> SpecStyleTable {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Malgun Gothic".to_string()),
        font_size: Some(10),
        border: Some(1),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecStyleTable {
        title: cfg_base_fmt_spec.with_(SpecCellFormat {
            font_size: Some(14),
            bold: Some(true),
            border: Some(0),
            ..Default::default()
        }),
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#D9E1F2".to_string()),
            text_wrap: Some(true),
            ..Default::default()
        }),
        data: cfg_base_fmt_spec.clone(),
        aggregate: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#F2F2F2".to_string()),
            ..Default::default()
        }),
    }
}

/// Build export options from a report definition.
pub fn derive_export_options_from_definition(
    definition: &SpecReportDefinition,
) -> SpecXlsxExportOptions {
    SpecXlsxExportOptions {
        file_name: definition.file_name.clone(),
        sheet_name: definition.sheet_name.clone(),
        title: definition.title.clone(),
        wscols: definition.wscols.clone(),
        ..Default::default()
    }
}
