//! Export models: cell formats, options, workbook plan and report.

use serde::{Deserialize, Serialize};

use reportkit_table::{
    EnumCellValue, SpecBodyRow, SpecColumnWidth, SpecHeaderMatrix, SpecMergeRegion,
    TypeAggregateRow,
};

use crate::conf::{N_WIDTH_COLUMN_DEFAULT, derive_default_style_table};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,

    /// Horizontal alignment (`left`, `center`, ...).
    pub align: Option<String>,
    /// Vertical alignment (`top`, `vcenter`, ...).
    pub valign: Option<String>,
    /// Border style code for all sides (0-13).
    pub border: Option<i64>,
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Fill color, `#RRGGBB`.
    pub bg_color: Option<String>,
    /// Font color, `#RRGGBB`.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Cell formats per table role.
///
/// Deserialized roles are laid over the default preset field by field, so a
/// partial role such as `{"header": {"bold": true}}` keeps the preset font,
/// border, alignment and fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecStyleTable {
    pub title: SpecCellFormat,
    pub header: SpecCellFormat,
    pub data: SpecCellFormat,
    pub aggregate: SpecCellFormat,
}

impl Default for SpecStyleTable {
    fn default() -> Self {
        derive_default_style_table()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecStyleTablePatch {
    #[serde(default)]
    title: Option<SpecCellFormat>,
    #[serde(default)]
    header: Option<SpecCellFormat>,
    #[serde(default)]
    data: Option<SpecCellFormat>,
    #[serde(default)]
    aggregate: Option<SpecCellFormat>,
}

impl<'de> Deserialize<'de> for SpecStyleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let patch = SpecStyleTablePatch::deserialize(deserializer)?;
        let base = derive_default_style_table();
        let apply_patch = |fmt_base: SpecCellFormat, fmt_patch: Option<SpecCellFormat>| {
            match fmt_patch {
                Some(fmt_patch) => fmt_base.merge(&fmt_patch),
                None => fmt_base,
            }
        };
        Ok(Self {
            title: apply_patch(base.title, patch.title),
            header: apply_patch(base.header, patch.header),
            data: apply_patch(base.data, patch.data),
            aggregate: apply_patch(base.aggregate, patch.aggregate),
        })
    }
}

impl SpecStyleTable {
    /// Format for `role`.
    pub fn get(&self, role: EnumCellRole) -> &SpecCellFormat {
        match role {
            EnumCellRole::Title => &self.title,
            EnumCellRole::Header => &self.header,
            EnumCellRole::Data => &self.data,
            EnumCellRole::Aggregate => &self.aggregate,
        }
    }
}

/// Part of the table a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnumCellRole {
    Title,
    Header,
    Data,
    Aggregate,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Per-export options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecXlsxExportOptions {
    /// Download file name; used verbatim.
    pub file_name: String,
    /// Worksheet name; sanitized before use.
    pub sheet_name: String,
    /// Optional title row merged across the table width.
    pub title: Option<String>,
    /// Column width hints (`wscols`).
    pub wscols: Option<Vec<SpecColumnWidth>>,
    /// Width for columns without a hint.
    pub width_default: f64,
    /// Freeze panes below the header rows.
    pub if_freeze_header: bool,
    /// Cell formats per role.
    pub style_table: SpecStyleTable,
}

impl Default for SpecXlsxExportOptions {
    fn default() -> Self {
        Self {
            file_name: "report.xlsx".to_string(),
            sheet_name: "Sheet1".to_string(),
            title: None,
            wscols: None,
            width_default: N_WIDTH_COLUMN_DEFAULT,
            if_freeze_header: true,
            style_table: SpecStyleTable::default(),
        }
    }
}

/// Borrowed inputs of one export.
pub struct SpecWorkbookInput<'a> {
    /// Two-row header grid.
    pub header: &'a SpecHeaderMatrix,
    /// Header merges in lookup order.
    pub merge_regions: &'a [SpecMergeRegion],
    /// Body rows placed at physical columns.
    pub body: &'a [SpecBodyRow],
    /// Optional trailing aggregate row.
    pub aggregate_row: Option<&'a TypeAggregateRow>,
    /// Export options.
    pub options: &'a SpecXlsxExportOptions,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookPlanSpecification

/// One cell value to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecSheetCell {
    pub row_idx: usize,
    pub col_idx: usize,
    pub value: EnumCellValue,
    pub role: EnumCellRole,
}

/// One merged range of the output sheet, zero-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSheetMerge {
    pub row_idx_start: usize,
    pub col_idx_start: usize,
    pub row_idx_end: usize,
    pub col_idx_end: usize,
    /// Same range in 1-based A1 notation, e.g. `A1:B2`.
    pub range_a1: String,
    pub role: EnumCellRole,
}

impl SpecSheetMerge {
    /// Whether two merges share at least one cell.
    pub fn overlaps(&self, other: &SpecSheetMerge) -> bool {
        self.row_idx_start <= other.row_idx_end
            && other.row_idx_start <= self.row_idx_end
            && self.col_idx_start <= other.col_idx_end
            && other.col_idx_start <= self.col_idx_end
    }

    /// Whether `(row_idx, col_idx)` lies inside the merge but is not its anchor.
    pub fn covers_non_anchor(&self, row_idx: usize, col_idx: usize) -> bool {
        (self.row_idx_start..=self.row_idx_end).contains(&row_idx)
            && (self.col_idx_start..=self.col_idx_end).contains(&col_idx)
            && (row_idx, col_idx) != (self.row_idx_start, self.col_idx_start)
    }
}

/// Serializable description of the workbook an export produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecWorkbookPlan {
    pub file_name: String,
    /// Sanitized worksheet name.
    pub sheet_name: String,
    /// Row index of the first header row.
    pub n_row_header_offset: usize,
    /// Row index of the first body row.
    pub n_row_body_offset: usize,
    /// Row index of the aggregate row, when present.
    pub n_row_aggregate: Option<usize>,
    /// Every cell value, including cells that merges later cover.
    pub cells: Vec<SpecSheetCell>,
    /// Title, header, body and aggregate merges in that order.
    pub merges: Vec<SpecSheetMerge>,
    /// Width per column.
    pub col_widths: Vec<f64>,
    /// First unfrozen row.
    pub row_freeze: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecXlsxReport {
    /// Merges written to the sheet.
    pub merges_applied: Vec<SpecSheetMerge>,
    /// Merges dropped because an earlier merge overlapped them.
    pub merges_skipped: Vec<SpecSheetMerge>,
    /// Cells written after merge coverage was applied.
    pub n_cells_written: usize,
    /// Size of the produced buffer.
    pub n_bytes: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        log::warn!("{}", msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
