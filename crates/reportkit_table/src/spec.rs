//! Shared table models: cell values, header grid, spans, aggregate and report.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conf::{
    C_AGGREGATE_EMPTY_TEXT, C_MARKER_LITERAL, C_MARKER_SUMMARY, N_DIGITS_AGGREGATE, N_HEADER_ROWS,
};
use crate::error::TableError;

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Raw record value as handed over by the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum EnumCellValue {
    /// Missing/null value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Display text used by the HTML body.
    pub fn to_display_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number_text(*n),
        }
    }
}

/// Shortest round-trip text of `x`, switching to exponent form below `1e-6`
/// and from `1e21` up (`1e-7`, `1.5e+21`), as browsers print numbers.
pub fn format_number_text(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let n_abs = x.abs();
    if n_abs == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n_abs) {
        return x.to_string();
    }
    let c_exp = format!("{x:e}");
    match c_exp.split_once('e') {
        Some((c_mantissa, c_power)) if !c_power.starts_with('-') => {
            format!("{c_mantissa}e+{c_power}")
        }
        _ => c_exp,
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// One data record: field key -> value.
pub type TypeRecord = BTreeMap<String, EnumCellValue>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderSpecification

/// Two-row grouped header label grid.
///
/// `""` is the blank sentinel: in row 0 it suppresses the cell, in row 1 it
/// pulls the row-0 label down across both rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SpecHeaderMatrix {
    rows: Vec<Vec<String>>,
}

impl SpecHeaderMatrix {
    /// Validate and wrap a raw label grid.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        if rows.len() != N_HEADER_ROWS {
            return Err(TableError::MalformedHeader(format!(
                "expected {N_HEADER_ROWS} header rows, got {}",
                rows.len()
            )));
        }
        let n_width = rows[0].len();
        if let Some((n_idx_row, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_width)
        {
            return Err(TableError::MalformedHeader(format!(
                "header row {n_idx_row} has {} labels, expected {n_width}",
                row.len()
            )));
        }
        Ok(Self { rows })
    }

    /// Convenience constructor from string slices.
    pub fn from_labels(rows: &[&[&str]]) -> Result<Self, TableError> {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        )
    }

    /// Header rows, top first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Label at `(row_idx, col_idx)`.
    pub fn label(&self, row_idx: usize, col_idx: usize) -> &str {
        &self.rows[row_idx][col_idx]
    }
}

impl<'de> Deserialize<'de> for SpecHeaderMatrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<String>>::deserialize(deserializer)?;
        Self::new(rows).map_err(serde::de::Error::custom)
    }
}

/// Rectangular header merge, inclusive and zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecMergeRegion {
    /// First covered row.
    pub row_idx_start: usize,
    /// First covered column.
    pub col_idx_start: usize,
    /// Last covered row.
    pub row_idx_end: usize,
    /// Last covered column.
    pub col_idx_end: usize,
}

impl SpecMergeRegion {
    /// Region covering one row run `[col_idx_start, col_idx_end]`.
    pub fn horizontal(row_idx: usize, col_idx_start: usize, col_idx_end: usize) -> Self {
        Self {
            row_idx_start: row_idx,
            col_idx_start,
            row_idx_end: row_idx,
            col_idx_end,
        }
    }

    /// Region covering rows `[row_idx_start, row_idx_end]` of one column.
    pub fn vertical(col_idx: usize, row_idx_start: usize, row_idx_end: usize) -> Self {
        Self {
            row_idx_start,
            col_idx_start: col_idx,
            row_idx_end,
            col_idx_end: col_idx,
        }
    }

    /// Whether `(row_idx, col_idx)` lies inside the region.
    pub fn contains(&self, row_idx: usize, col_idx: usize) -> bool {
        (self.row_idx_start..=self.row_idx_end).contains(&row_idx)
            && (self.col_idx_start..=self.col_idx_end).contains(&col_idx)
    }

    /// Whether `(row_idx, col_idx)` is the top-left cell.
    pub fn is_anchor(&self, row_idx: usize, col_idx: usize) -> bool {
        self.row_idx_start == row_idx && self.col_idx_start == col_idx
    }

    pub fn row_span(&self) -> usize {
        self.row_idx_end - self.row_idx_start + 1
    }

    pub fn col_span(&self) -> usize {
        self.col_idx_end - self.col_idx_start + 1
    }

    /// Whether two regions share at least one cell.
    pub fn overlaps(&self, other: &SpecMergeRegion) -> bool {
        self.row_idx_start <= other.row_idx_end
            && other.row_idx_start <= self.row_idx_end
            && self.col_idx_start <= other.col_idx_end
            && other.col_idx_start <= self.col_idx_end
    }
}

/// Render decision for one header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecHeaderCellPlan {
    /// `false` when another cell's span covers this one.
    pub visible: bool,
    pub row_span: usize,
    pub col_span: usize,
    pub label: String,
}

impl SpecHeaderCellPlan {
    /// Visible cell with explicit spans.
    pub fn spanned(label: &str, row_span: usize, col_span: usize) -> Self {
        Self {
            visible: true,
            row_span,
            col_span,
            label: label.to_string(),
        }
    }

    /// Cell that renders nothing.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            row_span: 0,
            col_span: 0,
            label: String::new(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AggregateSpecification

/// Per-column directive for the aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnumColumnSpecEntry {
    /// Spacer: renders nothing, widens the next summary label.
    Blank,
    /// Text copied verbatim; not averaged.
    Literal(String),
    /// Summary label spanning the preceding spacers.
    Summary,
    /// Field key whose values are averaged across rows.
    Average(String),
}

impl EnumColumnSpecEntry {
    /// Parse one marker string from a report definition.
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            "" => Self::Blank,
            C_MARKER_LITERAL => Self::Literal(marker.to_string()),
            C_MARKER_SUMMARY => Self::Summary,
            key => Self::Average(key.to_string()),
        }
    }

    /// Marker string this entry was parsed from.
    pub fn to_marker(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Literal(text) => text.clone(),
            Self::Summary => C_MARKER_SUMMARY.to_string(),
            Self::Average(key) => key.clone(),
        }
    }
}

impl From<String> for EnumColumnSpecEntry {
    fn from(value: String) -> Self {
        Self::from_marker(&value)
    }
}

impl From<EnumColumnSpecEntry> for String {
    fn from(value: EnumColumnSpecEntry) -> Self {
        value.to_marker()
    }
}

/// One rendered aggregate cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecAggregateCell {
    pub col_span: usize,
    pub data: String,
}

/// Aggregate row; `None` marks a column absorbed by a preceding span.
pub type TypeAggregateRow = Vec<Option<SpecAggregateCell>>;

/// Aggregate formatting policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAggregatePolicy {
    /// Label written into summary cells.
    pub summary_label: String,
    /// Fixed decimal digits of averages.
    pub n_digits: usize,
    /// Text written for averages over an empty row set.
    pub empty_text: String,
}

impl Default for SpecAggregatePolicy {
    fn default() -> Self {
        Self {
            summary_label: C_MARKER_SUMMARY.to_string(),
            n_digits: N_DIGITS_AGGREGATE,
            empty_text: C_AGGREGATE_EMPTY_TEXT.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BodySpecification

/// One body cell placed at a physical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecBodyCell {
    /// Physical column index inside the table.
    pub col_idx: usize,
    /// Rows covered, including this one.
    pub row_span: usize,
    pub value: EnumCellValue,
}

/// One physical body row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecBodyRow {
    pub cells: Vec<SpecBodyCell>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Non-fatal condition met while building a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumTableWarning {
    /// Averages requested over zero rows.
    EmptyRowSet {
        /// Number of averaging columns affected.
        n_cols_average: usize,
    },
    /// Double layout received an even row with no continuation row.
    UnpairedRow {
        /// Index of the trailing record.
        row_idx: usize,
    },
}

impl fmt::Display for EnumTableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRowSet { n_cols_average } => write!(
                f,
                "Empty row set: {n_cols_average} average column(s) rendered without data."
            ),
            Self::UnpairedRow { row_idx } => write!(
                f,
                "Unpaired row in double layout: record {row_idx} has no continuation row."
            ),
        }
    }
}

/// Per-build report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecTableReport {
    /// Non-fatal warnings.
    pub warnings: Vec<EnumTableWarning>,
}

impl SpecTableReport {
    /// Add a warning.
    pub fn warn(&mut self, warning: EnumTableWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
