//! XLSX writer kernel that turns a table view into a workbook buffer and
//! hands it to a download sink.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use reportkit_table::{EnumCellValue, SpecReportDefinition, SpecTableView};

use crate::conf::N_EXPORT_REPORTS_MAX;
use crate::error::ExportError;
use crate::spec::{
    EnumCellRole, SpecCellFormat, SpecSheetCell, SpecSheetMerge, SpecStyleTable,
    SpecWorkbookInput, SpecWorkbookPlan, SpecXlsxExportOptions, SpecXlsxReport,
};
use crate::util::{plan_workbook, select_non_overlapping_merges};

////////////////////////////////////////////////////////////////////////////////
// #region DownloadSinks

/// Receiver of finished workbook buffers.
pub trait DownloadSink {
    /// Take ownership of `buffer`, offered under `file_name`.
    fn deliver(&mut self, file_name: &str, buffer: Vec<u8>) -> Result<(), ExportError>;
}

/// Writes each delivered buffer into a directory.
///
/// Only the final path component of the offered file name is used.
#[derive(Debug, Clone)]
pub struct FileDownloadSink {
    dir_out: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir_out: impl Into<PathBuf>) -> Self {
        Self {
            dir_out: dir_out.into(),
        }
    }

    pub fn dir_out(&self) -> &Path {
        &self.dir_out
    }
}

impl DownloadSink for FileDownloadSink {
    fn deliver(&mut self, file_name: &str, buffer: Vec<u8>) -> Result<(), ExportError> {
        let Some(c_name) = Path::new(file_name).file_name() else {
            return Err(ExportError::Sink(format!("invalid file name: {file_name:?}")));
        };
        let path_file_out = self.dir_out.join(c_name);
        std::fs::write(&path_file_out, buffer)
            .map_err(|err| ExportError::Sink(format!("{}: {err}", path_file_out.display())))
    }
}

/// Keeps the last delivered buffer in memory.
#[derive(Debug, Default)]
pub struct MemoryDownloadSink {
    last: Option<(String, Vec<u8>)>,
}

impl MemoryDownloadSink {
    /// File name and bytes of the last delivery.
    pub fn last(&self) -> Option<(&str, &[u8])> {
        self.last
            .as_ref()
            .map(|(c_name, v_bytes)| (c_name.as_str(), v_bytes.as_slice()))
    }

    pub fn take(&mut self) -> Option<(String, Vec<u8>)> {
        self.last.take()
    }
}

impl DownloadSink for MemoryDownloadSink {
    fn deliver(&mut self, file_name: &str, buffer: Vec<u8>) -> Result<(), ExportError> {
        self.last = Some((file_name.to_string(), buffer));
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Exporter

/// Held for the duration of one export; released on drop.
struct ExportGuard<'a> {
    if_in_flight: &'a AtomicBool,
}

impl<'a> ExportGuard<'a> {
    fn acquire(if_in_flight: &'a AtomicBool) -> Result<Self, ExportError> {
        if_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::InFlight)?;
        Ok(Self { if_in_flight })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.if_in_flight.store(false, Ordering::Release);
    }
}

/// Spreadsheet exporter.
///
/// One export runs at a time per exporter; a second call while the first is
/// still building fails with [`ExportError::InFlight`].
#[derive(Default)]
pub struct XlsxExporter {
    if_in_flight: AtomicBool,
    l_reports: Mutex<Vec<SpecXlsxReport>>,
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an export is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.if_in_flight.load(Ordering::Acquire)
    }

    /// Return immutable snapshot of per-export reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.lock().clone()
    }

    /// Drain the kept per-export reports.
    pub fn take_reports(&self) -> Vec<SpecXlsxReport> {
        std::mem::take(&mut *self.l_reports.lock())
    }

    /// Build the workbook buffer.
    pub fn export_to_buffer(
        &self,
        input: &SpecWorkbookInput<'_>,
    ) -> Result<(Vec<u8>, SpecXlsxReport), ExportError> {
        let _guard = ExportGuard::acquire(&self.if_in_flight)?;
        derive_workbook_buffer(input)
    }

    /// Build the workbook and deliver it to `sink`.
    ///
    /// Failures are logged and reported as `false`; nothing reaches the sink
    /// unless the whole buffer was produced.
    pub fn export(&self, input: &SpecWorkbookInput<'_>, sink: &mut dyn DownloadSink) -> bool {
        let c_file_name = input.options.file_name.as_str();
        match self.export_and_deliver(input, sink) {
            Ok(report) => {
                log::info!(
                    "Exported {c_file_name} ({} bytes, {} merges).",
                    report.n_bytes,
                    report.merges_applied.len()
                );
                self.push_report(report);
                true
            }
            Err(err) => {
                log::error!("Export of {c_file_name} failed: {err}");
                false
            }
        }
    }

    /// Export a rendered table view with its definition's header.
    pub fn export_table_view(
        &self,
        definition: &SpecReportDefinition,
        view: &SpecTableView,
        options: &SpecXlsxExportOptions,
        sink: &mut dyn DownloadSink,
    ) -> bool {
        let input = SpecWorkbookInput {
            header: &definition.header,
            merge_regions: &view.merge_regions,
            body: &view.body,
            aggregate_row: view.aggregate_row.as_ref(),
            options,
        };
        self.export(&input, sink)
    }

    /// Keep at most `N_EXPORT_REPORTS_MAX` reports, dropping the oldest.
    fn push_report(&self, report: SpecXlsxReport) {
        let mut l_reports = self.l_reports.lock();
        if l_reports.len() >= N_EXPORT_REPORTS_MAX {
            let n_drop = l_reports.len() + 1 - N_EXPORT_REPORTS_MAX;
            l_reports.drain(..n_drop);
        }
        l_reports.push(report);
    }

    fn export_and_deliver(
        &self,
        input: &SpecWorkbookInput<'_>,
        sink: &mut dyn DownloadSink,
    ) -> Result<SpecXlsxReport, ExportError> {
        let _guard = ExportGuard::acquire(&self.if_in_flight)?;
        let (v_buffer, report) = derive_workbook_buffer(input)?;
        sink.deliver(&input.options.file_name, v_buffer)?;
        Ok(report)
    }
}

fn derive_workbook_buffer(
    input: &SpecWorkbookInput<'_>,
) -> Result<(Vec<u8>, SpecXlsxReport), ExportError> {
    let formats = RoleFormats::new(&input.options.style_table)?;
    let plan = plan_workbook(input)?;
    log::debug!(
        "Planned sheet {:?}: {} cells, {} merges.",
        plan.sheet_name,
        plan.cells.len(),
        plan.merges.len()
    );

    let mut report = SpecXlsxReport::default();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_plan(worksheet, &plan, &formats, &mut report)?;

    let v_buffer = workbook.save_to_buffer().map_err(derive_xlsx_error)?;
    report.n_bytes = v_buffer.len();
    Ok((v_buffer, report))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetWriting

fn write_plan(
    worksheet: &mut Worksheet,
    plan: &SpecWorkbookPlan,
    formats: &RoleFormats,
    report: &mut SpecXlsxReport,
) -> Result<(), ExportError> {
    worksheet
        .set_name(plan.sheet_name.as_str())
        .map_err(derive_xlsx_error)?;

    let (l_merges_applied, l_merges_skipped) = select_non_overlapping_merges(&plan.merges);
    for merge in &l_merges_skipped {
        report.warn(format!(
            "Skipped merge {} ({:?}): overlaps an earlier merge.",
            merge.range_a1, merge.role
        ));
    }

    // Anchor values are written after the merge; merge_range only takes text.
    for merge in &l_merges_applied {
        worksheet
            .merge_range(
                cast_row_num(merge.row_idx_start)?,
                cast_col_num(merge.col_idx_start)?,
                cast_row_num(merge.row_idx_end)?,
                cast_col_num(merge.col_idx_end)?,
                "",
                formats.get(merge.role),
            )
            .map_err(derive_xlsx_error)?;
    }

    let l_cells_written = select_written_cells(&plan.cells, &l_merges_applied);
    for cell in &l_cells_written {
        write_cell_with_format(
            worksheet,
            cell.row_idx,
            cell.col_idx,
            &cell.value,
            formats.get(cell.role),
        )?;
    }

    for (n_idx_col, n_width) in plan.col_widths.iter().enumerate() {
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, *n_width)
            .map_err(derive_xlsx_error)?;
    }
    if let Some(n_row) = plan.row_freeze {
        worksheet
            .set_freeze_panes(cast_row_num(n_row)?, 0)
            .map_err(derive_xlsx_error)?;
    }

    report.n_cells_written = l_cells_written.len();
    report.merges_applied = l_merges_applied;
    report.merges_skipped = l_merges_skipped;
    Ok(())
}

/// Cells to write once `merges` are applied: everything except cells a merge
/// covers without being its anchor.
fn select_written_cells<'a>(
    cells: &'a [SpecSheetCell],
    merges: &[SpecSheetMerge],
) -> Vec<&'a SpecSheetCell> {
    cells
        .iter()
        .filter(|cell| {
            !merges
                .iter()
                .any(|m| m.covers_non_anchor(cell.row_idx, cell.col_idx))
        })
        .collect()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ExportError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(_) => {
            worksheet
                .write_string_with_format(n_row, n_col, value.to_display_text(), format)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Resolved formats per cell role.
struct RoleFormats {
    title: Format,
    header: Format,
    data: Format,
    aggregate: Format,
}

impl RoleFormats {
    fn new(style_table: &SpecStyleTable) -> Result<Self, ExportError> {
        Ok(Self {
            title: derive_rust_xlsx_format(&style_table.title)?,
            header: derive_rust_xlsx_format(&style_table.header)?,
            data: derive_rust_xlsx_format(&style_table.data)?,
            aggregate: derive_rust_xlsx_format(&style_table.aggregate)?,
        })
    }

    fn get(&self, role: EnumCellRole) -> &Format {
        match role {
            EnumCellRole::Title => &self.title,
            EnumCellRole::Header => &self.header,
            EnumCellRole::Data => &self.data,
            EnumCellRole::Aggregate => &self.aggregate,
        }
    }
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Result<Format, ExportError> {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        if val <= 0 {
            return Err(ExportError::InvalidStyle(format!("font_size must be > 0: {val}")));
        }
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align {
        format = format.set_align(derive_format_align(val)?);
    }
    if let Some(val) = &spec.valign {
        format = format.set_align(derive_format_align(val)?);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(derive_color(val)?);
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(derive_color(val)?);
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val)?);
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    Ok(format)
}

fn derive_color(c_hex: &str) -> Result<Color, ExportError> {
    let c_digits = c_hex.trim().trim_start_matches('#');
    if c_digits.len() != 6 {
        return Err(ExportError::InvalidStyle(format!(
            "color must be #RRGGBB: {c_hex:?}"
        )));
    }
    u32::from_str_radix(c_digits, 16)
        .map(Color::RGB)
        .map_err(|_| ExportError::InvalidStyle(format!("color must be #RRGGBB: {c_hex:?}")))
}

fn derive_format_border(border: i64) -> Result<FormatBorder, ExportError> {
    let value = match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => {
            return Err(ExportError::InvalidStyle(format!(
                "border code must be 0-13: {border}"
            )));
        }
    };
    Ok(value)
}

fn derive_format_align(align: &str) -> Result<FormatAlign, ExportError> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Ok(FormatAlign::General),
        "left" => Ok(FormatAlign::Left),
        "center" => Ok(FormatAlign::Center),
        "right" => Ok(FormatAlign::Right),
        "fill" => Ok(FormatAlign::Fill),
        "justify" => Ok(FormatAlign::Justify),
        "center_across" => Ok(FormatAlign::CenterAcross),
        "distributed" => Ok(FormatAlign::Distributed),
        "top" => Ok(FormatAlign::Top),
        "bottom" => Ok(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Ok(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Ok(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Ok(FormatAlign::VerticalDistributed),
        _ => Err(ExportError::InvalidStyle(format!("unknown alignment: {align:?}"))),
    }
}

fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    u32::try_from(value).map_err(|_| ExportError::Index(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value).map_err(|_| ExportError::Index(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> ExportError {
    ExportError::Xlsx(err.to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
