//! Stateless planning helpers used by the XLSX export kernel.

use reportkit_table::{
    EnumCellValue, N_HEADER_ROWS, SpecAggregateCell, SpecColumnWidth, SpecMergeRegion,
    TypeAggregateRow,
};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::error::ExportError;
use crate::spec::{
    EnumCellRole, SpecSheetCell, SpecSheetMerge, SpecWorkbookInput, SpecWorkbookPlan,
};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet1".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Spreadsheet column letters for a zero-based index (`0 -> A`, `26 -> AA`).
pub fn derive_column_letters(col_idx: usize) -> String {
    let mut v_letters = Vec::new();
    let mut n_rest = col_idx + 1;
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        v_letters.push(char::from(b'A' + n_rem as u8));
        n_rest = (n_rest - 1) / 26;
    }
    v_letters.iter().rev().collect()
}

/// 1-based A1 range for a zero-based inclusive rectangle.
pub fn derive_a1_range(
    row_idx_start: usize,
    col_idx_start: usize,
    row_idx_end: usize,
    col_idx_end: usize,
) -> String {
    format!(
        "{}{}:{}{}",
        derive_column_letters(col_idx_start),
        row_idx_start + 1,
        derive_column_letters(col_idx_end),
        row_idx_end + 1
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergePlanning

/// Build one sheet merge.
pub fn create_sheet_merge(
    row_idx_start: usize,
    col_idx_start: usize,
    row_idx_end: usize,
    col_idx_end: usize,
    role: EnumCellRole,
) -> SpecSheetMerge {
    SpecSheetMerge {
        row_idx_start,
        col_idx_start,
        row_idx_end,
        col_idx_end,
        range_a1: derive_a1_range(row_idx_start, col_idx_start, row_idx_end, col_idx_end),
        role,
    }
}

/// Map header merge regions 1:1 onto the sheet, shifted down by `n_row_offset`.
pub fn plan_header_merges(
    regions: &[SpecMergeRegion],
    n_row_offset: usize,
) -> Vec<SpecSheetMerge> {
    regions
        .iter()
        .map(|region| {
            create_sheet_merge(
                n_row_offset + region.row_idx_start,
                region.col_idx_start,
                n_row_offset + region.row_idx_end,
                region.col_idx_end,
                EnumCellRole::Header,
            )
        })
        .collect()
}

/// Place aggregate cells on physical columns.
///
/// `None` entries take no column; every emitted cell starts where the previous
/// one ended, so a summary cell covers the spacer columns before it.
pub fn plan_aggregate_placement(
    aggregate_row: &TypeAggregateRow,
) -> Vec<(usize, &SpecAggregateCell)> {
    let mut n_col_cursor = 0usize;
    let mut l_placed = Vec::new();
    for cell in aggregate_row.iter().flatten() {
        l_placed.push((n_col_cursor, cell));
        n_col_cursor += usize::max(1, cell.col_span);
    }
    l_placed
}

/// Split merges into those that can be applied in order and those that
/// overlap an earlier applied merge.
pub fn select_non_overlapping_merges(
    merges: &[SpecSheetMerge],
) -> (Vec<SpecSheetMerge>, Vec<SpecSheetMerge>) {
    let mut l_applied: Vec<SpecSheetMerge> = Vec::with_capacity(merges.len());
    let mut l_skipped = Vec::new();
    for merge in merges {
        if l_applied.iter().any(|m| m.overlaps(merge)) {
            l_skipped.push(merge.clone());
        } else {
            l_applied.push(merge.clone());
        }
    }
    (l_applied, l_skipped)
}

/// Column widths from `wscols` hints, falling back to `width_default`.
pub fn derive_column_widths(
    n_width: usize,
    wscols: Option<&[SpecColumnWidth]>,
    width_default: f64,
) -> Vec<f64> {
    (0..n_width)
        .map(|n_idx_col| {
            wscols
                .and_then(|l_widths| l_widths.get(n_idx_col))
                .map_or(width_default, |w| w.width)
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookPlanning

/// Lay out title, header, body and aggregate row on one sheet.
pub fn plan_workbook(input: &SpecWorkbookInput<'_>) -> Result<SpecWorkbookPlan, ExportError> {
    let options = input.options;
    let n_width = input.header.width();

    let n_row_header_offset = usize::from(options.title.is_some());
    let n_row_body_offset = n_row_header_offset + N_HEADER_ROWS;
    let n_row_aggregate = input
        .aggregate_row
        .map(|_| n_row_body_offset + input.body.len());
    let n_rows_total = n_row_aggregate.map_or(n_row_body_offset + input.body.len(), |n| n + 1);

    if n_rows_total > N_NROWS_EXCEL_MAX {
        return Err(ExportError::Limit(format!(
            "{n_rows_total} rows exceed the sheet maximum of {N_NROWS_EXCEL_MAX}"
        )));
    }

    let mut l_cells = Vec::new();
    let mut l_merges = Vec::new();

    if let Some(c_title) = &options.title {
        l_cells.push(SpecSheetCell {
            row_idx: 0,
            col_idx: 0,
            value: EnumCellValue::String(c_title.clone()),
            role: EnumCellRole::Title,
        });
        if n_width > 1 {
            l_merges.push(create_sheet_merge(0, 0, 0, n_width - 1, EnumCellRole::Title));
        }
    }

    for (n_idx_row, row_labels) in input.header.rows().iter().enumerate() {
        for (n_idx_col, c_label) in row_labels.iter().enumerate() {
            l_cells.push(SpecSheetCell {
                row_idx: n_row_header_offset + n_idx_row,
                col_idx: n_idx_col,
                value: if c_label.is_empty() {
                    EnumCellValue::None
                } else {
                    EnumCellValue::String(c_label.clone())
                },
                role: EnumCellRole::Header,
            });
        }
    }
    l_merges.extend(plan_header_merges(input.merge_regions, n_row_header_offset));

    for (n_idx_row, body_row) in input.body.iter().enumerate() {
        let n_row = n_row_body_offset + n_idx_row;
        for cell in &body_row.cells {
            l_cells.push(SpecSheetCell {
                row_idx: n_row,
                col_idx: cell.col_idx,
                value: cell.value.clone(),
                role: EnumCellRole::Data,
            });
            if cell.row_span > 1 {
                l_merges.push(create_sheet_merge(
                    n_row,
                    cell.col_idx,
                    n_row + cell.row_span - 1,
                    cell.col_idx,
                    EnumCellRole::Data,
                ));
            }
        }
    }

    if let (Some(aggregate_row), Some(n_row)) = (input.aggregate_row, n_row_aggregate) {
        for (n_idx_col, cell) in plan_aggregate_placement(aggregate_row) {
            l_cells.push(SpecSheetCell {
                row_idx: n_row,
                col_idx: n_idx_col,
                value: EnumCellValue::String(cell.data.clone()),
                role: EnumCellRole::Aggregate,
            });
            if cell.col_span > 1 {
                l_merges.push(create_sheet_merge(
                    n_row,
                    n_idx_col,
                    n_row,
                    n_idx_col + cell.col_span - 1,
                    EnumCellRole::Aggregate,
                ));
            }
        }
    }

    let n_cols_used = l_cells
        .iter()
        .map(|c| c.col_idx + 1)
        .chain(l_merges.iter().map(|m| m.col_idx_end + 1))
        .fold(n_width, usize::max);
    if n_cols_used > N_NCOLS_EXCEL_MAX {
        return Err(ExportError::Limit(format!(
            "{n_cols_used} columns exceed the sheet maximum of {N_NCOLS_EXCEL_MAX}"
        )));
    }

    Ok(SpecWorkbookPlan {
        file_name: options.file_name.clone(),
        sheet_name: sanitize_sheet_name(&options.sheet_name, "_"),
        n_row_header_offset,
        n_row_body_offset,
        n_row_aggregate,
        cells: l_cells,
        merges: l_merges,
        col_widths: derive_column_widths(
            n_width,
            options.wscols.as_deref(),
            options.width_default,
        ),
        row_freeze: options.if_freeze_header.then_some(n_row_body_offset),
    })
}

/// Encode a workbook plan as pretty JSON.
pub fn derive_workbook_plan_json(plan: &SpecWorkbookPlan) -> Result<String, ExportError> {
    serde_json::to_string_pretty(plan).map_err(|err| ExportError::Encode(err.to_string()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reportkit_table::{
        EnumColumnSpecEntry, SpecAggregatePolicy, SpecBodyCell, SpecBodyRow, SpecHeaderMatrix,
        TypeRecord, build_aggregate_row, compute_merge_regions, derive_body_rows_flat,
        project_rows,
    };

    use super::*;
    use crate::spec::SpecXlsxExportOptions;

    fn header(rows: &[&[&str]]) -> SpecHeaderMatrix {
        SpecHeaderMatrix::from_labels(rows).expect("header")
    }

    #[test]
    fn test_column_letters_and_a1_ranges() {
        assert_eq!(derive_column_letters(0), "A");
        assert_eq!(derive_column_letters(25), "Z");
        assert_eq!(derive_column_letters(26), "AA");
        assert_eq!(derive_column_letters(701), "ZZ");
        assert_eq!(derive_column_letters(702), "AAA");
        assert_eq!(derive_a1_range(0, 0, 0, 1), "A1:B1");
        assert_eq!(derive_a1_range(1, 2, 2, 2), "C2:C3");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_aggregate_placement_follows_span_flow() {
        let aggregate_row = build_aggregate_row(
            &["", "", "통계", "a"]
                .iter()
                .map(|m| EnumColumnSpecEntry::from_marker(m))
                .collect::<Vec<_>>(),
            &[],
            &SpecAggregatePolicy::default(),
        );
        let l_placed = plan_aggregate_placement(&aggregate_row);
        assert_eq!(
            l_placed
                .iter()
                .map(|(n_col, cell)| (*n_col, cell.col_span))
                .collect::<Vec<_>>(),
            vec![(0, 3), (3, 1)]
        );
    }

    #[test]
    fn test_overlapping_merges_keep_first() {
        let first = create_sheet_merge(0, 0, 0, 1, EnumCellRole::Header);
        let second = create_sheet_merge(0, 1, 1, 1, EnumCellRole::Header);
        let third = create_sheet_merge(0, 2, 1, 2, EnumCellRole::Header);
        let (l_applied, l_skipped) =
            select_non_overlapping_merges(&[first.clone(), second.clone(), third.clone()]);
        assert_eq!(l_applied, vec![first, third]);
        assert_eq!(l_skipped, vec![second]);
    }

    #[test]
    fn test_column_widths_fall_back_to_default() {
        let l_widths = derive_column_widths(3, Some(&[SpecColumnWidth { width: 20.0 }]), 12.0);
        assert_eq!(l_widths, vec![20.0, 12.0, 12.0]);
        assert_eq!(derive_column_widths(2, None, 9.0), vec![9.0, 9.0]);
    }

    #[test]
    fn test_plan_workbook_merges_match_header_and_aggregate() {
        let h = header(&[&["No", "Score", "Score"], &["", "pre", "post"]]);
        let regions = compute_merge_regions(&h);
        let rows: Vec<TypeRecord> = vec![TypeRecord::from([
            ("pre".to_string(), EnumCellValue::Number(2.0)),
            ("post".to_string(), EnumCellValue::Number(3.0)),
        ])];
        let body = derive_body_rows_flat(project_rows(
            &rows,
            &["no".to_string(), "pre".to_string(), "post".to_string()],
        ));
        let aggregate_row = build_aggregate_row(
            &[
                EnumColumnSpecEntry::Summary,
                EnumColumnSpecEntry::Average("pre".to_string()),
                EnumColumnSpecEntry::Average("post".to_string()),
            ],
            &rows,
            &SpecAggregatePolicy::default(),
        );
        let options = SpecXlsxExportOptions {
            title: Some("Effect".to_string()),
            ..Default::default()
        };

        let plan = plan_workbook(&SpecWorkbookInput {
            header: &h,
            merge_regions: &regions,
            body: &body,
            aggregate_row: Some(&aggregate_row),
            options: &options,
        })
        .expect("plan");

        assert_eq!(plan.n_row_header_offset, 1);
        assert_eq!(plan.n_row_body_offset, 3);
        assert_eq!(plan.n_row_aggregate, Some(4));
        assert_eq!(plan.row_freeze, Some(3));

        let l_header_merges: Vec<_> = plan
            .merges
            .iter()
            .filter(|m| m.role == EnumCellRole::Header)
            .cloned()
            .collect();
        assert_eq!(l_header_merges, plan_header_merges(&regions, 1));
        assert_eq!(
            l_header_merges
                .iter()
                .map(|m| m.range_a1.as_str())
                .collect::<Vec<_>>(),
            vec!["B2:C2", "A2:A3"]
        );
        assert_eq!(
            plan.merges[0],
            create_sheet_merge(0, 0, 0, 2, EnumCellRole::Title)
        );
        assert!(plan.merges.iter().all(|m| m.role != EnumCellRole::Aggregate));

        let l_aggregate_values: Vec<_> = plan
            .cells
            .iter()
            .filter(|c| c.role == EnumCellRole::Aggregate)
            .map(|c| (c.col_idx, c.value.clone()))
            .collect();
        assert_eq!(
            l_aggregate_values,
            vec![
                (0, EnumCellValue::from("통계")),
                (1, EnumCellValue::from("2.00")),
                (2, EnumCellValue::from("3.00")),
            ]
        );
    }

    #[test]
    fn test_plan_workbook_converts_spans_into_merges() {
        let h = header(&[&["Name", "Pre", "Post"], &["", "x", "y"]]);
        let regions = compute_merge_regions(&h);
        let aggregate_row = vec![
            None,
            Some(SpecAggregateCell {
                col_span: 2,
                data: "통계".to_string(),
            }),
            Some(SpecAggregateCell {
                col_span: 1,
                data: "1.00".to_string(),
            }),
        ];
        let body = vec![
            SpecBodyRow {
                cells: vec![SpecBodyCell {
                    col_idx: 0,
                    row_span: 2,
                    value: "Kim".into(),
                }],
            },
            SpecBodyRow::default(),
        ];
        let options = SpecXlsxExportOptions::default();
        let plan = plan_workbook(&SpecWorkbookInput {
            header: &h,
            merge_regions: &regions,
            body: &body,
            aggregate_row: Some(&aggregate_row),
            options: &options,
        })
        .expect("plan");

        let l_ranges: Vec<_> = plan
            .merges
            .iter()
            .map(|m| (m.role, m.range_a1.as_str()))
            .collect();
        assert_eq!(
            l_ranges,
            vec![
                (EnumCellRole::Header, "A1:A2"),
                (EnumCellRole::Data, "A3:A4"),
                (EnumCellRole::Aggregate, "A5:B5"),
            ]
        );

        let c_json = derive_workbook_plan_json(&plan).expect("json");
        let plan_back: SpecWorkbookPlan = serde_json::from_str(&c_json).expect("parse");
        assert_eq!(plan_back.merges, plan.merges);
        assert!(c_json.contains("\"range_a1\": \"A5:B5\""));
    }

    #[test]
    fn test_plan_workbook_rejects_too_many_rows() {
        let h = header(&[&["A"], &["x"]]);
        let body = vec![SpecBodyRow::default(); N_NROWS_EXCEL_MAX];
        let options = SpecXlsxExportOptions::default();
        let result = plan_workbook(&SpecWorkbookInput {
            header: &h,
            merge_regions: &[],
            body: &body,
            aggregate_row: None,
            options: &options,
        });
        assert!(matches!(result, Err(ExportError::Limit(_))));
    }
}
