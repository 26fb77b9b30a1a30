//! Body projection for flat and double-row layouts.

use crate::conf::N_CELLS_ROW_SPAN_DOUBLE;
use crate::spec::{
    EnumCellValue, EnumTableWarning, SpecBodyCell, SpecBodyRow, SpecTableReport, TypeRecord,
};

/// Project `rows` through `column_keys`; missing keys read as `""`.
pub fn project_rows(rows: &[TypeRecord], column_keys: &[String]) -> Vec<Vec<EnumCellValue>> {
    rows.iter()
        .map(|row| project_record(row, column_keys))
        .collect()
}

/// Place a flat cell matrix at physical columns with no row spans.
pub fn derive_body_rows_flat(cell_matrix: Vec<Vec<EnumCellValue>>) -> Vec<SpecBodyRow> {
    cell_matrix
        .into_iter()
        .map(|l_values| SpecBodyRow {
            cells: l_values
                .into_iter()
                .enumerate()
                .map(|(col_idx, value)| SpecBodyCell {
                    col_idx,
                    row_span: 1,
                    value,
                })
                .collect(),
        })
        .collect()
}

/// Project pre-paired rows into the double-row layout.
///
/// Even rows go through `column_keys` and their leading cells span the
/// following odd row; odd rows go through `column_keys_secondary` and start
/// right after the spanned cells. A trailing unpaired even row renders
/// without spans and is reported.
pub fn project_double_rows(
    rows: &[TypeRecord],
    column_keys: &[String],
    column_keys_secondary: &[String],
    report: &mut SpecTableReport,
) -> Vec<SpecBodyRow> {
    let n_cols_spanned = usize::min(N_CELLS_ROW_SPAN_DOUBLE, column_keys.len());
    let mut l_body_rows = Vec::with_capacity(rows.len());

    for (n_idx_row, row) in rows.iter().enumerate() {
        if n_idx_row % 2 == 1 {
            l_body_rows.push(SpecBodyRow {
                cells: project_record(row, column_keys_secondary)
                    .into_iter()
                    .enumerate()
                    .map(|(n_idx_col, value)| SpecBodyCell {
                        col_idx: n_cols_spanned + n_idx_col,
                        row_span: 1,
                        value,
                    })
                    .collect(),
            });
            continue;
        }

        let if_paired = n_idx_row + 1 < rows.len();
        if !if_paired {
            report.warn(EnumTableWarning::UnpairedRow { row_idx: n_idx_row });
        }
        l_body_rows.push(SpecBodyRow {
            cells: project_record(row, column_keys)
                .into_iter()
                .enumerate()
                .map(|(col_idx, value)| SpecBodyCell {
                    col_idx,
                    row_span: if if_paired && col_idx < n_cols_spanned {
                        2
                    } else {
                        1
                    },
                    value,
                })
                .collect(),
        });
    }

    l_body_rows
}

fn project_record(row: &TypeRecord, column_keys: &[String]) -> Vec<EnumCellValue> {
    column_keys
        .iter()
        .map(|key| {
            row.get(key)
                .cloned()
                .unwrap_or_else(|| EnumCellValue::String(String::new()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn record(pairs: &[(&str, EnumCellValue)]) -> TypeRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_project_rows_reads_keys_in_order() {
        let rows = vec![
            record(&[("name", "Kim".into()), ("score", 4.0.into())]),
            record(&[("score", 5.0.into())]),
        ];
        let matrix = project_rows(&rows, &keys(&["score", "name"]));
        assert_eq!(
            matrix,
            vec![
                vec![EnumCellValue::Number(4.0), "Kim".into()],
                vec![EnumCellValue::Number(5.0), "".into()],
            ]
        );
    }

    #[test]
    fn test_flat_body_rows_have_unit_spans() {
        let body = derive_body_rows_flat(vec![vec!["a".into(), "b".into()]]);
        assert_eq!(body[0].cells[1].col_idx, 1);
        assert!(body[0].cells.iter().all(|c| c.row_span == 1));
    }

    #[test]
    fn test_double_rows_interleave_and_span_leading_cells() {
        let rows = vec![
            record(&[
                ("no", 1.0.into()),
                ("name", "Kim".into()),
                ("date", "2024-03-01".into()),
                ("pre", 3.0.into()),
            ]),
            record(&[("post", 4.0.into())]),
        ];
        let mut report = SpecTableReport::default();
        let body = project_double_rows(
            &rows,
            &keys(&["no", "name", "date", "pre"]),
            &keys(&["post"]),
            &mut report,
        );

        assert_eq!(body.len(), 2);
        assert_eq!(
            body[0].cells.iter().map(|c| c.row_span).collect::<Vec<_>>(),
            vec![2, 2, 2, 1]
        );
        assert_eq!(
            body[1].cells,
            vec![SpecBodyCell {
                col_idx: 3,
                row_span: 1,
                value: EnumCellValue::Number(4.0),
            }]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_double_rows_trailing_unpaired_row_is_reported() {
        let rows = vec![
            record(&[("no", 1.0.into())]),
            record(&[("post", 2.0.into())]),
            record(&[("no", 2.0.into())]),
        ];
        let mut report = SpecTableReport::default();
        let body = project_double_rows(
            &rows,
            &keys(&["no", "name"]),
            &keys(&["post"]),
            &mut report,
        );

        assert_eq!(body[1].cells[0].col_idx, 2);
        assert!(body[2].cells.iter().all(|c| c.row_span == 1));
        assert_eq!(
            report.warnings,
            vec![EnumTableWarning::UnpairedRow { row_idx: 2 }]
        );
    }
}
