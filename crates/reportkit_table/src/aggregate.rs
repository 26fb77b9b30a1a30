//! Trailing aggregate ("average") row.

use crate::spec::{
    EnumCellValue, EnumColumnSpecEntry, EnumTableWarning, SpecAggregateCell, SpecAggregatePolicy,
    SpecTableReport, TypeAggregateRow, TypeRecord,
};

////////////////////////////////////////////////////////////////////////////////
// #region AggregateRow

/// Build the aggregate row, discarding warnings.
pub fn build_aggregate_row(
    column_spec: &[EnumColumnSpecEntry],
    rows: &[TypeRecord],
    policy: &SpecAggregatePolicy,
) -> TypeAggregateRow {
    let mut report = SpecTableReport::default();
    build_aggregate_row_with_report(column_spec, rows, policy, &mut report)
}

/// Build the aggregate row.
///
/// Spacers emit `None` and widen the next summary cell by one column each.
/// Literals neither average nor reset the spacer count.
pub fn build_aggregate_row_with_report(
    column_spec: &[EnumColumnSpecEntry],
    rows: &[TypeRecord],
    policy: &SpecAggregatePolicy,
    report: &mut SpecTableReport,
) -> TypeAggregateRow {
    let mut l_cells = Vec::with_capacity(column_spec.len());
    let mut n_spacers = 0usize;
    let mut n_cols_average = 0usize;

    for entry in column_spec {
        match entry {
            EnumColumnSpecEntry::Blank => {
                n_spacers += 1;
                l_cells.push(None);
            }
            EnumColumnSpecEntry::Literal(text) => {
                l_cells.push(Some(SpecAggregateCell {
                    col_span: 1,
                    data: text.clone(),
                }));
            }
            EnumColumnSpecEntry::Summary => {
                l_cells.push(Some(SpecAggregateCell {
                    col_span: n_spacers + 1,
                    data: policy.summary_label.clone(),
                }));
                n_spacers = 0;
            }
            EnumColumnSpecEntry::Average(key) => {
                n_cols_average += 1;
                let data = if rows.is_empty() {
                    policy.empty_text.clone()
                } else {
                    format_fixed(calculate_mean(key, rows), policy.n_digits)
                };
                l_cells.push(Some(SpecAggregateCell { col_span: 1, data }));
            }
        }
    }

    if rows.is_empty() && n_cols_average > 0 {
        report.warn(EnumTableWarning::EmptyRowSet { n_cols_average });
    }

    l_cells
}

/// Arithmetic mean of `key` across `rows`; `NaN` for an empty row set.
pub fn calculate_mean(key: &str, rows: &[TypeRecord]) -> f64 {
    let n_sum: f64 = rows.iter().map(|row| coerce_to_f64(row.get(key))).sum();
    n_sum / rows.len() as f64
}

/// Numeric reading of a record value; anything non-numeric counts as zero.
pub fn coerce_to_f64(value: Option<&EnumCellValue>) -> f64 {
    let n_value = match value {
        None | Some(EnumCellValue::None) => 0.0,
        Some(EnumCellValue::Number(n)) => *n,
        Some(EnumCellValue::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
    };
    if n_value.is_finite() { n_value } else { 0.0 }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FixedFormatting

/// Format with `n_digits` decimals, rounding ties of the exact binary value
/// away from zero (`Number.prototype.toFixed` semantics).
pub fn format_fixed(x: f64, n_digits: usize) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // Exact decimal expansion of every double that can round to a non-zero digit.
    let n_precision = 64 + 4 * n_digits;
    let c_exact = format!("{:.*}", n_precision, x.abs());
    let (c_int, c_frac) = c_exact
        .split_once('.')
        .unwrap_or((c_exact.as_str(), ""));

    let mut v_digits: Vec<u8> = c_int
        .bytes()
        .chain(c_frac.bytes().take(n_digits))
        .map(|b| b - b'0')
        .collect();
    let mut n_len_int = c_int.len();

    if c_frac.as_bytes().get(n_digits).is_some_and(|b| *b >= b'5') {
        let mut n_idx = v_digits.len();
        loop {
            if n_idx == 0 {
                v_digits.insert(0, 1);
                n_len_int += 1;
                break;
            }
            n_idx -= 1;
            if v_digits[n_idx] == 9 {
                v_digits[n_idx] = 0;
            } else {
                v_digits[n_idx] += 1;
                break;
            }
        }
    }

    let mut c_out = String::with_capacity(v_digits.len() + 2);
    if x < 0.0 {
        c_out.push('-');
    }
    for (n_idx, n_digit) in v_digits.iter().enumerate() {
        if n_idx == n_len_int {
            c_out.push('.');
        }
        c_out.push(char::from(b'0' + n_digit));
    }
    c_out
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
