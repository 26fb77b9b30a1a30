//! Record ingestion from Polars DataFrames and Arrow IPC payloads.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::error::TableError;
use crate::spec::{EnumCellValue, TypeRecord};

/// Decode IPC bytes and convert every row into a record.
pub fn derive_records_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Vec<TypeRecord>, TableError> {
    let df = IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| TableError::Frame(format!("invalid IPC payload: {err}")))?;
    derive_records_from_dataframe(&df)
}

/// Convert every DataFrame row into a column-name keyed record.
pub fn derive_records_from_dataframe(df: &DataFrame) -> Result<Vec<TypeRecord>, TableError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_records = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut record = TypeRecord::new();
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            let value = col.get(n_idx_row).map_err(|err| {
                TableError::Frame(format!("cell ({n_idx_row}, {c_name:?}): {err}"))
            })?;
            record.insert(c_name.clone(), derive_cell_value_from_any_value(value));
        }
        l_records.push(record);
    }

    log::debug!(
        "ingested {} record(s) x {} column(s)",
        l_records.len(),
        l_colnames.len()
    );
    Ok(l_records)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Number(if val { 1.0 } else { 0.0 }),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IpcWriter, SerWriter};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_dataframe() -> DataFrame {
        DataFrame::new(vec![
            Column::new("name".into(), &["Kim", "Lee"]),
            Column::new("score".into(), &[Some(4i64), None]),
            Column::new("ratio".into(), &[0.5f64, 1.25]),
        ])
        .expect("dataframe")
    }

    #[test]
    fn test_records_from_dataframe() {
        let l_records = derive_records_from_dataframe(&sample_dataframe()).expect("records");
        assert_eq!(l_records.len(), 2);
        assert_eq!(l_records[0]["name"], EnumCellValue::String("Kim".to_string()));
        assert_eq!(l_records[0]["score"], EnumCellValue::Number(4.0));
        assert_eq!(l_records[1]["score"], EnumCellValue::None);
        assert_eq!(l_records[1]["ratio"], EnumCellValue::Number(1.25));
    }

    #[test]
    fn test_records_from_ipc_bytes() {
        let mut df = sample_dataframe();
        let mut v_buf = Vec::new();
        IpcWriter::new(&mut v_buf)
            .finish(&mut df)
            .expect("write ipc");

        let l_records = derive_records_from_ipc_bytes(&v_buf).expect("records");
        assert_eq!(l_records[1]["name"], EnumCellValue::String("Lee".to_string()));
    }

    #[test]
    fn test_invalid_ipc_bytes_fail() {
        let err = derive_records_from_ipc_bytes(b"not ipc").unwrap_err();
        assert!(matches!(err, TableError::Frame(_)));
    }
}
