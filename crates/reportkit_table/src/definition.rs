//! Static report definitions loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::conf::N_CELLS_ROW_SPAN_DOUBLE;
use crate::error::TableError;
use crate::spec::{EnumColumnSpecEntry, SpecHeaderMatrix};

/// Width hint for one spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecColumnWidth {
    pub width: f64,
}

/// One report view's table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecReportDefinition {
    /// Optional title row written above the header in exports.
    #[serde(default)]
    pub title: Option<String>,
    /// Suggested download file name.
    pub file_name: String,
    /// Worksheet name.
    pub sheet_name: String,
    /// Two-row header grid.
    pub header: SpecHeaderMatrix,
    /// Aggregate directives; empty disables the aggregate row.
    #[serde(default)]
    pub column_spec: Vec<EnumColumnSpecEntry>,
    /// Field keys of the (even) body rows.
    pub column_keys: Vec<String>,
    /// Field keys of the odd continuation rows; enables the double layout.
    #[serde(default)]
    pub column_keys_secondary: Option<Vec<String>>,
    /// Column width hints.
    #[serde(default)]
    pub wscols: Option<Vec<SpecColumnWidth>>,
}

impl SpecReportDefinition {
    /// Check that keys, column spec and widths line up with the header.
    pub fn validate(&self) -> Result<(), TableError> {
        let n_width = self.header.width();
        if self.column_keys.len() != n_width {
            return Err(TableError::InvalidDefinition(format!(
                "columnKeys has {} entries, header has {n_width} columns",
                self.column_keys.len()
            )));
        }
        if !self.column_spec.is_empty() && self.column_spec.len() != n_width {
            return Err(TableError::InvalidDefinition(format!(
                "columnSpec has {} entries, header has {n_width} columns",
                self.column_spec.len()
            )));
        }
        if let Some(l_keys) = &self.column_keys_secondary {
            let n_cols_spanned = usize::min(N_CELLS_ROW_SPAN_DOUBLE, n_width);
            if n_cols_spanned + l_keys.len() > n_width {
                return Err(TableError::InvalidDefinition(format!(
                    "columnKeysSecondary has {} entries, only {} columns follow the spanned cells",
                    l_keys.len(),
                    n_width - n_cols_spanned
                )));
            }
        }
        if let Some(l_widths) = &self.wscols
            && l_widths.iter().any(|w| !w.width.is_finite() || w.width < 0.0)
        {
            return Err(TableError::InvalidDefinition(
                "wscols widths must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate a JSON report definition.
pub fn derive_report_definition_from_json(
    c_json: &str,
) -> Result<SpecReportDefinition, TableError> {
    let definition: SpecReportDefinition = serde_json::from_str(c_json)
        .map_err(|err| TableError::InvalidDefinition(err.to_string()))?;
    definition.validate()?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const C_SATISFACTION: &str = r#"{
        "title": "Program satisfaction",
        "fileName": "satisfaction.xlsx",
        "sheetName": "Satisfaction",
        "header": [["No", "Program", "Score", "Score"], ["", "", "pre", "post"]],
        "columnSpec": ["", "통계", "pre", "post"],
        "columnKeys": ["no", "program", "pre", "post"],
        "wscols": [{"width": 6}, {"width": 24}, {"width": 10}, {"width": 10}]
    }"#;

    #[test]
    fn test_parse_definition() {
        let definition = derive_report_definition_from_json(C_SATISFACTION).expect("definition");
        assert_eq!(definition.header.width(), 4);
        assert_eq!(
            definition.column_spec,
            vec![
                EnumColumnSpecEntry::Blank,
                EnumColumnSpecEntry::Summary,
                EnumColumnSpecEntry::Average("pre".to_string()),
                EnumColumnSpecEntry::Average("post".to_string()),
            ]
        );
        assert_eq!(definition.column_keys_secondary, None);
        assert_eq!(definition.wscols.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_definition_json_round_trip() {
        let definition = derive_report_definition_from_json(C_SATISFACTION).expect("definition");
        let c_json = serde_json::to_string(&definition).expect("serialize");
        assert!(c_json.contains(r#""header":[["No","Program","Score","Score"],["","","pre","post"]]"#));

        let definition_back = derive_report_definition_from_json(&c_json).expect("reparse");
        assert_eq!(definition_back, definition);
    }

    #[test]
    fn test_rejects_mismatched_keys() {
        let c_json = C_SATISFACTION.replace(r#""program", "pre", "post""#, r#""program""#);
        let err = derive_report_definition_from_json(&c_json).unwrap_err();
        assert!(err.to_string().contains("columnKeys has 2 entries"));
    }

    #[test]
    fn test_rejects_malformed_header() {
        let c_json = C_SATISFACTION.replace(r#", ["", "", "pre", "post"]"#, "");
        let err = derive_report_definition_from_json(&c_json).unwrap_err();
        assert!(matches!(err, TableError::InvalidDefinition(_)));
        assert!(err.to_string().contains("expected 2 header rows"));
    }

    #[test]
    fn test_rejects_oversized_secondary_keys() {
        let c_json = C_SATISFACTION.replace(
            r#""columnKeys""#,
            r#""columnKeysSecondary": ["a", "b"], "columnKeys""#,
        );
        let err = derive_report_definition_from_json(&c_json).unwrap_err();
        assert!(err.to_string().contains("columnKeysSecondary"));
    }
}
