//! Export error types.

use thiserror::Error;

/// Failures of the spreadsheet export path.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Style entry that cannot be turned into a cell format.
    #[error("Invalid style: {0}")]
    InvalidStyle(String),
    /// Workbook larger than Excel allows.
    #[error("Excel limit exceeded: {0}")]
    Limit(String),
    /// Row/column index that does not fit the xlsx index types.
    #[error("Index overflow: {0}")]
    Index(String),
    /// Error raised by the xlsx library.
    #[error("xlsx write error: {0}")]
    Xlsx(String),
    /// Workbook plan could not be encoded as JSON.
    #[error("Plan encoding failed: {0}")]
    Encode(String),
    /// Download sink could not take the buffer.
    #[error("Download failed: {0}")]
    Sink(String),
    /// Another export of this exporter is still running.
    #[error("Export already in progress")]
    InFlight,
}
