//! Top-level error types.

use thiserror::Error;

/// Failures raised while building report tables.
///
/// Data-shape problems inside rows never surface here; they degrade to
/// defaults and land in [`crate::spec::SpecTableReport`] instead.
#[derive(Debug, Error)]
pub enum TableError {
    /// Header grid with the wrong number of rows or ragged rows.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    /// Report definition that cannot be parsed or is inconsistent.
    #[error("Invalid report definition: {0}")]
    InvalidDefinition(String),
    /// DataFrame/IPC ingestion failure.
    #[error("Failed to read rows: {0}")]
    Frame(String),
}
