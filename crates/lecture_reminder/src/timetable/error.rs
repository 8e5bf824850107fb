//! Batch-level failures of a timetable upload.

use thiserror::Error;

/// Reasons an uploaded timetable is rejected as a whole.
///
/// Problems with individual rows never produce one of these; such rows are
/// skipped with a warning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Fewer than two non-empty lines
    #[error("File must contain at least a header row and one data row")]
    TooShort,

    /// No header matched any synonym of a required column
    #[error("Required column not found: {column}. Available columns: {}", available.join(", "))]
    MissingColumn {
        column: &'static str,
        available: Vec<String>,
    },

    /// Every data row was skipped
    #[error("No valid timetable entries found in the file")]
    NoValidRows,
}
