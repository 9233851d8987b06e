//! Data grid error types.

/// Errors that can occur while sorting, filtering or editing the grid.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    /// The grid has no column with this name
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// The column cannot be edited
    #[error("Column is read-only: {0}")]
    ReadOnlyColumn(String),

    /// The record index is out of range
    #[error("No record at index {0}")]
    RecordNotFound(usize),
}
