//! State management-specific error types.

/// Errors that can occur during state operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// No row is selected
    #[error("No field row selected")]
    RowNotSelected,

    /// Rows failed validation
    #[error("{0} field row(s) have validation errors")]
    InvalidRows(usize),

    /// Deployment needs at least one object
    #[error("No target objects configured")]
    NoTargetObjects,

    /// Remote features need a configured connection
    #[error("Not connected to a CRM instance")]
    NotConnected,

    /// Attribute cannot be edited for the selected row
    #[error("{0} is not editable for this field")]
    AttributeDisabled(String),

    /// No query result is loaded
    #[error("No query results loaded")]
    NoGrid,

    /// The grid has no pending edits
    #[error("No edited records to save")]
    NoGridChanges,

    /// The query does not name a single object to save to
    #[error("Cannot tell which object the query reads from")]
    UnknownQueryObject,

    /// Generic state error
    #[error("State error: {0}")]
    Other(String),
}
