//! Field authoring error types.

/// Errors that can occur while authoring, importing or exporting field rows.
#[derive(Debug, thiserror::Error)]
pub enum FieldsError {
    /// An action was dispatched by a name the reducer does not know
    #[error("Unknown field row action: {0}")]
    UnknownAction(String),

    /// An attribute name is not part of the catalog
    #[error("Unknown field attribute: {0}")]
    UnknownAttribute(String),

    /// A field type name is not supported
    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),

    /// An action payload did not match the action
    #[error("Invalid payload for action '{action}': {message}")]
    InvalidPayload { action: String, message: String },

    /// Reading or writing tabular data failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tabular data had no header row
    #[error("Tabular data has no header row")]
    MissingHeader,

    /// The tabular data had a header but no field rows
    #[error("Tabular data has no field rows")]
    NoRows,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_error_display() {
        let error = FieldsError::UnknownAction("EXPLODE".to_string());
        assert!(error.to_string().contains("Unknown field row action"));
        assert!(error.to_string().contains("EXPLODE"));

        let error = FieldsError::UnknownAttribute("colour".to_string());
        assert!(error.to_string().contains("colour"));

        let error = FieldsError::InvalidPayload {
            action: "CHANGE".to_string(),
            message: "missing key".to_string(),
        };
        let error_str = error.to_string();
        assert!(error_str.contains("CHANGE"));
        assert!(error_str.contains("missing key"));

        let error = FieldsError::MissingHeader;
        assert!(error.to_string().contains("header"));

        let error = FieldsError::NoRows;
        assert!(error.to_string().contains("no field rows"));
    }
}
