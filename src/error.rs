//! Application-wide error types.
//!
//! This module defines the main error type hierarchy for the application,
//! allowing for type-safe error handling throughout the codebase.

pub use crate::config::ConfigError;
pub use crate::expression::ExpressionError;
pub use crate::fields::FieldsError;
pub use crate::grid::GridError;
pub use crate::salesforce::SalesforceError;
pub use crate::state::StateError;

/// Main application error type.
///
/// This is the top-level error type that encompasses all error types
/// in the application. It uses `thiserror` for automatic error derivation
/// and conversion.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Salesforce API-related errors
    #[error("Salesforce API error: {0}")]
    Salesforce(#[from] SalesforceError),

    /// State management errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Field row errors
    #[error("Field error: {0}")]
    Fields(#[from] FieldsError),

    /// Filter expression errors
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Data grid errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger initialization errors
    #[error("Logger error: {0}")]
    Logger(String),
}

/// Convenience type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
