//! Configuration-specific error types.

use std::path::PathBuf;

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File path was not set
    #[error("Configuration file path not set")]
    FilePathNotSet,

    /// Access token was not set
    #[error("Access token not set")]
    AccessTokenNotSet,

    /// Instance URL was not set
    #[error("Instance URL not set")]
    InstanceUrlNotSet,

    /// Failed to find home directory
    #[error("Failed to find home directory")]
    HomeDirectoryNotFound,

    /// Failed to load configuration file
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration file
    #[error("Failed to save configuration to {path}: {source}")]
    SaveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create configuration directory
    #[error("Failed to create configuration directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializationFailed(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_connection_messages() {
        assert_eq!(
            ConfigError::InstanceUrlNotSet.to_string(),
            "Instance URL not set"
        );
        assert_eq!(
            ConfigError::AccessTokenNotSet.to_string(),
            "Access token not set"
        );
    }

    #[test]
    fn test_load_failure_names_file() {
        let error = ConfigError::LoadFailed {
            path: PathBuf::from("/home/admin/.config/sfadmin-tui/config.yml"),
            message: "permission denied".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("sfadmin-tui/config.yml"));
        assert!(message.ends_with("permission denied"));
    }

    #[test]
    fn test_save_failure_keeps_source() {
        let error = ConfigError::SaveFailed {
            path: PathBuf::from("/readonly/config.yml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("/readonly/config.yml"));
    }
}
