//! Configuration management module.
//!
//! This module handles loading, saving, and managing application configuration,
//! including the CRM connection, target objects, and theme preferences.

mod error;

pub use error::ConfigError;

use crate::error::AppError;
use log::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

const FILE_NAME: &str = "config.yml";
const DEFAULT_DIRECTORY_PATH: &str = ".config/sfadmin-tui";

/// Oversees management of configuration file.
///
#[derive(Clone, Debug)]
pub struct Config {
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: String,
    pub target_objects: Vec<String>, // API names, e.g. Account
    pub theme_name: String,
    file_path: Option<PathBuf>,
}

/// Define specification for configuration file.
///
#[derive(Serialize, Deserialize)]
struct FileSpec {
    pub instance_url: String,
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub target_objects: Vec<String>,
    #[serde(default = "default_theme_name")]
    pub theme_name: String,
}

fn default_api_version() -> String {
    "59.0".to_string()
}

fn default_theme_name() -> String {
    "tokyo-night".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Return a new empty instance.
    ///
    pub fn new() -> Config {
        Config {
            file_path: None,
            instance_url: None,
            access_token: None,
            api_version: default_api_version(),
            target_objects: vec![],
            theme_name: default_theme_name(),
        }
    }

    /// Try to load an existing configuration from the disk using the custom
    /// directory if provided. A missing file leaves the connection unset.
    ///
    pub fn load(&mut self, custom_path: Option<&str>) -> Result<(), AppError> {
        let dir_path = match custom_path {
            Some(path) => Path::new(&path).to_path_buf(),
            None => Config::default_path()?,
        };

        if !dir_path.exists() {
            fs::create_dir_all(&dir_path).map_err(|e| ConfigError::CreateDirectoryFailed {
                path: dir_path.clone(),
                source: e,
            })?;
        }

        self.file_path = Some(dir_path.join(Path::new(FILE_NAME)));
        let file_path = self.file_path.as_ref().ok_or(ConfigError::FilePathNotSet)?;

        if file_path.exists() {
            let contents = fs::read_to_string(file_path).map_err(|e| ConfigError::LoadFailed {
                path: file_path.clone(),
                message: format!("IO error: {}", e),
            })?;
            let data: FileSpec = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::DeserializationFailed(e.to_string()))?;
            self.instance_url = Some(data.instance_url);
            self.access_token = Some(data.access_token);
            self.api_version = data.api_version;
            self.target_objects = data.target_objects;
            self.theme_name = data.theme_name;
            debug!("Loaded configuration from {}", file_path.display());
        } else {
            warn!(
                "No configuration at {}; remote features are unavailable",
                file_path.display()
            );
        }

        Ok(())
    }

    /// Return the instance URL and access token, or the first one missing.
    ///
    pub fn connection(&self) -> Result<(&str, &str), ConfigError> {
        let instance_url = self
            .instance_url
            .as_deref()
            .ok_or(ConfigError::InstanceUrlNotSet)?;
        let access_token = self
            .access_token
            .as_deref()
            .ok_or(ConfigError::AccessTokenNotSet)?;
        Ok((instance_url, access_token))
    }

    /// Save the current configuration to disk.
    ///
    pub fn save(&self) -> Result<(), AppError> {
        let file_path = self.file_path.as_ref().ok_or(ConfigError::FilePathNotSet)?;
        let (instance_url, access_token) = self.connection()?;
        let data = FileSpec {
            instance_url: instance_url.to_string(),
            access_token: access_token.to_string(),
            api_version: self.api_version.clone(),
            target_objects: self.target_objects.clone(),
            theme_name: self.theme_name.clone(),
        };
        let content = serde_yaml::to_string(&data)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::CreateDirectoryFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut file = fs::File::create(file_path).map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        write!(file, "{}", content).map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        file.flush().map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// Returns the path buffer for the default path to the configuration file
    /// or an error if the home directory could not be found.
    ///
    fn default_path() -> Result<PathBuf, AppError> {
        match dirs::home_dir() {
            Some(home) => {
                let home_path = Path::new(&home);
                let default_config_path = Path::new(DEFAULT_DIRECTORY_PATH);
                Ok(home_path.join(default_config_path))
            }
            None => Err(ConfigError::HomeDirectoryNotFound.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::uuid::UUIDv4;
    use fake::Fake;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let id: Uuid = UUIDv4.fake();
        std::env::temp_dir().join(format!("sfadmin-tui-test-{}", id))
    }

    #[test]
    fn test_load_missing_file_leaves_connection_unset() {
        let dir = scratch_dir();
        let mut config = Config::new();
        config.load(dir.to_str()).unwrap();
        assert!(config.instance_url.is_none());
        assert!(matches!(
            config.connection(),
            Err(ConfigError::InstanceUrlNotSet)
        ));
        assert_eq!(config.api_version, "59.0");
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_applies_defaults() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(FILE_NAME),
            "instance_url: https://acme.my.salesforce.com\naccess_token: 00Dxx!token\n",
        )
        .unwrap();

        let mut config = Config::new();
        config.load(dir.to_str()).unwrap();
        assert_eq!(
            config.connection().unwrap(),
            ("https://acme.my.salesforce.com", "00Dxx!token")
        );
        assert_eq!(config.api_version, "59.0");
        assert!(config.target_objects.is_empty());
        assert_eq!(config.theme_name, "tokyo-night");
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir();
        let mut config = Config::new();
        config.load(dir.to_str()).unwrap();
        config.instance_url = Some("https://acme.my.salesforce.com".to_string());
        config.access_token = Some("token".to_string());
        config.api_version = "60.0".to_string();
        config.target_objects = vec!["Account".to_string(), "Contact".to_string()];
        config.save().unwrap();

        let mut reloaded = Config::new();
        reloaded.load(dir.to_str()).unwrap();
        assert_eq!(reloaded.api_version, "60.0");
        assert_eq!(reloaded.target_objects, config.target_objects);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_save_without_token_fails() {
        let dir = scratch_dir();
        let mut config = Config::new();
        config.load(dir.to_str()).unwrap();
        config.instance_url = Some("https://acme.my.salesforce.com".to_string());
        assert!(config.save().is_err());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(FILE_NAME), "target_objects: [unterminated\n").unwrap();
        let mut config = Config::new();
        let err = config.load(dir.to_str()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::DeserializationFailed(_))
        ));
        fs::remove_dir_all(dir).unwrap();
    }
}
