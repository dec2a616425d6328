//! config
//!
//! Service configuration.
//!
//! # Design
//!
//! Configuration is a TOML file with serde defaults, overridable per
//! field through `MENDER_*` environment variables. Every field has a
//! workable default so `mender serve` starts without any file at all.
//!
//! # Example
//!
//! ```toml
//! listen_addr = "0.0.0.0:8080"
//! data_dir = "/var/lib/mender/data"
//! knowledge_api_base = "https://kb.internal.example.com"
//! knowledge_base_id = "kb-sec-standards"
//! generation_api_base = "https://models.internal.example.com"
//! model_id = "anthropic.claude-3-5-sonnet-20241022-v2:0"
//! push_remote = false
//! upload_reports = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but cannot be read.
    #[error("cannot read config file {path}: {message}")]
    ReadError {
        /// The config file path
        path: PathBuf,
        /// OS-level diagnostic
        message: String,
    },

    /// The config file is not valid TOML of the expected shape.
    #[error("cannot parse config file {path}: {message}")]
    ParseError {
        /// The config file path
        path: PathBuf,
        /// TOML diagnostic
        message: String,
    },
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Address the HTTP API binds to.
    pub listen_addr: String,
    /// Root directory of the filesystem blob store.
    pub data_dir: PathBuf,
    /// Base URL of the knowledge retrieval service.
    pub knowledge_api_base: String,
    /// Knowledge base queried for remediation context.
    pub knowledge_base_id: String,
    /// Base URL of the text generation service.
    pub generation_api_base: String,
    /// Model identifier passed to the generation service.
    pub model_id: String,
    /// Push patch branches to `origin` after committing.
    pub push_remote: bool,
    /// HTTPS access token used for pushes.
    pub git_token: Option<String>,
    /// Upload patch reports to the blob store.
    pub upload_reports: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./data"),
            knowledge_api_base: "http://localhost:9000".to_string(),
            knowledge_base_id: "kb-sec-standards".to_string(),
            generation_api_base: "http://localhost:9001".to_string(),
            model_id: "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
            push_remote: false,
            git_token: None,
            upload_reports: true,
        }
    }
}

impl Config {
    /// Load configuration: file (when given) first, then environment
    /// overrides on top.
    ///
    /// # Errors
    ///
    /// File read/parse errors only; a missing environment variable is
    /// never an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MENDER_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Ok(v) = std::env::var("MENDER_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MENDER_KNOWLEDGE_API_BASE") {
            self.knowledge_api_base = v;
        }
        if let Ok(v) = std::env::var("MENDER_KNOWLEDGE_BASE_ID") {
            self.knowledge_base_id = v;
        }
        if let Ok(v) = std::env::var("MENDER_GENERATION_API_BASE") {
            self.generation_api_base = v;
        }
        if let Ok(v) = std::env::var("MENDER_MODEL_ID") {
            self.model_id = v;
        }
        if let Ok(v) = std::env::var("MENDER_PUSH_REMOTE") {
            self.push_remote = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("MENDER_GIT_TOKEN") {
            self.git_token = Some(v);
        }
        if let Ok(v) = std::env::var("MENDER_UPLOAD_REPORTS") {
            self.upload_reports = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_workable() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert!(!config.push_remote);
        assert!(config.upload_reports);
        assert!(config.git_token.is_none());
    }

    #[test]
    fn partial_file_fills_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mender.toml");
        std::fs::write(&path, "listen_addr = \"127.0.0.1:9999\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
        assert_eq!(config.model_id, Config::default().model_id);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mender.toml");
        std::fs::write(&path, "surprise = true\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/mender.toml")),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            listen_addr: "10.0.0.1:8081".into(),
            data_dir: PathBuf::from("/srv/mender"),
            push_remote: true,
            git_token: Some("token".into()),
            ..Config::default()
        };
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
