//! File-based application configuration.
//!
//! Everything here can also be set programmatically on [`App`](crate::App); the
//! TOML form exists so deployments can change CORS and static settings without
//! recompiling.
//!
//! ```toml
//! address = "127.0.0.1:8080"
//!
//! [cors]
//! allowed_origins = ["http://localhost:3000"]
//! allow_credentials = false
//!
//! [public]
//! prefix = "/static"
//! dir = "./public"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::security::Cors;
use crate::static_files::Public;

/// Address used when the configuration does not name one.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address [`App::run`](crate::App::run) binds to.
    pub address: String,
    pub cors: Cors,
    pub public: Option<Public>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            cors: Cors::default(),
            public: None,
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or has
    /// fields of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert!(config.cors.allow_credentials);
        assert!(config.public.is_none());
    }

    #[test]
    fn full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            address = "0.0.0.0:9000"

            [cors]
            allowed_origins = ["http://localhost:3000"]
            allowed_methods = ["GET"]
            allow_credentials = false

            [public]
            prefix = "/static"
            dir = "./public"
            "#,
        )
        .unwrap();

        assert_eq!(config.address, "0.0.0.0:9000");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.cors.allowed_methods, vec!["GET"]);
        // unspecified fields keep their defaults
        assert_eq!(
            config.cors.allowed_headers,
            vec!["Content-Type", "Authorization"]
        );
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.public, Some(Public::new("/static", "./public")));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = AppConfig::from_toml_str("address = 8080").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zapi.toml");
        std::fs::write(&path, "address = \"127.0.0.1:0\"\n").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().address, "127.0.0.1:0");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
