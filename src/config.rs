use crate::error::ConfigError;
use crate::ui::selection::RoundsRange;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONFIG_FILE: &str = "cipherscore.toml";
pub const DEFAULT_ROUNDS: u32 = 1000;

/// Client settings. Every field is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub rounds: u32,
    /// Cipher id selected before the list arrives.
    pub cipher: Option<String>,
    /// File whose contents replace the built-in custom cipher template.
    pub custom_source: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            rounds: DEFAULT_ROUNDS,
            cipher: None,
            custom_source: None,
        }
    }
}

impl ClientConfig {
    /// Loads `path` if given, else `cipherscore.toml` when it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Rounds value as the range control would present it.
    pub fn initial_rounds(&self) -> u32 {
        RoundsRange::AUDIT.snap(self.rounds)
    }

    /// Reads the configured custom source file, if any.
    pub fn read_custom_source(&self) -> Result<Option<String>, ConfigError> {
        match &self.custom_source {
            Some(path) => fs::read_to_string(path)
                .map(Some)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.initial_rounds(), 1000);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = ClientConfig::from_toml_str(
            "base_url = \"http://10.0.0.5:9000\"\nrounds = 2350\ncipher = \"speck\"\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.cipher.as_deref(), Some("speck"));
        assert_eq!(config.initial_rounds(), 2400);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ClientConfig::load(Some(Path::new("/nonexistent/cipherscore.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        assert!(ClientConfig::from_toml_str("rounds = \"many\"").is_err());
    }
}
