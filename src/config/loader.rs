//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::chain::types::RobonomicsError;
use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for RobonomicsError {
    fn from(e: ConfigError) -> Self {
        RobonomicsError::Config(e.to_string())
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ClientConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = %path.display(), remote_ws = %config.node.remote_ws, "Configuration loaded");
    Ok(config)
}

/// Validate a configuration assembled in code (e.g. after CLI overrides).
pub fn finalize(config: ClientConfig) -> Result<ClientConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[node]\nremote_ws = \"ws://127.0.0.1:9944\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.node.remote_ws, "ws://127.0.0.1:9944");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[node]\nremote_ws = \"ftp://x\"\nconnect_timeout_secs = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().starts_with("Validation failed: node.remote_ws"));
    }

    #[test]
    fn test_load_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[node\nremote_ws =").unwrap();
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_error_converts() {
        let err: RobonomicsError = load_config(Path::new("/definitely/not/here.toml")).unwrap_err().into();
        assert!(matches!(err, RobonomicsError::Config(ref m) if m.starts_with("IO error")));
    }
}
