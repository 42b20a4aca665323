//! CLI configuration.
//!
//! Configuration is loaded from `~/.config/turnwire/config.toml` when present.
//! Every key is optional.
//!
//! ## Example Configuration
//!
//! ```toml
//! [prompt]
//! namespace = "functions"
//! system_instruction = "A chat between a curious user and an artificial intelligence assistant."
//!
//! [validate]
//! strict = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use turnwire::PromptConfig;

use crate::error::{CliError, Result};

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    /// How the leading system messages of a record are built
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Settings for the `validate` command
    #[serde(default)]
    pub validate: ValidateSettings,
}

/// Settings for the `validate` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidateSettings {
    /// Exit non-zero when any record has warnings (default: false)
    #[serde(default)]
    pub strict: bool,
}

impl CliConfig {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read if present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit path does not exist
    /// - The file cannot be read
    /// - Deserialization or validation fails
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        match Self::config_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            Ok(path) => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                debug!("{e}, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Returns the default configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Failed to determine config directory".to_string()))?
            .join("turnwire");

        Ok(config_dir.join("config.toml"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt namespace is unusable.
    pub fn validate(&self) -> Result<()> {
        self.prompt
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::io::Write;

    use super::*;
    use turnwire::DEFAULT_SYSTEM_INSTRUCTION;

    fn sample_config_toml() -> &'static str {
        r#"
[prompt]
namespace = "tools"
system_instruction = "Answer briefly."

[validate]
strict = true
        "#
    }

    #[test]
    fn test_parse_config() {
        let config: CliConfig = toml::from_str(sample_config_toml()).unwrap();

        assert_eq!(config.prompt.namespace, "tools");
        assert_eq!(
            config.prompt.system_instruction.as_deref(),
            Some("Answer briefly.")
        );
        assert!(config.validate.strict);
    }

    #[test]
    fn test_default_settings() {
        let config: CliConfig = toml::from_str("").unwrap();

        assert_eq!(config, CliConfig::default());
        assert_eq!(config.prompt.namespace, "functions");
        assert_eq!(
            config.prompt.system_instruction.as_deref(),
            Some(DEFAULT_SYSTEM_INSTRUCTION)
        );
        assert!(!config.validate.strict);
    }

    #[test]
    fn test_partial_prompt_section() {
        let config: CliConfig = toml::from_str("[prompt]\nnamespace = \"weather\"\n").unwrap();
        assert_eq!(config.prompt.namespace, "weather");
        assert!(config.prompt.system_instruction.is_some());
    }

    #[test]
    fn test_validate_bad_namespace() {
        let config: CliConfig = toml::from_str("[prompt]\nnamespace = \"my tools\"\n").unwrap();
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_config_toml().as_bytes()).unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.prompt.namespace, "tools");
        assert!(config.validate.strict);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        assert!(matches!(
            CliConfig::load(Some(&path)),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[prompt\nnamespace = 1").unwrap();

        assert!(matches!(
            CliConfig::load(Some(file.path())),
            Err(CliError::Toml(_))
        ));
    }
}
