//! Loader configuration.
//!
//! Defines the YAML-serializable configuration that selects which command
//! families are exported, how absent bundle references are treated, and
//! which file extension marks a specification file.
//!
//! # Example YAML
//!
//! ```yaml
//! families:
//!   - Glossary
//!   - Governance Officer
//! strict_bundles: false
//! extension: json
//! ```

use std::collections::BTreeSet;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_spec_core::ExpansionMode;
use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, Result};

/// Default extension of specification files.
pub const DEFAULT_EXTENSION: &str = "json";

/// Options for a single directory load.
///
/// # Examples
///
/// ```
/// use command_spec_core::ExpansionMode;
/// use command_spec_loader::LoadOptions;
///
/// let options = LoadOptions::default().with_family("Glossary").strict();
/// assert!(options.is_family_allowed(Some("Glossary")));
/// assert!(!options.is_family_allowed(Some("Projects")));
/// assert_eq!(options.mode, ExpansionMode::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Allowed command families; empty allows every command.
    pub families: BTreeSet<String>,
    /// Treatment of command bundle references with no bundle entry.
    pub mode: ExpansionMode,
    /// Extension (without the dot) of files to load.
    pub extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            families: BTreeSet::new(),
            mode: ExpansionMode::Lenient,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl LoadOptions {
    /// Adds a family to the allow-list.
    pub fn with_family(mut self, family: &str) -> Self {
        self.families.insert(family.to_string());
        self
    }

    /// Switches to [`ExpansionMode::Strict`].
    pub fn strict(mut self) -> Self {
        self.mode = ExpansionMode::Strict;
        self
    }

    /// Returns `true` if a command of `family` passes the allow-list.
    ///
    /// With a non-empty allow-list, commands without a family are dropped.
    pub fn is_family_allowed(&self, family: Option<&str>) -> bool {
        self.families.is_empty() || family.is_some_and(|f| self.families.contains(f))
    }
}

/// Loader configuration file.
///
/// Every field is optional in YAML.
///
/// # Examples
///
/// ```
/// use command_spec_loader::LoaderConfig;
///
/// let config: LoaderConfig = serde_yaml::from_str("families: [Glossary]").unwrap();
/// assert_eq!(config.extension, "json");
/// assert!(!config.strict_bundles);
/// let options = config.to_options().unwrap();
/// assert!(options.families.contains("Glossary"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Command families to export (empty = all).
    pub families: Vec<String>,
    /// Fail expansion of commands whose bundle does not exist.
    pub strict_bundles: bool,
    /// Specification file extension, with or without a leading dot.
    pub extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            families: Vec::new(),
            strict_bundles: false,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::LoaderError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be created, or [`YamlError`](crate::LoaderError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Converts the configuration into [`LoadOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](crate::LoaderError::InvalidConfig) if the
    /// extension is empty or a family name is blank.
    pub fn to_options(&self) -> Result<LoadOptions> {
        let extension = self.extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return Err(LoaderError::InvalidConfig(
                "extension cannot be empty".to_string(),
            ));
        }
        if self.families.iter().any(|family| family.trim().is_empty()) {
            return Err(LoaderError::InvalidConfig(
                "family names cannot be blank".to_string(),
            ));
        }

        Ok(LoadOptions {
            families: self.families.iter().map(|f| f.trim().to_string()).collect(),
            mode: if self.strict_bundles {
                ExpansionMode::Strict
            } else {
                ExpansionMode::Lenient
            },
            extension: extension.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: LoaderConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.to_options().unwrap(), LoadOptions::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
families:
  - Glossary
  - " Governance Officer "
strict_bundles: true
extension: .spec
"#;
        let config: LoaderConfig = serde_yaml::from_str(yaml).unwrap();
        let options = config.to_options().unwrap();
        assert_eq!(options.mode, ExpansionMode::Strict);
        assert_eq!(options.extension, "spec");
        assert!(options.families.contains("Governance Officer"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = LoaderConfig {
            extension: " . ".to_string(),
            ..LoaderConfig::default()
        };
        assert!(matches!(
            config.to_options(),
            Err(LoaderError::InvalidConfig(_))
        ));

        let config = LoaderConfig {
            families: vec!["".to_string()],
            ..LoaderConfig::default()
        };
        assert!(matches!(
            config.to_options(),
            Err(LoaderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_family_filter_without_family() {
        assert!(LoadOptions::default().is_family_allowed(None));
        assert!(!LoadOptions::default().with_family("Glossary").is_family_allowed(None));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.yaml");
        let config = LoaderConfig {
            families: vec!["Glossary".to_string()],
            strict_bundles: true,
            extension: "json".to_string(),
        };
        config.save(&path).unwrap();
        assert_eq!(LoaderConfig::load(&path).unwrap(), config);
    }
}
