//! Filesystem configuration.
//!
//! Configuration is RON:
//!
//! ```ron
//! (
//!     flavor: Windows,
//!     known_folders: { TemporaryData: "/scratch" },
//! )
//! ```
//!
//! Every field is optional. `known_folders` entries override the default
//! layout of [`KnownFolderTable::default_layout`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stowage_types::{KnownFolder, PathInformation};

use crate::known_folders::KnownFolderTable;

/// Path conventions a filesystem is built with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathFlavor {
    #[default]
    Unix,
    Windows,
    Custom(PathInformation),
}

impl PathFlavor {
    pub fn path_information(&self) -> PathInformation {
        match self {
            Self::Unix => PathInformation::unix(),
            Self::Windows => PathInformation::windows(),
            Self::Custom(info) => info.clone(),
        }
    }
}

/// Settings for an in-memory filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    pub flavor: PathFlavor,
    pub known_folders: BTreeMap<KnownFolder, String>,
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("RON serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

impl FileSystemConfig {
    /// Parse from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        tracing::debug!(path = %path.display(), flavor = ?config.flavor, "loaded filesystem config");
        Ok(config)
    }

    /// Pretty-printed RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// The default layout with this config's overrides applied.
    pub fn known_folder_table(&self) -> KnownFolderTable {
        let mut table = KnownFolderTable::default_layout();
        for (folder, path) in &self.known_folders {
            table.insert(*folder, path.clone());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_types::StringComparison;

    #[test]
    fn test_empty_config_is_default() {
        let config = FileSystemConfig::from_ron("()").unwrap();
        assert_eq!(config, FileSystemConfig::default());
        assert_eq!(config.flavor, PathFlavor::Unix);
    }

    #[test]
    fn test_parse_windows_with_overrides() {
        let config = FileSystemConfig::from_ron(
            r#"(flavor: Windows, known_folders: { TemporaryData: "\\scratch" })"#,
        )
        .unwrap();
        assert_eq!(config.flavor, PathFlavor::Windows);
        let table = config.known_folder_table();
        assert_eq!(table.get(KnownFolder::TemporaryData), Some("\\scratch"));
        assert_eq!(
            table.get(KnownFolder::Documents),
            Some("/home/user/Documents")
        );
    }

    #[test]
    fn test_custom_flavor() {
        let config = FileSystemConfig::from_ron(
            r#"(
                flavor: Custom((
                    directory_separator: ':',
                    alt_directory_separator: ':',
                    volume_separator: '@',
                    extension_separator: '~',
                    current_directory_segment: ".",
                    parent_directory_segment: "..",
                    invalid_path_chars: ['*'],
                    invalid_file_name_chars: ['*', ':'],
                    default_comparison: OrdinalIgnoreCase,
                )),
            )"#,
        )
        .unwrap();
        let info = config.flavor.path_information();
        assert_eq!(info.directory_separator, ':');
        assert_eq!(info.extension_separator, '~');
        assert_eq!(info.default_comparison, StringComparison::OrdinalIgnoreCase);
    }

    #[test]
    fn test_to_ron_roundtrip() {
        let config = FileSystemConfig {
            flavor: PathFlavor::Windows,
            known_folders: BTreeMap::from([(KnownFolder::Music, "/media/music".to_string())]),
        };
        let text = config.to_ron().unwrap();
        assert_eq!(FileSystemConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_input_is_parse_error() {
        let err = FileSystemConfig::from_ron("(flavor: Amiga)").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = FileSystemConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
