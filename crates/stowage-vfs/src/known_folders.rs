//! Known-folder resolution.
//!
//! A resolver maps a [`KnownFolder`] to a path string in the filesystem's
//! own syntax. OS-backed resolvers can plug in through
//! [`KnownFolderResolver`]; the in-memory filesystem uses a
//! [`KnownFolderTable`].

use std::collections::BTreeMap;
use std::fmt;

use stowage_types::KnownFolder;

/// Maps well-known folders to path strings.
pub trait KnownFolderResolver: Send + Sync + fmt::Debug {
    /// The path string for `folder`, or `None` if it is not mapped.
    fn resolve(&self, folder: KnownFolder) -> Option<String>;
}

/// Table-driven resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFolderTable {
    entries: BTreeMap<KnownFolder, String>,
}

impl KnownFolderTable {
    /// An empty table. Every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// A Unix-shaped home layout: `/tmp` and folders under `/home/user`.
    pub fn default_layout() -> Self {
        const HOME: &str = "/home/user";
        Self::new()
            .with(KnownFolder::TemporaryData, "/tmp")
            .with(KnownFolder::UserProfile, HOME)
            .with(
                KnownFolder::LocalApplicationData,
                format!("{HOME}/.local/share"),
            )
            .with(KnownFolder::RoamingApplicationData, format!("{HOME}/.config"))
            .with(KnownFolder::Desktop, format!("{HOME}/Desktop"))
            .with(KnownFolder::Documents, format!("{HOME}/Documents"))
            .with(KnownFolder::Pictures, format!("{HOME}/Pictures"))
            .with(KnownFolder::Videos, format!("{HOME}/Videos"))
            .with(KnownFolder::Music, format!("{HOME}/Music"))
            .with(KnownFolder::Downloads, format!("{HOME}/Downloads"))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, folder: KnownFolder, path: impl Into<String>) -> Self {
        self.insert(folder, path);
        self
    }

    /// Map `folder` to `path`, replacing any previous mapping.
    pub fn insert(&mut self, folder: KnownFolder, path: impl Into<String>) {
        self.entries.insert(folder, path.into());
    }

    /// Remove the mapping for `folder`.
    pub fn remove(&mut self, folder: KnownFolder) -> Option<String> {
        self.entries.remove(&folder)
    }

    pub fn get(&self, folder: KnownFolder) -> Option<&str> {
        self.entries.get(&folder).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (KnownFolder, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl KnownFolderResolver for KnownFolderTable {
    fn resolve(&self, folder: KnownFolder) -> Option<String> {
        self.get(folder).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_default_layout_maps_everything() {
        let table = KnownFolderTable::default_layout();
        for folder in KnownFolder::iter() {
            assert!(table.resolve(folder).is_some(), "{folder} unmapped");
        }
        assert_eq!(table.get(KnownFolder::TemporaryData), Some("/tmp"));
        assert_eq!(
            table.get(KnownFolder::Documents),
            Some("/home/user/Documents")
        );
    }

    #[test]
    fn test_empty_table_misses() {
        assert_eq!(KnownFolderTable::new().resolve(KnownFolder::Music), None);
    }

    #[test]
    fn test_insert_overrides() {
        let mut table = KnownFolderTable::default_layout();
        table.insert(KnownFolder::TemporaryData, "/var/tmp");
        assert_eq!(
            table.resolve(KnownFolder::TemporaryData).as_deref(),
            Some("/var/tmp")
        );
        assert_eq!(table.remove(KnownFolder::Music).as_deref(), Some("/home/user/Music"));
        assert_eq!(table.get(KnownFolder::Music), None);
    }
}
