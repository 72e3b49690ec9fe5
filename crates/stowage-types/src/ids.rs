//! Typed identifier for filesystem instances.
//!
//! Every `StoragePath` carries the id of the filesystem that produced it, so
//! paths from two simulated filesystems living in one process can never be
//! mixed up. The id wraps a UUIDv7 and displays as standard UUID text for
//! logging; `short()` (first 8 hex chars) is for human display only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A filesystem instance identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSystemId(uuid::Uuid);

impl FileSystemId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters — for human display only, not lookup.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// A nil / zero ID — for sentinel values only.
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    /// Check if this is the nil ID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for FileSystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for FileSystemId {
    fn from(u: uuid::Uuid) -> Self {
        Self(u)
    }
}

impl fmt::Display for FileSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FileSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSystemId({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        assert_ne!(FileSystemId::new(), FileSystemId::new());
    }

    #[test]
    fn test_short_is_eight_hex_chars() {
        let id = FileSystemId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.short().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_nil() {
        assert!(FileSystemId::nil().is_nil());
        assert!(!FileSystemId::new().is_nil());
    }

    #[test]
    fn test_debug_uses_short_form() {
        let id = FileSystemId::new();
        assert_eq!(format!("{:?}", id), format!("FileSystemId({})", id.short()));
    }

    #[test]
    fn test_json_roundtrip() {
        let id = FileSystemId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: FileSystemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
