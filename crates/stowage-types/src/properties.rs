//! Element metadata: properties and attribute bits.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::Display;

/// The two kinds of element a filesystem holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    File,
    Folder,
}

/// Attribute bit-set of a file or folder.
///
/// Plain data. The in-memory engine stores and reports these bits but never
/// enforces them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const READ_ONLY: Self = Self(0x0001);
    pub const HIDDEN: Self = Self(0x0002);
    pub const SYSTEM: Self = Self(0x0004);
    pub const DIRECTORY: Self = Self(0x0010);
    pub const ARCHIVE: Self = Self(0x0020);
    pub const NORMAL: Self = Self(0x0080);
    pub const TEMPORARY: Self = Self(0x0100);

    const NAMED: [(Self, &'static str); 7] = [
        (Self::READ_ONLY, "READ_ONLY"),
        (Self::HIDDEN, "HIDDEN"),
        (Self::SYSTEM, "SYSTEM"),
        (Self::DIRECTORY, "DIRECTORY"),
        (Self::ARCHIVE, "ARCHIVE"),
        (Self::NORMAL, "NORMAL"),
        (Self::TEMPORARY, "TEMPORARY"),
    ];

    /// No bits set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Build from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// True if every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no bit is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Copy with the bits of `other` set.
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Copy with the bits of `other` cleared.
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for FileAttributes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FileAttributes {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for FileAttributes {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "FileAttributes({:#x})", self.0)
        } else {
            write!(f, "FileAttributes({})", names.join(" | "))
        }
    }
}

/// Properties of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProperties {
    /// Full name, including extension.
    pub name: String,
    /// Name without its extension.
    pub name_without_extension: String,
    /// Extension without the separator.
    pub extension: Option<String>,
    /// Creation time.
    pub created: SystemTime,
    /// Last content or structural modification, if any happened.
    pub modified: Option<SystemTime>,
    /// Content size in bytes.
    pub size: u64,
}

/// Properties of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderProperties {
    /// Folder name (empty for the root).
    pub name: String,
    /// Creation time.
    pub created: SystemTime,
    /// Last time a direct child was added or removed, if ever.
    pub modified: Option<SystemTime>,
}
