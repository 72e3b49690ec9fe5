//! Collision, deletion and access options.
//!
//! Small closed enums; each structural operation matches on its option in one
//! place. All of them parse from their variant names (`"ReplaceExisting"`) so
//! scripts and configuration can name them; [`parse_option`] maps a bad
//! string to `InvalidArgument`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{StorageError, StorageResult};

/// What `create` does when the target path is already occupied by an element
/// of the same kind.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
pub enum CreationCollisionOption {
    /// Fail with `AlreadyExists`.
    #[default]
    Fail,
    /// Delete the existing element, then create a fresh one.
    ReplaceExisting,
    /// Keep the existing element untouched.
    UseExisting,
}

/// What `move`, `copy` and `rename` do when the destination is occupied by an
/// element of the same kind.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
pub enum NameCollisionOption {
    /// Fail with `AlreadyExists`.
    #[default]
    Fail,
    /// Remove the occupying element first.
    ReplaceExisting,
}

/// What `delete` does when the element does not exist.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
pub enum DeletionOption {
    /// Fail with `NotFoundSelf` (or `NotFoundParent`).
    #[default]
    Fail,
    /// Treat a missing element as already deleted.
    IgnoreMissing,
}

/// Capabilities requested when opening a file's content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum FileAccessMode {
    /// Shared; admitted while no writer is active.
    Read,
    /// Exclusive; admitted while no reader and no writer is active.
    Write,
    /// Exclusive, and counts as a reader too.
    ReadWrite,
}

impl FileAccessMode {
    /// True if the mode grants read capability.
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// True if the mode grants write capability.
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Parse an option from its variant name, reporting `InvalidArgument` for
/// unsupported values.
pub fn parse_option<T>(s: &str) -> StorageResult<T>
where
    T: FromStr,
{
    s.parse::<T>().map_err(|_| {
        StorageError::invalid_argument(format!(
            "unsupported {} value {:?}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("option"),
            s
        ))
    })
}
