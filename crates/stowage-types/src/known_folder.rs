//! Well-known folder kinds.
//!
//! A filesystem maps each kind to a canonical path through a resolver; this
//! enum is just the vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Well-known folders a filesystem may expose.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum KnownFolder {
    TemporaryData,
    LocalApplicationData,
    RoamingApplicationData,
    UserProfile,
    Desktop,
    Documents,
    Pictures,
    Videos,
    Music,
    Downloads,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_roundtrip() {
        for folder in KnownFolder::iter() {
            let parsed: KnownFolder = folder.to_string().parse().unwrap();
            assert_eq!(parsed, folder);
        }
    }

    #[test]
    fn test_count() {
        assert_eq!(KnownFolder::iter().count(), 10);
    }
}
