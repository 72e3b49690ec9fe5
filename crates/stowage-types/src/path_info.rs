//! Path conventions of a filesystem.
//!
//! `PathInformation` is pure data: the characters and tokens the path algebra
//! needs to take a string apart. One instance is created per filesystem and
//! shared behind an `Arc` by every path the filesystem hands out.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How path strings are compared for equality and ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum StringComparison {
    /// Byte-wise, case-sensitive.
    #[default]
    Ordinal,
    /// Case-insensitive (Unicode lowercase folding).
    OrdinalIgnoreCase,
}

impl StringComparison {
    /// Fold a string so that equal strings under this comparison are
    /// byte-identical.
    pub fn fold(&self, s: &str) -> String {
        match self {
            Self::Ordinal => s.to_string(),
            Self::OrdinalIgnoreCase => s.to_lowercase(),
        }
    }

    /// Compare two strings under this comparison.
    pub fn equals(&self, a: &str, b: &str) -> bool {
        match self {
            Self::Ordinal => a == b,
            Self::OrdinalIgnoreCase => a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Order two strings under this comparison.
    pub fn compare(&self, a: &str, b: &str) -> std::cmp::Ordering {
        match self {
            Self::Ordinal => a.cmp(b),
            Self::OrdinalIgnoreCase => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

/// Separator characters, special segments and invalid characters of a
/// filesystem's paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInformation {
    /// Canonical directory separator, used when the algebra inserts one.
    pub directory_separator: char,
    /// Alternative directory separator. May equal `directory_separator`.
    pub alt_directory_separator: char,
    /// Volume separator (`:` on Windows). Informational only.
    pub volume_separator: char,
    /// Separates a name from its extension.
    pub extension_separator: char,
    /// Segment denoting the current directory (`.`).
    pub current_directory_segment: String,
    /// Segment denoting the parent directory (`..`).
    pub parent_directory_segment: String,
    /// Characters that may never appear in a path.
    pub invalid_path_chars: Vec<char>,
    /// Characters that may never appear in a single file or folder name.
    pub invalid_file_name_chars: Vec<char>,
    /// Default comparison for path equality.
    pub default_comparison: StringComparison,
}

impl PathInformation {
    /// Unix-style conventions: `/`, case-sensitive.
    pub fn unix() -> Self {
        Self {
            directory_separator: '/',
            alt_directory_separator: '/',
            volume_separator: '/',
            extension_separator: '.',
            current_directory_segment: ".".to_string(),
            parent_directory_segment: "..".to_string(),
            invalid_path_chars: vec!['\0'],
            invalid_file_name_chars: vec!['\0', '/'],
            default_comparison: StringComparison::Ordinal,
        }
    }

    /// Windows-style conventions: `\` and `/`, case-insensitive.
    pub fn windows() -> Self {
        let mut invalid_path_chars = vec!['"', '<', '>', '|'];
        invalid_path_chars.extend((0u8..32).map(char::from));

        let mut invalid_file_name_chars = invalid_path_chars.clone();
        invalid_file_name_chars.extend([':', '*', '?', '\\', '/']);

        Self {
            directory_separator: '\\',
            alt_directory_separator: '/',
            volume_separator: ':',
            extension_separator: '.',
            current_directory_segment: ".".to_string(),
            parent_directory_segment: "..".to_string(),
            invalid_path_chars,
            invalid_file_name_chars,
            default_comparison: StringComparison::OrdinalIgnoreCase,
        }
    }

    /// True if `c` is a directory separator.
    pub fn is_separator(&self, c: char) -> bool {
        c == self.directory_separator || c == self.alt_directory_separator
    }

    /// Distinct directory separators, canonical first.
    pub fn directory_separator_chars(&self) -> Vec<char> {
        if self.directory_separator == self.alt_directory_separator {
            vec![self.directory_separator]
        } else {
            vec![self.directory_separator, self.alt_directory_separator]
        }
    }

    /// First invalid path character in `s`, if any.
    pub fn find_invalid_path_char(&self, s: &str) -> Option<char> {
        s.chars().find(|c| self.invalid_path_chars.contains(c))
    }

    /// First invalid file-name character in `s`, if any.
    pub fn find_invalid_file_name_char(&self, s: &str) -> Option<char> {
        s.chars()
            .find(|c| self.invalid_file_name_chars.contains(c) || self.is_separator(*c))
    }

    /// True if `segment` is the current or parent directory token.
    pub fn is_special_segment(&self, segment: &str) -> bool {
        segment == self.current_directory_segment || segment == self.parent_directory_segment
    }
}

impl Default for PathInformation {
    fn default() -> Self {
        Self::unix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_separators() {
        let info = PathInformation::unix();
        assert!(info.is_separator('/'));
        assert!(!info.is_separator('\\'));
        assert_eq!(info.directory_separator_chars(), vec!['/']);
    }

    #[test]
    fn test_windows_separators() {
        let info = PathInformation::windows();
        assert!(info.is_separator('\\'));
        assert!(info.is_separator('/'));
        assert_eq!(info.directory_separator_chars(), vec!['\\', '/']);
        assert_eq!(info.default_comparison, StringComparison::OrdinalIgnoreCase);
    }

    #[test]
    fn test_invalid_chars() {
        let info = PathInformation::windows();
        assert_eq!(info.find_invalid_path_char("a|b"), Some('|'));
        assert_eq!(info.find_invalid_path_char("a\\b"), None);
        assert_eq!(info.find_invalid_file_name_char("a:b"), Some(':'));
        assert_eq!(PathInformation::unix().find_invalid_file_name_char("a/b"), Some('/'));
    }

    #[test]
    fn test_comparison() {
        assert!(StringComparison::OrdinalIgnoreCase.equals("ABC", "abc"));
        assert!(!StringComparison::Ordinal.equals("ABC", "abc"));
        assert_eq!(StringComparison::OrdinalIgnoreCase.fold("AbC"), "abc");
    }

    #[test]
    fn test_comparison_from_str() {
        let parsed: StringComparison = "OrdinalIgnoreCase".parse().unwrap();
        assert_eq!(parsed, StringComparison::OrdinalIgnoreCase);
        assert!("Loose".parse::<StringComparison>().is_err());
    }

    #[test]
    fn test_special_segments() {
        let info = PathInformation::unix();
        assert!(info.is_special_segment("."));
        assert!(info.is_special_segment(".."));
        assert!(!info.is_special_segment("..."));
    }
}
