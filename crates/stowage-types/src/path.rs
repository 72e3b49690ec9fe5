//! Lexical path algebra.
//!
//! A [`StoragePath`] is an immutable, non-empty path string bound to the
//! filesystem instance that produced it. Every derived attribute (name,
//! parent, full path, ...) is a pure function of the string and the
//! filesystem's [`PathInformation`]; nothing here touches storage.
//!
//! # Concatenation flavours
//!
//! | Operation  | Rooted rhs        | Separator at the join point             |
//! |------------|-------------------|-----------------------------------------|
//! | `append`   | concatenated      | never inserted, never removed           |
//! | `combine`  | rhs wins outright | inserted if neither side provides one   |
//! | `join`     | concatenated      | inserted if neither side provides one   |
//! | `link`     | concatenated      | exactly one, surrounding ones trimmed   |
//!
//! # Equality
//!
//! `==` is *string* equality under the filesystem's default comparison.
//! `"/a"` and `"/a/"` are different strings that name the same location; use
//! [`StoragePath::effective_eq`] for "same location" semantics.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{StorageError, StorageResult};
use crate::ids::FileSystemId;
use crate::path_info::PathInformation;

/// Whether a path is rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Starts with a directory separator.
    Absolute,
    /// Everything else.
    Relative,
}

/// An immutable path bound to one filesystem instance.
#[derive(Clone)]
pub struct StoragePath {
    value: String,
    info: Arc<PathInformation>,
    fs: FileSystemId,
}

impl StoragePath {
    /// Create a path for the filesystem `fs` using its conventions `info`.
    ///
    /// Fails with `InvalidArgument` for an empty string and with `InvalidPath`
    /// when the string contains a character the filesystem forbids.
    pub fn new(
        fs: FileSystemId,
        info: Arc<PathInformation>,
        value: impl Into<String>,
    ) -> StorageResult<Self> {
        let value = value.into();
        Self::validate(&info, &value)?;
        Ok(Self { value, info, fs })
    }

    fn validate(info: &PathInformation, value: &str) -> StorageResult<()> {
        if value.is_empty() {
            return Err(StorageError::invalid_argument("path must not be empty"));
        }
        if let Some(c) = info.find_invalid_path_char(value) {
            return Err(StorageError::invalid_path(format!(
                "{:?} contains invalid character {:?}",
                value, c
            )));
        }
        Ok(())
    }

    /// The root path (a single canonical separator) of a filesystem.
    pub fn new_root(fs: FileSystemId, info: Arc<PathInformation>) -> Self {
        let value = info.directory_separator.to_string();
        Self { value, info, fs }
    }

    /// Check that `name` is usable as a single file or folder name.
    pub fn validate_name(info: &PathInformation, name: &str) -> StorageResult<()> {
        if name.is_empty() {
            return Err(StorageError::invalid_argument("name must not be empty"));
        }
        if info.is_special_segment(name) {
            return Err(StorageError::invalid_argument(format!(
                "{:?} is not a valid name",
                name
            )));
        }
        if let Some(c) = info.find_invalid_file_name_char(name) {
            return Err(StorageError::invalid_path(format!(
                "name {:?} contains invalid character {:?}",
                name, c
            )));
        }
        Ok(())
    }

    /// A new path on the same filesystem, validated.
    fn derive(&self, value: String) -> StorageResult<Self> {
        Self::validate(&self.info, &value)?;
        Ok(Self {
            value,
            info: Arc::clone(&self.info),
            fs: self.fs,
        })
    }

    /// A new path built only from pieces of already-valid paths and
    /// separators. Must be non-empty.
    fn derive_unchecked(&self, value: String) -> Self {
        debug_assert!(!value.is_empty());
        Self {
            value,
            info: Arc::clone(&self.info),
            fs: self.fs,
        }
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The filesystem this path belongs to.
    pub fn file_system_id(&self) -> FileSystemId {
        self.fs
    }

    /// The path conventions of the owning filesystem.
    pub fn path_information(&self) -> &Arc<PathInformation> {
        &self.info
    }

    fn is_sep(&self, c: char) -> bool {
        self.info.is_separator(c)
    }

    /// Fail with `InvalidArgument` unless `other` comes from the same
    /// filesystem instance.
    pub fn ensure_same_file_system(&self, other: &StoragePath) -> StorageResult<()> {
        if self.fs != other.fs {
            return Err(StorageError::invalid_argument(format!(
                "{:?} belongs to file system {} but {:?} belongs to {}",
                other.value,
                other.fs.short(),
                self.value,
                self.fs.short()
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Derived attributes
    // ========================================================================

    /// Absolute if the string begins with a directory separator.
    pub fn kind(&self) -> PathKind {
        match self.value.chars().next() {
            Some(c) if self.is_sep(c) => PathKind::Absolute,
            _ => PathKind::Relative,
        }
    }

    /// Shorthand for `kind() == PathKind::Absolute`.
    pub fn is_absolute(&self) -> bool {
        self.kind() == PathKind::Absolute
    }

    /// True if the path consists of separators only.
    pub fn is_root(&self) -> bool {
        self.value.chars().all(|c| self.is_sep(c))
    }

    /// The single-separator root of an absolute path.
    pub fn root(&self) -> Option<StoragePath> {
        match self.value.chars().next() {
            Some(c) if self.is_sep(c) => Some(self.derive_unchecked(c.to_string())),
            _ => None,
        }
    }

    /// True if the last character is a directory separator.
    pub fn ends_in_directory_separator(&self) -> bool {
        self.value.chars().next_back().is_some_and(|c| self.is_sep(c))
    }

    /// The string with exactly one trailing separator removed, if present.
    fn without_one_trailing_separator(&self) -> &str {
        match self.value.chars().next_back() {
            Some(c) if self.is_sep(c) => &self.value[..self.value.len() - c.len_utf8()],
            _ => &self.value,
        }
    }

    /// The last segment, ignoring exactly one trailing separator.
    ///
    /// `"a/"` → `"a"`, `"a//"` → `""`, `"/"` → `""`.
    pub fn name(&self) -> &str {
        let trimmed = self.without_one_trailing_separator();
        match trimmed.char_indices().rev().find(|(_, c)| self.is_sep(*c)) {
            Some((i, c)) => &trimmed[i + c.len_utf8()..],
            None => trimmed,
        }
    }

    fn split_name(&self) -> (&str, Option<&str>) {
        let name = self.name();
        if self.info.is_special_segment(name) {
            return (name, None);
        }
        let ext_sep = self.info.extension_separator;
        match name.rfind(ext_sep) {
            Some(i) => {
                let extension = &name[i + ext_sep.len_utf8()..];
                let stem = &name[..i];
                if extension.is_empty() {
                    (stem, None)
                } else {
                    (stem, Some(extension))
                }
            }
            None => (name, None),
        }
    }

    /// The name up to its last extension separator.
    pub fn name_without_extension(&self) -> &str {
        self.split_name().0
    }

    /// The text after the name's last extension separator, without the
    /// separator. `None` for `.`/`..` and for names without an extension.
    pub fn extension(&self) -> Option<&str> {
        self.split_name().1
    }

    /// The parent path, lexically.
    ///
    /// One trailing separator is ignored, then the path is cut at the previous
    /// separator boundary (skipping runs of separators). Root-only paths and
    /// single-segment relative paths have no parent.
    pub fn parent(&self) -> Option<StoragePath> {
        let trimmed = self.without_one_trailing_separator();
        if trimmed.chars().all(|c| self.is_sep(c)) {
            return None;
        }
        let (boundary, _) = trimmed.char_indices().rev().find(|(_, c)| self.is_sep(*c))?;
        let head = trimmed[..boundary].trim_end_matches(|c| self.is_sep(c));
        if head.is_empty() {
            // The boundary run reaches the start: the parent is the root.
            let first = trimmed.chars().next()?;
            return Some(self.derive_unchecked(first.to_string()));
        }
        Some(self.derive_unchecked(head.to_string()))
    }

    /// Lexically normalized, rooted form.
    ///
    /// `.` segments are dropped, `..` pops the last resolved segment (or is
    /// kept when there is none), separators are canonicalized and collapsed,
    /// and the result is always rooted. A trailing separator survives when
    /// any segment remains.
    pub fn full_path(&self) -> StoragePath {
        let info = &self.info;
        let sep = info.directory_separator;
        let mut resolved: Vec<&str> = Vec::new();

        for segment in self.value.split(|c| info.is_separator(c)) {
            if segment.is_empty() || segment == info.current_directory_segment {
                continue;
            }
            if segment == info.parent_directory_segment {
                match resolved.last() {
                    Some(last) if *last != info.parent_directory_segment => {
                        resolved.pop();
                    }
                    _ => resolved.push(segment),
                }
                continue;
            }
            resolved.push(segment);
        }

        let sep_str = sep.to_string();
        let mut out = String::with_capacity(self.value.len() + 1);
        out.push(sep);
        out.push_str(&resolved.join(sep_str.as_str()));
        if self.ends_in_directory_separator() && !resolved.is_empty() {
            out.push(sep);
        }
        self.derive_unchecked(out)
    }

    // ========================================================================
    // Concatenation
    // ========================================================================

    /// Raw concatenation. No separator is inserted or removed.
    pub fn append(&self, part: &str) -> StorageResult<StoragePath> {
        self.derive(format!("{}{}", self.value, part))
    }

    /// Resolve `other` against `self`: a rooted `other` is returned as-is.
    pub fn combine(&self, other: &StoragePath) -> StorageResult<StoragePath> {
        self.ensure_same_file_system(other)?;
        self.combine_str(&other.value)
    }

    /// String form of [`combine`](Self::combine).
    pub fn combine_str(&self, other: &str) -> StorageResult<StoragePath> {
        match other.chars().next() {
            None => Ok(self.clone()),
            Some(c) if self.is_sep(c) => self.derive(other.to_string()),
            Some(_) => self.join_str(other),
        }
    }

    /// Concatenate, inserting one separator only if neither adjacent
    /// character already is one. Existing separators are kept verbatim.
    pub fn join(&self, other: &StoragePath) -> StorageResult<StoragePath> {
        self.ensure_same_file_system(other)?;
        self.join_str(&other.value)
    }

    /// String form of [`join`](Self::join).
    pub fn join_str(&self, other: &str) -> StorageResult<StoragePath> {
        let Some(first) = other.chars().next() else {
            return Ok(self.clone());
        };
        if self.ends_in_directory_separator() || self.is_sep(first) {
            self.derive(format!("{}{}", self.value, other))
        } else {
            self.derive(format!(
                "{}{}{}",
                self.value, self.info.directory_separator, other
            ))
        }
    }

    /// Concatenate with exactly one separator at the join point, trimming any
    /// trailing separators of `self` and leading separators of `other`.
    pub fn link(&self, other: &StoragePath) -> StorageResult<StoragePath> {
        self.ensure_same_file_system(other)?;
        self.link_str(&other.value)
    }

    /// String form of [`link`](Self::link).
    pub fn link_str(&self, other: &str) -> StorageResult<StoragePath> {
        let left = self.value.trim_end_matches(|c| self.is_sep(c));
        let right = other.trim_start_matches(|c| self.is_sep(c));
        self.derive(format!(
            "{}{}{}",
            left, self.info.directory_separator, right
        ))
    }

    // ========================================================================
    // Trimming
    // ========================================================================

    /// Remove exactly one trailing separator.
    ///
    /// Fails with `InvalidPath` when the path is a single separator, since the
    /// result would be empty. Paths without a trailing separator are returned
    /// unchanged.
    pub fn trim_end_directory_separator(&self) -> StorageResult<StoragePath> {
        self.try_trim_end_directory_separator().ok_or_else(|| {
            StorageError::invalid_path(format!(
                "cannot trim the separator of root path {:?}",
                self.value
            ))
        })
    }

    /// Non-failing form of
    /// [`trim_end_directory_separator`](Self::trim_end_directory_separator).
    pub fn try_trim_end_directory_separator(&self) -> Option<StoragePath> {
        if !self.ends_in_directory_separator() {
            return Some(self.clone());
        }
        let trimmed = self.without_one_trailing_separator();
        if trimmed.is_empty() {
            None
        } else {
            Some(self.derive_unchecked(trimmed.to_string()))
        }
    }

    // ========================================================================
    // Effective (location) equality
    // ========================================================================

    /// The normalized, trailing-separator-trimmed, case-folded form that
    /// identifies the location this path names.
    pub fn effective_key(&self) -> String {
        let full = self.full_path();
        let full = full.try_trim_end_directory_separator().unwrap_or(full);
        self.info.default_comparison.fold(&full.value)
    }

    /// True if both paths name the same location on the same filesystem.
    pub fn effective_eq(&self, other: &StoragePath) -> bool {
        self.fs == other.fs && self.effective_key() == other.effective_key()
    }
}

impl PartialEq for StoragePath {
    fn eq(&self, other: &Self) -> bool {
        self.fs == other.fs
            && self
                .info
                .default_comparison
                .equals(&self.value, &other.value)
    }
}

impl Eq for StoragePath {}

impl Hash for StoragePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fs.hash(state);
        self.info.default_comparison.fold(&self.value).hash(state);
    }
}

impl PartialOrd for StoragePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StoragePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fs.cmp(&other.fs).then_with(|| {
            self.info
                .default_comparison
                .compare(&self.value, &other.value)
        })
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoragePath({:?})", self.value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageErrorKind;
    use proptest::prelude::*;

    fn unix_fs() -> (FileSystemId, Arc<PathInformation>) {
        (FileSystemId::new(), Arc::new(PathInformation::unix()))
    }

    fn p(s: &str) -> StoragePath {
        thread_local! {
            static FS: (FileSystemId, Arc<PathInformation>) = unix_fs();
        }
        FS.with(|(id, info)| StoragePath::new(*id, Arc::clone(info), s).unwrap())
    }

    fn win(s: &str) -> StoragePath {
        thread_local! {
            static FS: (FileSystemId, Arc<PathInformation>) =
                (FileSystemId::new(), Arc::new(PathInformation::windows()));
        }
        FS.with(|(id, info)| StoragePath::new(*id, Arc::clone(info), s).unwrap())
    }

    #[test]
    fn test_empty_is_invalid_argument() {
        let (id, info) = unix_fs();
        let err = StoragePath::new(id, info, "").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
    }

    #[test]
    fn test_invalid_char_is_invalid_path() {
        let (id, info) = unix_fs();
        let err = StoragePath::new(id, info, "a\0b").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_kind() {
        assert_eq!(p("/a").kind(), PathKind::Absolute);
        assert_eq!(p("a/b").kind(), PathKind::Relative);
        assert_eq!(win("\\a").kind(), PathKind::Absolute);
        assert_eq!(win("/a").kind(), PathKind::Absolute);
        // Not volume aware.
        assert_eq!(win("C:\\a").kind(), PathKind::Relative);
    }

    #[test]
    fn test_root() {
        assert_eq!(p("/a/b").root().unwrap().as_str(), "/");
        assert!(p("a/b").root().is_none());
        let (id, info) = unix_fs();
        let root = StoragePath::new_root(id, info);
        assert!(root.is_root());
        assert_eq!(root.as_str(), "/");
    }

    #[test]
    fn test_name_edge_cases() {
        assert_eq!(p("a/").name(), "a");
        assert_eq!(p("a//").name(), "");
        assert_eq!(p("/").name(), "");
        assert_eq!(p("/a/b.txt").name(), "b.txt");
        assert_eq!(p("plain").name(), "plain");
    }

    #[test]
    fn test_extension() {
        assert_eq!(p("/a/b.tar.gz").extension(), Some("gz"));
        assert_eq!(p("/a/b.tar.gz").name_without_extension(), "b.tar");
        assert_eq!(p("/a/b").extension(), None);
        assert_eq!(p("/a/b").name_without_extension(), "b");
        assert_eq!(p("/a/.bashrc").extension(), Some("bashrc"));
        assert_eq!(p("/a/.bashrc").name_without_extension(), "");
        assert_eq!(p("/a/file.").extension(), None);
    }

    #[test]
    fn test_extension_skips_special_segments() {
        assert_eq!(p("/a/..").name(), "..");
        assert_eq!(p("/a/..").extension(), None);
        assert_eq!(p("/a/..").name_without_extension(), "..");
        assert_eq!(p("/a/.").name_without_extension(), ".");
    }

    #[test]
    fn test_parent() {
        assert_eq!(p("/a/b").parent().unwrap().as_str(), "/a");
        assert_eq!(p("/a/b/").parent().unwrap().as_str(), "/a");
        assert_eq!(p("/a").parent().unwrap().as_str(), "/");
        assert_eq!(p("a//b").parent().unwrap().as_str(), "a");
        assert_eq!(p("//a").parent().unwrap().as_str(), "/");
        assert!(p("/").parent().is_none());
        assert!(p("//").parent().is_none());
        assert!(p("a").parent().is_none());
        assert!(p("a/").parent().is_none());
    }

    #[test]
    fn test_full_path_normalization() {
        assert_eq!(p("/a/b/../c").full_path().as_str(), "/a/c");
        assert_eq!(p("a/./b").full_path().as_str(), "/a/b");
        assert_eq!(p("//a///b").full_path().as_str(), "/a/b");
        assert_eq!(p("/a/b/").full_path().as_str(), "/a/b/");
        assert_eq!(p("/a/..").full_path().as_str(), "/");
        assert_eq!(p(".").full_path().as_str(), "/");
        assert_eq!(p("../a").full_path().as_str(), "/../a");
        assert_eq!(p("a/../../b").full_path().as_str(), "/../b");
    }

    #[test]
    fn test_full_path_canonicalizes_separators() {
        assert_eq!(win("a/b\\c").full_path().as_str(), "\\a\\b\\c");
    }

    #[test]
    fn test_append() {
        assert_eq!(p("/a").append("b").unwrap().as_str(), "/ab");
        assert_eq!(p("/a/").append("/b").unwrap().as_str(), "/a//b");
        let err = p("/a").append("\0").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_combine() {
        assert_eq!(p("/a").combine(&p("/b")).unwrap().as_str(), "/b");
        assert_eq!(p("/a").combine(&p("b")).unwrap().as_str(), "/a/b");
        assert_eq!(p("/a/").combine(&p("b")).unwrap().as_str(), "/a/b");
        assert_eq!(p("/a//").combine(&p("b")).unwrap().as_str(), "/a//b");
    }

    #[test]
    fn test_join() {
        assert_eq!(p("/a").join(&p("b")).unwrap().as_str(), "/a/b");
        assert_eq!(p("/a/").join(&p("/b")).unwrap().as_str(), "/a//b");
        assert_eq!(p("/a").join(&p("/b")).unwrap().as_str(), "/a/b");
    }

    #[test]
    fn test_link() {
        assert_eq!(p("/a//").link(&p("//b")).unwrap().as_str(), "/a/b");
        assert_eq!(p("/a").link(&p("b")).unwrap().as_str(), "/a/b");
        assert_eq!(p("/").link(&p("b")).unwrap().as_str(), "/b");
    }

    #[test]
    fn test_cross_file_system_is_error() {
        let err = p("/a").combine(&win("b")).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidArgument);
        assert_ne!(p("/a"), {
            let (id, info) = unix_fs();
            StoragePath::new(id, info, "/a").unwrap()
        });
    }

    #[test]
    fn test_trim_end_directory_separator() {
        assert_eq!(p("/a/").trim_end_directory_separator().unwrap().as_str(), "/a");
        assert_eq!(p("/a//").trim_end_directory_separator().unwrap().as_str(), "/a/");
        assert_eq!(p("/a").trim_end_directory_separator().unwrap().as_str(), "/a");
        assert_eq!(p("//").trim_end_directory_separator().unwrap().as_str(), "/");

        let err = p("/").trim_end_directory_separator().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
        assert!(p("/").try_trim_end_directory_separator().is_none());
    }

    #[test]
    fn test_string_equality_is_not_location_equality() {
        assert_ne!(p("/a"), p("/a/"));
        assert!(p("/a").effective_eq(&p("/a/")));
        assert!(p("/a/b/..").effective_eq(&p("/a")));
        assert!(p("a").effective_eq(&p("/a")));
        assert_eq!(p("/").effective_key(), "/");
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(win("\\A\\b"), win("\\a\\B"));
        assert_eq!(win("\\A\\b").effective_key(), win("/a/B/").effective_key());
        assert_ne!(p("/A"), p("/a"));
    }

    #[test]
    fn test_validate_name() {
        let info = PathInformation::unix();
        assert!(StoragePath::validate_name(&info, "file.txt").is_ok());
        assert_eq!(
            StoragePath::validate_name(&info, "").unwrap_err().kind(),
            StorageErrorKind::InvalidArgument
        );
        assert_eq!(
            StoragePath::validate_name(&info, "..").unwrap_err().kind(),
            StorageErrorKind::InvalidArgument
        );
        assert_eq!(
            StoragePath::validate_name(&info, "a/b").unwrap_err().kind(),
            StorageErrorKind::InvalidPath
        );
    }

    proptest! {
        #[test]
        fn prop_full_path_is_idempotent(s in "[ab./]{1,16}") {
            let once = p(&s).full_path();
            let twice = once.full_path();
            prop_assert_eq!(once.as_str(), twice.as_str());
        }

        #[test]
        fn prop_link_never_doubles_at_join(a in "[ab/]{1,8}", b in "[ab/]{1,8}") {
            let linked = p(&a).link(&p(&b)).unwrap();
            let left = a.trim_end_matches('/');
            let right = b.trim_start_matches('/');
            prop_assert_eq!(linked.as_str(), format!("{}/{}", left, right));
        }

        #[test]
        fn prop_combine_with_absolute_rhs_is_rhs(a in "[ab/]{1,8}", b in "/[ab/]{0,8}") {
            let combined = p(&a).combine(&p(&b)).unwrap();
            prop_assert_eq!(combined.as_str(), b.as_str());
        }
    }
}
