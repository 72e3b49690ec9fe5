//! Indexed tree entries.

use std::sync::Arc;
use std::time::SystemTime;

use stowage_types::{ElementKind, FileAttributes, StoragePath};

use super::content::ContentCell;

/// A file or folder in the tree.
///
/// `path` is the display form (normalized, no trailing separator, original
/// casing). The parent is never stored; it is derived from the index key.
#[derive(Debug)]
pub(crate) struct Node {
    pub path: StoragePath,
    pub created: SystemTime,
    pub attributes: FileAttributes,
    pub body: NodeBody,
}

#[derive(Debug)]
pub(crate) enum NodeBody {
    File { content: Arc<ContentCell> },
    Folder { modified: Option<SystemTime> },
}

impl Node {
    pub(crate) fn file(path: StoragePath, now: SystemTime) -> Self {
        Self {
            path,
            created: now,
            attributes: FileAttributes::NORMAL,
            body: NodeBody::File {
                content: Arc::new(ContentCell::new()),
            },
        }
    }

    pub(crate) fn folder(path: StoragePath, now: SystemTime) -> Self {
        Self {
            path,
            created: now,
            attributes: FileAttributes::DIRECTORY,
            body: NodeBody::Folder { modified: None },
        }
    }

    pub(crate) fn new(kind: ElementKind, path: StoragePath, now: SystemTime) -> Self {
        match kind {
            ElementKind::File => Self::file(path, now),
            ElementKind::Folder => Self::folder(path, now),
        }
    }

    pub(crate) fn kind(&self) -> ElementKind {
        match self.body {
            NodeBody::File { .. } => ElementKind::File,
            NodeBody::Folder { .. } => ElementKind::Folder,
        }
    }

    /// The content cell, for file nodes.
    pub(crate) fn content(&self) -> Option<&Arc<ContentCell>> {
        match &self.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Folder { .. } => None,
        }
    }

    /// True if this is a file with an open stream.
    pub(crate) fn is_in_use(&self) -> bool {
        self.content().is_some_and(|c| c.is_in_use())
    }

    /// A copy at `path` with fresh creation time and duplicated content.
    pub(crate) fn duplicate_at(&self, path: StoragePath, now: SystemTime) -> Self {
        let body = match &self.body {
            NodeBody::File { content } => NodeBody::File {
                content: Arc::new(content.duplicate()),
            },
            NodeBody::Folder { .. } => NodeBody::Folder { modified: None },
        };
        Self {
            path,
            created: now,
            attributes: self.attributes,
            body,
        }
    }

    /// Normalize attribute bits for this node's kind: folders always carry
    /// `DIRECTORY`, files never do, and an empty file set becomes `NORMAL`.
    pub(crate) fn normalize_attributes(&self, attributes: FileAttributes) -> FileAttributes {
        match self.kind() {
            ElementKind::Folder => attributes.with(FileAttributes::DIRECTORY),
            ElementKind::File => {
                let bits = attributes.without(FileAttributes::DIRECTORY);
                if bits.is_empty() {
                    FileAttributes::NORMAL
                } else {
                    bits
                }
            }
        }
    }
}
