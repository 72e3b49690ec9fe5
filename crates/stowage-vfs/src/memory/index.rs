//! Node index.
//!
//! One ordered map from effective path key to node. Keys are normalized,
//! rooted, trailing-separator-free and case-folded under the filesystem's
//! comparison, so a folder's subtree is always a contiguous key range
//! starting at `key + separator`.

use std::collections::BTreeMap;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use stowage_types::{ElementKind, StorageError, StorageResult, StoragePath};

use super::node::{Node, NodeBody};

#[derive(Debug)]
pub(crate) struct NodeIndex {
    nodes: BTreeMap<String, Node>,
    root_key: String,
    separator: char,
}

impl NodeIndex {
    /// An index holding only the root folder at `root`.
    pub(crate) fn new(root: StoragePath, now: SystemTime) -> Self {
        let root_key = root.effective_key();
        let separator = root.path_information().directory_separator;
        let mut nodes = BTreeMap::new();
        nodes.insert(root_key.clone(), Node::folder(root, now));
        Self {
            nodes,
            root_key,
            separator,
        }
    }

    pub(crate) fn is_root(&self, key: &str) -> bool {
        key == self.root_key
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub(crate) fn kind_of(&self, key: &str) -> Option<ElementKind> {
        self.nodes.get(key).map(Node::kind)
    }

    pub(crate) fn insert(&mut self, key: String, node: Node) {
        self.nodes.insert(key, node);
    }

    /// Key of the containing folder. `None` for the root.
    pub(crate) fn parent_key(&self, key: &str) -> Option<String> {
        if self.is_root(key) {
            return None;
        }
        match key.rfind(self.separator) {
            Some(0) | None => Some(self.root_key.clone()),
            Some(i) => Some(key[..i].to_string()),
        }
    }

    fn child_prefix(&self, key: &str) -> String {
        if self.is_root(key) {
            self.root_key.clone()
        } else {
            format!("{}{}", key, self.separator)
        }
    }

    /// True if `key` lies strictly below `ancestor`.
    pub(crate) fn is_within(&self, key: &str, ancestor: &str) -> bool {
        key != ancestor && key.starts_with(&self.child_prefix(ancestor))
    }

    fn descendants<'a>(&'a self, key: &'a str) -> impl Iterator<Item = (&'a String, &'a Node)> {
        let prefix = self.child_prefix(key);
        self.nodes
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .filter(move |(k, _)| k.as_str() != key)
    }

    /// `key` followed by every key below it, in order.
    fn subtree_keys(&self, key: &str) -> Vec<String> {
        let mut keys = Vec::new();
        if self.nodes.contains_key(key) {
            keys.push(key.to_string());
        }
        keys.extend(self.descendants(key).map(|(k, _)| k.clone()));
        keys
    }

    /// True if the node at `key`, or any file below it, has an open stream.
    pub(crate) fn subtree_in_use(&self, key: &str) -> bool {
        self.nodes.get(key).is_some_and(Node::is_in_use)
            || self.descendants(key).any(|(_, node)| node.is_in_use())
    }

    /// Remove the node at `key` and everything below it.
    pub(crate) fn remove_subtree(&mut self, key: &str) -> usize {
        let keys = self.subtree_keys(key);
        for k in &keys {
            self.nodes.remove(k);
        }
        keys.len()
    }

    /// Remove everything below `key`, keeping the node itself.
    pub(crate) fn remove_descendants(&mut self, key: &str) -> usize {
        let keys: Vec<String> = self.descendants(key).map(|(k, _)| k.clone()).collect();
        for k in &keys {
            self.nodes.remove(k);
        }
        keys.len()
    }

    fn rebase_key(&self, key: &str, from: &str, to: &str) -> String {
        let suffix = &key[from.len()..];
        if self.is_root(to) && !suffix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}{}", to, suffix)
        }
    }

    fn rebase_path(
        path: &StoragePath,
        from: &StoragePath,
        to: &StoragePath,
    ) -> StorageResult<StoragePath> {
        match path.as_str().strip_prefix(from.as_str()) {
            Some("") => Ok(to.clone()),
            Some(suffix) if !to.is_root() => to.append(suffix),
            _ => to.link_str(path.name()),
        }
    }

    /// Re-key the subtree at `from` to `to`, giving it the display path `to_path`.
    ///
    /// Every new key and path is computed before the map is touched, so a
    /// failure leaves the index unchanged.
    pub(crate) fn rekey_subtree(
        &mut self,
        from: &str,
        to: &str,
        to_path: &StoragePath,
    ) -> StorageResult<usize> {
        let from_path = self
            .nodes
            .get(from)
            .map(|n| n.path.clone())
            .ok_or_else(|| StorageError::not_found(from))?;

        let mut plan = Vec::new();
        for key in self.subtree_keys(from) {
            let Some(node) = self.nodes.get(&key) else {
                continue;
            };
            let path = Self::rebase_path(&node.path, &from_path, to_path)?;
            plan.push((key.clone(), self.rebase_key(&key, from, to), path));
        }

        let count = plan.len();
        let mut moved = Vec::with_capacity(count);
        for (old_key, new_key, path) in plan {
            if let Some(mut node) = self.nodes.remove(&old_key) {
                node.path = path;
                moved.push((new_key, node));
            }
        }
        self.nodes.extend(moved);
        Ok(count)
    }

    /// Duplicate the subtree at `from` under `to`.
    ///
    /// `cancel` is checked before each node; a cancelled copy keeps the nodes
    /// copied so far.
    pub(crate) fn copy_subtree(
        &mut self,
        from: &str,
        to: &str,
        to_path: &StoragePath,
        now: SystemTime,
        cancel: &CancellationToken,
    ) -> StorageResult<usize> {
        let from_path = self
            .nodes
            .get(from)
            .map(|n| n.path.clone())
            .ok_or_else(|| StorageError::not_found(from))?;

        let mut copied = 0;
        for key in self.subtree_keys(from) {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let Some(node) = self.nodes.get(&key) else {
                continue;
            };
            let path = Self::rebase_path(&node.path, &from_path, to_path)?;
            let copy = node.duplicate_at(path, now);
            let new_key = self.rebase_key(&key, from, to);
            self.nodes.insert(new_key, copy);
            copied += 1;
        }
        Ok(copied)
    }

    /// Display paths of the direct children of `key` with the given kind.
    pub(crate) fn children(&self, key: &str, kind: ElementKind) -> Vec<StoragePath> {
        let prefix_len = self.child_prefix(key).len();
        self.descendants(key)
            .filter(|(k, _)| !k[prefix_len..].contains(self.separator))
            .filter(|(_, node)| node.kind() == kind)
            .map(|(_, node)| node.path.clone())
            .collect()
    }

    /// Record a child change on the folder at `key`.
    pub(crate) fn touch(&mut self, key: &str, now: SystemTime) {
        if let Some(Node {
            body: NodeBody::Folder { modified },
            ..
        }) = self.nodes.get_mut(key)
        {
            *modified = Some(now);
        }
    }
}
