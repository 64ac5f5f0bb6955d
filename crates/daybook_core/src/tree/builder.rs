//! Path tree construction.
//!
//! # Invariants
//! - Segments are keyed by exact name per depth (case-sensitive, no folding).
//! - Children keep first-seen order, so output follows input path order.
//! - Empty segments from leading, trailing or doubled `/` are skipped; a path
//!   made only of separators adds nothing.
//! - A node with at least one child is a folder, even if a journal also
//!   exists at exactly that path.

use crate::model::journal::PATH_SEPARATOR;
use serde::{Deserialize, Serialize};

/// One named node of a [`PathTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    name: String,
    children: Vec<PathNode>,
}

impl PathNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[PathNode] {
        &self.children
    }

    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }

    fn to_entry(&self) -> TreeEntry {
        TreeEntry {
            name: self.name.clone(),
            children: self
                .is_folder()
                .then(|| self.children.iter().map(PathNode::to_entry).collect()),
        }
    }
}

/// Hierarchy built from flat journal paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTree {
    roots: Vec<PathNode>,
}

impl PathTree {
    pub fn roots(&self) -> &[PathNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Array form consumed by the renderer.
    pub fn to_entries(&self) -> Vec<TreeEntry> {
        self.roots.iter().map(PathNode::to_entry).collect()
    }

    fn insert(&mut self, path: &str) {
        let mut level = &mut self.roots;
        for segment in split_path(path) {
            let index = match level.iter().position(|node| node.name == segment) {
                Some(index) => index,
                None => {
                    level.push(PathNode::new(segment));
                    level.len() - 1
                }
            };
            level = &mut level[index].children;
        }
    }
}

/// Array record of one tree node.
///
/// `children` is `None` (and omitted when serialized) for journal leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
}

impl TreeEntry {
    pub fn is_folder(&self) -> bool {
        self.children.is_some()
    }
}

/// Splits a journal path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Builds a tree from journal paths, reusing shared prefixes.
pub fn build_tree<I, P>(paths: I) -> PathTree
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    let mut tree = PathTree::default();
    for path in paths {
        tree.insert(path.as_ref());
    }
    tree
}
