// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flattening, rebuilding and searching Function trees.
//!
//! The nested tree is the source of truth. The flat list is a pre-order
//! projection of the `actions` group, recomputed after every edit and consumed
//! by list rendering and drag reordering.

use crate::node::{FunctionTree, Group, Node};
use indexmap::IndexMap;
use serde::Serialize;

/// A statement annotated with its position in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    /// The statement, including its nested content
    #[serde(flatten)]
    pub node: Node,
    /// Owning statement, `None` for top-level entries
    pub parent_id: Option<String>,
    /// Nesting depth, 0 for top-level entries
    pub depth: usize,
    /// Position among siblings
    pub index: usize,
}

impl FlatEntry {
    /// ID of the wrapped node
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Whether the wrapped node can hold child statements
    pub fn is_block(&self) -> bool {
        self.node.is_block()
    }
}

/// Errors raised by structural tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// An entry refers to a parent that has not appeared earlier in the list
    #[error("Entry '{id}' references parent '{parent_id}' before it appears")]
    UnknownParent {
        /// Entry ID
        id: String,
        /// Missing parent ID
        parent_id: String,
    },

    /// Two entries share an ID
    #[error("Duplicate node ID: {0}")]
    DuplicateId(String),

    /// No node with this ID exists
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A drop-target ID could not be decoded
    #[error("Malformed drop target: {0}")]
    MalformedDropTarget(String),

    /// A socket index is past the end of the socket list
    #[error("Node '{parent_id}' has no {group} socket at index {index}")]
    SocketOutOfRange {
        /// Node owning the sockets
        parent_id: String,
        /// Socket group
        group: Group,
        /// Requested index
        index: usize,
    },

    /// A node was placed into a slot of the wrong group
    #[error("Cannot place a {found} node where a {expected} node is expected")]
    GroupMismatch {
        /// Group the slot accepts
        expected: Group,
        /// Group of the placed node
        found: Group,
    },

    /// Statements may only be nested inside block kinds
    #[error("Node '{0}' cannot hold child statements")]
    NotABlock(String),
}

/// Flatten a statement list into pre-order entries starting at depth 0
pub fn flatten(tree: &[Node]) -> Vec<FlatEntry> {
    flatten_from(tree, None, 0)
}

/// Flatten a statement list whose entries sit under `parent_id` at `depth`.
///
/// Only block kinds contribute their children.
pub fn flatten_from(tree: &[Node], parent_id: Option<&str>, depth: usize) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    push_entries(tree, parent_id, depth, &mut entries);
    entries
}

fn push_entries(
    nodes: &[Node],
    parent_id: Option<&str>,
    depth: usize,
    entries: &mut Vec<FlatEntry>,
) {
    for (index, node) in nodes.iter().enumerate() {
        entries.push(FlatEntry {
            node: node.clone(),
            parent_id: parent_id.map(str::to_string),
            depth,
            index,
        });
        if node.is_block() {
            push_entries(&node.child_nodes, Some(&node.id), depth + 1, entries);
        }
    }
}

/// Rebuild the nested tree from pre-order entries.
///
/// Each entry's existing children are discarded and replaced by the entries that
/// name it as parent, in list order. A parent must precede its children.
pub fn rebuild(entries: &[FlatEntry]) -> Result<FunctionTree, TreeError> {
    let mut slots: Vec<Option<Node>> = Vec::with_capacity(entries.len());
    let mut children: Vec<Vec<usize>> = Vec::with_capacity(entries.len());
    let mut by_id: IndexMap<&str, usize> = IndexMap::with_capacity(entries.len());
    let mut roots = Vec::new();

    for (slot, entry) in entries.iter().enumerate() {
        match entry.parent_id.as_deref() {
            None => roots.push(slot),
            Some(parent_id) => {
                let parent = by_id.get(parent_id).copied().ok_or_else(|| {
                    TreeError::UnknownParent {
                        id: entry.node.id.clone(),
                        parent_id: parent_id.to_string(),
                    }
                })?;
                children[parent].push(slot);
            }
        }

        if by_id.insert(entry.id(), slot).is_some() {
            return Err(TreeError::DuplicateId(entry.node.id.clone()));
        }
        let mut node = entry.node.clone();
        node.child_nodes.clear();
        slots.push(Some(node));
        children.push(Vec::new());
    }

    // Children always sit after their parent, so a reverse sweep sees every
    // subtree completed before it is attached.
    for slot in (0..slots.len()).rev() {
        let attached: Vec<Node> = children[slot]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(node) = slots[slot].as_mut() {
            node.child_nodes = attached;
        }
    }

    Ok(roots.into_iter().filter_map(|slot| slots[slot].take()).collect())
}

/// Depth-first search across children, number sockets and track sockets
pub fn find_deep<'a>(tree: &'a [Node], id: &str) -> Option<&'a Node> {
    find_in(tree.iter(), id)
}

fn find_in<'a>(nodes: impl Iterator<Item = &'a Node>, id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(node.nested(), id) {
            return Some(found);
        }
    }
    None
}

/// Mutable variant of [`find_deep`]
pub fn find_deep_mut<'a>(tree: &'a mut [Node], id: &str) -> Option<&'a mut Node> {
    find_in_mut(tree.iter_mut(), id)
}

fn find_in_mut<'a>(nodes: impl Iterator<Item = &'a mut Node>, id: &str) -> Option<&'a mut Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(node.nested_mut(), id) {
            return Some(found);
        }
    }
    None
}

/// Find the node directly holding `id` in any of its slots.
///
/// Returns `None` for top-level statements and unknown IDs.
pub fn find_parent_deep<'a>(tree: &'a [Node], id: &str) -> Option<&'a Node> {
    find_parent_in(tree.iter(), id)
}

fn find_parent_in<'a>(nodes: impl Iterator<Item = &'a Node>, id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.nested().any(|child| child.id == id) {
            return Some(node);
        }
        if let Some(found) = find_parent_in(node.nested(), id) {
            return Some(found);
        }
    }
    None
}

/// Count all statements below `node` (expression sockets excluded)
pub fn count_descendants(node: &Node) -> usize {
    node.child_nodes
        .iter()
        .map(|child| 1 + count_descendants(child))
        .sum()
}

/// Drop every entry transitively parented by one of `ids`.
///
/// The roots themselves are kept.
pub fn remove_children_of(entries: &[FlatEntry], ids: &[&str]) -> Vec<FlatEntry> {
    let mut excluded: Vec<&str> = ids.to_vec();
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.parent_id.as_deref() {
            Some(parent) if excluded.contains(&parent) => excluded.push(entry.id()),
            _ => kept.push(entry.clone()),
        }
    }
    kept
}
