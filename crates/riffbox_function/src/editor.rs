// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drag session state for a Function being edited.
//!
//! [`FunctionEditor`] owns the authoritative tree and consumes sensor events
//! (active ID, hovered ID, horizontal pointer delta). The flat list and drop
//! projection are recomputed from the committed tree on every query.

use crate::edit;
use crate::node::{FunctionTree, Node};
use crate::projection::{get_projection, Projection, DEFAULT_INDENTATION_WIDTH};
use crate::tree::{count_descendants, find_deep, flatten, remove_children_of, FlatEntry, TreeError};

/// Current drag operation
#[derive(Debug, Clone, PartialEq)]
pub enum DragOperation {
    /// Not dragging
    None,
    /// Reordering a statement
    Reorder {
        /// Dragged entry
        active_id: String,
        /// Hovered entry, `None` while outside the list
        over_id: Option<String>,
        /// Horizontal pointer displacement since the drag started
        offset_x: f32,
    },
}

/// Editor state for one Function
#[derive(Debug, Clone)]
pub struct FunctionEditor {
    tree: FunctionTree,
    /// Pixels per nesting level
    pub indentation_width: f32,
    drag_op: DragOperation,
    revision: u64,
}

impl Default for FunctionEditor {
    fn default() -> Self {
        Self::new(FunctionTree::new())
    }
}

impl FunctionEditor {
    /// Create an editor over `tree`
    pub fn new(tree: FunctionTree) -> Self {
        Self {
            tree,
            indentation_width: DEFAULT_INDENTATION_WIDTH,
            drag_op: DragOperation::None,
            revision: 0,
        }
    }

    /// Set the indentation width
    pub fn with_indentation_width(mut self, width: f32) -> Self {
        self.indentation_width = width;
        self
    }

    /// The committed tree
    pub fn tree(&self) -> &[Node] {
        &self.tree
    }

    /// Consume the editor, returning the committed tree
    pub fn into_tree(self) -> FunctionTree {
        self.tree
    }

    /// Number of committed edits
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current drag operation
    pub fn drag_op(&self) -> &DragOperation {
        &self.drag_op
    }

    /// ID of the entry being dragged
    pub fn active_id(&self) -> Option<&str> {
        match &self.drag_op {
            DragOperation::Reorder { active_id, .. } => Some(active_id),
            DragOperation::None => None,
        }
    }

    /// The list to render. While dragging, the dragged entry's descendants are
    /// left out.
    pub fn entries(&self) -> Vec<FlatEntry> {
        let entries = flatten(&self.tree);
        match self.active_id() {
            Some(active_id) => remove_children_of(&entries, &[active_id]),
            None => entries,
        }
    }

    /// Start dragging `active_id`
    pub fn begin_drag(&mut self, active_id: &str) -> Result<(), TreeError> {
        if !flatten(&self.tree).iter().any(|e| e.id() == active_id) {
            return Err(TreeError::NodeNotFound(active_id.to_string()));
        }
        tracing::debug!(active_id, "drag started");
        self.drag_op = DragOperation::Reorder {
            active_id: active_id.to_string(),
            over_id: Some(active_id.to_string()),
            offset_x: 0.0,
        };
        Ok(())
    }

    /// Record the hovered entry and cumulative pointer delta
    pub fn drag_move(&mut self, over_id: Option<&str>, delta_x: f32) {
        if let DragOperation::Reorder {
            over_id: over,
            offset_x,
            ..
        } = &mut self.drag_op
        {
            *over = over_id.map(str::to_string);
            *offset_x = delta_x;
        }
    }

    /// Where the dragged entry would land if dropped now
    pub fn projection(&self) -> Option<Projection> {
        match &self.drag_op {
            DragOperation::Reorder {
                active_id,
                over_id: Some(over_id),
                offset_x,
            } => get_projection(
                &self.entries(),
                active_id,
                over_id,
                *offset_x,
                self.indentation_width,
            ),
            _ => None,
        }
    }

    /// Number of statements carried along with the dragged entry
    pub fn dragged_descendants(&self) -> Option<usize> {
        let active_id = self.active_id()?;
        find_deep(&self.tree, active_id).map(count_descendants)
    }

    /// Drop the dragged entry at its projected position.
    ///
    /// Returns `Ok(false)` when nothing was committed.
    pub fn end_drag(&mut self) -> Result<bool, TreeError> {
        let projection = self.projection();
        let DragOperation::Reorder {
            active_id, over_id, ..
        } = std::mem::replace(&mut self.drag_op, DragOperation::None)
        else {
            return Ok(false);
        };
        let (Some(over_id), Some(projection)) = (over_id, projection) else {
            tracing::warn!(active_id = %active_id, "drag dropped outside the list");
            return Ok(false);
        };

        let tree = edit::move_entry(&self.tree, &active_id, &over_id, &projection)?;
        tracing::debug!(
            active_id = %active_id,
            over_id = %over_id,
            depth = projection.depth,
            parent = projection.parent_id.as_deref().unwrap_or("<root>"),
            "drag committed"
        );
        self.commit(tree);
        Ok(true)
    }

    /// Abandon the drag without changing the tree
    pub fn cancel_drag(&mut self) {
        if let Some(active_id) = self.active_id() {
            tracing::debug!(active_id, "drag cancelled");
        }
        self.drag_op = DragOperation::None;
    }

    /// Replace node `id` with `f(node)`
    pub fn update_node(&mut self, id: &str, f: impl FnOnce(&Node) -> Node) -> Result<(), TreeError> {
        let tree = edit::update_node(&self.tree, id, f)?;
        self.commit(tree);
        Ok(())
    }

    /// Remove node `id`, returning it
    pub fn remove_node(&mut self, id: &str) -> Result<Node, TreeError> {
        let (tree, removed) = edit::remove_node(&self.tree, id)?;
        self.commit(tree);
        Ok(removed)
    }

    /// Insert a statement under `parent_id` at `index`
    pub fn insert_action(
        &mut self,
        parent_id: Option<&str>,
        index: usize,
        node: Node,
    ) -> Result<(), TreeError> {
        let tree = edit::insert_action(&self.tree, parent_id, index, node)?;
        self.commit(tree);
        Ok(())
    }

    /// Fill the socket addressed by `drop_id`
    pub fn place_expression(&mut self, drop_id: &str, expression: Node) -> Result<(), TreeError> {
        let tree = edit::place_expression(&self.tree, drop_id, expression)?;
        self.commit(tree);
        Ok(())
    }

    fn commit(&mut self, tree: FunctionTree) {
        self.tree = tree;
        self.revision += 1;
        tracing::trace!(revision = self.revision, "tree committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::encode_drop_id;
    use crate::node::{Group, NodeKind};

    fn editor() -> FunctionEditor {
        FunctionEditor::new(vec![
            Node::play("one").with_id("a"),
            Node::loop_block(
                Node::number_literal(2.0),
                vec![Node::play("two").with_id("b"), Node::play("three").with_id("c")],
            )
            .with_id("loop"),
            Node::play("four").with_id("d"),
        ])
    }

    fn ids(entries: &[FlatEntry]) -> Vec<&str> {
        entries.iter().map(FlatEntry::id).collect()
    }

    #[test]
    fn test_drag_hides_descendants() {
        let mut editor = editor();
        editor.begin_drag("loop").unwrap();
        assert_eq!(ids(&editor.entries()), vec!["a", "loop", "d"]);
        assert_eq!(editor.dragged_descendants(), Some(2));

        editor.cancel_drag();
        assert_eq!(ids(&editor.entries()), vec!["a", "loop", "b", "c", "d"]);
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn test_drag_commits_projection() {
        let mut editor = editor();
        editor.begin_drag("d").unwrap();
        editor.drag_move(Some("c"), 60.0);
        let projection = editor.projection().unwrap();
        assert_eq!(projection.parent_id.as_deref(), Some("loop"));

        assert_eq!(editor.end_drag(), Ok(true));
        assert_eq!(editor.revision(), 1);
        assert_eq!(editor.tree().len(), 2);
        assert_eq!(editor.tree()[1].child_nodes.len(), 3);
        assert_eq!(editor.drag_op(), &DragOperation::None);
    }

    #[test]
    fn test_drop_outside_list() {
        let mut editor = editor();
        editor.begin_drag("a").unwrap();
        editor.drag_move(None, 0.0);
        assert!(editor.projection().is_none());
        assert_eq!(editor.end_drag(), Ok(false));
        assert_eq!(editor.revision(), 0);
        assert_eq!(editor.end_drag(), Ok(false));
    }

    #[test]
    fn test_cannot_drag_unknown_or_expression() {
        let mut editor = editor();
        assert!(editor.begin_drag("missing").is_err());
        let track_id = editor.tree()[0].track_expressions[0].as_ref().unwrap().id.clone();
        assert!(editor.begin_drag(&track_id).is_err());
        assert!(editor.active_id().is_none());
    }

    #[test]
    fn test_edits_bump_revision() {
        let mut editor = FunctionEditor::default();
        let looped = Node::create_empty(NodeKind::Loop).with_id("l");
        editor.insert_action(None, 0, looped).unwrap();
        editor
            .place_expression(&encode_drop_id(Group::Numbers, 0, "l"), Node::number_literal(3.0))
            .unwrap();
        editor.insert_action(Some("l"), 0, Node::play("x").with_id("p")).unwrap();
        editor
            .update_node("p", |n| Node::play("y").with_id(n.id.clone()))
            .unwrap();
        let removed = editor.remove_node("p").unwrap();
        assert_eq!(removed.id, "p");
        assert_eq!(editor.revision(), 5);
        assert!(editor.remove_node("p").is_err());
        assert_eq!(editor.revision(), 5);
    }
}
