// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy-on-write edits.
//!
//! Every edit takes the current tree by reference and returns a new tree; the
//! input is never modified, so earlier revisions stay comparable.

use crate::id::decode_drop_id;
use crate::node::{FunctionTree, Group, Node};
use crate::projection::{array_move, Projection};
use crate::tree::{find_deep, find_deep_mut, flatten, rebuild, remove_children_of, TreeError};

/// Return a copy of `tree` with node `id` replaced by `f(node)`
pub fn update_node(
    tree: &[Node],
    id: &str,
    f: impl FnOnce(&Node) -> Node,
) -> Result<FunctionTree, TreeError> {
    let mut next = tree.to_vec();
    let target =
        find_deep_mut(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    *target = f(target);
    Ok(next)
}

/// Return a copy of `tree` without node `id`, and the removed node.
///
/// Statements are removed from their list; expressions leave an empty socket.
pub fn remove_node(tree: &[Node], id: &str) -> Result<(FunctionTree, Node), TreeError> {
    let mut next = tree.to_vec();
    let removed = take_from(&mut next, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    Ok((next, removed))
}

fn take_from(nodes: &mut Vec<Node>, id: &str) -> Option<Node> {
    if let Some(position) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(position));
    }
    nodes.iter_mut().find_map(|node| take_nested(node, id))
}

fn take_nested(node: &mut Node, id: &str) -> Option<Node> {
    if let Some(found) = take_from(&mut node.child_nodes, id) {
        return Some(found);
    }
    for socket in node
        .number_expressions
        .iter_mut()
        .chain(node.track_expressions.iter_mut())
    {
        if socket.as_ref().is_some_and(|n| n.id == id) {
            return socket.take();
        }
        if let Some(found) = socket.as_mut().and_then(|n| take_nested(n, id)) {
            return Some(found);
        }
    }
    None
}

/// Insert a statement at `index` under `parent_id` (top level when `None`).
///
/// `index` is clamped to the end of the sibling list.
pub fn insert_action(
    tree: &[Node],
    parent_id: Option<&str>,
    index: usize,
    node: Node,
) -> Result<FunctionTree, TreeError> {
    if node.group != Group::Actions {
        return Err(TreeError::GroupMismatch {
            expected: Group::Actions,
            found: node.group,
        });
    }
    if find_deep(tree, &node.id).is_some() {
        return Err(TreeError::DuplicateId(node.id));
    }

    let mut next = tree.to_vec();
    let siblings = match parent_id {
        None => &mut next,
        Some(parent_id) => {
            let parent = find_deep_mut(&mut next, parent_id)
                .ok_or_else(|| TreeError::NodeNotFound(parent_id.to_string()))?;
            if !parent.is_block() {
                return Err(TreeError::NotABlock(parent_id.to_string()));
            }
            &mut parent.child_nodes
        }
    };
    let index = index.min(siblings.len());
    siblings.insert(index, node);
    Ok(next)
}

/// Fill the socket addressed by `drop_id` (`group_index_parentId`) with `expression`.
///
/// Any expression already in the socket is replaced.
pub fn place_expression(
    tree: &[Node],
    drop_id: &str,
    expression: Node,
) -> Result<FunctionTree, TreeError> {
    let parts = decode_drop_id(drop_id);
    let (group, index, parent_id) = parts
        .complete()
        .ok_or_else(|| TreeError::MalformedDropTarget(drop_id.to_string()))?;
    if expression.group != group {
        return Err(TreeError::GroupMismatch {
            expected: group,
            found: expression.group,
        });
    }

    let mut next = tree.to_vec();
    let parent = find_deep_mut(&mut next, parent_id)
        .ok_or_else(|| TreeError::NodeNotFound(parent_id.to_string()))?;
    let sockets = parent
        .sockets_mut(group)
        .ok_or_else(|| TreeError::MalformedDropTarget(drop_id.to_string()))?;
    let socket = sockets
        .get_mut(index)
        .ok_or_else(|| TreeError::SocketOutOfRange {
            parent_id: parent_id.to_string(),
            group,
            index,
        })?;
    *socket = Some(expression);
    Ok(next)
}

/// Apply a drop: move `active_id` and its subtree onto `over_id`'s position
/// with the projected parent.
pub fn move_entry(
    tree: &[Node],
    active_id: &str,
    over_id: &str,
    projection: &Projection,
) -> Result<FunctionTree, TreeError> {
    let entries = flatten(tree);
    let active_index = entries
        .iter()
        .position(|e| e.id() == active_id)
        .ok_or_else(|| TreeError::NodeNotFound(active_id.to_string()))?;
    let active_depth = entries[active_index].depth;

    let visible = remove_children_of(&entries, &[active_id]);
    let subtree: Vec<_> = entries[active_index + 1..]
        .iter()
        .take_while(|e| e.depth > active_depth)
        .cloned()
        .collect();

    let from = visible
        .iter()
        .position(|e| e.id() == active_id)
        .ok_or_else(|| TreeError::NodeNotFound(active_id.to_string()))?;
    let to = visible
        .iter()
        .position(|e| e.id() == over_id)
        .ok_or_else(|| TreeError::NodeNotFound(over_id.to_string()))?;

    let mut moved = array_move(&visible, from, to);
    moved[to].depth = projection.depth;
    moved[to].parent_id = projection.parent_id.clone();

    let shift = projection.depth as isize - active_depth as isize;
    let tail = moved.split_off(to + 1);
    moved.extend(subtree.into_iter().map(|mut entry| {
        entry.depth = (entry.depth as isize + shift).max(0) as usize;
        entry
    }));
    moved.extend(tail);

    rebuild(&moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::encode_drop_id;
    use crate::node::NodeKind;
    use crate::projection::get_projection;

    fn tree() -> FunctionTree {
        vec![
            Node::play("one").with_id("a"),
            Node::loop_block(
                Node::number_literal(2.0),
                vec![Node::play("two").with_id("b"), Node::play("three").with_id("c")],
            )
            .with_id("loop"),
            Node::play("four").with_id("d"),
        ]
    }

    fn ids(tree: &[Node]) -> Vec<(String, usize)> {
        flatten(tree)
            .into_iter()
            .map(|e| (e.node.id, e.depth))
            .collect()
    }

    #[test]
    fn test_update_leaves_input_untouched() {
        let original = tree();
        let snapshot = original.clone();
        let edited =
            update_node(&original, "b", |n| Node::play("new").with_id(n.id.clone())).unwrap();
        assert_ne!(edited, original);
        assert_eq!(original, snapshot);
        assert!(update_node(&original, "zzz", Node::clone).is_err());
    }

    #[test]
    fn test_remove_statement_and_expression() {
        let original = tree();
        let (without, removed) = remove_node(&original, "c").unwrap();
        assert_eq!(removed.id, "c");
        assert_eq!(find_deep(&without, "loop").unwrap().child_nodes.len(), 1);

        let track_id = original[0].track_expressions[0].as_ref().unwrap().id.clone();
        let (emptied, _) = remove_node(&original, &track_id).unwrap();
        assert_eq!(emptied[0].track_expressions, vec![None]);
    }

    #[test]
    fn test_insert_action() {
        let original = tree();
        let inserted =
            insert_action(&original, Some("loop"), 99, Node::play("five").with_id("e")).unwrap();
        let entry_ids: Vec<String> = ids(&inserted).into_iter().map(|(id, _)| id).collect();
        assert_eq!(entry_ids, vec!["a", "loop", "b", "c", "e", "d"]);

        assert_eq!(
            insert_action(&original, Some("a"), 0, Node::play("x")),
            Err(TreeError::NotABlock("a".to_string()))
        );
        assert!(matches!(
            insert_action(&original, None, 0, Node::number_literal(1.0)),
            Err(TreeError::GroupMismatch { .. })
        ));
    }

    #[test]
    fn test_place_expression() {
        let original = vec![Node::create_empty(NodeKind::Loop).with_id("actions_loop_x_y")];
        let drop_id = encode_drop_id(Group::Numbers, 0, "actions_loop_x_y");
        let filled = place_expression(&original, &drop_id, Node::number_literal(4.0)).unwrap();
        assert!(filled[0].number_expressions[0].is_some());
        assert!(original[0].number_expressions[0].is_none());

        let out_of_range = encode_drop_id(Group::Numbers, 3, "actions_loop_x_y");
        assert!(matches!(
            place_expression(&original, &out_of_range, Node::number_literal(4.0)),
            Err(TreeError::SocketOutOfRange { index: 3, .. })
        ));
        assert!(matches!(
            place_expression(&original, &drop_id, Node::track_literal("t")),
            Err(TreeError::GroupMismatch { .. })
        ));
        assert!(matches!(
            place_expression(&original, "numbers", Node::number_literal(1.0)),
            Err(TreeError::MalformedDropTarget(_))
        ));
    }

    #[test]
    fn test_move_entry_into_loop() {
        let original = tree();
        let entries = flatten(&original);
        let projection = get_projection(&entries, "d", "c", 50.0, 50.0).unwrap();
        assert_eq!(projection.parent_id.as_deref(), Some("loop"));

        let moved = move_entry(&original, "d", "c", &projection).unwrap();
        assert_eq!(
            ids(&moved),
            vec![
                ("a".to_string(), 0),
                ("loop".to_string(), 0),
                ("b".to_string(), 1),
                ("d".to_string(), 1),
                ("c".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_move_entry_carries_subtree() {
        let original = tree();
        let entries = remove_children_of(&flatten(&original), &["loop"]);
        let projection = get_projection(&entries, "loop", "a", 0.0, 50.0).unwrap();
        let moved = move_entry(&original, "loop", "a", &projection).unwrap();
        assert_eq!(
            ids(&moved),
            vec![
                ("loop".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 1),
                ("a".to_string(), 0),
                ("d".to_string(), 0),
            ]
        );
    }
}
