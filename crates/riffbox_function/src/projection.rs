// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drop projection for drag reordering.
//!
//! Given the flat list, the dragged entry, the hovered entry and the horizontal
//! pointer offset, compute the depth and parent the dragged entry would land
//! at. The list passed in must already exclude the dragged entry's
//! descendants (see [`crate::tree::remove_children_of`]), which prevents
//! dropping a node into its own subtree.

use crate::tree::FlatEntry;
use serde::Serialize;

/// Default pixels per nesting level
pub const DEFAULT_INDENTATION_WIDTH: f32 = 50.0;

/// Where a dragged entry would land
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Landing depth
    pub depth: usize,
    /// Deepest legal depth at this position
    pub max_depth: usize,
    /// Shallowest legal depth at this position
    pub min_depth: usize,
    /// Landing parent, `None` for top level
    pub parent_id: Option<String>,
}

/// Nesting levels implied by a horizontal offset, rounded half up.
///
/// A non-positive or non-finite indentation width yields 0.
pub fn drag_depth(offset: f32, indentation_width: f32) -> isize {
    if !offset.is_finite() || !indentation_width.is_finite() || indentation_width <= 0.0 {
        return 0;
    }
    (offset / indentation_width + 0.5).floor() as isize
}

/// Copy of `items` with the element at `from` moved to `to`.
///
/// Out-of-range indices leave the order unchanged.
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from < moved.len() && to < moved.len() {
        let item = moved.remove(from);
        moved.insert(to, item);
    }
    moved
}

/// Project a drag of `active_id` over `over_id`.
///
/// Returns `None` when either ID is not in `entries`.
pub fn get_projection(
    entries: &[FlatEntry],
    active_id: &str,
    over_id: &str,
    drag_offset: f32,
    indentation_width: f32,
) -> Option<Projection> {
    let over_index = entries.iter().position(|e| e.id() == over_id)?;
    let active_index = entries.iter().position(|e| e.id() == active_id)?;
    let active = &entries[active_index];

    let refs: Vec<&FlatEntry> = entries.iter().collect();
    let moved = array_move(&refs, active_index, over_index);
    let previous = over_index.checked_sub(1).map(|i| moved[i]);
    let next = moved.get(over_index + 1).copied();

    let projected = active.depth as isize + drag_depth(drag_offset, indentation_width);
    let max_depth = previous.map_or(0, |prev| {
        if prev.is_block() {
            prev.depth + 1
        } else {
            prev.depth
        }
    });
    let min_depth = next.map_or(0, |next| next.depth);

    let depth = if projected >= max_depth as isize {
        max_depth
    } else if projected < min_depth as isize {
        min_depth
    } else {
        projected as usize
    };

    let parent_id = match previous {
        Some(prev) if depth > 0 => {
            if depth == prev.depth {
                prev.parent_id.clone()
            } else if depth > prev.depth {
                Some(prev.id().to_string())
            } else {
                moved[..over_index]
                    .iter()
                    .rev()
                    .find(|e| e.depth == depth)
                    .and_then(|e| e.parent_id.clone())
            }
        }
        _ => None,
    };

    tracing::trace!(
        active_id,
        over_id,
        projected,
        depth,
        min_depth,
        max_depth,
        parent = parent_id.as_deref().unwrap_or("<root>"),
        "projected drop"
    );

    Some(Projection {
        depth,
        max_depth,
        min_depth,
        parent_id,
    })
}
