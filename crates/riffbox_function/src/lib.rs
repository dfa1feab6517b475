// SPDX-License-Identifier: MIT OR Apache-2.0
//! Function expression trees for Riffbox.
//!
//! A Function is a small visual program built by dragging blocks:
//! - `play` a track
//! - `loop` a list of statements N times
//! - number expressions (literals and `+ - * /`) and track references
//!   filling the statements' sockets
//!
//! ## Architecture
//!
//! The nested tree is authoritative and edited copy-on-write. Around it sit:
//! - An identifier codec for node and drop-target IDs
//! - Flatten/rebuild into a depth-annotated list for rendering and reordering
//! - Drop projection for drag reordering
//! - Two-pass validation of untrusted trees
//! - Number evaluation and a drag-session editor

pub mod id;
pub mod node;
pub mod tree;
pub mod edit;
pub mod projection;
pub mod validation;
pub mod evaluation;
pub mod editor;

pub use id::{decode_drop_id, decode_node_id, encode_drop_id, encode_node_id, DropIdParts, NodeIdParts};
pub use node::{create_empty, ArithOperator, Arity, FunctionTree, Group, Node, NodeData, NodeKind};
pub use tree::{
    count_descendants, find_deep, find_parent_deep, flatten, rebuild, remove_children_of,
    FlatEntry, TreeError,
};
pub use edit::{insert_action, move_entry, place_expression, remove_node, update_node};
pub use projection::{get_projection, Projection, DEFAULT_INDENTATION_WIDTH};
pub use validation::{pre_validate, validate_function, validate_statement, Rejection};
pub use evaluation::{evaluate_number, evaluate_track, EvaluationError};
pub use editor::{DragOperation, FunctionEditor};
