// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lowering of Function trees into flat action lists.
//!
//! `play` becomes `play-song` carrying the play node's ID. `loop` becomes
//! `loop-begin`, `number(count)`, the lowered children, then `end-loop`.

use crate::action::{Action, ActionTrackPair};
use crate::parser::{PlaylistError, PlaylistParser};
use riffbox_function::evaluation::{evaluate_number, evaluate_track, socket, EvaluationError};
use riffbox_function::validation::{check_statement, Rejection};
use riffbox_function::{Group, Node, NodeKind};

/// Error while lowering a tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoweringError {
    /// The tree failed validation
    #[error("Invalid function: {0}")]
    Invalid(#[from] Rejection),

    /// An expression could not be evaluated
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// A loop count that is not a non-negative integer
    #[error("Loop '{id}' has repeat count {value}, expected a non-negative integer")]
    InvalidRepeatCount {
        /// Loop node ID
        id: String,
        /// Evaluated count
        value: f64,
    },

    /// The lowered list was refused by the interpreter
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// Lower a Function into a flat action list
pub fn lower_function(tree: &[Node]) -> Result<Vec<Action>, LoweringError> {
    let mut actions = Vec::new();
    for node in tree {
        check_statement(node, Group::Actions)?;
        lower_statement(node, &mut actions)?;
    }
    Ok(actions)
}

/// Lower a Function and interpret it into the playback sequence
pub fn compile(tree: &[Node]) -> Result<Vec<ActionTrackPair>, LoweringError> {
    let actions = lower_function(tree)?;
    Ok(PlaylistParser::parse(&actions)?)
}

fn lower_statement(node: &Node, actions: &mut Vec<Action>) -> Result<(), LoweringError> {
    match node.kind {
        NodeKind::Play => {
            let track_id = evaluate_track(socket(node, Group::Tracks, 0)?)?;
            actions.push(Action::play_song(track_id).with_id(node.id.clone()));
        }
        NodeKind::Loop => {
            let count = repeat_count(node)?;
            actions.push(Action::loop_begin().with_id(node.id.clone()));
            actions.push(Action::number(count).with_id(format!("{}:count", node.id)));
            for child in &node.child_nodes {
                lower_statement(child, actions)?;
            }
            actions.push(Action::end_loop().with_id(format!("{}:end", node.id)));
        }
        NodeKind::NumberLiteral | NodeKind::BinaryArith | NodeKind::TrackLiteral => {
            return Err(Rejection::KindOutsideGroup {
                id: node.id.clone(),
                kind: node.kind,
                expected: Group::Actions,
            }
            .into());
        }
    }
    Ok(())
}

fn repeat_count(node: &Node) -> Result<i64, LoweringError> {
    let value = evaluate_number(socket(node, Group::Numbers, 0)?)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(LoweringError::InvalidRepeatCount {
            id: node.id.clone(),
            value,
        })
    }
}
