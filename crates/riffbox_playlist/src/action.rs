// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat action model.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One instruction in a flat action list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action ID
    pub id: String,
    /// Instruction and payload
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Instruction kind with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Play one song
    PlaySong {
        /// Song to play
        #[serde(rename = "songId")]
        song_id: String,
    },
    /// Integer literal, only valid as a loop's repeat count
    Number {
        /// Literal value
        value: i64,
    },
    /// Open a loop; the next action carries the repeat count
    LoopBegin,
    /// Close the innermost loop
    EndLoop,
    /// Reserved
    Condition,
    /// Reserved
    EndCondition,
}

impl ActionKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlaySong { .. } => "play-song",
            Self::Number { .. } => "number",
            Self::LoopBegin => "loop-begin",
            Self::EndLoop => "end-loop",
            Self::Condition => "condition",
            Self::EndCondition => "end-condition",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    /// Create an action with a fresh ID
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
        }
    }

    /// A `play-song` action
    pub fn play_song(song_id: impl Into<String>) -> Self {
        Self::new(ActionKind::PlaySong {
            song_id: song_id.into(),
        })
    }

    /// A `number` action
    pub fn number(value: i64) -> Self {
        Self::new(ActionKind::Number { value })
    }

    /// A `loop-begin` action
    pub fn loop_begin() -> Self {
        Self::new(ActionKind::LoopBegin)
    }

    /// An `end-loop` action
    pub fn end_loop() -> Self {
        Self::new(ActionKind::EndLoop)
    }

    /// Replace the ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// One resolved playback step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTrackPair {
    /// Action that produced this step
    pub action_id: String,
    /// Song to play
    pub song_id: String,
}

impl ActionTrackPair {
    /// Create a pair
    pub fn new(action_id: impl Into<String>, song_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            song_id: song_id.into(),
        }
    }
}
