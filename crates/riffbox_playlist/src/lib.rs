// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playlist interpreter for Riffbox.
//!
//! This crate turns flat action lists into playable sequences:
//! - `play-song`, `number`, `loop-begin` and `end-loop` actions
//! - Loop expansion into `(action, song)` steps
//! - Lowering of validated Function trees into action lists
//! - A playback queue over the resolved steps

pub mod action;
pub mod parser;
pub mod lowering;
pub mod queue;

pub use action::{Action, ActionKind, ActionTrackPair};
pub use parser::{PlaylistError, PlaylistParser, MAX_SEQUENCE_STEPS};
pub use lowering::{compile, lower_function, LoweringError};
pub use queue::{PlaybackQueue, PlaybackState};
