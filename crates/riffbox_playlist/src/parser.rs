// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat action list interpreter.
//!
//! A single left-to-right pass with a stack of open loop frames. Songs played
//! inside a loop are buffered in the innermost frame; closing the loop emits
//! the buffered segment once per repetition into the enclosing frame (or the
//! output, at top level). Originating action IDs are kept on every copy.

use crate::action::{Action, ActionKind, ActionTrackPair};

/// Upper bound on the number of steps a parse may produce
pub const MAX_SEQUENCE_STEPS: usize = 1 << 20;

/// Error while interpreting an action list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaylistError {
    /// A `loop-begin` is not immediately followed by a `number`
    #[error("Loop '{loop_id}' must be followed by a number action, found {found}")]
    MissingRepeatCount {
        /// The `loop-begin` action
        loop_id: String,
        /// What followed instead
        found: String,
    },

    /// A `number` outside the repeat-count position
    #[error("Number action '{0}' does not follow a loop-begin")]
    UnexpectedNumber(String),

    /// A repeat count below zero
    #[error("Number action '{id}' has negative repeat count {value}")]
    NegativeRepeatCount {
        /// The `number` action
        id: String,
        /// The count
        value: i64,
    },

    /// An `end-loop` with no open loop
    #[error("End-loop action '{0}' has no matching loop-begin")]
    UnmatchedEndLoop(String),

    /// A loop still open at the end of input
    #[error("Loop '{0}' is never closed")]
    UnclosedLoop(String),

    /// Expanding a loop would exceed [`MAX_SEQUENCE_STEPS`]
    #[error("Loop '{loop_id}' repeated {count} times exceeds {} steps", MAX_SEQUENCE_STEPS)]
    RepeatOverflow {
        /// The `loop-begin` action
        loop_id: String,
        /// Requested repeat count
        count: usize,
    },

    /// A reserved action kind
    #[error("Action '{id}' of type '{kind}' is not supported")]
    Unsupported {
        /// Action ID
        id: String,
        /// Action kind
        kind: String,
    },
}

#[derive(Debug, Clone)]
struct LoopFrame {
    loop_id: String,
    count: usize,
    segment: Vec<ActionTrackPair>,
}

/// Incremental interpreter state
#[derive(Debug, Clone, Default)]
pub struct PlaylistParser {
    output: Vec<ActionTrackPair>,
    frames: Vec<LoopFrame>,
    awaiting_count: Option<String>,
}

impl PlaylistParser {
    /// Create an empty parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret a whole action list
    pub fn parse(actions: &[Action]) -> Result<Vec<ActionTrackPair>, PlaylistError> {
        let mut parser = Self::new();
        for action in actions {
            parser.feed(action)?;
        }
        let sequence = parser.finish()?;
        tracing::info!(actions = actions.len(), steps = sequence.len(), "playlist parsed");
        Ok(sequence)
    }

    /// Number of loops currently open
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Consume one action
    pub fn feed(&mut self, action: &Action) -> Result<(), PlaylistError> {
        if let Some(loop_id) = self.awaiting_count.take() {
            let ActionKind::Number { value } = action.kind else {
                return Err(PlaylistError::MissingRepeatCount {
                    loop_id,
                    found: format!("'{}'", action.kind),
                });
            };
            let count = usize::try_from(value).map_err(|_| PlaylistError::NegativeRepeatCount {
                id: action.id.clone(),
                value,
            })?;
            self.frames.push(LoopFrame {
                loop_id,
                count,
                segment: Vec::new(),
            });
            return Ok(());
        }

        match &action.kind {
            ActionKind::PlaySong { song_id } => {
                self.emit(std::iter::once(ActionTrackPair::new(&action.id, song_id)));
            }
            ActionKind::Number { .. } => {
                return Err(PlaylistError::UnexpectedNumber(action.id.clone()));
            }
            ActionKind::LoopBegin => self.awaiting_count = Some(action.id.clone()),
            ActionKind::EndLoop => {
                let frame = self
                    .frames
                    .pop()
                    .ok_or_else(|| PlaylistError::UnmatchedEndLoop(action.id.clone()))?;
                tracing::trace!(
                    loop_id = %frame.loop_id,
                    count = frame.count,
                    segment = frame.segment.len(),
                    "loop closed"
                );
                if frame.segment.is_empty() || frame.count == 0 {
                    return Ok(());
                }
                let target = self.target();
                let total = frame
                    .segment
                    .len()
                    .checked_mul(frame.count)
                    .and_then(|steps| steps.checked_add(target.len()))
                    .filter(|&steps| steps <= MAX_SEQUENCE_STEPS)
                    .ok_or_else(|| PlaylistError::RepeatOverflow {
                        loop_id: frame.loop_id.clone(),
                        count: frame.count,
                    })?;
                target.reserve_exact(total - target.len());
                for _ in 0..frame.count {
                    target.extend_from_slice(&frame.segment);
                }
            }
            ActionKind::Condition | ActionKind::EndCondition => {
                return Err(PlaylistError::Unsupported {
                    id: action.id.clone(),
                    kind: action.kind.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Finish parsing and return the resolved sequence
    pub fn finish(self) -> Result<Vec<ActionTrackPair>, PlaylistError> {
        if let Some(loop_id) = self.awaiting_count {
            return Err(PlaylistError::MissingRepeatCount {
                loop_id,
                found: "end of input".to_string(),
            });
        }
        if let Some(frame) = self.frames.last() {
            return Err(PlaylistError::UnclosedLoop(frame.loop_id.clone()));
        }
        Ok(self.output)
    }

    fn emit(&mut self, pairs: impl IntoIterator<Item = ActionTrackPair>) {
        self.target().extend(pairs);
    }

    /// Innermost open segment, or the output at top level
    fn target(&mut self) -> &mut Vec<ActionTrackPair> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.segment,
            None => &mut self.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, song_id: &str) -> Action {
        Action::play_song(song_id).with_id(id)
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<ActionTrackPair> {
        expected
            .iter()
            .map(|(action_id, song_id)| ActionTrackPair::new(*action_id, *song_id))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(PlaylistParser::parse(&[]), Ok(Vec::new()));
    }

    #[test]
    fn test_flat_pass_through() {
        let actions = vec![song("1", "A"), song("2", "B"), song("3", "C")];
        assert_eq!(
            PlaylistParser::parse(&actions),
            Ok(pairs(&[("1", "A"), ("2", "B"), ("3", "C")]))
        );
    }

    #[test]
    fn test_loop_expansion() {
        let actions = vec![
            Action::loop_begin(),
            Action::number(3),
            song("p", "A"),
            Action::end_loop(),
        ];
        assert_eq!(
            PlaylistParser::parse(&actions),
            Ok(pairs(&[("p", "A"), ("p", "A"), ("p", "A")]))
        );
    }

    #[test]
    fn test_nested_loops() {
        let actions = vec![
            song("intro", "I"),
            Action::loop_begin(),
            Action::number(2),
            song("v", "V"),
            Action::loop_begin(),
            Action::number(2),
            song("h", "H"),
            Action::end_loop(),
            Action::end_loop(),
            song("outro", "O"),
        ];
        assert_eq!(
            PlaylistParser::parse(&actions),
            Ok(pairs(&[
                ("intro", "I"),
                ("v", "V"),
                ("h", "H"),
                ("h", "H"),
                ("v", "V"),
                ("h", "H"),
                ("h", "H"),
                ("outro", "O"),
            ]))
        );
    }

    #[test]
    fn test_zero_and_single_repeat() {
        let zero = vec![Action::loop_begin(), Action::number(0), song("p", "A"), Action::end_loop()];
        assert_eq!(PlaylistParser::parse(&zero), Ok(Vec::new()));

        let once = vec![Action::loop_begin(), Action::number(1), song("p", "A"), Action::end_loop()];
        assert_eq!(PlaylistParser::parse(&once), Ok(pairs(&[("p", "A")])));
    }

    #[test]
    fn test_bare_number_fails() {
        let actions = vec![song("1", "A"), Action::number(2).with_id("n")];
        assert_eq!(
            PlaylistParser::parse(&actions),
            Err(PlaylistError::UnexpectedNumber("n".to_string()))
        );

        let inside = vec![
            Action::loop_begin(),
            Action::number(2),
            song("1", "A"),
            Action::number(2).with_id("n2"),
            Action::end_loop(),
        ];
        assert_eq!(
            PlaylistParser::parse(&inside),
            Err(PlaylistError::UnexpectedNumber("n2".to_string()))
        );
    }

    #[test]
    fn test_unmatched_end_loop_fails() {
        let actions = vec![song("1", "A"), Action::end_loop().with_id("e")];
        assert_eq!(
            PlaylistParser::parse(&actions),
            Err(PlaylistError::UnmatchedEndLoop("e".to_string()))
        );
    }

    #[test]
    fn test_missing_repeat_count_fails() {
        let actions = vec![Action::loop_begin().with_id("l"), song("1", "A"), Action::end_loop()];
        assert!(matches!(
            PlaylistParser::parse(&actions),
            Err(PlaylistError::MissingRepeatCount { loop_id, .. }) if loop_id == "l"
        ));
        assert!(matches!(
            PlaylistParser::parse(&[Action::loop_begin()]),
            Err(PlaylistError::MissingRepeatCount { .. })
        ));
    }

    #[test]
    fn test_unclosed_and_negative_fail() {
        let unclosed = vec![Action::loop_begin().with_id("l"), Action::number(2), song("1", "A")];
        assert_eq!(
            PlaylistParser::parse(&unclosed),
            Err(PlaylistError::UnclosedLoop("l".to_string()))
        );

        let negative = vec![Action::loop_begin(), Action::number(-1).with_id("n"), Action::end_loop()];
        assert_eq!(
            PlaylistParser::parse(&negative),
            Err(PlaylistError::NegativeRepeatCount {
                id: "n".to_string(),
                value: -1,
            })
        );
    }

    #[test]
    fn test_huge_count_over_empty_body() {
        let actions = vec![Action::loop_begin(), Action::number(1 << 34), Action::end_loop()];
        assert_eq!(PlaylistParser::parse(&actions), Ok(Vec::new()));

        let nested = vec![
            Action::loop_begin(),
            Action::number(i64::MAX),
            Action::loop_begin(),
            Action::number(0),
            song("p", "A"),
            Action::end_loop(),
            Action::end_loop(),
        ];
        assert_eq!(PlaylistParser::parse(&nested), Ok(Vec::new()));
    }

    #[test]
    fn test_repeat_overflow_fails() {
        let huge = vec![
            Action::loop_begin().with_id("l"),
            Action::number(i64::MAX),
            song("p", "A"),
            song("q", "B"),
            Action::end_loop(),
        ];
        assert!(matches!(
            PlaylistParser::parse(&huge),
            Err(PlaylistError::RepeatOverflow { loop_id, .. }) if loop_id == "l"
        ));

        let limit = MAX_SEQUENCE_STEPS as i64;
        let at_limit = vec![Action::loop_begin(), Action::number(limit), song("p", "A"), Action::end_loop()];
        assert_eq!(PlaylistParser::parse(&at_limit).map(|s| s.len()), Ok(MAX_SEQUENCE_STEPS));

        let past_limit = vec![
            song("intro", "I"),
            Action::loop_begin(),
            Action::number(limit),
            song("p", "A"),
            Action::end_loop(),
        ];
        assert!(matches!(
            PlaylistParser::parse(&past_limit),
            Err(PlaylistError::RepeatOverflow { .. })
        ));
    }

    #[test]
    fn test_reserved_kinds_fail() {
        let actions = vec![Action::new(ActionKind::Condition).with_id("c")];
        assert!(matches!(
            PlaylistParser::parse(&actions),
            Err(PlaylistError::Unsupported { id, .. }) if id == "c"
        ));
    }

    #[test]
    fn test_incremental_depth() {
        let mut parser = PlaylistParser::new();
        parser.feed(&Action::loop_begin()).unwrap();
        assert_eq!(parser.depth(), 0);
        parser.feed(&Action::number(2)).unwrap();
        assert_eq!(parser.depth(), 1);
        parser.feed(&song("p", "A")).unwrap();
        parser.feed(&Action::end_loop()).unwrap();
        assert_eq!(parser.depth(), 0);
        assert_eq!(parser.finish(), Ok(pairs(&[("p", "A"), ("p", "A")])));
    }
}
