// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback queue over a resolved sequence.
//!
//! The queue only tracks position and transport state. Audio output belongs to
//! whoever consumes [`PlaybackQueue::current`].

use crate::action::ActionTrackPair;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing
    Playing,
    /// Paused
    Paused,
}

/// Walks a resolved sequence step by step
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    sequence: Vec<ActionTrackPair>,
    position: usize,
    /// Transport state
    pub state: PlaybackState,
    /// Restart from the first step after the last one
    pub repeat: bool,
}

impl PlaybackQueue {
    /// Create a stopped queue at the first step
    pub fn new(sequence: Vec<ActionTrackPair>) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    /// Replace the sequence and stop
    pub fn load(&mut self, sequence: Vec<ActionTrackPair>) {
        self.sequence = sequence;
        self.stop();
    }

    /// All steps
    pub fn sequence(&self) -> &[ActionTrackPair] {
        &self.sequence
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Index of the current step
    pub fn position(&self) -> usize {
        self.position
    }

    /// The current step
    pub fn current(&self) -> Option<&ActionTrackPair> {
        self.sequence.get(self.position)
    }

    /// Play from the current step
    pub fn play(&mut self) {
        if !self.is_empty() {
            self.state = PlaybackState::Playing;
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and rewind to the first step
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0;
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Move to the next step.
    ///
    /// Past the last step the queue wraps when `repeat` is set, otherwise it
    /// stops on the last step and returns `None`.
    pub fn advance(&mut self) -> Option<&ActionTrackPair> {
        if self.is_empty() {
            return None;
        }
        if self.position + 1 < self.len() {
            self.position += 1;
        } else if self.repeat {
            self.position = 0;
        } else {
            self.state = PlaybackState::Stopped;
            tracing::debug!(steps = self.len(), "queue finished");
            return None;
        }
        self.current()
    }

    /// Move to the previous step, wrapping to the end when `repeat` is set
    pub fn previous(&mut self) -> Option<&ActionTrackPair> {
        if self.position > 0 {
            self.position -= 1;
        } else if self.repeat && !self.is_empty() {
            self.position = self.len() - 1;
        }
        self.current()
    }

    /// Jump to step `index`, clamped to the last step
    pub fn seek(&mut self, index: usize) -> Option<&ActionTrackPair> {
        self.position = index.min(self.len().saturating_sub(1));
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> PlaybackQueue {
        PlaybackQueue::new(vec![
            ActionTrackPair::new("1", "A"),
            ActionTrackPair::new("2", "B"),
            ActionTrackPair::new("3", "C"),
        ])
    }

    fn song(pair: Option<&ActionTrackPair>) -> Option<&str> {
        pair.map(|p| p.song_id.as_str())
    }

    #[test]
    fn test_transport() {
        let mut queue = queue();
        assert_eq!(queue.state, PlaybackState::Stopped);
        queue.toggle_playback();
        assert_eq!(queue.state, PlaybackState::Playing);
        queue.toggle_playback();
        assert_eq!(queue.state, PlaybackState::Paused);
        queue.seek(2);
        queue.stop();
        assert_eq!(queue.position(), 0);
        assert_eq!(queue.state, PlaybackState::Stopped);

        let mut empty = PlaybackQueue::default();
        empty.play();
        assert_eq!(empty.state, PlaybackState::Stopped);
        assert!(empty.advance().is_none());
        assert!(empty.seek(4).is_none());
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut queue = queue();
        queue.play();
        assert_eq!(song(queue.advance()), Some("B"));
        assert_eq!(song(queue.advance()), Some("C"));
        assert_eq!(queue.advance(), None);
        assert_eq!(queue.state, PlaybackState::Stopped);
        assert_eq!(song(queue.current()), Some("C"));
    }

    #[test]
    fn test_repeat_wraps() {
        let mut queue = queue();
        queue.repeat = true;
        assert_eq!(song(queue.previous()), Some("C"));
        assert_eq!(song(queue.advance()), Some("A"));
    }

    #[test]
    fn test_seek_and_previous() {
        let mut queue = queue();
        assert_eq!(song(queue.seek(10)), Some("C"));
        assert_eq!(song(queue.previous()), Some("B"));
        assert_eq!(song(queue.seek(0)), Some("A"));
        assert_eq!(song(queue.previous()), Some("A"));

        queue.load(vec![ActionTrackPair::new("9", "Z")]);
        assert_eq!(song(queue.current()), Some("Z"));
    }
}
