//! Session state controller
//!
//! Sole owner of [`SessionState`]. Candidate moves from either source
//! (board clicks or engine best-move events) go through the same path:
//! resolve against the legal move list, play on a copy of the position,
//! then commit. A rejected candidate leaves no observable change.

use shakmaty::san::SanPlus;
use tracing::debug;

use crate::game::error::MoveRejected;
use crate::game::rules::{self, MoveCandidate};
use crate::game::state::SessionState;

/// Applies moves and resets; never decides what happens next
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Validate and apply a candidate move
    ///
    /// The move is played on a copy of the current position, so any
    /// previously published snapshot stays valid. On rejection the state
    /// is returned to the caller untouched.
    pub fn apply_move(&mut self, candidate: &MoveCandidate) -> Result<&SessionState, MoveRejected> {
        if self.state.status().is_terminal() {
            return Err(MoveRejected::GameOver);
        }

        let illegal = MoveRejected::Illegal {
            from: candidate.from,
            to: candidate.to,
        };
        let mv = rules::resolve_candidate(self.state.position(), candidate).ok_or(illegal)?;

        // Play on a copy; holders of earlier snapshots keep a valid
        // position. The move came out of the legal move list, so the
        // unchecked application cannot corrupt the copy.
        let mut next = self.state.position().clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut next, &mv).to_string();

        let (from, to) = rules::move_squares(&mv);
        self.state.advance(next, from, to, san);
        debug!(
            "[SESSION] applied {candidate}, status {:?}",
            self.state.status()
        );
        Ok(&self.state)
    }

    /// Return to the canonical starting state
    pub fn reset(&mut self) -> &SessionState {
        self.state = SessionState::new();
        &self.state
    }
}
