//! Board selection state machine
//!
//! Per-click logic turning raw square clicks into move intents. Two
//! states: idle, or one selected origin square. The machine only compares
//! the clicked piece against the configured human color and the side to
//! move; it neither knows nor cares which side the engine controls.
//!
//! # Click handling
//!
//! - clicking the selected square again deselects it (toggle);
//! - clicking a legal destination of the selection emits a move intent
//!   with promotion defaulted to queen;
//! - any other click is re-evaluated as a fresh selection attempt: own
//!   piece on the human's turn selects it, everything else clears the
//!   selection.
//!
//! Underpromotion is deliberately not offered here; the candidate path
//! still accepts explicit promotion roles from other callers.

use shakmaty::{Chess, Color, Position, Role, Square};
use tracing::debug;

use crate::game::rules::{self, MoveCandidate};

/// What a single click resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A new origin square was selected
    Selected(Square),

    /// The selection was cleared
    Deselected,

    /// The click completed a move; the selection is cleared
    MoveIntent(MoveCandidate),

    /// Nothing changed (empty square, opponent piece, or not the
    /// human's turn)
    Ignored,
}

/// Tracks the tentatively selected origin square
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<Square>,
}

impl Selection {
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Legal destination squares for the current selection, derived on
    /// demand
    pub fn targets(&self, position: &Chess) -> Vec<Square> {
        match self.selected {
            Some(origin) => rules::legal_destinations(position, origin),
            None => Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Feed one square click through the state machine
    pub fn on_click(&mut self, position: &Chess, human: Color, square: Square) -> ClickOutcome {
        // Toggle-deselect.
        if self.selected == Some(square) {
            self.selected = None;
            debug!("[INPUT] deselected {square}");
            return ClickOutcome::Deselected;
        }

        if let Some(origin) = self.selected {
            if rules::legal_destinations(position, origin).contains(&square) {
                self.selected = None;
                let candidate = MoveCandidate {
                    from: origin,
                    to: square,
                    promotion: Some(Role::Queen),
                };
                debug!("[INPUT] move intent {candidate}");
                return ClickOutcome::MoveIntent(candidate);
            }
            // Not a destination: fall through to a fresh selection attempt.
        }

        let own_piece = position
            .board()
            .piece_at(square)
            .is_some_and(|piece| piece.color == human);
        if own_piece && position.turn() == human {
            self.selected = Some(square);
            debug!("[INPUT] selected {square}");
            ClickOutcome::Selected(square)
        } else if self.selected.take().is_some() {
            debug!("[INPUT] selection cleared");
            ClickOutcome::Deselected
        } else {
            ClickOutcome::Ignored
        }
    }
}
