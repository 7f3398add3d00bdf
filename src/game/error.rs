//! Error types for the game session
//!
//! Move rejection is a recoverable condition: session state is left
//! untouched and the current selection is cleared. Engine-side failures
//! live in [`crate::engine`].

use shakmaty::Square;

/// Reasons a candidate move is refused by the session controller
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejected {
    /// No legal move matches the candidate's squares
    #[error("no legal move from {from} to {to}")]
    Illegal { from: Square, to: Square },

    /// The side to move is not the caller's side
    #[error("it is not your turn")]
    NotYourTurn,

    /// The game already ended in checkmate or a draw
    #[error("the game is already over")]
    GameOver,
}
