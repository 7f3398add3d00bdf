//! Authoritative session state
//!
//! One value owns the current position, the derived game status, the last
//! played move, and the SAN move history. Every transition produces a new
//! position (the previous one stays valid for any snapshot holder) and
//! re-derives the status; the status is never stored independently of a
//! position update.
//!
//! # Status derivation
//!
//! Checked in priority order: checkmate, draw, check, playing. Checkmate
//! and draw are terminal. Draw covers stalemate, insufficient material,
//! the 50-move rule, and threefold repetition; repetition is tracked here
//! because the rules engine judges single positions, not game history.

use std::collections::HashMap;

use shakmaty::{fen::Fen, Chess, Color, EnPassantMode, Position, Square};

/// Game status derived from the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    /// Game in progress, side to move is not in check
    #[default]
    Playing,

    /// Side to move is in check but has legal moves
    Check,

    /// Side to move is checkmated; the game is over
    Checkmate,

    /// Stalemate, insufficient material, 50-move rule, or threefold
    /// repetition; the game is over
    Draw,
}

impl GameStatus {
    /// True once no further moves are accepted from either side
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Draw)
    }
}

/// A move that has been applied, kept for highlighting and notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub san: String,
}

/// The session's authoritative game state
///
/// Owned exclusively by the session controller; other components read
/// cloned snapshots.
#[derive(Debug, Clone)]
pub struct SessionState {
    position: Chess,
    status: GameStatus,
    last_move: Option<PlayedMove>,
    history: Vec<String>,
    repetitions: HashMap<String, u32>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        let position = Chess::default();
        let mut repetitions = HashMap::new();
        repetitions.insert(repetition_key(&fen_of(&position)), 1);
        Self {
            position,
            status: GameStatus::Playing,
            last_move: None,
            history: Vec::new(),
            repetitions,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Side to move, always read from the position
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn fen(&self) -> String {
        fen_of(&self.position)
    }

    pub fn last_move(&self) -> Option<&PlayedMove> {
        self.last_move.as_ref()
    }

    /// SAN notation of every move played, in order
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Install the position produced by an accepted move and re-derive
    /// the status
    pub(crate) fn advance(&mut self, next: Chess, from: Square, to: Square, san: String) {
        self.position = next;
        let key = repetition_key(&self.fen());
        let seen = {
            let count = self.repetitions.entry(key).or_insert(0);
            *count += 1;
            *count
        };
        self.status = derive_status(&self.position, seen >= 3);
        self.history.push(san.clone());
        self.last_move = Some(PlayedMove { from, to, san });
    }
}

pub(crate) fn fen_of(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

/// Board, side to move, castling rights, and en-passant square; the move
/// counters are irrelevant for repetition
fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

fn derive_status(position: &Chess, threefold: bool) -> GameStatus {
    if position.is_checkmate() {
        GameStatus::Checkmate
    } else if position.is_stalemate()
        || position.is_insufficient_material()
        || position.halfmoves() >= 100
        || threefold
    {
        GameStatus::Draw
    } else if position.is_check() {
        GameStatus::Check
    } else {
        GameStatus::Playing
    }
}
