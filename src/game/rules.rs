//! Rules engine facade
//!
//! Thin adapter over `shakmaty`: candidate moves described by a pair of
//! squares (plus an optional promotion piece) are matched against the
//! position's legal move list. Castling is matched by the king's
//! destination square (g- or c-file), which is also how both board clicks
//! and UCI move text describe it.

use std::fmt;

use shakmaty::{Chess, File, Move, Position, Role, Square};

/// A move described from the outside: two squares and an optional
/// promotion piece
///
/// Built either from a resolved board selection (promotion defaulted to
/// queen) or from a 4-5 character UCI move token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCandidate {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl MoveCandidate {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Parse a UCI move token: origin square, destination square, optional
    /// promotion letter (`e2e4`, `e7e8q`)
    pub fn from_uci(text: &str) -> Option<Self> {
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from = text[0..2].parse().ok()?;
        let to = text[2..4].parse().ok()?;
        let promotion = match text.as_bytes().get(4) {
            Some(&letter) => Some(Role::from_char(letter as char)?),
            None => None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for MoveCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// Origin and destination squares of a legal move, with castling reported
/// as the king's travel
pub fn move_squares(mv: &Move) -> (Square, Square) {
    match *mv {
        Move::Normal { from, to, .. } => (from, to),
        Move::EnPassant { from, to } => (from, to),
        Move::Castle { king, rook } => (king, castle_king_target(rook)),
        // Drop moves exist only in crazyhouse-style variants, never in a
        // standard legal move list.
        Move::Put { to, .. } => (to, to),
    }
}

fn castle_king_target(rook: Square) -> Square {
    let file = if rook.file() == File::H {
        File::G
    } else {
        File::C
    };
    Square::from_coords(file, rook.rank())
}

/// Squares reachable by a legal move from `from` in the given position
pub fn legal_destinations(position: &Chess, from: Square) -> Vec<Square> {
    let mut destinations = Vec::new();
    for mv in position.legal_moves() {
        let (origin, target) = move_squares(&mv);
        if origin == from && !destinations.contains(&target) {
            destinations.push(target);
        }
    }
    destinations
}

/// Match a candidate against the position's legal moves
///
/// Promotion handling: an explicit promotion role must match; a candidate
/// without one falls back to the queen promotion when only promotion moves
/// fit the squares.
pub fn resolve_candidate(position: &Chess, candidate: &MoveCandidate) -> Option<Move> {
    let mut queen_fallback = None;
    for mv in position.legal_moves() {
        let (from, to) = move_squares(&mv);
        if from != candidate.from || to != candidate.to {
            continue;
        }
        match mv.promotion() {
            None => return Some(mv),
            promotion if promotion == candidate.promotion => return Some(mv),
            Some(Role::Queen) => queen_fallback = Some(mv),
            Some(_) => {}
        }
    }
    queen_fallback
}
