//! chessmate - interactive chess against a UCI engine
//!
//! The crate orchestrates a human-vs-engine game session: it owns the
//! authoritative game state, turns raw board clicks into legal moves, and
//! talks to an external UCI engine process over an asynchronous
//! line-oriented channel.
//!
//! Chess rules come from `shakmaty`; move search comes from whatever UCI
//! executable the session is given. Presentation is up to the embedder:
//! the session publishes immutable snapshots and accepts commands through
//! a cloneable handle (see [`game::session`]).

pub mod engine;
pub mod game;

pub use engine::{EngineChannel, EngineError};
pub use game::{
    GameSession, GameStatus, MoveCandidate, MoveRejected, PlayedMove, SessionConfig,
    SessionHandle, SessionSnapshot,
};
