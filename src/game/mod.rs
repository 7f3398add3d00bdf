//! Game session logic
//!
//! Implements the human-vs-engine session around the `shakmaty` rules
//! engine, with clean separation between what happened and what happens
//! next:
//!
//! - `state` / `controller` - authoritative position, status, and history
//! - `selection` - per-click board selection state machine
//! - `scheduler` - decides when the engine is asked to move
//! - `session` - the actor tying everything to the engine channel and
//!   publishing snapshots to the UI layer
//! - `rules` - candidate-move resolution against the legal move list
//! - `config` / `error` - session settings and the rejection taxonomy

pub mod config;
pub mod controller;
pub mod error;
pub mod rules;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod state;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use error::MoveRejected;
pub use rules::MoveCandidate;
pub use selection::{ClickOutcome, Selection};
pub use session::{GameSession, SessionHandle, SessionSnapshot};
pub use state::{GameStatus, PlayedMove, SessionState};
