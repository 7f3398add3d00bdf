//! UCI wire protocol
//!
//! Typed commands are rendered to the exact text lines the engine
//! expects; inbound lines are scanned for the one pattern the session
//! cares about, `bestmove <move> [ponder <move>]`. Everything else the
//! engine prints (id, option, info, readyok) is informational and never
//! surfaced.

use crate::game::rules::MoveCandidate;

/// Commands sent down the engine channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Handshake, sent once per channel lifetime
    Initialize,

    /// `setoption name <name> value <value>`
    SetOption { name: String, value: String },

    /// Reset the engine's internal game state
    NewGame,

    /// Load a position and search it to a fixed depth
    Analyze { fen: String, depth: u8 },

    /// Best-effort interruption of the current search
    Stop,

    /// Final command; the engine process exits
    Quit,
}

impl EngineCommand {
    /// Protocol lines for this command, in send order
    pub fn lines(&self) -> Vec<String> {
        match self {
            EngineCommand::Initialize => vec!["uci".into(), "isready".into()],
            EngineCommand::SetOption { name, value } => {
                vec![format!("setoption name {name} value {value}")]
            }
            EngineCommand::NewGame => vec!["ucinewgame".into(), "isready".into()],
            EngineCommand::Analyze { fen, depth } => {
                vec![format!("position fen {fen}"), format!("go depth {depth}")]
            }
            EngineCommand::Stop => vec!["stop".into()],
            EngineCommand::Quit => vec!["quit".into()],
        }
    }
}

/// Events parsed from the engine's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Search finished; `mv` is `None` when the engine reports
    /// `bestmove (none)` for a terminal position
    BestMove { mv: Option<MoveCandidate> },
}

/// Scan one output line for a best-move event
///
/// Returns `None` for every informational line and for malformed move
/// tokens; a ponder suffix is accepted and ignored.
pub(crate) fn parse_line(line: &str) -> Option<EngineEvent> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    let token = tokens.next()?;
    if token == "(none)" {
        return Some(EngineEvent::BestMove { mv: None });
    }
    let mv = MoveCandidate::from_uci(token)?;
    Some(EngineEvent::BestMove { mv: Some(mv) })
}
