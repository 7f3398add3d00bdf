//! Session configuration
//!
//! Controls which color the human plays, how strong the engine is, and how
//! long the scheduler pretends to deliberate before asking the engine for
//! a move.
//!
//! # Difficulty
//!
//! Engine strength is the UCI `Skill Level` option (0..=20), distinct from
//! the fixed search depth sent with every analyze request. The skill level
//! is clamped here; the channel adapter forwards whatever it is given.

use std::time::Duration;

use shakmaty::Color;

/// Highest value the engine's skill option accepts
pub const SKILL_LEVEL_MAX: u8 = 20;

/// Depth sent with every `go depth` request
pub const DEFAULT_SEARCH_DEPTH: u8 = 10;

/// Pause between a finished ply and the next analyze request
pub const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(500);

/// Tunable settings for one game session
///
/// The defaults mirror a casual game: human plays White, skill level 10,
/// depth 10, half a second of apparent deliberation.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Color controlled by board clicks; the engine owns the other side
    pub human_color: Color,

    /// Engine `Skill Level` option, kept within 0..=20
    pub skill_level: u8,

    /// Search depth for analyze requests
    pub search_depth: u8,

    /// Delay before an engine move is requested
    pub think_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            human_color: Color::White,
            skill_level: 10,
            search_depth: DEFAULT_SEARCH_DEPTH,
            think_delay: DEFAULT_THINK_DELAY,
        }
    }
}

impl SessionConfig {
    /// Set the skill level, clamping out-of-range values
    pub fn set_skill_level(&mut self, level: u8) {
        self.skill_level = level.min(SKILL_LEVEL_MAX);
    }

    /// Color the engine plays
    pub fn engine_color(&self) -> Color {
        self.human_color.other()
    }
}
