//! Search engine integration
//!
//! The engine is an external UCI process reached only through
//! line-oriented text over its stdio. `channel` owns the connection and
//! its reader/writer tasks; `protocol` renders typed commands to lines
//! and parses best-move events back out.

pub mod channel;
pub mod protocol;

pub use channel::{EngineChannel, EngineError};
pub use protocol::{EngineCommand, EngineEvent};
