//! Engine channel adapter
//!
//! Wraps one long-lived connection to a UCI engine process. Commands are
//! sent fire-and-forget through a writer task that owns the engine's
//! stdin; a reader task owns stdout and turns recognized lines into
//! events. Both tasks end on their own when the channel is dropped or the
//! process goes away.
//!
//! At most one analyze request may be outstanding per channel; a second
//! one is rejected until the pending search has produced its best-move
//! event. Cancellation (`stop`) is advisory only, so consumers must be
//! prepared to receive and discard a result that arrives after it.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::protocol::{parse_line, EngineCommand, EngineEvent};

/// Engine channel failures
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process could not be launched or lost its pipes
    #[error("search engine unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// A previous analyze request has not produced its best move yet
    #[error("an analyze request is already in flight")]
    RequestInFlight,

    /// The engine process ended and the channel can no longer send
    #[error("engine channel closed")]
    ChannelClosed,
}

/// Handle to one engine connection
#[derive(Debug)]
pub struct EngineChannel {
    commands: mpsc::UnboundedSender<EngineCommand>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    pending_request: bool,
    skill_level: u8,
    child: Option<Child>,
}

impl EngineChannel {
    /// Launch an engine executable and wire its stdio to the channel
    pub fn spawn_process(path: &str) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("engine stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("engine stdout not captured"))?;
        debug!("[ENGINE] process launched: {path}");
        Ok(Self::start(stdout, stdin, Some(child)))
    }

    /// Build a channel over arbitrary streams (tests, in-process engines)
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::start(reader, writer, None)
    }

    fn start<R, W>(reader: R, writer: W, child: Option<Child>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_commands(command_rx, writer));
        tokio::spawn(read_events(reader, event_tx));
        Self {
            commands: command_tx,
            events: event_rx,
            pending_request: false,
            skill_level: 0,
            child,
        }
    }

    /// Send the handshake; call once per channel lifetime
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::Initialize)
    }

    /// Configure the engine's skill option; values are sent as given
    pub fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError> {
        self.send(EngineCommand::SetOption {
            name: "Skill Level".into(),
            value: level.to_string(),
        })?;
        self.skill_level = level;
        Ok(())
    }

    pub fn skill_level(&self) -> u8 {
        self.skill_level
    }

    /// Tell the engine to forget the previous game
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::NewGame)
    }

    /// Request a fixed-depth search of the given position
    ///
    /// Rejected while a previous request is still pending.
    pub fn analyze(&mut self, fen: &str, depth: u8) -> Result<(), EngineError> {
        if self.pending_request {
            return Err(EngineError::RequestInFlight);
        }
        self.send(EngineCommand::Analyze {
            fen: fen.to_owned(),
            depth,
        })?;
        self.pending_request = true;
        Ok(())
    }

    /// True while an analyze request has not produced its best move
    pub fn is_pending(&self) -> bool {
        self.pending_request
    }

    /// Ask the engine to abort the current search; the pending request
    /// stays open until its (possibly immediate) best move arrives
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::Stop)
    }

    /// Next parsed engine event; `None` once the engine's output ends
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        let event = self.events.recv().await;
        if let Some(EngineEvent::BestMove { .. }) = &event {
            self.pending_request = false;
        }
        event
    }

    /// Release the channel irrevocably
    ///
    /// Sends `quit`, closes the command queue, and kills the process as a
    /// backstop. No further commands can be sent afterwards.
    pub fn terminate(mut self) {
        let _ = self.commands.send(EngineCommand::Quit);
        if let Some(mut child) = self.child.take() {
            if let Err(error) = child.start_kill() {
                debug!("[ENGINE] kill after quit failed: {error}");
            }
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::ChannelClosed)
    }
}

async fn write_commands<W>(mut commands: mpsc::UnboundedReceiver<EngineCommand>, mut writer: W)
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    while let Some(command) = commands.recv().await {
        let is_quit = matches!(command, EngineCommand::Quit);
        for line in command.lines() {
            trace!("[ENGINE] >> {line}");
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                debug!("[ENGINE] write side closed");
                return;
            }
        }
        if is_quit {
            return;
        }
    }
}

async fn read_events<R>(reader: R, events: mpsc::UnboundedSender<EngineEvent>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!("[ENGINE] << {line}");
                if let Some(event) = parse_line(&line) {
                    if events.send(event).is_err() {
                        return;
                    }
                }
            }
            Ok(None) => {
                debug!("[ENGINE] output stream ended");
                return;
            }
            Err(error) => {
                warn!("[ENGINE] read failed: {error}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{split, AsyncBufReadExt, BufReader};

    async fn read_line<R: AsyncRead + Unpin>(lines: &mut tokio::io::Lines<BufReader<R>>) -> String {
        lines
            .next_line()
            .await
            .expect("readable")
            .expect("line present")
    }

    #[tokio::test]
    async fn test_initialize_writes_handshake() {
        let (near, far) = tokio::io::duplex(1024);
        let (near_read, near_write) = split(near);
        let mut channel = EngineChannel::from_streams(near_read, near_write);

        channel.initialize().expect("send");

        let (far_read, _far_write) = split(far);
        let mut lines = BufReader::new(far_read).lines();
        assert_eq!(read_line(&mut lines).await, "uci");
        assert_eq!(read_line(&mut lines).await, "isready");
    }

    #[tokio::test]
    async fn test_analyze_rejected_while_pending() {
        let (near, _far) = tokio::io::duplex(1024);
        let (near_read, near_write) = split(near);
        let mut channel = EngineChannel::from_streams(near_read, near_write);

        channel.analyze("8/8/8/8/8/8/8/8 w - - 0 1", 10).expect("first request");
        assert!(channel.is_pending());

        let second = channel.analyze("8/8/8/8/8/8/8/8 w - - 0 1", 10);
        assert!(matches!(second, Err(EngineError::RequestInFlight)));
    }

    #[tokio::test]
    async fn test_best_move_clears_pending() {
        let (near, far) = tokio::io::duplex(1024);
        let (near_read, near_write) = split(near);
        let mut channel = EngineChannel::from_streams(near_read, near_write);

        channel.analyze("8/8/8/8/8/8/8/8 w - - 0 1", 10).expect("send");

        let (_far_read, mut far_write) = split(far);
        far_write
            .write_all(b"info depth 1 score cp 10\nbestmove e2e4\n")
            .await
            .expect("write");

        let event = channel.recv_event().await.expect("event");
        let EngineEvent::BestMove { mv: Some(mv) } = event else {
            panic!("expected a move");
        };
        assert_eq!(mv.to_string(), "e2e4");
        assert!(!channel.is_pending());
    }

    #[tokio::test]
    async fn test_recv_ends_when_engine_output_ends() {
        let (near, far) = tokio::io::duplex(1024);
        let (near_read, near_write) = split(near);
        let mut channel = EngineChannel::from_streams(near_read, near_write);

        drop(far);
        assert_eq!(channel.recv_event().await, None);
    }

    #[tokio::test]
    async fn test_spawn_missing_executable_is_unavailable() {
        let result = EngineChannel::spawn_process("/nonexistent/engine-binary");
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }
}
