//! Game session actor
//!
//! One task owns every piece of mutable session state: the controller,
//! the board selection, the turn scheduler, and the engine channel. UI
//! callers talk to it through a [`SessionHandle`] and observe it through
//! cloned [`SessionSnapshot`] values on a watch channel; nothing outside
//! the actor ever mutates game state.
//!
//! The actor suspends on three sources at once: UI commands, engine
//! events, and the scheduler's think-delay deadline. Engine loss at any
//! point degrades the session to an engine-less game instead of ending
//! it.

use std::fmt;

use shakmaty::{Chess, Color, Square};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{EngineChannel, EngineError, EngineEvent};
use crate::game::config::SessionConfig;
use crate::game::controller::SessionController;
use crate::game::error::MoveRejected;
use crate::game::rules::MoveCandidate;
use crate::game::scheduler::TurnScheduler;
use crate::game::selection::{ClickOutcome, Selection};
use crate::game::state::{GameStatus, PlayedMove, SessionState};

/// Read-only view of the session published after every transition
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current position; safe to hold across later transitions
    pub position: Chess,
    pub fen: String,
    pub status: GameStatus,
    pub turn: Color,
    pub last_move: Option<PlayedMove>,
    /// SAN notation of every move played
    pub history: Vec<String>,
    /// Currently selected origin square, if any
    pub selected: Option<Square>,
    /// Legal destinations of the selection, for highlighting
    pub targets: Vec<Square>,
    /// True while an analyze request is outstanding
    pub thinking: bool,
    pub human_color: Color,
}

enum SessionCommand {
    Click(Square),
    PlayMove(MoveCandidate),
    Reset,
    SetSkillLevel(u8),
    SetHumanColor(Color),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum MoveSource {
    Human,
    Engine,
}

impl fmt::Display for MoveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveSource::Human => write!(f, "human"),
            MoveSource::Engine => write!(f, "engine"),
        }
    }
}

/// Cloneable front door to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Feed a board click into the selection machine
    pub fn click(&self, square: Square) {
        self.send(SessionCommand::Click(square));
    }

    /// Apply a fully described human move, bypassing selection
    pub fn play_move(&self, candidate: MoveCandidate) {
        self.send(SessionCommand::PlayMove(candidate));
    }

    /// Start a new game
    pub fn reset(&self) {
        self.send(SessionCommand::Reset);
    }

    /// Change engine difficulty; values are clamped to the valid range
    pub fn set_skill_level(&self, level: u8) {
        self.send(SessionCommand::SetSkillLevel(level));
    }

    /// Change sides; restarts the game
    pub fn set_human_color(&self, color: Color) {
        self.send(SessionCommand::SetHumanColor(color));
    }

    /// End the session and release the engine channel
    pub fn shutdown(&self) {
        self.send(SessionCommand::Shutdown);
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch receiver for observing snapshot updates
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!("[SESSION] command dropped, session already ended");
        }
    }
}

enum Wake {
    Command(Option<SessionCommand>),
    Engine(Option<EngineEvent>),
    DeadlineElapsed,
}

/// The session actor; drive it with [`GameSession::run`]
pub struct GameSession {
    config: SessionConfig,
    controller: SessionController,
    selection: Selection,
    scheduler: TurnScheduler,
    engine: Option<EngineChannel>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl GameSession {
    /// Build a session around an optional engine channel
    ///
    /// `None` runs the session engine-less from the start (degraded
    /// mode); the scheduler then never requests a move.
    pub fn new(config: SessionConfig, engine: Option<EngineChannel>) -> (Self, SessionHandle) {
        let controller = SessionController::new();
        let initial = build_snapshot(controller.state(), None, Vec::new(), false, &config);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(config.think_delay);
        let session = Self {
            config,
            controller,
            selection: Selection::default(),
            scheduler,
            engine,
            commands: command_rx,
            snapshot: snapshot_tx,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (session, handle)
    }

    /// Build and spawn a session onto the current runtime
    pub fn spawn(config: SessionConfig, engine: Option<EngineChannel>) -> SessionHandle {
        let (session, handle) = Self::new(config, engine);
        tokio::spawn(session.run());
        handle
    }

    /// Run until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        self.start_engine();
        self.publish();
        self.reschedule();

        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                event = next_engine_event(self.engine.as_mut()) => Wake::Engine(event),
                () = deadline_elapsed(self.scheduler.deadline()) => Wake::DeadlineElapsed,
            };
            match wake {
                Wake::Command(Some(command)) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Wake::Command(None) => break,
                Wake::Engine(Some(event)) => self.handle_engine_event(event),
                Wake::Engine(None) => self.disable_engine(),
                Wake::DeadlineElapsed => self.dispatch_analysis(),
            }
        }

        info!("[SESSION] shutting down");
        if let Some(engine) = self.engine.take() {
            engine.terminate();
        }
    }

    fn start_engine(&mut self) {
        let skill = self.config.skill_level;
        let Some(engine) = self.engine.as_mut() else {
            info!("[SESSION] no engine attached, running without AI");
            return;
        };
        let handshake = (|| {
            engine.initialize()?;
            engine.set_skill_level(skill)?;
            engine.new_game()
        })();
        if let Err(error) = handshake {
            warn!("[ENGINE] initialization failed: {error}");
            self.disable_engine();
        }
    }

    fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Click(square) => self.handle_click(square),
            SessionCommand::PlayMove(candidate) => self.handle_human_move(candidate),
            SessionCommand::Reset => self.handle_reset(),
            SessionCommand::SetSkillLevel(level) => self.handle_set_skill(level),
            SessionCommand::SetHumanColor(color) => {
                info!("[SESSION] human now plays {color:?}");
                self.config.human_color = color;
                self.handle_reset();
            }
            SessionCommand::Shutdown => return false,
        }
        true
    }

    fn handle_click(&mut self, square: Square) {
        if self.controller.state().status().is_terminal() {
            debug!("[INPUT] click on {square} ignored, game over");
            return;
        }
        let outcome = self.selection.on_click(
            self.controller.state().position(),
            self.config.human_color,
            square,
        );
        match outcome {
            ClickOutcome::MoveIntent(candidate) => self.apply_move(candidate, MoveSource::Human),
            ClickOutcome::Selected(_) | ClickOutcome::Deselected => self.publish(),
            ClickOutcome::Ignored => {}
        }
    }

    fn handle_human_move(&mut self, candidate: MoveCandidate) {
        if self.controller.state().turn() != self.config.human_color {
            warn!("[INPUT] {candidate} rejected: {}", MoveRejected::NotYourTurn);
            return;
        }
        self.apply_move(candidate, MoveSource::Human);
    }

    /// Shared path for both move sources
    fn apply_move(&mut self, candidate: MoveCandidate, source: MoveSource) {
        match self.controller.apply_move(&candidate) {
            Ok(state) => {
                let san = state
                    .last_move()
                    .map(|played| played.san.clone())
                    .unwrap_or_default();
                info!(
                    "[SESSION] {source} played {san} ({candidate}), status {:?}",
                    state.status()
                );
                self.selection.clear();
                self.publish();
                self.reschedule();
            }
            Err(rejected) => {
                warn!("[SESSION] {source} move {candidate} rejected: {rejected}");
                self.selection.clear();
                self.publish();
            }
        }
    }

    fn handle_reset(&mut self) {
        info!("[SESSION] new game");
        self.scheduler.invalidate();
        self.selection.clear();
        let mut engine_lost = false;
        if let Some(engine) = self.engine.as_mut() {
            if engine.is_pending() {
                let _ = engine.cancel();
            }
            engine_lost = engine.new_game().is_err();
        }
        if engine_lost {
            self.disable_engine();
        }
        self.controller.reset();
        self.publish();
        self.reschedule();
    }

    fn handle_set_skill(&mut self, level: u8) {
        self.config.set_skill_level(level);
        let clamped = self.config.skill_level;
        let mut engine_lost = false;
        if let Some(engine) = self.engine.as_mut() {
            info!("[ENGINE] skill level {} -> {clamped}", engine.skill_level());
            engine_lost = engine.set_skill_level(clamped).is_err();
        }
        if engine_lost {
            self.disable_engine();
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        let EngineEvent::BestMove { mv } = event;
        if !self.scheduler.accept_result() {
            debug!("[ENGINE] stale best-move event discarded");
            self.publish();
            self.reschedule();
            return;
        }
        match mv {
            Some(candidate) => self.apply_move(candidate, MoveSource::Engine),
            None => {
                info!("[ENGINE] no legal move reported");
                self.publish();
            }
        }
    }

    /// Arm or clear the think-delay deadline after a transition
    fn reschedule(&mut self) {
        let state = self.controller.state();
        let engine_to_move = self.engine.is_some()
            && !state.status().is_terminal()
            && state.turn() != self.config.human_color;
        self.scheduler.on_state_change(engine_to_move);
        if engine_to_move {
            debug!(
                "[SCHEDULER] engine move scheduled in {:?}",
                self.config.think_delay
            );
        }
    }

    /// The think delay elapsed; send the analyze request if it is still
    /// wanted
    fn dispatch_analysis(&mut self) {
        self.scheduler.clear_deadline();
        let state = self.controller.state();
        if state.status().is_terminal() || state.turn() == self.config.human_color {
            return;
        }
        let fen = state.fen();
        let depth = self.config.search_depth;

        let mut outcome: Option<Result<(), EngineError>> = None;
        if let Some(engine) = self.engine.as_mut() {
            if engine.is_pending() {
                // A cancelled search has not drained yet; the scheduler
                // re-arms once its stale result arrives.
                debug!("[SCHEDULER] previous search still pending, analyze deferred");
                return;
            }
            outcome = Some(engine.analyze(&fen, depth));
        }
        match outcome {
            Some(Ok(())) => {
                self.scheduler.mark_dispatched();
                info!("[SCHEDULER] analyze dispatched at depth {depth}");
                self.publish();
            }
            Some(Err(error)) => {
                warn!("[SCHEDULER] analyze failed: {error}");
                self.disable_engine();
            }
            None => {}
        }
    }

    fn disable_engine(&mut self) {
        warn!("[ENGINE] search engine unavailable, session continues without AI");
        if let Some(engine) = self.engine.take() {
            engine.terminate();
        }
        self.scheduler.invalidate();
        self.publish();
    }

    fn publish(&mut self) {
        let state = self.controller.state();
        let selected = self.selection.selected();
        let targets = self.selection.targets(state.position());
        let snapshot = build_snapshot(
            state,
            selected,
            targets,
            self.scheduler.is_thinking(),
            &self.config,
        );
        self.snapshot.send_replace(snapshot);
    }
}

fn build_snapshot(
    state: &SessionState,
    selected: Option<Square>,
    targets: Vec<Square>,
    thinking: bool,
    config: &SessionConfig,
) -> SessionSnapshot {
    SessionSnapshot {
        position: state.position().clone(),
        fen: state.fen(),
        status: state.status(),
        turn: state.turn(),
        last_move: state.last_move().cloned(),
        history: state.history().to_vec(),
        selected,
        targets,
        thinking,
        human_color: config.human_color,
    }
}

async fn next_engine_event(engine: Option<&mut EngineChannel>) -> Option<EngineEvent> {
    match engine {
        Some(channel) => channel.recv_event().await,
        None => std::future::pending().await,
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
