//! End-to-end session scenarios against a scripted mock engine
//!
//! The mock speaks the engine's side of the wire protocol over in-memory
//! duplex streams: it consumes outbound lines and answers `go depth`
//! requests with scripted `bestmove` lines.

use std::time::Duration;

use shakmaty::{Color, Square};
use tokio::io::{split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::{sleep, timeout};

use chessmate::{EngineChannel, GameSession, GameStatus, MoveCandidate, SessionConfig, SessionHandle, SessionSnapshot};

const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

struct MockEngine {
    lines: tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl MockEngine {
    /// Consume outbound lines until one starts with `prefix`
    async fn expect_line(&mut self, prefix: &str) -> String {
        let fut = async {
            loop {
                let line = self
                    .lines
                    .next_line()
                    .await
                    .expect("engine stream readable")
                    .expect("engine stream open");
                if line.starts_with(prefix) {
                    return line;
                }
            }
        };
        timeout(Duration::from_secs(5), fut)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for `{prefix}` line"))
    }

    async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("engine stream writable");
    }
}

fn start_session(config: SessionConfig) -> (SessionHandle, MockEngine) {
    let (near, far) = tokio::io::duplex(4096);
    let (near_read, near_write) = split(near);
    let channel = EngineChannel::from_streams(near_read, near_write);
    let handle = GameSession::spawn(config, Some(channel));

    let (far_read, far_write) = split(far);
    let mock = MockEngine {
        lines: BufReader::new(far_read).lines(),
        writer: far_write,
    };
    (handle, mock)
}

fn fast_config() -> SessionConfig {
    SessionConfig {
        think_delay: Duration::ZERO,
        ..SessionConfig::default()
    }
}

async fn wait_for(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = handle.watch();
    let guard = timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session ended");
    guard.clone()
}

fn square(name: &str) -> Square {
    name.parse().expect("valid square")
}

fn candidate(uci: &str) -> MoveCandidate {
    MoveCandidate::from_uci(uci).expect("valid move text")
}

#[tokio::test]
async fn human_move_then_engine_reply() {
    //! Human plays e2e4 via clicks; the engine answers and `thinking`
    //! goes true then false
    let (handle, mut mock) = start_session(fast_config());
    mock.expect_line("ucinewgame").await;

    handle.click(square("e2"));
    handle.click(square("e4"));

    let after_human = wait_for(&handle, |s| s.history.len() == 1).await;
    assert_eq!(after_human.turn, Color::Black);
    assert_eq!(after_human.status, GameStatus::Playing);
    let played = after_human.last_move.expect("move recorded");
    assert_eq!(played.from, square("e2"));
    assert_eq!(played.to, square("e4"));

    wait_for(&handle, |s| s.thinking).await;
    let go = mock.expect_line("go depth").await;
    assert_eq!(go, "go depth 10");

    mock.send_line("info depth 1 score cp -20").await;
    mock.send_line("bestmove e7e5 ponder g1f3").await;

    let after_engine = wait_for(&handle, |s| s.history.len() == 2 && !s.thinking).await;
    assert_eq!(after_engine.turn, Color::White);
    assert_eq!(after_engine.last_move.expect("move recorded").to, square("e5"));

    handle.shutdown();
}

#[tokio::test]
async fn engine_receives_position_before_go() {
    //! The analyze request carries the post-move position
    let (handle, mut mock) = start_session(fast_config());

    handle.play_move(candidate("e2e4"));
    let position_line = mock.expect_line("position fen").await;
    assert_eq!(
        position_line,
        "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );

    handle.shutdown();
}

#[tokio::test]
async fn fools_mate_through_the_session() {
    //! Scripted engine cooperates in Fool's Mate; checkmate is absorbing
    let (handle, mut mock) = start_session(fast_config());

    handle.play_move(candidate("f2f3"));
    mock.expect_line("go depth").await;
    mock.send_line("bestmove e7e5").await;
    wait_for(&handle, |s| s.history.len() == 2).await;

    handle.play_move(candidate("g2g4"));
    mock.expect_line("go depth").await;
    mock.send_line("bestmove d8h4").await;

    let mated = wait_for(&handle, |s| s.history.len() == 4).await;
    assert_eq!(mated.status, GameStatus::Checkmate);
    assert_eq!(mated.history.last().unwrap(), "Qh4#");

    // No further move changes anything, from either source.
    handle.play_move(candidate("a2a3"));
    handle.click(square("a2"));
    sleep(Duration::from_millis(100)).await;
    let frozen = handle.snapshot();
    assert_eq!(frozen.history.len(), 4);
    assert_eq!(frozen.status, GameStatus::Checkmate);

    handle.shutdown();
}

#[tokio::test]
async fn bestmove_none_resolves_thinking_without_a_move() {
    //! `bestmove (none)` suppresses move emission but settles the request
    let config = SessionConfig {
        human_color: Color::Black,
        think_delay: Duration::ZERO,
        ..SessionConfig::default()
    };
    let (handle, mut mock) = start_session(config);

    // Engine owns the first ply as White.
    wait_for(&handle, |s| s.thinking).await;
    mock.expect_line("go depth").await;
    mock.send_line("bestmove (none)").await;

    let settled = wait_for(&handle, |s| !s.thinking).await;
    assert!(settled.history.is_empty());
    assert_eq!(settled.status, GameStatus::Playing);
    assert_eq!(settled.fen, STARTING_FEN);

    handle.shutdown();
}

#[tokio::test]
async fn stale_result_after_reset_is_discarded() {
    //! A best move computed for a pre-reset position never lands
    let (handle, mut mock) = start_session(fast_config());

    handle.play_move(candidate("e2e4"));
    mock.expect_line("go depth").await;
    wait_for(&handle, |s| s.thinking).await;

    handle.reset();
    let fresh = wait_for(&handle, |s| s.history.is_empty() && !s.thinking).await;
    assert_eq!(fresh.fen, STARTING_FEN);

    // Cancellation is advisory; the session must see the reset signal and
    // still drop the late result.
    mock.expect_line("stop").await;
    mock.expect_line("ucinewgame").await;
    mock.send_line("bestmove e7e5").await;

    sleep(Duration::from_millis(100)).await;
    let after_stale = handle.snapshot();
    assert!(after_stale.history.is_empty());
    assert_eq!(after_stale.fen, STARTING_FEN);
    assert!(!after_stale.thinking);

    handle.shutdown();
}

#[tokio::test]
async fn opponent_piece_click_leaves_selection_idle() {
    let (handle, mut mock) = start_session(fast_config());
    mock.expect_line("ucinewgame").await;

    handle.click(square("e7"));
    // Follow with a real selection so a snapshot update is observable.
    handle.click(square("e2"));

    let selected = wait_for(&handle, |s| s.selected.is_some()).await;
    assert_eq!(selected.selected, Some(square("e2")));
    assert!(selected.history.is_empty());

    handle.shutdown();
}

#[tokio::test]
async fn terminate_sends_quit() {
    let (handle, mut mock) = start_session(fast_config());
    mock.expect_line("ucinewgame").await;

    handle.shutdown();
    mock.expect_line("quit").await;
}
