//! Terminal front end for a chess session against a UCI engine
//!
//! Thin presentation shim over the session library: renders snapshots as
//! an ASCII board and feeds typed squares back in as board clicks.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use shakmaty::{Color, File, Position, Rank, Square};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chessmate::{
    EngineChannel, GameSession, GameStatus, MoveCandidate, SessionConfig, SessionHandle,
    SessionSnapshot,
};

#[derive(Parser, Debug)]
#[command(name = "chessmate", about = "Play chess against a UCI engine in the terminal")]
struct Args {
    /// Path to a UCI engine executable
    #[arg(long, default_value = "stockfish")]
    engine: String,

    /// Side played by the human
    #[arg(long, value_enum, default_value = "white")]
    color: PlayAs,

    /// Engine skill level (0-20)
    #[arg(long, default_value_t = 10)]
    skill: u8,

    /// Search depth per engine move
    #[arg(long, default_value_t = 10)]
    depth: u8,

    /// Delay in milliseconds before the engine starts thinking
    #[arg(long, default_value_t = 500)]
    think_delay_ms: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlayAs {
    White,
    Black,
}

impl From<PlayAs> for Color {
    fn from(side: PlayAs) -> Self {
        match side {
            PlayAs::White => Color::White,
            PlayAs::Black => Color::Black,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = SessionConfig {
        human_color: args.color.into(),
        search_depth: args.depth,
        think_delay: Duration::from_millis(args.think_delay_ms),
        ..SessionConfig::default()
    };
    config.set_skill_level(args.skill);

    let engine = match EngineChannel::spawn_process(&args.engine) {
        Ok(channel) => Some(channel),
        Err(error) => {
            warn!("[MAIN] {error}; continuing without AI");
            None
        }
    };

    let handle = GameSession::spawn(config, engine);
    let mut snapshots = handle.watch();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    render(&handle.snapshot());
    print_help();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                render(&snapshot);
            }
            line = input.next_line() => {
                match line? {
                    None => break,
                    Some(text) => {
                        if !handle_input(text.trim(), &handle) {
                            break;
                        }
                    }
                }
            }
        }
    }

    handle.shutdown();
    Ok(())
}

fn handle_input(text: &str, handle: &SessionHandle) -> bool {
    match text {
        "" => {}
        "quit" | "exit" => return false,
        "new" => handle.reset(),
        "help" => print_help(),
        _ => {
            if let Some(level) = text.strip_prefix("skill ") {
                match level.trim().parse::<u8>() {
                    Ok(level) => handle.set_skill_level(level),
                    Err(_) => println!("skill takes a number, e.g. `skill 15`"),
                }
            } else if let Ok(square) = text.parse::<Square>() {
                handle.click(square);
            } else if let Some(candidate) = MoveCandidate::from_uci(text) {
                handle.play_move(candidate);
            } else {
                println!("unrecognized input `{text}`; type `help`");
            }
        }
    }
    true
}

fn render(snapshot: &SessionSnapshot) {
    println!();
    for rank_index in (0u32..8).rev() {
        let rank = Rank::new(rank_index);
        print!("  {} ", rank_index + 1);
        for file_index in 0u32..8 {
            let square = Square::from_coords(File::new(file_index), rank);
            let glyph = match snapshot.position.board().piece_at(square) {
                Some(piece) => piece.char(),
                None if snapshot.targets.contains(&square) => '*',
                None => '.',
            };
            if snapshot.selected == Some(square) {
                print!("({glyph})");
            } else {
                print!(" {glyph} ");
            }
        }
        println!();
    }
    println!("     a  b  c  d  e  f  g  h");
    if let Some(played) = &snapshot.last_move {
        println!("  last move: {}", played.san);
    }
    println!("  {}", status_line(snapshot));
}

fn status_line(snapshot: &SessionSnapshot) -> String {
    let text = match snapshot.status {
        GameStatus::Checkmate => {
            format!("Checkmate! {} wins.", color_name(snapshot.turn.other()))
        }
        GameStatus::Draw => "Draw!".to_string(),
        GameStatus::Check => format!("Check! {}'s turn", color_name(snapshot.turn)),
        GameStatus::Playing => format!("{}'s turn", color_name(snapshot.turn)),
    };
    if snapshot.thinking {
        format!("{text} (thinking...)")
    } else {
        text
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

fn print_help() {
    println!("  commands: e2 (click square), e2e4 (play move), new, skill <0-20>, quit");
}
