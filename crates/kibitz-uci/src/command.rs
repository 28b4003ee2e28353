//! UCI messages: commands sent to an engine and the replies it sends back.

use std::fmt;

/// A command written to the engine's standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- switch the engine to UCI mode.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- the next position belongs to a new game.
    UciNewGame,
    /// `position fen <fen>` -- set up the position to search.
    Position { fen: String },
    /// `go depth <n>` -- search to a fixed depth.
    Go { depth: u8 },
    /// `quit` -- exit the engine.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => write!(f, "uci"),
            Command::IsReady => write!(f, "isready"),
            Command::UciNewGame => write!(f, "ucinewgame"),
            Command::Position { fen } => write!(f, "position fen {fen}"),
            Command::Go { depth } => write!(f, "go depth {depth}"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// A line read from the engine's standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `uciok` -- identification finished.
    UciOk,
    /// `readyok` -- answer to `isready`.
    ReadyOk,
    /// `bestmove <move> [ponder <move>]`.
    BestMove {
        best: String,
        ponder: Option<String>,
    },
    /// `bestmove` with nothing after it.
    MissingBestMove,
    /// `id`, `info`, `option` and anything else; ignored.
    Other,
}

/// Parse a single line of engine output into a [`Reply`].
pub fn parse_reply(line: &str) -> Reply {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uciok") => Reply::UciOk,
        Some("readyok") => Reply::ReadyOk,
        Some("bestmove") => parse_bestmove(tokens),
        _ => Reply::Other,
    }
}

fn parse_bestmove<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Reply {
    let Some(best) = tokens.next() else {
        return Reply::MissingBestMove;
    };
    let ponder = match (tokens.next(), tokens.next()) {
        (Some("ponder"), Some(mv)) => Some(mv.to_string()),
        _ => None,
    };
    Reply::BestMove {
        best: best.to_string(),
        ponder,
    }
}
