//! Line-based front end: command parsing and plain text rendering.

use std::fmt::Write as _;

use rankfile_shared::time::{elapsed_seconds, format_clock, now_utc};
use thiserror::Error;

use crate::domain::{
    BoardDimensions, BoardSetup, Color, DisplayMessage, GameEnding, GameHistory, GameId,
    GameSnapshot, GameStatus, Piece, Position, Severity,
};

use super::session::{Navigation, SessionCommand};

pub const HELP: &str = "\
Commands:
  create [standard | random <RxF> | king <RxF>] [white|black]
  join <game-id>        join (or re-join) a game
  leave                 leave the active game
  focus <game-id>       switch the active game
  games                 list tracked games
  select <square>       pick a source square, then a destination
  move <from> <to>      e.g. move e2 e4
  resign | draw | state
  first | prev | next | last
  board | help | quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Session(SessionCommand),
    Board,
    Games,
    Help,
    Quit,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<CliCommand, CliError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(CliError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let session = |command| Ok(CliCommand::Session(command));

    match (command.to_lowercase().as_str(), args.as_slice()) {
        ("create", args) => session(parse_create(args)?),
        ("join", [id]) => session(SessionCommand::Join(parse_game_id(id)?)),
        ("join", _) => Err(CliError::Usage("join <game-id>")),
        ("focus", [id]) => session(SessionCommand::Focus(parse_game_id(id)?)),
        ("focus", _) => Err(CliError::Usage("focus <game-id>")),
        ("select", [square]) => session(SessionCommand::Select(parse_square(square)?)),
        ("select", _) => Err(CliError::Usage("select <square>")),
        ("move", [from, to]) => session(SessionCommand::Move {
            from: parse_square(from)?,
            to: parse_square(to)?,
        }),
        ("move", _) => Err(CliError::Usage("move <from> <to>")),
        ("leave", []) => session(SessionCommand::Leave),
        ("resign", []) => session(SessionCommand::Resign),
        ("draw", []) => session(SessionCommand::OfferDraw),
        ("state", []) => session(SessionCommand::Refresh),
        ("first", []) => session(SessionCommand::Navigate(Navigation::First)),
        ("prev", []) => session(SessionCommand::Navigate(Navigation::Previous)),
        ("next", []) => session(SessionCommand::Navigate(Navigation::Next)),
        ("last", []) => session(SessionCommand::Navigate(Navigation::Last)),
        ("board", []) => Ok(CliCommand::Board),
        ("games", []) => Ok(CliCommand::Games),
        ("help", _) => Ok(CliCommand::Help),
        ("quit" | "exit", []) => Ok(CliCommand::Quit),
        (
            "leave" | "resign" | "draw" | "state" | "first" | "prev" | "next" | "last" | "board"
            | "games" | "quit" | "exit",
            _,
        ) => Err(CliError::InvalidArgument(format!(
            "'{command}' takes no arguments"
        ))),
        _ => Err(CliError::UnknownCommand(command.to_string())),
    }
}

fn parse_create(args: &[&str]) -> Result<SessionCommand, CliError> {
    const USAGE: &str = "create [standard | random <RxF> | king <RxF>] [white|black]";

    let mut args = args.iter().copied().peekable();
    let board_setup = match args.peek().copied() {
        Some("standard") => {
            args.next();
            Some(BoardSetup::Standard)
        }
        Some("random") => {
            args.next();
            let dims = args.next().ok_or(CliError::Usage(USAGE))?;
            Some(BoardSetup::Random(parse_dimensions(dims)?))
        }
        Some("king") => {
            args.next();
            let dims = args.next().ok_or(CliError::Usage(USAGE))?;
            Some(BoardSetup::KingAndOneOtherPiece(parse_dimensions(dims)?))
        }
        _ => None,
    };

    let color_preference = match args.next() {
        None => None,
        Some("white") => Some(Color::White),
        Some("black") => Some(Color::Black),
        Some(_) => return Err(CliError::Usage(USAGE)),
    };

    if args.next().is_some() {
        return Err(CliError::Usage(USAGE));
    }

    Ok(SessionCommand::Create {
        board_setup,
        color_preference,
    })
}

fn parse_game_id(id: &str) -> Result<GameId, CliError> {
    GameId::new(id.to_string()).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

fn parse_square(square: &str) -> Result<Position, CliError> {
    square.parse().map_err(CliError::InvalidArgument)
}

/// `RxF`, e.g. `6x8`.
fn parse_dimensions(text: &str) -> Result<BoardDimensions, CliError> {
    let invalid = || CliError::InvalidArgument(format!("'{text}' is not RANKSxFILES"));
    let (ranks, files) = text.split_once(['x', 'X']).ok_or_else(invalid)?;
    let ranks = ranks.parse().map_err(|_| invalid())?;
    let files = files.parse().map_err(|_| invalid())?;
    BoardDimensions::new(ranks, files).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Plain text board seen from `viewer`'s side.
pub fn render_board(snapshot: &GameSnapshot, viewer: Color, selection: Option<Position>) -> String {
    let board = &snapshot.board;
    let dims = board.dimensions();

    let mut ranks: Vec<u8> = (0..dims.ranks).rev().collect();
    let mut files: Vec<u8> = (0..dims.files).collect();
    if viewer == Color::Black {
        ranks.reverse();
        files.reverse();
    }

    let mut out = String::new();
    for &rank in &ranks {
        let _ = write!(out, "{:>2} |", rank + 1);
        for &file in &files {
            let position = Position::new(rank, file);
            let symbol = board.get(position).map_or('.', |piece| piece.symbol());
            if selection == Some(position) {
                let _ = write!(out, "[{symbol}]");
            } else {
                let _ = write!(out, " {symbol} ");
            }
        }
        out.push('\n');
    }

    out.push_str("    ");
    for &file in &files {
        let _ = write!(out, " {} ", (b'a' + file) as char);
    }
    out
}

/// One-line status of the viewed snapshot, followed by clocks and captures.
pub fn render_summary(history: &GameHistory, index: usize, viewer: Color) -> String {
    let Some(snapshot) = history.get(index) else {
        return format!("Game {} has no snapshot #{}", history.id(), index);
    };

    let mut out = format!(
        "Game {} [{}/{}] {}",
        history.id(),
        index + 1,
        history.len(),
        describe_status(snapshot),
    );
    if index + 1 < history.len() {
        out.push_str(" (reviewing)");
    }
    let _ = write!(out, ", you are {}", color_name(viewer));

    let players = history.players();
    let _ = write!(
        out,
        "\n  white: {}  black: {}",
        players.white.username.as_deref().unwrap_or("-"),
        players.black.username.as_deref().unwrap_or("-"),
    );

    if let Some(clock) = history.clock() {
        let _ = write!(
            out,
            "\n  clock: white {}  black {}",
            format_clock(clock.white_seconds_left),
            format_clock(clock.black_seconds_left),
        );
        if let Some(last_move_at) = clock.last_move_at {
            let _ = write!(
                out,
                "  (last move {}s ago)",
                elapsed_seconds(last_move_at, now_utc())
            );
        }
    }

    let captured = &snapshot.captured_pieces;
    if captured.total() > 0 {
        let symbols = |pieces: &[Piece]| -> String {
            pieces.iter().map(|piece| piece.symbol()).collect()
        };
        let _ = write!(
            out,
            "\n  captured: white {} (+{})  black {} (+{})",
            symbols(&captured.white),
            captured.white_points,
            symbols(&captured.black),
            captured.black_points,
        );
    }

    if let Some(stats) = snapshot.search_statistics {
        let _ = write!(
            out,
            "\n  engine: depth {} nodes {} qnodes {} {}ms{}",
            stats.depth,
            stats.nodes,
            stats.qnodes,
            stats.time_ms,
            if stats.from_book { " (book)" } else { "" },
        );
    }
    out
}

/// `[warning] text`
pub fn render_message(message: &DisplayMessage) -> String {
    let tag = match message.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Success => "success",
    };
    format!("[{tag}] {}", message.text)
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn describe_status(snapshot: &GameSnapshot) -> String {
    match snapshot.status {
        GameStatus::NotStarted => "waiting for players".to_string(),
        GameStatus::InProgress => {
            let mut text = format!("{} to move", color_name(snapshot.current_turn));
            if let Some(color) = snapshot.in_check {
                let _ = write!(text, ", {} in check", color_name(color));
            }
            text
        }
        GameStatus::Finished(ending) => format!("finished: {}", describe_ending(ending)),
    }
}

fn describe_ending(ending: GameEnding) -> String {
    match ending {
        GameEnding::Checkmate(winner) => format!("checkmate, {} wins", color_name(winner)),
        GameEnding::Resignation(winner) => {
            format!("resignation, {} wins", color_name(winner))
        }
        GameEnding::OutOfTime(winner) => format!("out of time, {} wins", color_name(winner)),
        GameEnding::Stalemate => "stalemate".to_string(),
        GameEnding::DrawByThreefoldRepetition => "draw by threefold repetition".to_string(),
        GameEnding::DrawByFiftyMoveRule => "draw by fifty-move rule".to_string(),
        GameEnding::DrawByInsufficientMaterial => "draw by insufficient material".to_string(),
        GameEnding::DrawByMutualAgreement => "draw by agreement".to_string(),
    }
}
