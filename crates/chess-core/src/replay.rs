//! SAN replay for the read-only game view. This is the only place the client
//! plays moves locally; the branching cursor always asks the server.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{Chess, EnPassantMode, Position};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Move {index} ({san}) could not be replayed: {reason}")]
pub struct ReplayError {
    pub index: usize,
    pub san: String,
    pub reason: String,
}

/// Positions reached by a recorded move list. `fens[0]` is the start
/// position and `fens[i]` the position after `moves[i - 1]`.
#[derive(Debug, Clone)]
pub struct ReplayLine {
    pub moves: Vec<String>,
    pub fens: Vec<String>,
    /// Set when replay stopped early at an unreadable or illegal move.
    pub stopped: Option<ReplayError>,
}

impl ReplayLine {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Replay SAN moves from the standard start position, stopping at the first
/// move that does not parse or is illegal.
pub fn replay_san(san_moves: &[String]) -> ReplayLine {
    let mut pos = Chess::default();
    let mut moves = Vec::new();
    let mut fens = vec![fen_of(&pos)];
    let mut stopped = None;

    for (index, san_str) in san_moves.iter().enumerate() {
        let san_str = san_str.trim();
        if san_str.is_empty() || matches!(san_str, "1-0" | "0-1" | "1/2-1/2" | "*") {
            continue;
        }

        let mv = san_str
            .parse::<San>()
            .map_err(|e| e.to_string())
            .and_then(|san| san.to_move(&pos).map_err(|e| e.to_string()));

        match mv {
            Ok(mv) => {
                pos.play_unchecked(mv);
                moves.push(san_str.to_string());
                fens.push(fen_of(&pos));
            }
            Err(reason) => {
                stopped = Some(ReplayError {
                    index,
                    san: san_str.to_string(),
                    reason,
                });
                break;
            }
        }
    }

    ReplayLine {
        moves,
        fens,
        stopped,
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}
