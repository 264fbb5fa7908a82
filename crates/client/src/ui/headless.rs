use std::sync::Mutex;

use chess_core::{board, PieceCode, Square, START_FEN};

use super::{BoardWidget, Rect};

/// Board widget backed by a FEN string, laid out as an 8x8 grid of
/// `square_size` pixels starting at `origin`, white at the bottom.
#[derive(Debug)]
pub struct FenBoard {
    fen: Mutex<String>,
    origin: (f64, f64),
    square_size: f64,
}

impl FenBoard {
    pub fn new() -> Self {
        Self::with_geometry((0.0, 0.0), 50.0)
    }

    pub fn with_geometry(origin: (f64, f64), square_size: f64) -> Self {
        Self {
            fen: Mutex::new(START_FEN.to_string()),
            origin,
            square_size,
        }
    }

    pub fn starting_at(fen: &str) -> Self {
        let b = Self::new();
        b.set_position(fen);
        b
    }
}

impl Default for FenBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardWidget for FenBoard {
    fn fen(&self) -> String {
        self.fen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_position(&self, fen: &str) {
        *self.fen.lock().unwrap_or_else(|e| e.into_inner()) = fen.to_string();
    }

    fn piece_at(&self, square: Square) -> Option<PieceCode> {
        board::piece_at(&self.fen(), square)
    }

    fn square_bounds(&self, square: Square) -> Rect {
        let col = f64::from(square.file());
        let row = f64::from(7 - square.rank());
        Rect {
            left: self.origin.0 + col * self.square_size,
            top: self.origin.1 + row * self.square_size,
            width: self.square_size,
            height: self.square_size,
        }
    }
}
