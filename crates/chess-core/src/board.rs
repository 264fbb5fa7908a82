//! Board vocabulary shared by the client: squares, widget piece codes and
//! the promotion rule. Nothing here knows about move legality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid piece code: {0}")]
    InvalidPiece(String),

    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(String),
}

/// A board square, file and rank both zero-based (a1 = (0, 0)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// Rank as written in algebraic notation (1..=8).
    pub fn rank_number(&self) -> u8 {
        self.rank + 1
    }
}

impl FromStr for Square {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(BoardError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| BoardError::InvalidSquare(s.to_string()))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank_number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Zero-based rank a pawn of this color promotes on.
    pub fn last_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    fn prefix(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// Piece identity as the board widget reports it: `wP`, `bK`, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PieceCode {
    pub color: Color,
    pub kind: PieceKind,
}

impl PieceCode {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Piece from a FEN placement character (uppercase = white).
    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self { color, kind })
    }
}

impl FromStr for PieceCode {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(c), Some(k), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(BoardError::InvalidPiece(s.to_string()));
        };
        let color = match c {
            'w' => Color::White,
            'b' => Color::Black,
            _ => return Err(BoardError::InvalidPiece(s.to_string())),
        };
        if !k.is_ascii_uppercase() {
            return Err(BoardError::InvalidPiece(s.to_string()));
        }
        let kind = PieceKind::from_letter(k).ok_or_else(|| BoardError::InvalidPiece(s.to_string()))?;
        Ok(Self { color, kind })
    }
}

impl fmt::Display for PieceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.prefix(), self.kind.letter())
    }
}

/// A pawn dropped on the last rank for its color needs a promotion choice.
pub fn is_promotion_drop(piece: PieceCode, target: Square) -> bool {
    piece.kind == PieceKind::Pawn && target.rank() == piece.color.last_rank()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionPiece {
    /// Menu order.
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    pub fn kind(&self) -> PieceKind {
        match self {
            PromotionPiece::Queen => PieceKind::Queen,
            PromotionPiece::Rook => PieceKind::Rook,
            PromotionPiece::Bishop => PieceKind::Bishop,
            PromotionPiece::Knight => PieceKind::Knight,
        }
    }

    pub fn letter(&self) -> char {
        self.kind().letter()
    }

    /// Widget code for the menu image of this piece in `color`.
    pub fn piece_code(&self, color: Color) -> PieceCode {
        PieceCode::new(color, self.kind())
    }
}

impl FromStr for PromotionPiece {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q" | "queen" => Ok(PromotionPiece::Queen),
            "r" | "rook" => Ok(PromotionPiece::Rook),
            "b" | "bishop" => Ok(PromotionPiece::Bishop),
            "n" | "knight" => Ok(PromotionPiece::Knight),
            _ => Err(BoardError::InvalidPromotion(s.to_string())),
        }
    }
}

/// Move as submitted to the server: source + target + optional promotion
/// letter, e.g. `e2e4` or `e7e8N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: Square,
    pub target: Square,
    pub promotion: Option<PromotionPiece>,
}

impl MoveRequest {
    pub fn new(source: Square, target: Square, promotion: Option<PromotionPiece>) -> Self {
        Self {
            source,
            target,
            promotion,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source, self.target)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.letter())?;
        }
        Ok(())
    }
}

/// Piece placement field of a FEN.
pub fn placement(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

pub fn is_start_position(fen: &str) -> bool {
    placement(fen) == placement(START_FEN)
}

/// Look up the piece on `square` from a FEN placement field.
pub fn piece_at(fen: &str, square: Square) -> Option<PieceCode> {
    // Placement lists rank 8 first.
    let row = placement(fen).split('/').nth(usize::from(7 - square.rank()))?;
    let mut file = 0u8;
    for c in row.chars() {
        if let Some(skip) = c.to_digit(10) {
            file += skip as u8;
            continue;
        }
        if file == square.file() {
            return PieceCode::from_fen_char(c);
        }
        file += 1;
        if file > square.file() {
            break;
        }
    }
    None
}
