pub mod board;
pub mod game_data;
pub mod pgn;
pub mod replay;

pub use board::{MoveRequest, PieceCode, PromotionPiece, Square, START_FEN};
pub use game_data::GameSummary;
