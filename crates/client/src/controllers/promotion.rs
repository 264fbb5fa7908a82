//! Promotion choice for a pawn dropped on its last rank.

use chess_core::board::Color;
use chess_core::{MoveRequest, PieceCode, PromotionPiece, Square};

use crate::ui::{BoardWidget, Rect};

/// What the view needs to draw the four-piece menu over the target square.
#[derive(Clone, Debug, PartialEq)]
pub struct PromotionPrompt {
    pub source: Square,
    pub target: Square,
    pub color: Color,
    /// Menu images in `PromotionPiece::ALL` order.
    pub options: Vec<PieceCode>,
    /// On-screen bounds of the target square.
    pub square: Rect,
    /// Point the menu is centred on.
    pub anchor: (f64, f64),
}

/// A suspended move waiting for the user to pick a piece. There is no
/// timeout; dropping the menu abandons the move without committing anything.
#[derive(Debug)]
pub struct PromotionMenu {
    source: Square,
    target: Square,
    color: Color,
}

impl PromotionMenu {
    pub fn open(
        source: Square,
        target: Square,
        piece: PieceCode,
        board: &dyn BoardWidget,
    ) -> (Self, PromotionPrompt) {
        let square = board.square_bounds(target);
        let prompt = PromotionPrompt {
            source,
            target,
            color: piece.color,
            options: PromotionPiece::ALL
                .iter()
                .map(|p| p.piece_code(piece.color))
                .collect(),
            square,
            anchor: square.center(),
        };
        let menu = Self {
            source,
            target,
            color: piece.color,
        };
        (menu, prompt)
    }

    pub fn source(&self) -> Square {
        self.source
    }

    pub fn target(&self) -> Square {
        self.target
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Compose the final move for the chosen piece.
    pub fn choose(self, piece: PromotionPiece) -> MoveRequest {
        MoveRequest::new(self.source, self.target, Some(piece))
    }
}
