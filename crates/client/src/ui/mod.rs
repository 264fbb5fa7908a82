//! Seams to the page: the board widget and everything else the controllers
//! render. Both are implemented outside the controllers; `headless` and
//! `record` provide in-process implementations.

pub mod headless;
pub mod record;

use chess_core::{GameSummary, PieceCode, Square};

use crate::controllers::pagination::PaginationBar;
use crate::controllers::promotion::PromotionPrompt;
use crate::push::ConnectionState;
use crate::state::RosterPage;

pub use headless::FenBoard;
pub use record::{RecordingView, ViewEvent};

/// Screen rectangle in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// The external board widget: piece display and drag gestures.
pub trait BoardWidget: Send + Sync {
    fn fen(&self) -> String;

    fn set_position(&self, fen: &str);

    fn piece_at(&self, square: Square) -> Option<PieceCode>;

    fn square_bounds(&self, square: Square) -> Rect;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavButtons {
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl NavButtons {
    /// "previous" is disabled exactly at the start, "next" exactly when no
    /// continuation is recorded.
    pub fn from_flags(is_at_start: bool, has_next_move: bool) -> Self {
        Self {
            prev_enabled: !is_at_start,
            next_enabled: has_next_move,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationDisplay {
    Score { score: String, best_move: String },
    /// Error marker shown in both evaluation fields.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterMessage {
    NoGames,
    NoMatchingGames,
    Error(String),
}

impl RosterMessage {
    pub fn text(&self) -> String {
        match self {
            RosterMessage::NoGames => "No games found.".to_string(),
            RosterMessage::NoMatchingGames => "No games match this position.".to_string(),
            RosterMessage::Error(msg) => format!("Error loading games: {msg}"),
        }
    }
}

/// Everything on the page other than the board itself.
pub trait View: Send + Sync {
    fn set_nav_buttons(&self, buttons: NavButtons);

    fn set_pgn(&self, pgn: &str);

    fn show_error(&self, message: &str);

    fn show_evaluation(&self, evaluation: &EvaluationDisplay);

    fn show_promotion_menu(&self, prompt: &PromotionPrompt);

    fn hide_promotion_menu(&self);

    fn show_variation_menu(&self, labels: &[String], highlighted: usize);

    fn highlight_variation(&self, index: usize);

    fn hide_variation_menu(&self);

    fn set_loading(&self, loading: bool, text: &str);

    fn render_roster(&self, page: &RosterPage);

    fn append_roster_rows(&self, games: &[GameSummary]);

    fn render_pagination(&self, bar: &PaginationBar);

    fn show_roster_message(&self, message: &RosterMessage);

    fn show_connection(&self, state: &ConnectionState);
}
