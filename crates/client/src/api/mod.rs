//! Request/response surface of the game server.

pub mod csrf;
pub mod http;

use async_trait::async_trait;
use chess_core::pgn;
use chess_core::GameSummary;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::state::FilterSet;

pub use http::HttpApi;

pub mod endpoints {
    pub const ADD_MOVE: &str = "/add-move/";
    pub const CURRENT_STATE: &str = "/current_state/";
    pub const PREV_MOVE: &str = "/prev-move/";
    pub const NEXT_MOVE: &str = "/next-move/";
    pub const CHOOSE_VARIATION: &str = "/choose-variation/";
    pub const GAMES: &str = "/get_games/";
    pub const FILTERED_GAMES: &str = "/filter_games/";
    pub const GAMES_BY_FEN: &str = "/get_games_by_fen/";
    pub const EVALUATE: &str = "/evaluate_position/";
    pub const CLEAR_FILTERS: &str = "/clear_filters/";
    pub const RESET_GAME: &str = "/reset_game/";

    pub fn game_moves(game_id: i64) -> String {
        format!("/get_game_moves/{game_id}/")
    }
}

/// Board position returned by move, step and variation calls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BoardReply {
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default)]
    pub pgn: Option<String>,
}

/// Cursor flags as tracked by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CursorState {
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default)]
    pub pgn: Option<String>,
    #[serde(default)]
    pub is_at_start: bool,
    #[serde(default)]
    pub has_next_move: bool,
}

/// Forward step: either a single position or a choice between recorded
/// continuations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NextReply {
    Variations { variations: Vec<String> },
    Board(BoardReply),
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RosterReply {
    #[serde(default)]
    pub games: Vec<GameSummary>,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
}

/// Roster filtered by position. The server may answer 200 with an `error`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositionSearchReply {
    #[serde(default)]
    pub games: Vec<GameSummary>,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EvaluationReply {
    #[serde(default, alias = "eval")]
    pub evaluation: Option<f64>,
    #[serde(default)]
    pub best_move: Option<String>,
    #[serde(default)]
    pub best_moves: Vec<String>,
}

impl EvaluationReply {
    pub fn best(&self) -> Option<&str> {
        self.best_move
            .as_deref()
            .or_else(|| self.best_moves.first().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameMovesReply {
    #[serde(default)]
    pub moves: Option<Vec<String>>,
    #[serde(default)]
    pub notation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GameMovesReply {
    /// SAN moves, taken from `moves` or extracted from the PGN `notation`.
    pub fn san_moves(&self) -> Vec<String> {
        match (&self.moves, &self.notation) {
            (Some(moves), _) => moves.clone(),
            (None, Some(notation)) => pgn::extract_moves(notation),
            (None, None) => Vec::new(),
        }
    }
}

/// Unsolicited roster update from the push channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RosterUpdate {
    #[serde(default)]
    pub games: Option<Vec<GameSummary>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

#[async_trait]
pub trait GameApi: Send + Sync {
    async fn add_move(&self, mv: &str) -> Result<BoardReply, TransportError>;

    async fn current_state(&self) -> Result<CursorState, TransportError>;

    async fn prev_move(&self) -> Result<BoardReply, TransportError>;

    async fn next_move(&self) -> Result<NextReply, TransportError>;

    async fn choose_variation(&self, index: usize) -> Result<BoardReply, TransportError>;

    async fn games(&self, page: u32) -> Result<RosterReply, TransportError>;

    async fn filtered_games(
        &self,
        filters: &FilterSet,
        page: u32,
    ) -> Result<RosterReply, TransportError>;

    async fn games_by_fen(
        &self,
        fen: &str,
        filters: &FilterSet,
        page: u32,
    ) -> Result<PositionSearchReply, TransportError>;

    async fn evaluate(
        &self,
        fen: &str,
        history: &[String],
    ) -> Result<EvaluationReply, TransportError>;

    async fn clear_filters(&self) -> Result<(), TransportError>;

    async fn reset_game(&self) -> Result<(), TransportError>;

    async fn game_moves(&self, game_id: i64) -> Result<GameMovesReply, TransportError>;
}
