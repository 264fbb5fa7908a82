//! Client-side application state.
//!
//! Everything the controllers mutate lives in one [`AppState`] behind the
//! [`Context`](crate::context::Context) mutex. Board and cursor state are
//! written only through [`AppState::commit_board`]; the filter set only by
//! the filter-submit path.

use std::collections::{BTreeMap, HashMap};

use chess_core::{GameSummary, MoveRequest, START_FEN};

use crate::controllers::pagination::Pagination;
use crate::controllers::promotion::PromotionMenu;
use crate::controllers::variation::VariationMenu;

/// Active roster filters, keyed by form field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet(BTreeMap<String, String>);

impl FilterSet {
    /// Keep only fields with a non-blank name and value.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map = fields
            .into_iter()
            .filter_map(|(k, v)| {
                let (k, v) = (k.as_ref().trim(), v.as_ref().trim());
                (!k.is_empty() && !v.is_empty()).then(|| (k.to_string(), v.to_string()))
            })
            .collect();
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Resources whose responses are sequenced independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Board,
    CursorFlags,
    Roster,
    Evaluation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken {
    resource: Resource,
    seq: u64,
}

impl RequestToken {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Monotonic per-resource request tokens. A response is applied only while
/// its token is still the latest issued for that resource.
#[derive(Debug, Default)]
pub struct RequestTokens {
    next_seq: u64,
    latest: HashMap<Resource, u64>,
}

impl RequestTokens {
    pub fn issue(&mut self, resource: Resource) -> RequestToken {
        self.next_seq += 1;
        self.latest.insert(resource, self.next_seq);
        RequestToken {
            resource,
            seq: self.next_seq,
        }
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest.get(&token.resource) == Some(&token.seq)
    }
}

/// Move awaiting the server's verdict.
#[derive(Clone, Debug)]
pub struct PendingMove {
    pub request: MoveRequest,
    /// Board snapshot taken just before submission, restored on rejection.
    pub previous_fen: String,
    pub token: RequestToken,
}

/// FENs along the path from the start to the cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionHistory(Vec<String>);

impl PositionHistory {
    pub fn push(&mut self, fen: impl Into<String>) {
        self.0.push(fen.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a board commit does to the position history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryEffect {
    Push,
    Pop,
    Reset,
}

#[derive(Debug, Default)]
pub enum CursorPhase {
    #[default]
    Idle,
    InFlight(RequestToken),
    VariationPending(VariationMenu),
}

impl CursorPhase {
    pub fn is_variation_pending(&self) -> bool {
        matches!(self, CursorPhase::VariationPending(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, CursorPhase::InFlight(_))
    }
}

/// Which query produced the displayed roster; page links re-issue the same kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterMode {
    Metadata,
    Position { fen: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RosterPage {
    pub games: Vec<GameSummary>,
    pub pagination: Pagination,
}

impl Default for RosterPage {
    fn default() -> Self {
        Self {
            games: Vec::new(),
            pagination: Pagination::new(1, 1),
        }
    }
}

impl RosterPage {
    pub fn contains(&self, game_id: i64) -> bool {
        self.games.iter().any(|g| g.id == game_id)
    }
}

/// Push updates that arrived while the unfiltered metadata roster was not on
/// screen. They are merged the next time that roster is rendered.
#[derive(Debug, Default)]
pub struct PushBacklog {
    pub games: Vec<GameSummary>,
    pub total_pages: Option<u32>,
}

impl PushBacklog {
    /// Queue games not already waiting. Returns how many were added.
    pub fn queue(&mut self, games: Vec<GameSummary>, total_pages: Option<u32>) -> usize {
        let before = self.games.len();
        for game in games {
            if !self.games.iter().any(|g| g.id == game.id) {
                self.games.push(game);
            }
        }
        if total_pages.is_some() {
            self.total_pages = total_pages;
        }
        self.games.len() - before
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty() && self.total_pages.is_none()
    }
}

#[derive(Debug)]
pub struct AppState {
    pub tokens: RequestTokens,
    pub pending_move: Option<PendingMove>,
    pub promotion: Option<PromotionMenu>,
    pub cursor: CursorPhase,
    pub history: PositionHistory,
    pub filters: FilterSet,
    pub roster: RosterPage,
    pub roster_mode: RosterMode,
    pub push_backlog: PushBacklog,
    pub evaluation_enabled: bool,
    /// Last position committed from a server response.
    board_fen: String,
}

impl AppState {
    pub fn new(evaluation_enabled: bool) -> Self {
        Self {
            tokens: RequestTokens::default(),
            pending_move: None,
            promotion: None,
            cursor: CursorPhase::Idle,
            history: PositionHistory::default(),
            filters: FilterSet::default(),
            roster: RosterPage::default(),
            roster_mode: RosterMode::Metadata,
            push_backlog: PushBacklog::default(),
            evaluation_enabled,
            board_fen: START_FEN.to_string(),
        }
    }

    pub fn board_fen(&self) -> &str {
        &self.board_fen
    }

    /// Record `fen` as the committed board position if `token` is still the
    /// latest board token. Returns whether the commit was applied.
    pub fn commit_board(&mut self, token: RequestToken, fen: &str, effect: HistoryEffect) -> bool {
        if token.resource() != Resource::Board || !self.tokens.is_latest(token) {
            return false;
        }
        self.board_fen = fen.to_string();
        match effect {
            HistoryEffect::Push => self.history.push(fen),
            HistoryEffect::Pop => {
                self.history.pop();
            }
            HistoryEffect::Reset => self.history.clear(),
        }
        true
    }

    /// A modal input (promotion or variation choice) is waiting on the user.
    pub fn modal_open(&self) -> bool {
        self.promotion.is_some() || self.cursor.is_variation_pending()
    }

    /// Whether the unfiltered metadata roster is the one on screen.
    pub fn metadata_roster_shown(&self) -> bool {
        self.roster_mode == RosterMode::Metadata && self.filters.is_empty()
    }
}
