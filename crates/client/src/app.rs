use std::sync::Arc;

use chess_core::PromotionPiece;

use crate::api::{GameApi, RosterUpdate};
use crate::config::Config;
use crate::context::Context;
use crate::controllers::moves::{self, DropOutcome};
use crate::controllers::navigation::{self, NavOutcome};
use crate::controllers::roster::{self, PushMerge, RosterOutcome};
use crate::controllers::replay::ReplayViewer;
use crate::controllers::{evaluation, position_search};
use crate::error::ClientError;
use crate::keys::Key;
use crate::ui::{BoardWidget, View};

/// One page's worth of client state and the operations the page wires to
/// its widgets. Cloning shares the same state.
#[derive(Clone)]
pub struct App {
    ctx: Arc<Context>,
}

impl App {
    pub fn new(
        api: Arc<dyn GameApi>,
        board: Arc<dyn BoardWidget>,
        view: Arc<dyn View>,
        config: &Config,
    ) -> Self {
        Self {
            ctx: Context::new(api, board, view, config),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Initial page load: cursor buttons, first roster page and evaluation.
    pub async fn start(&self) {
        tracing::info!("Board initialized");
        navigation::refresh_cursor_state(&self.ctx).await;
        roster::fetch_games(&self.ctx, 1).await;
        evaluation::refresh(&self.ctx).await;
    }

    pub async fn on_drop(&self, source: &str, target: &str) -> Result<DropOutcome, ClientError> {
        moves::submit_move(&self.ctx, source, target).await
    }

    pub async fn choose_promotion(&self, piece: PromotionPiece) -> Result<DropOutcome, ClientError> {
        moves::choose_promotion(&self.ctx, piece).await
    }

    pub fn cancel_promotion(&self) -> bool {
        moves::cancel_promotion(&self.ctx)
    }

    pub async fn navigate_back(&self) -> NavOutcome {
        navigation::navigate_back(&self.ctx).await
    }

    pub async fn navigate_next(&self) -> NavOutcome {
        navigation::navigate_next(&self.ctx).await
    }

    pub async fn select_variation(&self, index: usize) -> NavOutcome {
        navigation::select_variation(&self.ctx, index).await
    }

    pub async fn click_variation(&self, index: usize) -> Result<NavOutcome, ClientError> {
        navigation::click_variation(&self.ctx, index).await
    }

    pub async fn handle_key(&self, key: Key) -> NavOutcome {
        navigation::handle_key(&self.ctx, key).await
    }

    pub async fn reset_game(&self) -> NavOutcome {
        navigation::reset_game(&self.ctx).await
    }

    pub async fn fetch_games(&self, page: u32) -> RosterOutcome {
        roster::fetch_games(&self.ctx, page).await
    }

    pub async fn fetch_games_by_fen(&self, fen: &str, page: u32) -> RosterOutcome {
        position_search::fetch_games_by_fen(&self.ctx, fen, page).await
    }

    /// Follow a page link of the bar currently shown.
    pub async fn go_to_page(&self, page: u32) -> RosterOutcome {
        let mode = self.ctx.state().roster_mode.clone();
        roster::go_to_page(&self.ctx, &mode, page).await
    }

    pub async fn submit_filters(&self, fields: &[(String, String)]) -> RosterOutcome {
        roster::submit_filters(&self.ctx, fields.iter().map(|(k, v)| (k, v))).await
    }

    pub async fn clear_filters(&self) -> RosterOutcome {
        roster::clear_filters(&self.ctx).await
    }

    pub fn apply_push_update(&self, update: RosterUpdate) -> PushMerge {
        roster::apply_push_update(&self.ctx, update)
    }

    pub async fn set_evaluation(&self, enabled: bool) {
        evaluation::set_enabled(&self.ctx, enabled).await
    }

    pub fn replay_viewer(&self) -> ReplayViewer {
        ReplayViewer::new(
            self.ctx.api.clone(),
            self.ctx.board.clone(),
            self.ctx.view.clone(),
        )
    }
}
