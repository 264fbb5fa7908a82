//! Roster queries keyed by the board position.

use chess_core::board::is_start_position;

use super::pagination::Pagination;
use super::roster::{self, begin_load, render_page, report_failure, settle_loading, RosterOutcome};
use crate::context::Context;
use crate::state::RosterMode;
use crate::ui::RosterMessage;

pub const SEARCH_TEXT: &str = "Searching games by position...";

/// Games that reached `fen`, with the active filters applied server side.
pub async fn fetch_games_by_fen(ctx: &Context, fen: &str, page: u32) -> RosterOutcome {
    let (token, filters) = begin_load(ctx);
    ctx.view.set_loading(true, SEARCH_TEXT);

    let outcome = match ctx.api.games_by_fen(fen, &filters, page).await {
        Ok(reply) => match reply.error {
            Some(message) => report_failure(ctx, token, message),
            None => render_page(
                ctx,
                token,
                RosterMode::Position {
                    fen: fen.to_string(),
                },
                reply.games,
                Pagination::new(reply.total_pages, reply.current_page),
                RosterMessage::NoMatchingGames,
            ),
        },
        Err(e) => report_failure(ctx, token, e.to_string()),
    };
    settle_loading(ctx, token);
    outcome
}

/// Re-query the roster for the committed board: the plain list at the
/// start position, a position search anywhere else.
pub async fn refresh_for_board(ctx: &Context) -> RosterOutcome {
    let fen = ctx.state().board_fen().to_string();
    if is_start_position(&fen) {
        roster::fetch_games(ctx, 1).await
    } else {
        fetch_games_by_fen(ctx, &fen, 1).await
    }
}
