//! Controllers for the board, cursor and roster. Each operation is a free
//! function over the shared [`Context`]; state locks are never held across
//! a request.

pub mod evaluation;
pub mod moves;
pub mod navigation;
pub mod pagination;
pub mod position_search;
pub mod promotion;
pub mod replay;
pub mod roster;
pub mod variation;

use chess_core::pgn;

use crate::context::Context;
use crate::state::{HistoryEffect, RequestToken};

/// Apply a server-confirmed position: board, history and PGN, then the
/// follow-ups that depend on the board (cursor buttons, roster, evaluation).
/// Returns `false` when a newer board request has superseded `token`.
pub(crate) async fn commit_position(
    ctx: &Context,
    token: RequestToken,
    fen: &str,
    pgn: Option<&str>,
    effect: HistoryEffect,
) -> bool {
    let applied = ctx.state().commit_board(token, fen, effect);
    if !applied {
        tracing::debug!(seq = token.seq(), "Discarding stale board response");
        return false;
    }

    ctx.board.set_position(fen);
    if let Some(pgn) = pgn {
        ctx.view.set_pgn(&pgn::strip_tags(pgn));
    }

    navigation::refresh_cursor_state(ctx).await;
    position_search::refresh_for_board(ctx).await;
    evaluation::refresh(ctx).await;
    true
}
