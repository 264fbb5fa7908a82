//! Cursor navigation along the server's move tree.
//!
//! Back, next and variation selection each issue a board token and move the
//! cursor phase to `InFlight`. A forward step that meets a branch opens the
//! variation menu instead of committing a position; while it is open every
//! other navigation input is suspended.

use std::mem;

use super::commit_position;
use super::variation::{MenuInput, VariationMenu, VARIATION_MENU_LISTENER};
use crate::api::{BoardReply, NextReply};
use crate::context::Context;
use crate::error::{ClientError, TransportError};
use crate::keys::Key;
use crate::state::{CursorPhase, HistoryEffect, RequestToken, Resource};
use crate::ui::NavButtons;

use chess_core::{pgn, START_FEN};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { fen: String },
    VariationMenuOpened { options: usize },
    Highlighted { index: usize },
    MenuClosed,
    /// A modal choice is open; the input was not acted on.
    Suspended,
    /// Another board request is still waiting on the server.
    Busy,
    Ignored,
    Failed { reason: String },
    Superseded,
}

const UNEXPECTED_REPLY: &str = "Server response did not include a position";

/// Issue a board token for a cursor step. The cursor takes one step at a
/// time and never moves while a modal choice or a move submission is open.
fn begin_step(ctx: &Context) -> Result<RequestToken, NavOutcome> {
    let mut state = ctx.state();
    if state.modal_open() {
        tracing::debug!("Navigation suspended while a choice is pending");
        return Err(NavOutcome::Suspended);
    }
    if state.cursor.is_in_flight() || state.pending_move.is_some() {
        tracing::debug!("Navigation ignored while a board request is in flight");
        return Err(NavOutcome::Busy);
    }
    let token = state.tokens.issue(Resource::Board);
    state.cursor = CursorPhase::InFlight(token);
    Ok(token)
}

/// Return the cursor to `Idle` if it is still waiting on `token`.
fn settle(ctx: &Context, token: RequestToken) {
    let mut state = ctx.state();
    if matches!(state.cursor, CursorPhase::InFlight(t) if t == token) {
        state.cursor = CursorPhase::Idle;
    }
}

async fn finish_step(
    ctx: &Context,
    token: RequestToken,
    reply: BoardReply,
    effect: HistoryEffect,
) -> NavOutcome {
    settle(ctx, token);
    let Some(fen) = reply.fen else {
        return fail(ctx, token, UNEXPECTED_REPLY.to_string());
    };
    if commit_position(ctx, token, &fen, reply.pgn.as_deref(), effect).await {
        NavOutcome::Moved { fen }
    } else {
        NavOutcome::Superseded
    }
}

/// Report a failed step. Nothing but the error display changes.
fn fail(ctx: &Context, token: RequestToken, reason: String) -> NavOutcome {
    settle(ctx, token);
    let latest = ctx.state().tokens.is_latest(token);
    if !latest {
        tracing::debug!(seq = token.seq(), "Discarding stale navigation failure");
        return NavOutcome::Superseded;
    }
    tracing::error!("Navigation failed: {reason}");
    ctx.view.show_error(&reason);
    NavOutcome::Failed { reason }
}

fn transport_failure(ctx: &Context, token: RequestToken, err: TransportError) -> NavOutcome {
    fail(ctx, token, err.to_string())
}

pub async fn navigate_back(ctx: &Context) -> NavOutcome {
    let token = match begin_step(ctx) {
        Ok(token) => token,
        Err(outcome) => return outcome,
    };
    match ctx.api.prev_move().await {
        Ok(reply) => finish_step(ctx, token, reply, HistoryEffect::Pop).await,
        Err(e) => transport_failure(ctx, token, e),
    }
}

pub async fn navigate_next(ctx: &Context) -> NavOutcome {
    let token = match begin_step(ctx) {
        Ok(token) => token,
        Err(outcome) => return outcome,
    };
    match ctx.api.next_move().await {
        Ok(NextReply::Variations { variations }) => open_variation_menu(ctx, token, variations),
        Ok(NextReply::Board(reply)) => finish_step(ctx, token, reply, HistoryEffect::Push).await,
        Err(e) => transport_failure(ctx, token, e),
    }
}

enum MenuOpen {
    Stale,
    Blocked,
    Empty,
    Opened,
}

fn open_variation_menu(ctx: &Context, token: RequestToken, labels: Vec<String>) -> NavOutcome {
    let opened = {
        let mut state = ctx.state();
        if !state.tokens.is_latest(token) {
            MenuOpen::Stale
        } else if state.promotion.is_some() {
            MenuOpen::Blocked
        } else {
            // The previous menu's listener must be released before the new one registers.
            if let CursorPhase::VariationPending(mut old) = mem::take(&mut state.cursor) {
                old.close();
            }
            match VariationMenu::open(labels.clone(), &ctx.keys) {
                Some(menu) => {
                    state.cursor = CursorPhase::VariationPending(menu);
                    MenuOpen::Opened
                }
                None => MenuOpen::Empty,
            }
        }
    };

    match opened {
        MenuOpen::Stale => {
            settle(ctx, token);
            tracing::debug!(seq = token.seq(), "Discarding stale variation list");
            NavOutcome::Superseded
        }
        MenuOpen::Blocked => {
            settle(ctx, token);
            tracing::warn!("Variation menu not opened while a promotion choice is open");
            NavOutcome::Suspended
        }
        MenuOpen::Empty => fail(ctx, token, "No variations available".to_string()),
        MenuOpen::Opened => {
            tracing::info!(options = labels.len(), "Variations available");
            ctx.view.show_variation_menu(&labels, 0);
            NavOutcome::VariationMenuOpened {
                options: labels.len(),
            }
        }
    }
}

/// Commit the variation at `index`. An open menu is closed first.
pub async fn select_variation(ctx: &Context, index: usize) -> NavOutcome {
    let (token, closed_menu) = {
        let mut state = ctx.state();
        if state.promotion.is_some() {
            return NavOutcome::Suspended;
        }
        if state.cursor.is_in_flight() || state.pending_move.is_some() {
            tracing::debug!(index, "Variation choice ignored while a board request is in flight");
            return NavOutcome::Busy;
        }
        let closed_menu = match mem::take(&mut state.cursor) {
            CursorPhase::VariationPending(mut menu) => {
                menu.close();
                true
            }
            _ => false,
        };
        let token = state.tokens.issue(Resource::Board);
        state.cursor = CursorPhase::InFlight(token);
        (token, closed_menu)
    };
    if closed_menu {
        ctx.view.hide_variation_menu();
    }

    tracing::info!(index, "Selecting variation");
    match ctx.api.choose_variation(index).await {
        Ok(reply) => finish_step(ctx, token, reply, HistoryEffect::Push).await,
        Err(e) => transport_failure(ctx, token, e),
    }
}

/// Feed a key to the open variation menu. `None` when no menu is open.
pub async fn handle_menu_key(ctx: &Context, key: Key) -> Option<NavOutcome> {
    if key == Key::Escape {
        return close_variation_menu(ctx).then_some(NavOutcome::MenuClosed);
    }
    let input = {
        let mut state = ctx.state();
        let CursorPhase::VariationPending(menu) = &mut state.cursor else {
            return None;
        };
        let input = menu.handle_key(key);
        if let MenuInput::Committed(_) = input {
            state.cursor = CursorPhase::Idle;
        }
        input
    };
    Some(apply_menu_input(ctx, input).await)
}

/// Click on the option at `index` of the open menu.
pub async fn click_variation(ctx: &Context, index: usize) -> Result<NavOutcome, ClientError> {
    let input = {
        let mut state = ctx.state();
        let CursorPhase::VariationPending(menu) = &mut state.cursor else {
            return Err(ClientError::NoVariationMenu);
        };
        let count = menu.labels().len();
        let input = menu.click(index);
        match input {
            MenuInput::Ignored => return Err(ClientError::VariationOutOfRange { index, count }),
            MenuInput::Committed(_) => state.cursor = CursorPhase::Idle,
            MenuInput::Highlighted(_) => {}
        }
        input
    };
    Ok(apply_menu_input(ctx, input).await)
}

async fn apply_menu_input(ctx: &Context, input: MenuInput) -> NavOutcome {
    match input {
        MenuInput::Highlighted(index) => {
            ctx.view.highlight_variation(index);
            NavOutcome::Highlighted { index }
        }
        MenuInput::Committed(index) => {
            ctx.view.hide_variation_menu();
            select_variation(ctx, index).await
        }
        MenuInput::Ignored => NavOutcome::Ignored,
    }
}

/// Close the variation menu without choosing. Returns whether one was open.
pub fn close_variation_menu(ctx: &Context) -> bool {
    let closed = {
        let mut state = ctx.state();
        match mem::take(&mut state.cursor) {
            CursorPhase::VariationPending(mut menu) => {
                menu.close();
                true
            }
            other => {
                state.cursor = other;
                false
            }
        }
    };
    if closed {
        ctx.view.hide_variation_menu();
    }
    closed
}

/// Global key handling: the variation menu takes every key while its
/// listener is registered, otherwise left/right step the cursor.
pub async fn handle_key(ctx: &Context, key: Key) -> NavOutcome {
    if ctx.keys.is_registered(VARIATION_MENU_LISTENER) {
        return handle_menu_key(ctx, key)
            .await
            .unwrap_or(NavOutcome::Ignored);
    }
    match key {
        Key::ArrowLeft => navigate_back(ctx).await,
        Key::ArrowRight => navigate_next(ctx).await,
        _ => NavOutcome::Ignored,
    }
}

/// Ask the server for the cursor flags and republish buttons and PGN.
pub async fn refresh_cursor_state(ctx: &Context) {
    let token = ctx.state().tokens.issue(Resource::CursorFlags);
    match ctx.api.current_state().await {
        Ok(cursor) => {
            let latest = ctx.state().tokens.is_latest(token);
            if !latest {
                tracing::debug!(seq = token.seq(), "Discarding stale cursor state");
                return;
            }
            ctx.view.set_nav_buttons(NavButtons::from_flags(
                cursor.is_at_start,
                cursor.has_next_move,
            ));
            if let Some(text) = cursor.pgn {
                ctx.view.set_pgn(&pgn::strip_tags(&text));
            }
        }
        Err(e) => tracing::warn!("Error updating button states: {e}"),
    }
}

/// Clear the server-side game and return the board to the start position.
pub async fn reset_game(ctx: &Context) -> NavOutcome {
    let (token, closed_menu, closed_promotion) = {
        let mut state = ctx.state();
        let closed_menu = match mem::take(&mut state.cursor) {
            CursorPhase::VariationPending(mut menu) => {
                menu.close();
                true
            }
            _ => false,
        };
        let closed_promotion = state.promotion.take().is_some();
        let token = state.tokens.issue(Resource::Board);
        state.cursor = CursorPhase::InFlight(token);
        (token, closed_menu, closed_promotion)
    };
    if closed_menu {
        ctx.view.hide_variation_menu();
    }
    if closed_promotion {
        ctx.view.hide_promotion_menu();
    }

    tracing::info!("Resetting game");
    match ctx.api.reset_game().await {
        Ok(()) => {
            let reply = BoardReply {
                fen: Some(START_FEN.to_string()),
                pgn: Some(String::new()),
            };
            finish_step(ctx, token, reply, HistoryEffect::Reset).await
        }
        Err(e) => transport_failure(ctx, token, e),
    }
}
