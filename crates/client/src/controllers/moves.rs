//! Move submission: drop gesture to server request, with promotion choice,
//! optimistic display and rollback on rejection.

use chess_core::board::is_promotion_drop;
use chess_core::{MoveRequest, PromotionPiece, Square};

use super::commit_position;
use super::promotion::PromotionMenu;
use crate::api::BoardReply;
use crate::context::Context;
use crate::error::ClientError;
use crate::state::{AppState, HistoryEffect, PendingMove, RequestToken, Resource};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// Server accepted the move; the board shows `fen`.
    Committed { fen: String },
    /// Pawn reached its last rank; the piece snaps back until a choice is made.
    AwaitingPromotion,
    /// Server rejected the move; the board was restored.
    RolledBack { reason: String },
    Rejected(RejectReason),
    /// A newer board request was issued while this one was in flight.
    Superseded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MovePending,
    PromotionPending,
    VariationPending,
    /// A cursor step is waiting on the server.
    NavigationPending,
}

fn busy_reason(state: &AppState) -> Option<RejectReason> {
    if state.pending_move.is_some() {
        Some(RejectReason::MovePending)
    } else if state.promotion.is_some() {
        Some(RejectReason::PromotionPending)
    } else if state.cursor.is_variation_pending() {
        Some(RejectReason::VariationPending)
    } else if state.cursor.is_in_flight() {
        Some(RejectReason::NavigationPending)
    } else {
        None
    }
}

/// Drop callback of the board widget.
pub async fn submit_move(
    ctx: &Context,
    source: &str,
    target: &str,
) -> Result<DropOutcome, ClientError> {
    let source: Square = source.parse()?;
    let target: Square = target.parse()?;
    let piece = ctx.board.piece_at(source);

    if let Some(piece) = piece.filter(|p| is_promotion_drop(*p, target)) {
        let prompt = {
            let mut state = ctx.state();
            if let Some(reason) = busy_reason(&state) {
                return Ok(DropOutcome::Rejected(reason));
            }
            let (menu, prompt) = PromotionMenu::open(source, target, piece, ctx.board.as_ref());
            state.promotion = Some(menu);
            prompt
        };
        tracing::info!(%source, %target, "Promotion choice required");
        ctx.view.show_promotion_menu(&prompt);
        return Ok(DropOutcome::AwaitingPromotion);
    }

    let busy = busy_reason(&ctx.state());
    if let Some(reason) = busy {
        tracing::debug!(?reason, "Drop rejected");
        return Ok(DropOutcome::Rejected(reason));
    }
    Ok(send_move(ctx, MoveRequest::new(source, target, None)).await)
}

/// Complete a suspended promotion with the chosen piece.
pub async fn choose_promotion(
    ctx: &Context,
    piece: PromotionPiece,
) -> Result<DropOutcome, ClientError> {
    let menu = ctx
        .state()
        .promotion
        .take()
        .ok_or(ClientError::NoPromotionPending)?;
    ctx.view.hide_promotion_menu();
    Ok(send_move(ctx, menu.choose(piece)).await)
}

/// Abandon a suspended promotion. Nothing is submitted.
pub fn cancel_promotion(ctx: &Context) -> bool {
    let menu = ctx.state().promotion.take();
    match menu {
        Some(menu) => {
            tracing::info!(source = %menu.source(), target = %menu.target(), "Promotion abandoned");
            ctx.view.hide_promotion_menu();
            true
        }
        None => false,
    }
}

async fn send_move(ctx: &Context, request: MoveRequest) -> DropOutcome {
    let encoded = request.encode();
    let previous_fen = ctx.board.fen();
    let token = {
        let mut state = ctx.state();
        if state.pending_move.is_some() {
            return DropOutcome::Rejected(RejectReason::MovePending);
        }
        let token = state.tokens.issue(Resource::Board);
        state.pending_move = Some(PendingMove {
            request,
            previous_fen: previous_fen.clone(),
            token,
        });
        token
    };

    tracing::info!(mv = %encoded, "Submitting move");
    let result = ctx.api.add_move(&encoded).await;
    ctx.state().pending_move = None;

    match result {
        Ok(BoardReply { fen: Some(fen), pgn }) => {
            if commit_position(ctx, token, &fen, pgn.as_deref(), HistoryEffect::Push).await {
                DropOutcome::Committed { fen }
            } else {
                DropOutcome::Superseded
            }
        }
        Ok(_) => rollback(
            ctx,
            token,
            &previous_fen,
            "Server response did not include a position".to_string(),
        ),
        Err(e) => rollback(ctx, token, &previous_fen, e.to_string()),
    }
}

fn rollback(ctx: &Context, token: RequestToken, previous_fen: &str, reason: String) -> DropOutcome {
    tracing::error!("Error adding move: {reason}");
    let latest = ctx.state().tokens.is_latest(token);
    if !latest {
        tracing::debug!(seq = token.seq(), "Skipping rollback of superseded move");
        return DropOutcome::Superseded;
    }
    ctx.board.set_position(previous_fen);
    ctx.view.show_error(&reason);
    DropOutcome::RolledBack { reason }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::endpoints;
    use crate::controllers::navigation::{navigate_next, NavOutcome};
    use crate::test_support::Harness;
    use crate::ui::{BoardWidget, NavButtons, ViewEvent};
    use chess_core::START_FEN;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    const PROMOTION_FEN: &str = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";

    #[tokio::test]
    async fn test_committed_move_updates_board_and_buttons() {
        let h = Harness::new();
        h.api.reply(endpoints::ADD_MOVE, json!({ "fen": AFTER_E4 }));
        h.api.reply(
            endpoints::CURRENT_STATE,
            json!({ "is_at_start": false, "has_next_move": false, "pgn": "[Event \"?\"]\n\n1. e4 *" }),
        );

        let outcome = submit_move(&h.ctx, "e2", "e4").await.unwrap();

        assert_eq!(outcome, DropOutcome::Committed { fen: AFTER_E4.into() });
        assert_eq!(h.board.fen(), AFTER_E4);
        assert_eq!(
            h.view.last_nav_buttons(),
            Some(NavButtons { prev_enabled: true, next_enabled: false })
        );
        assert_eq!(h.view.last_pgn().as_deref(), Some("1. e4 *"));
        assert_eq!(h.ctx.state().history.as_slice(), [AFTER_E4.to_string()]);
        assert_eq!(h.api.calls_to(endpoints::ADD_MOVE), vec![json!({ "move": "e2e4" })]);
    }

    #[tokio::test]
    async fn test_rejected_move_restores_previous_position() {
        let h = Harness::new();
        h.api.reject(endpoints::ADD_MOVE, 400, "Illegal move");

        let outcome = submit_move(&h.ctx, "e2", "e5").await.unwrap();

        assert_eq!(outcome, DropOutcome::RolledBack { reason: "Illegal move".into() });
        assert_eq!(h.board.fen(), START_FEN);
        assert_eq!(h.view.errors(), vec!["Illegal move".to_string()]);
        assert!(h.ctx.state().history.is_empty());
        assert!(h.api.calls_to(endpoints::CURRENT_STATE).is_empty());
    }

    #[tokio::test]
    async fn test_reply_without_fen_is_rolled_back() {
        let h = Harness::new();
        h.api.reply(endpoints::ADD_MOVE, json!({ "status": "ok" }));

        let outcome = submit_move(&h.ctx, "e2", "e4").await.unwrap();

        assert!(matches!(outcome, DropOutcome::RolledBack { .. }));
        assert_eq!(h.board.fen(), START_FEN);
        assert_eq!(h.ctx.state().board_fen(), START_FEN);
    }

    #[tokio::test]
    async fn test_promotion_waits_for_choice() {
        let h = Harness::starting_at(PROMOTION_FEN);

        let outcome = submit_move(&h.ctx, "e7", "e8").await.unwrap();

        assert_eq!(outcome, DropOutcome::AwaitingPromotion);
        assert!(h.api.calls_to(endpoints::ADD_MOVE).is_empty());
        let prompt = h
            .view
            .events()
            .into_iter()
            .find_map(|e| match e {
                ViewEvent::PromotionMenu(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(prompt.options.len(), 4);
        assert_eq!(prompt.anchor, h.board.square_bounds("e8".parse().unwrap()).center());

        h.api.reply(endpoints::ADD_MOVE, json!({ "fen": "4N3/8/8/8/8/8/k7/4K3 b - - 0 1" }));
        let outcome = choose_promotion(&h.ctx, PromotionPiece::Knight).await.unwrap();

        assert!(matches!(outcome, DropOutcome::Committed { .. }));
        assert_eq!(h.api.calls_to(endpoints::ADD_MOVE), vec![json!({ "move": "e7e8N" })]);
        assert!(h.board.fen().starts_with("4N3/"));
        assert!(h.view.events().contains(&ViewEvent::PromotionMenuHidden));
    }

    #[tokio::test]
    async fn test_abandoned_promotion_never_submits() {
        let h = Harness::starting_at(PROMOTION_FEN);

        submit_move(&h.ctx, "e7", "e8").await.unwrap();
        assert!(cancel_promotion(&h.ctx));

        assert!(h.api.calls_to(endpoints::ADD_MOVE).is_empty());
        assert_eq!(h.board.fen(), PROMOTION_FEN);
        assert!(matches!(
            choose_promotion(&h.ctx, PromotionPiece::Queen).await,
            Err(ClientError::NoPromotionPending)
        ));
    }

    #[tokio::test]
    async fn test_second_drop_during_promotion_is_rejected() {
        let h = Harness::starting_at(PROMOTION_FEN);

        submit_move(&h.ctx, "e7", "e8").await.unwrap();
        let second = submit_move(&h.ctx, "e1", "d1").await.unwrap();

        assert_eq!(second, DropOutcome::Rejected(RejectReason::PromotionPending));
        assert!(h.api.calls_to(endpoints::ADD_MOVE).is_empty());
    }

    #[tokio::test]
    async fn test_second_drop_while_move_pending_is_rejected() {
        let h = Harness::new();
        let gate = h.api.gated(endpoints::ADD_MOVE, json!({ "fen": AFTER_E4 }));

        let first = {
            let ctx = h.ctx.clone();
            tokio::spawn(async move { submit_move(&ctx, "e2", "e4").await })
        };
        h.api.wait_for_calls(endpoints::ADD_MOVE, 1).await;

        let second = submit_move(&h.ctx, "d2", "d4").await.unwrap();
        assert_eq!(second, DropOutcome::Rejected(RejectReason::MovePending));

        gate.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, DropOutcome::Committed { fen: AFTER_E4.into() });
        assert_eq!(h.api.calls_to(endpoints::ADD_MOVE).len(), 1);
    }

    #[tokio::test]
    async fn test_promotion_drop_during_step_is_rejected() {
        let h = Harness::starting_at(PROMOTION_FEN);
        let gate = h.api.gated(endpoints::NEXT_MOVE, json!({ "variations": ["a", "b"] }));

        let step = {
            let ctx = h.ctx.clone();
            tokio::spawn(async move { navigate_next(&ctx).await })
        };
        h.api.wait_for_calls(endpoints::NEXT_MOVE, 1).await;

        let outcome = submit_move(&h.ctx, "e7", "e8").await.unwrap();
        assert_eq!(outcome, DropOutcome::Rejected(RejectReason::NavigationPending));
        assert!(h.ctx.state().promotion.is_none());

        gate.send(()).unwrap();
        assert_eq!(step.await.unwrap(), NavOutcome::VariationMenuOpened { options: 2 });
        assert!(h.ctx.state().promotion.is_none());
        assert!(!h
            .view
            .events()
            .iter()
            .any(|e| matches!(e, ViewEvent::PromotionMenu(_))));
    }

    #[tokio::test]
    async fn test_invalid_square_is_an_error() {
        let h = Harness::new();
        assert!(matches!(
            submit_move(&h.ctx, "z9", "e4").await,
            Err(ClientError::Board(_))
        ));
    }
}
