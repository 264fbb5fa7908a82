use crate::context::Context;
use crate::state::Resource;
use crate::ui::EvaluationDisplay;

/// Evaluate the committed position when evaluation is switched on. Any
/// failure shows the unavailable marker and nothing else.
pub async fn refresh(ctx: &Context) {
    let request = {
        let mut state = ctx.state();
        state.evaluation_enabled.then(|| {
            (
                state.tokens.issue(Resource::Evaluation),
                state.board_fen().to_string(),
                state.history.as_slice().to_vec(),
            )
        })
    };
    let Some((token, fen, history)) = request else {
        return;
    };

    let display = match ctx.api.evaluate(&fen, &history).await {
        Ok(reply) => match reply.evaluation {
            Some(score) => EvaluationDisplay::Score {
                score: format!("{score:+.2}"),
                best_move: reply.best().unwrap_or("-").to_string(),
            },
            None => {
                tracing::warn!("Evaluation reply carried no score");
                EvaluationDisplay::Unavailable
            }
        },
        Err(e) => {
            tracing::warn!("Error fetching evaluation: {e}");
            EvaluationDisplay::Unavailable
        }
    };

    let latest = ctx.state().tokens.is_latest(token);
    if latest {
        ctx.view.show_evaluation(&display);
    } else {
        tracing::debug!(seq = token.seq(), "Discarding stale evaluation");
    }
}

pub async fn set_enabled(ctx: &Context, enabled: bool) {
    ctx.state().evaluation_enabled = enabled;
    tracing::info!(enabled, "Evaluation toggled");
    if enabled {
        refresh(ctx).await;
    }
}
