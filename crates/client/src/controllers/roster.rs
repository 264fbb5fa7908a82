//! Game roster: paginated metadata queries, filters and push merges.

use std::mem;

use chess_core::GameSummary;

use super::pagination::{Pagination, PaginationBar};
use super::position_search;
use crate::api::RosterUpdate;
use crate::context::Context;
use crate::state::{AppState, FilterSet, RequestToken, Resource, RosterMode, RosterPage};
use crate::ui::RosterMessage;

pub const LOADING_TEXT: &str = "Loading games...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterOutcome {
    Rendered { games: usize },
    Empty,
    Failed { reason: String },
    Superseded,
}

/// Result of merging one push update into the displayed roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushMerge {
    Merged { appended: usize, duplicates: usize },
    /// A filtered or position query is on screen; the games wait in the
    /// backlog until the metadata roster is shown again.
    Deferred { queued: usize },
    /// The update carried no game list.
    Ignored,
}

/// Load one page of the metadata roster, honouring the active filters.
pub async fn fetch_games(ctx: &Context, page: u32) -> RosterOutcome {
    let (token, filters) = begin_load(ctx);
    ctx.view.set_loading(true, LOADING_TEXT);

    let result = if filters.is_empty() {
        ctx.api.games(page).await
    } else {
        ctx.api.filtered_games(&filters, page).await
    };
    let outcome = match result {
        Ok(reply) => render_page(
            ctx,
            token,
            RosterMode::Metadata,
            reply.games,
            Pagination::new(reply.total_pages, reply.current_page),
            RosterMessage::NoGames,
        ),
        Err(e) => report_failure(ctx, token, e.to_string()),
    };
    settle_loading(ctx, token);
    let shown = matches!(outcome, RosterOutcome::Rendered { .. } | RosterOutcome::Empty);
    if shown && filters.is_empty() {
        replay_backlog(ctx);
    }
    outcome
}

fn replay_backlog(ctx: &Context) {
    let backlog = mem::take(&mut ctx.state().push_backlog);
    if backlog.is_empty() {
        return;
    }
    tracing::info!(
        games = backlog.games.len(),
        "Applying push updates received while the game list was hidden"
    );
    apply_push_update(
        ctx,
        RosterUpdate {
            games: Some(backlog.games),
            total_pages: backlog.total_pages,
            current_page: None,
        },
    );
}

pub(crate) fn begin_load(ctx: &Context) -> (RequestToken, FilterSet) {
    let mut state = ctx.state();
    (state.tokens.issue(Resource::Roster), state.filters.clone())
}

/// Hide the loading indicator unless a newer query now owns it.
pub(crate) fn settle_loading(ctx: &Context, token: RequestToken) {
    let latest = ctx.state().tokens.is_latest(token);
    if latest {
        ctx.view.set_loading(false, "");
    }
}

/// Replace the displayed page and pagination bar with a query result.
pub(crate) fn render_page(
    ctx: &Context,
    token: RequestToken,
    mode: RosterMode,
    games: Vec<GameSummary>,
    pagination: Pagination,
    empty: RosterMessage,
) -> RosterOutcome {
    let (page, bar) = {
        let mut state = ctx.state();
        if !state.tokens.is_latest(token) {
            tracing::debug!(seq = token.seq(), "Discarding stale roster response");
            return RosterOutcome::Superseded;
        }
        state.roster = RosterPage { games, pagination };
        state.roster_mode = mode.clone();
        let bar = PaginationBar::new(
            mode,
            pagination,
            ctx.settings.pagination_window,
            ctx.settings.pagination_style,
        );
        (state.roster.clone(), bar)
    };

    tracing::info!(
        total_pages = pagination.total_pages(),
        current_page = pagination.current_page(),
        games = page.games.len(),
        "Roster page loaded"
    );
    if page.games.is_empty() {
        ctx.view.show_roster_message(&empty);
    } else {
        ctx.view.render_roster(&page);
    }
    ctx.view.render_pagination(&bar);

    if page.games.is_empty() {
        RosterOutcome::Empty
    } else {
        RosterOutcome::Rendered {
            games: page.games.len(),
        }
    }
}

pub(crate) fn report_failure(ctx: &Context, token: RequestToken, reason: String) -> RosterOutcome {
    let latest = ctx.state().tokens.is_latest(token);
    if !latest {
        tracing::debug!(seq = token.seq(), "Discarding stale roster failure");
        return RosterOutcome::Superseded;
    }
    tracing::error!("Error fetching games: {reason}");
    ctx.view.show_roster_message(&RosterMessage::Error(reason.clone()));
    RosterOutcome::Failed { reason }
}

/// Merge a push update into the unfiltered metadata roster. Rows already
/// present (by game id) are skipped; nothing is ever removed. The current
/// page jumps to the last page when the update carries a page count. While
/// another query is on screen the update is queued instead.
pub fn apply_push_update(ctx: &Context, update: RosterUpdate) -> PushMerge {
    let Some(games) = update.games else {
        return PushMerge::Ignored;
    };

    let (fresh, duplicates, bar) = {
        let mut state = ctx.state();
        if !state.metadata_roster_shown() {
            let queued = state.push_backlog.queue(games, update.total_pages);
            tracing::debug!(queued, "Push update held until the game list is shown");
            return PushMerge::Deferred { queued };
        }
        merge_shown(ctx, &mut state, games, update.total_pages)
    };

    if let Some(bar) = bar {
        ctx.view.render_pagination(&bar);
    }
    if !fresh.is_empty() {
        ctx.view.append_roster_rows(&fresh);
    }
    tracing::info!(
        appended = fresh.len(),
        duplicates,
        "Received updated game list"
    );
    PushMerge::Merged {
        appended: fresh.len(),
        duplicates,
    }
}

fn merge_shown(
    ctx: &Context,
    state: &mut AppState,
    games: Vec<GameSummary>,
    total_pages: Option<u32>,
) -> (Vec<GameSummary>, usize, Option<PaginationBar>) {
    let bar = total_pages.map(|total| {
        let pagination = Pagination::new(total, total);
        state.roster.pagination = pagination;
        PaginationBar::new(
            RosterMode::Metadata,
            pagination,
            ctx.settings.pagination_window,
            ctx.settings.pagination_style,
        )
    });

    let mut fresh: Vec<GameSummary> = Vec::new();
    let mut duplicates = 0;
    for game in games {
        if state.roster.contains(game.id) || fresh.iter().any(|g| g.id == game.id) {
            duplicates += 1;
        } else {
            fresh.push(game);
        }
    }
    state.roster.games.extend(fresh.iter().cloned());
    (fresh, duplicates, bar)
}

/// Replace the filter set with the submitted form fields and re-query.
pub async fn submit_filters<I, K, V>(ctx: &Context, fields: I) -> RosterOutcome
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let filters = FilterSet::from_fields(fields);
    tracing::info!(filters = filters.len(), "Applying filters");
    ctx.state().filters = filters;
    position_search::refresh_for_board(ctx).await
}

/// Drop all filters on both sides and re-query.
pub async fn clear_filters(ctx: &Context) -> RosterOutcome {
    if let Err(e) = ctx.api.clear_filters().await {
        let reason = e.to_string();
        tracing::error!("Error clearing filters: {reason}");
        ctx.view.show_error(&reason);
        return RosterOutcome::Failed { reason };
    }
    ctx.state().filters = FilterSet::default();
    position_search::refresh_for_board(ctx).await
}

/// Follow a page link: the same kind of query that produced the bar.
pub async fn go_to_page(ctx: &Context, mode: &RosterMode, page: u32) -> RosterOutcome {
    match mode {
        RosterMode::Metadata => fetch_games(ctx, page).await,
        RosterMode::Position { fen } => position_search::fetch_games_by_fen(ctx, fen, page).await,
    }
}
