use std::sync::{Mutex, MutexGuard};

use chess_core::GameSummary;

use super::{EvaluationDisplay, NavButtons, RosterMessage, View};
use crate::controllers::pagination::{PageLink, PaginationBar};
use crate::controllers::promotion::PromotionPrompt;
use crate::push::ConnectionState;
use crate::state::RosterPage;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    NavButtons(NavButtons),
    Pgn(String),
    Error(String),
    Evaluation(EvaluationDisplay),
    PromotionMenu(PromotionPrompt),
    PromotionMenuHidden,
    VariationMenu { labels: Vec<String>, highlighted: usize },
    VariationHighlighted(usize),
    VariationMenuHidden,
    Loading { loading: bool, text: String },
    Roster(Vec<GameSummary>),
    RowsAppended(Vec<GameSummary>),
    Pagination(PaginationBar),
    RosterMessage(RosterMessage),
    Connection(ConnectionState),
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<ViewEvent>,
    rows: Vec<GameSummary>,
}

/// View that keeps every call as a [`ViewEvent`] plus the current table rows.
/// With `echo` set it also prints each event for the terminal driver.
#[derive(Debug, Default)]
pub struct RecordingView {
    recorded: Mutex<Recorded>,
    echo: bool,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            recorded: Mutex::default(),
            echo: true,
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: ViewEvent) {
        if self.echo {
            for line in describe(&event) {
                println!("{line}");
            }
        }
        self.recorded().events.push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.recorded().events.clone()
    }

    pub fn clear(&self) {
        self.recorded().events.clear();
    }

    /// Ids of the rows currently in the table, in display order.
    pub fn row_ids(&self) -> Vec<i64> {
        self.recorded().rows.iter().map(|g| g.id).collect()
    }

    pub fn last_nav_buttons(&self) -> Option<NavButtons> {
        self.recorded().events.iter().rev().find_map(|e| match e {
            ViewEvent::NavButtons(b) => Some(*b),
            _ => None,
        })
    }

    pub fn last_pgn(&self) -> Option<String> {
        self.recorded().events.iter().rev().find_map(|e| match e {
            ViewEvent::Pgn(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn last_pagination(&self) -> Option<PaginationBar> {
        self.recorded().events.iter().rev().find_map(|e| match e {
            ViewEvent::Pagination(bar) => Some(bar.clone()),
            _ => None,
        })
    }

    pub fn last_evaluation(&self) -> Option<EvaluationDisplay> {
        self.recorded().events.iter().rev().find_map(|e| match e {
            ViewEvent::Evaluation(ev) => Some(ev.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.recorded()
            .events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

impl View for RecordingView {
    fn set_nav_buttons(&self, buttons: NavButtons) {
        self.push(ViewEvent::NavButtons(buttons));
    }

    fn set_pgn(&self, pgn: &str) {
        self.push(ViewEvent::Pgn(pgn.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.push(ViewEvent::Error(message.to_string()));
    }

    fn show_evaluation(&self, evaluation: &EvaluationDisplay) {
        self.push(ViewEvent::Evaluation(evaluation.clone()));
    }

    fn show_promotion_menu(&self, prompt: &PromotionPrompt) {
        self.push(ViewEvent::PromotionMenu(prompt.clone()));
    }

    fn hide_promotion_menu(&self) {
        self.push(ViewEvent::PromotionMenuHidden);
    }

    fn show_variation_menu(&self, labels: &[String], highlighted: usize) {
        self.push(ViewEvent::VariationMenu {
            labels: labels.to_vec(),
            highlighted,
        });
    }

    fn highlight_variation(&self, index: usize) {
        self.push(ViewEvent::VariationHighlighted(index));
    }

    fn hide_variation_menu(&self) {
        self.push(ViewEvent::VariationMenuHidden);
    }

    fn set_loading(&self, loading: bool, text: &str) {
        self.push(ViewEvent::Loading {
            loading,
            text: text.to_string(),
        });
    }

    fn render_roster(&self, page: &RosterPage) {
        self.recorded().rows = page.games.clone();
        self.push(ViewEvent::Roster(page.games.clone()));
    }

    fn append_roster_rows(&self, games: &[GameSummary]) {
        self.recorded().rows.extend(games.iter().cloned());
        self.push(ViewEvent::RowsAppended(games.to_vec()));
    }

    fn render_pagination(&self, bar: &PaginationBar) {
        self.push(ViewEvent::Pagination(bar.clone()));
    }

    fn show_roster_message(&self, message: &RosterMessage) {
        self.recorded().rows.clear();
        self.push(ViewEvent::RosterMessage(message.clone()));
    }

    fn show_connection(&self, state: &ConnectionState) {
        self.push(ViewEvent::Connection(state.clone()));
    }
}

fn describe(event: &ViewEvent) -> Vec<String> {
    match event {
        ViewEvent::NavButtons(b) => vec![format!(
            "[nav] prev {} | next {}",
            if b.prev_enabled { "on" } else { "off" },
            if b.next_enabled { "on" } else { "off" }
        )],
        ViewEvent::Pgn(pgn) => vec![format!("[pgn] {pgn}")],
        ViewEvent::Error(msg) => vec![format!("[error] {msg}")],
        ViewEvent::Evaluation(EvaluationDisplay::Score { score, best_move }) => {
            vec![format!("[eval] {score} best {best_move}")]
        }
        ViewEvent::Evaluation(EvaluationDisplay::Unavailable) => {
            vec!["[eval] Error best Error".to_string()]
        }
        ViewEvent::PromotionMenu(prompt) => vec![format!(
            "[promote] {} -> {}: {}",
            prompt.source,
            prompt.target,
            prompt
                .options
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        )],
        ViewEvent::PromotionMenuHidden | ViewEvent::VariationMenuHidden => Vec::new(),
        ViewEvent::VariationMenu { labels, highlighted } => labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!("[variation] {} {i}: {l}", if i == *highlighted { ">" } else { " " }))
            .collect(),
        ViewEvent::VariationHighlighted(i) => vec![format!("[variation] > {i}")],
        ViewEvent::Loading { loading: true, text } => vec![format!("[roster] {text}")],
        ViewEvent::Loading { loading: false, .. } => Vec::new(),
        ViewEvent::Roster(games) | ViewEvent::RowsAppended(games) => games
            .iter()
            .map(|g| format!("[game {}] {}", g.id, g.cells().join(" | ")))
            .collect(),
        ViewEvent::Pagination(bar) => vec![format!(
            "[pages] {}",
            bar.links
                .iter()
                .map(|l| match l {
                    PageLink::Previous { target: Some(_) } => "«".to_string(),
                    PageLink::Previous { target: None } => "(«)".to_string(),
                    PageLink::Page { number, active: true } => format!("[{number}]"),
                    PageLink::Page { number, active: false } => number.to_string(),
                    PageLink::Ellipsis => "...".to_string(),
                    PageLink::Next { target: Some(_) } => "»".to_string(),
                    PageLink::Next { target: None } => "(»)".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        )],
        ViewEvent::RosterMessage(msg) => vec![format!("[roster] {}", msg.text())],
        ViewEvent::Connection(state) => vec![format!("[push] {state:?}")],
    }
}
