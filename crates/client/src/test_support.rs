//! Scripted in-memory `GameApi` for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::api::{
    endpoints, BoardReply, CursorState, EvaluationReply, GameApi, GameMovesReply, NextReply,
    PositionSearchReply, RosterReply,
};
use crate::config::Config;
use crate::context::Context;
use crate::error::TransportError;
use crate::state::FilterSet;
use crate::ui::{FenBoard, RecordingView};

struct Step {
    gate: Option<oneshot::Receiver<()>>,
    reply: Result<Value, TransportError>,
}

#[derive(Default)]
struct Script {
    steps: HashMap<String, VecDeque<Step>>,
    defaults: HashMap<String, Value>,
    calls: Vec<(String, Value)>,
}

/// Replies are consumed in order per endpoint; an endpoint with nothing
/// queued falls back to its default reply.
#[derive(Default)]
pub(crate) struct FakeApi {
    script: Mutex<Script>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.set_default(
            endpoints::CURRENT_STATE,
            json!({ "is_at_start": true, "has_next_move": false }),
        );
        api.set_default(endpoints::GAMES, json!({ "games": [] }));
        api.set_default(endpoints::FILTERED_GAMES, json!({ "games": [] }));
        api.set_default(endpoints::GAMES_BY_FEN, json!({ "games": [] }));
        api.set_default(endpoints::EVALUATE, json!({ "eval": 0.0, "best_moves": [] }));
        Arc::new(api)
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_default(&self, endpoint: &str, value: Value) {
        self.script().defaults.insert(endpoint.to_string(), value);
    }

    fn enqueue(&self, endpoint: &str, step: Step) {
        self.script()
            .steps
            .entry(endpoint.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn reply(&self, endpoint: &str, value: Value) {
        self.enqueue(endpoint, Step { gate: None, reply: Ok(value) });
    }

    pub fn reject(&self, endpoint: &str, status: u16, message: &str) {
        self.enqueue(
            endpoint,
            Step {
                gate: None,
                reply: Err(TransportError::rejected(status, message)),
            },
        );
    }

    /// Queue a reply that is held until the returned sender fires.
    pub fn gated(&self, endpoint: &str, value: Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(
            endpoint,
            Step {
                gate: Some(rx),
                reply: Ok(value),
            },
        );
        tx
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Value> {
        self.script()
            .calls
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub async fn wait_for_calls(&self, endpoint: &str, count: usize) {
        while self.calls_to(endpoint).len() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn respond<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        args: Value,
    ) -> Result<T, TransportError> {
        let step = {
            let mut script = self.script();
            script.calls.push((endpoint.to_string(), args));
            let queued = script.steps.get_mut(endpoint).and_then(VecDeque::pop_front);
            match queued {
                Some(step) => step,
                None => Step {
                    gate: None,
                    reply: script
                        .defaults
                        .get(endpoint)
                        .cloned()
                        .ok_or_else(|| TransportError::Decode(format!("unscripted call to {endpoint}"))),
                },
            }
        };
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        Ok(serde_json::from_value(step.reply?)?)
    }
}

fn filters_json(filters: &FilterSet) -> Value {
    filters
        .query_pairs()
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

#[async_trait]
impl GameApi for FakeApi {
    async fn add_move(&self, mv: &str) -> Result<BoardReply, TransportError> {
        self.respond(endpoints::ADD_MOVE, json!({ "move": mv })).await
    }

    async fn current_state(&self) -> Result<CursorState, TransportError> {
        self.respond(endpoints::CURRENT_STATE, Value::Null).await
    }

    async fn prev_move(&self) -> Result<BoardReply, TransportError> {
        self.respond(endpoints::PREV_MOVE, Value::Null).await
    }

    async fn next_move(&self) -> Result<NextReply, TransportError> {
        self.respond(endpoints::NEXT_MOVE, Value::Null).await
    }

    async fn choose_variation(&self, index: usize) -> Result<BoardReply, TransportError> {
        self.respond(endpoints::CHOOSE_VARIATION, json!({ "variation_index": index }))
            .await
    }

    async fn games(&self, page: u32) -> Result<RosterReply, TransportError> {
        self.respond(endpoints::GAMES, json!({ "page": page })).await
    }

    async fn filtered_games(
        &self,
        filters: &FilterSet,
        page: u32,
    ) -> Result<RosterReply, TransportError> {
        self.respond(
            endpoints::FILTERED_GAMES,
            json!({ "page": page, "filters": filters_json(filters) }),
        )
        .await
    }

    async fn games_by_fen(
        &self,
        fen: &str,
        filters: &FilterSet,
        page: u32,
    ) -> Result<PositionSearchReply, TransportError> {
        self.respond(
            endpoints::GAMES_BY_FEN,
            json!({ "fen": fen, "page": page, "filters": filters_json(filters) }),
        )
        .await
    }

    async fn evaluate(
        &self,
        fen: &str,
        history: &[String],
    ) -> Result<EvaluationReply, TransportError> {
        self.respond(endpoints::EVALUATE, json!({ "fen": fen, "history": history }))
            .await
    }

    async fn clear_filters(&self) -> Result<(), TransportError> {
        self.respond::<Value>(endpoints::CLEAR_FILTERS, Value::Null)
            .await
            .map(|_| ())
    }

    async fn reset_game(&self) -> Result<(), TransportError> {
        self.respond::<Value>(endpoints::RESET_GAME, Value::Null)
            .await
            .map(|_| ())
    }

    async fn game_moves(&self, game_id: i64) -> Result<GameMovesReply, TransportError> {
        self.respond(&endpoints::game_moves(game_id), Value::Null).await
    }
}

/// Roster row with every metadata field filled in.
pub(crate) fn game(id: i64) -> Value {
    json!({
        "id": id,
        "white_player": format!("White {id}"),
        "white_elo": 2500,
        "black_player": format!("Black {id}"),
        "black_elo": 2400,
        "result": "1-0",
        "date": "2024.01.15",
        "site": "Online",
    })
}

pub(crate) struct Harness {
    pub api: Arc<FakeApi>,
    pub board: Arc<FenBoard>,
    pub view: Arc<RecordingView>,
    pub ctx: Arc<Context>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_board(FenBoard::new())
    }

    pub fn starting_at(fen: &str) -> Self {
        Self::with_board(FenBoard::starting_at(fen))
    }

    fn with_board(board: FenBoard) -> Self {
        let api = FakeApi::new();
        let board = Arc::new(board);
        let view = Arc::new(RecordingView::new());
        let ctx = Context::new(api.clone(), board.clone(), view.clone(), &Config::default());
        Self {
            api,
            board,
            view,
            ctx,
        }
    }
}
