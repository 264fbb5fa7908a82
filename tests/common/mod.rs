//! In-process game server for integration tests.
//!
//! Serves the same routes as the real backend from an in-memory move tree
//! and game list on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use client::api::csrf::CsrfSource;
use client::api::HttpApi;
use client::push::ReconnectPolicy;
use client::ui::{FenBoard, RecordingView};
use client::{App, Config};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const CSRF_TOKEN: &str = "test-csrf-token";
pub const PAGE_SIZE: usize = 2;

// ---------------------------------------------------------------------------
// Move tree
// ---------------------------------------------------------------------------

struct Node {
    fen: String,
    san: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

struct MoveTree {
    nodes: Vec<Node>,
    cursor: usize,
}

fn position(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.parse().ok()?;
    fen.into_position(CastlingMode::Standard).ok()
}

impl MoveTree {
    fn new(root_fen: &str) -> Self {
        Self {
            nodes: vec![Node {
                fen: root_fen.to_string(),
                san: String::new(),
                parent: None,
                children: Vec::new(),
            }],
            cursor: 0,
        }
    }

    fn fen(&self) -> &str {
        &self.nodes[self.cursor].fen
    }

    fn pgn(&self) -> String {
        let mut path = Vec::new();
        let mut at = self.cursor;
        while let Some(parent) = self.nodes[at].parent {
            path.push(self.nodes[at].san.clone());
            at = parent;
        }
        path.reverse();
        let moves = path
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect::<Vec<_>>()
            .join(" ");
        format!("[Event \"Analysis\"]\n[Site \"Test\"]\n\n{moves}")
    }

    fn play(&mut self, uci: &str) -> Result<(), String> {
        let pos = position(self.fen()).ok_or("Corrupt position")?;
        let uci_move: UciMove = uci
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| format!("Invalid move: {uci}"))?;
        let legal = uci_move.to_move(&pos).map_err(|_| "Illegal move".to_string())?;
        let san = San::from_move(&pos, legal.clone()).to_string();
        let mut next = pos;
        next.play_unchecked(legal);
        let fen = Fen::from_position(&next, EnPassantMode::Legal).to_string();

        let existing = self.nodes[self.cursor]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].fen == fen);
        self.cursor = match existing {
            Some(child) => child,
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    fen,
                    san,
                    parent: Some(self.cursor),
                    children: Vec::new(),
                });
                self.nodes[self.cursor].children.push(id);
                id
            }
        };
        Ok(())
    }

    fn board_reply(&self) -> Value {
        json!({ "fen": self.fen(), "pgn": self.pgn() })
    }
}

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

pub struct StubState {
    root_fen: String,
    tree: Mutex<MoveTree>,
    games: Mutex<Vec<Value>>,
    by_fen: Mutex<HashMap<String, Vec<Value>>>,
    push_frames: Mutex<Vec<String>>,
    csrf_seen: Mutex<Vec<Option<String>>>,
    ws_connections: AtomicUsize,
}

impl StubState {
    pub fn set_games(&self, games: Vec<Value>) {
        *self.games.lock().unwrap() = games;
    }

    pub fn set_games_at(&self, fen: &str, games: Vec<Value>) {
        self.by_fen.lock().unwrap().insert(fen.to_string(), games);
    }

    /// Frames sent to every push connection before the server closes it.
    pub fn set_push_frames(&self, frames: Vec<String>) {
        *self.push_frames.lock().unwrap() = frames;
    }

    pub fn csrf_seen(&self) -> Vec<Option<String>> {
        self.csrf_seen.lock().unwrap().clone()
    }

    pub fn ws_connections(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn cursor_fen(&self) -> String {
        self.tree.lock().unwrap().fen().to_string()
    }

    fn record_csrf(&self, headers: &HeaderMap) {
        let token = headers
            .get("X-CSRFToken")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.csrf_seen.lock().unwrap().push(token);
    }
}

type Shared = Arc<StubState>;

fn rejected(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn paginate(games: &[Value], query: &HashMap<String, String>) -> Value {
    let total_pages = games.len().div_ceil(PAGE_SIZE);
    let page = query
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let rows: Vec<Value> = games
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();
    json!({ "games": rows, "total_pages": total_pages, "current_page": page })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn add_move(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.record_csrf(&headers);
    let mv = body.get("move").and_then(Value::as_str).unwrap_or_default();
    let mut tree = s.tree.lock().unwrap();
    match tree.play(mv) {
        Ok(()) => Json(json!({ "fen": tree.fen() })).into_response(),
        Err(e) => rejected(&e),
    }
}

async fn current_state(State(s): State<Shared>) -> Json<Value> {
    let tree = s.tree.lock().unwrap();
    let node = &tree.nodes[tree.cursor];
    Json(json!({
        "fen": node.fen,
        "pgn": tree.pgn(),
        "is_at_start": node.parent.is_none(),
        "has_next_move": !node.children.is_empty(),
    }))
}

async fn prev_move(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.record_csrf(&headers);
    let mut tree = s.tree.lock().unwrap();
    let parent = tree.nodes[tree.cursor].parent;
    match parent {
        Some(parent) => {
            tree.cursor = parent;
            Json(tree.board_reply()).into_response()
        }
        None => rejected("No previous move"),
    }
}

async fn next_move(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.record_csrf(&headers);
    let mut tree = s.tree.lock().unwrap();
    let children = tree.nodes[tree.cursor].children.clone();
    match children.as_slice() {
        [] => rejected("No next move"),
        [only] => {
            tree.cursor = *only;
            Json(tree.board_reply()).into_response()
        }
        many => {
            let labels: Vec<String> = many.iter().map(|&c| tree.nodes[c].san.clone()).collect();
            Json(json!({ "variations": labels })).into_response()
        }
    }
}

async fn choose_variation(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    s.record_csrf(&headers);
    let index = body
        .get("variation_index")
        .and_then(Value::as_u64)
        .unwrap_or(u64::MAX) as usize;
    let mut tree = s.tree.lock().unwrap();
    let child = tree.nodes[tree.cursor].children.get(index).copied();
    match child {
        Some(child) => {
            tree.cursor = child;
            Json(tree.board_reply()).into_response()
        }
        None => rejected("Invalid variation index"),
    }
}

async fn get_games(State(s): State<Shared>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    Json(paginate(&s.games.lock().unwrap(), &q))
}

async fn filter_games(
    State(s): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let games: Vec<Value> = s
        .games
        .lock()
        .unwrap()
        .iter()
        .filter(|g| {
            q.iter()
                .filter(|(k, _)| k.as_str() != "page")
                .all(|(k, v)| g.get(k).and_then(Value::as_str) == Some(v.as_str()))
        })
        .cloned()
        .collect();
    Json(paginate(&games, &q))
}

async fn games_by_fen(
    State(s): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let fen = q.get("fen").cloned().unwrap_or_default();
    if position(&fen).is_none() {
        return Json(json!({ "error": "Invalid FEN" }));
    }
    let games = s.by_fen.lock().unwrap().get(&fen).cloned().unwrap_or_default();
    Json(paginate(&games, &q))
}

async fn evaluate(State(s): State<Shared>, headers: HeaderMap) -> Json<Value> {
    s.record_csrf(&headers);
    Json(json!({ "eval": 0.25, "best_moves": ["e7e5", "c7c5"] }))
}

async fn clear_filters(State(s): State<Shared>, headers: HeaderMap) -> Json<Value> {
    s.record_csrf(&headers);
    Json(json!({ "status": "ok" }))
}

async fn reset_game(State(s): State<Shared>, headers: HeaderMap) -> Json<Value> {
    s.record_csrf(&headers);
    *s.tree.lock().unwrap() = MoveTree::new(&s.root_fen);
    Json(json!({ "status": "ok" }))
}

async fn game_moves(State(s): State<Shared>, Path(id): Path<i64>) -> Response {
    let games = s.games.lock().unwrap();
    match games.iter().find(|g| g.get("id").and_then(Value::as_i64) == Some(id)) {
        Some(game) => Json(json!({ "moves": game.get("moves").cloned().unwrap_or(json!([])) }))
            .into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Game not found" }))).into_response(),
    }
}

async fn push_socket(ws: WebSocketUpgrade, State(s): State<Shared>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_push(socket, s))
}

async fn serve_push(mut socket: WebSocket, s: Shared) {
    s.ws_connections.fetch_add(1, Ordering::SeqCst);
    let frames = s.push_frames.lock().unwrap().clone();
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Stub {
    pub base_url: String,
    pub push_url: String,
    pub state: Shared,
}

impl Stub {
    pub async fn start() -> Self {
        Self::start_at(START_FEN).await
    }

    /// Serve a move tree rooted at `fen`.
    pub async fn start_at(fen: &str) -> Self {
        let state = Arc::new(StubState {
            root_fen: fen.to_string(),
            tree: Mutex::new(MoveTree::new(fen)),
            games: Mutex::new(Vec::new()),
            by_fen: Mutex::new(HashMap::new()),
            push_frames: Mutex::new(Vec::new()),
            csrf_seen: Mutex::new(Vec::new()),
            ws_connections: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/add-move/", post(add_move))
            .route("/current_state/", get(current_state))
            .route("/prev-move/", post(prev_move))
            .route("/next-move/", post(next_move))
            .route("/choose-variation/", post(choose_variation))
            .route("/get_games/", get(get_games))
            .route("/filter_games/", get(filter_games))
            .route("/get_games_by_fen/", get(games_by_fen))
            .route("/evaluate_position/", post(evaluate))
            .route("/clear_filters/", post(clear_filters))
            .route("/reset_game/", post(reset_game))
            .route("/get_game_moves/{id}/", get(game_moves))
            .route("/ws/games/", get(push_socket))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Stub server has no address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Stub server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            push_url: format!("ws://{addr}/ws/games/"),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            push_url: self.push_url.clone(),
            csrf: CsrfSource::Static(CSRF_TOKEN.to_string()),
            request_timeout: Duration::from_secs(5),
            reconnect: ReconnectPolicy {
                max_attempts: 3,
                reload_delay: Duration::ZERO,
            },
            ..Config::default()
        }
    }
}

pub struct TestClient {
    pub app: App,
    pub board: Arc<FenBoard>,
    pub view: Arc<RecordingView>,
}

/// Client wired to `stub` over HTTP, with its board showing `fen`.
pub fn client_at(stub: &Stub, fen: &str) -> TestClient {
    let config = stub.config();
    let api = Arc::new(HttpApi::new(&config).expect("Failed to build HTTP client"));
    let board = Arc::new(FenBoard::starting_at(fen));
    let view = Arc::new(RecordingView::new());
    let app = App::new(api, board.clone(), view.clone(), &config);
    TestClient { app, board, view }
}

pub fn client(stub: &Stub) -> TestClient {
    client_at(stub, START_FEN)
}

/// Roster row as the server serializes it.
pub fn game(id: i64, white: &str, black: &str) -> Value {
    json!({
        "id": id,
        "white_player": white,
        "white_elo": 2700,
        "black_player": black,
        "black_elo": 2650,
        "result": "1/2-1/2",
        "date": "2023.11.02",
        "site": "Test",
        "moves": ["e4", "e5", "Nf3", "Nc6"],
    })
}
