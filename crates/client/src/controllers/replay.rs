//! Read-only replay of a stored game from the roster.
//!
//! Positions are rebuilt locally from the game's SAN moves; stepping never
//! touches the server-side cursor.

use std::sync::Arc;

use chess_core::replay::{replay_san, ReplayLine};

use crate::api::GameApi;
use crate::error::{ClientError, TransportError};
use crate::ui::{BoardWidget, NavButtons, View};

pub struct ReplayViewer {
    api: Arc<dyn GameApi>,
    board: Arc<dyn BoardWidget>,
    view: Arc<dyn View>,
    line: Option<ReplayLine>,
    index: usize,
}

impl ReplayViewer {
    pub fn new(api: Arc<dyn GameApi>, board: Arc<dyn BoardWidget>, view: Arc<dyn View>) -> Self {
        Self {
            api,
            board,
            view,
            line: None,
            index: 0,
        }
    }

    /// Fetch and replay `game_id`, showing its initial position. Returns the
    /// number of playable moves.
    pub async fn load(&mut self, game_id: i64) -> Result<usize, ClientError> {
        let reply = match self.api.game_moves(game_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(game_id, "Error loading game moves: {e}");
                self.view.show_error(&e.to_string());
                return Err(e.into());
            }
        };
        if let Some(message) = reply.error.clone() {
            tracing::error!(game_id, "Game moves unavailable: {message}");
            self.view.show_error(&message);
            return Err(TransportError::rejected(404, message).into());
        }

        let line = replay_san(&reply.san_moves());
        if let Some(stop) = &line.stopped {
            tracing::warn!(game_id, "Replay stopped early: {stop}");
        }
        let moves = line.len();
        tracing::info!(game_id, moves, "Game loaded for replay");

        self.line = Some(line);
        self.index = 0;
        self.render();
        Ok(moves)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn moves(&self) -> &[String] {
        self.line.as_ref().map(|l| l.moves.as_slice()).unwrap_or_default()
    }

    /// Step back one ply. Returns whether the position changed.
    pub fn back(&mut self) -> Result<bool, ClientError> {
        self.line.as_ref().ok_or(ClientError::NoReplayLoaded)?;
        if self.index == 0 {
            return Ok(false);
        }
        self.index -= 1;
        self.render();
        Ok(true)
    }

    /// Step forward one ply. Returns whether the position changed.
    pub fn next(&mut self) -> Result<bool, ClientError> {
        let len = self.line.as_ref().ok_or(ClientError::NoReplayLoaded)?.len();
        if self.index >= len {
            return Ok(false);
        }
        self.index += 1;
        self.render();
        Ok(true)
    }

    pub fn buttons(&self) -> NavButtons {
        let len = self.line.as_ref().map_or(0, ReplayLine::len);
        NavButtons {
            prev_enabled: self.index > 0,
            next_enabled: self.index < len,
        }
    }

    fn render(&self) {
        let Some(line) = &self.line else {
            return;
        };
        if let Some(fen) = line.fens.get(self.index) {
            self.board.set_position(fen);
        }
        self.view.set_nav_buttons(self.buttons());
    }
}
