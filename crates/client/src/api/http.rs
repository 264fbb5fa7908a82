use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::csrf::{self, CsrfSource, CSRF_HEADER};
use super::{
    endpoints, BoardReply, CursorState, EvaluationReply, GameApi, GameMovesReply, NextReply,
    PositionSearchReply, RosterReply,
};
use crate::config::Config;
use crate::error::TransportError;
use crate::state::FilterSet;

/// `GameApi` over HTTP with a shared cookie jar.
pub struct HttpApi {
    client: Client,
    base_url: String,
    csrf: CsrfSource,
    jar: Arc<Jar>,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent("ChessHub/1.0")
            .timeout(config.request_timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf: config.csrf.clone(),
            jar,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn csrf_token(&self) -> Option<String> {
        match &self.csrf {
            CsrfSource::Static(token) => Some(token.clone()),
            CsrfSource::Cookie(name) => {
                let url = Url::parse(&self.base_url).ok()?;
                let header = self.jar.cookies(&url)?;
                csrf::cookie_value(header.to_str().ok()?, name)
            }
            CsrfSource::None => None,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, TransportError> {
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        decode(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, TransportError> {
        let mut req = self.with_csrf(self.client.post(self.url(path)));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        decode(resp).await
    }

    fn with_csrf(&self, req: RequestBuilder) -> RequestBuilder {
        match self.csrf_token() {
            Some(token) => req.header(CSRF_HEADER, token),
            None => {
                tracing::warn!("No CSRF token available for mutating request");
                req
            }
        }
    }
}

fn page_query(filters: &FilterSet, page: u32) -> Vec<(String, String)> {
    let mut query = filters.query_pairs();
    query.push(("page".to_string(), page.to_string()));
    query
}

/// Map a response to `T`, turning non-2xx into `Rejected` with the server's
/// `error` (or `detail`) message when the body has one.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, TransportError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                body.get("error")
                    .or_else(|| body.get("detail"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(TransportError::rejected(status.as_u16(), message));
    }

    let body = if text.trim().is_empty() { "null" } else { text.as_str() };
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl GameApi for HttpApi {
    async fn add_move(&self, mv: &str) -> Result<BoardReply, TransportError> {
        self.post(endpoints::ADD_MOVE, Some(json!({ "move": mv }))).await
    }

    async fn current_state(&self) -> Result<CursorState, TransportError> {
        self.get(endpoints::CURRENT_STATE, &[]).await
    }

    async fn prev_move(&self) -> Result<BoardReply, TransportError> {
        self.post(endpoints::PREV_MOVE, None).await
    }

    async fn next_move(&self) -> Result<NextReply, TransportError> {
        self.post(endpoints::NEXT_MOVE, None).await
    }

    async fn choose_variation(&self, index: usize) -> Result<BoardReply, TransportError> {
        self.post(
            endpoints::CHOOSE_VARIATION,
            Some(json!({ "variation_index": index })),
        )
        .await
    }

    async fn games(&self, page: u32) -> Result<RosterReply, TransportError> {
        self.get(endpoints::GAMES, &[("page".to_string(), page.to_string())])
            .await
    }

    async fn filtered_games(
        &self,
        filters: &FilterSet,
        page: u32,
    ) -> Result<RosterReply, TransportError> {
        self.get(endpoints::FILTERED_GAMES, &page_query(filters, page))
            .await
    }

    async fn games_by_fen(
        &self,
        fen: &str,
        filters: &FilterSet,
        page: u32,
    ) -> Result<PositionSearchReply, TransportError> {
        let mut query = vec![("fen".to_string(), fen.to_string())];
        query.extend(page_query(filters, page));
        self.get(endpoints::GAMES_BY_FEN, &query).await
    }

    async fn evaluate(
        &self,
        fen: &str,
        history: &[String],
    ) -> Result<EvaluationReply, TransportError> {
        self.post(
            endpoints::EVALUATE,
            Some(json!({ "fen": fen, "history": history })),
        )
        .await
    }

    async fn clear_filters(&self) -> Result<(), TransportError> {
        let _: Value = self.post(endpoints::CLEAR_FILTERS, None).await?;
        Ok(())
    }

    async fn reset_game(&self) -> Result<(), TransportError> {
        let _: Value = self.post(endpoints::RESET_GAME, None).await?;
        Ok(())
    }

    async fn game_moves(&self, game_id: i64) -> Result<GameMovesReply, TransportError> {
        self.get(&endpoints::game_moves(game_id), &[]).await
    }
}
