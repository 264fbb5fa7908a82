use std::env;
use std::time::Duration;

use crate::api::csrf::CsrfSource;
use crate::controllers::pagination::PaginationStyle;
use crate::push::ReconnectPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub push_url: String,
    pub csrf: CsrfSource,
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub pagination_window: u32,
    pub pagination_style: PaginationStyle,
    pub evaluation_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            push_url: "ws://localhost:8001/ws/games/".to_string(),
            csrf: CsrfSource::Cookie("csrftoken".to_string()),
            request_timeout: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
            pagination_window: 3,
            pagination_style: PaginationStyle::Ellipsis,
            evaluation_enabled: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("CHESSHUB_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            push_url: env::var("CHESSHUB_PUSH_URL").unwrap_or(defaults.push_url),
            csrf: env::var("CSRF_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(CsrfSource::Static)
                .unwrap_or(defaults.csrf),
            request_timeout: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            reconnect: ReconnectPolicy {
                max_attempts: env::var("RECONNECT_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.reconnect.max_attempts),
                reload_delay: env::var("RECONNECT_DELAY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.reconnect.reload_delay),
            },
            pagination_window: env::var("PAGINATION_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.pagination_window),
            pagination_style: env::var("PAGINATION_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pagination_style),
            evaluation_enabled: env::var("EVALUATION")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on"))
                .unwrap_or(defaults.evaluation_enabled),
        }
    }
}
