use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::GameApi;
use crate::config::Config;
use crate::controllers::pagination::PaginationStyle;
use crate::keys::KeyListeners;
use crate::state::AppState;
use crate::ui::{BoardWidget, View};

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub pagination_window: u32,
    pub pagination_style: PaginationStyle,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            pagination_window: config.pagination_window,
            pagination_style: config.pagination_style,
        }
    }
}

/// Collaborators and state shared by every controller.
pub struct Context {
    pub api: Arc<dyn GameApi>,
    pub board: Arc<dyn BoardWidget>,
    pub view: Arc<dyn View>,
    pub keys: KeyListeners,
    pub settings: Settings,
    state: Mutex<AppState>,
}

impl Context {
    pub fn new(
        api: Arc<dyn GameApi>,
        board: Arc<dyn BoardWidget>,
        view: Arc<dyn View>,
        config: &Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            board,
            view,
            keys: KeyListeners::new(),
            settings: Settings::from(config),
            state: Mutex::new(AppState::new(config.evaluation_enabled)),
        })
    }

    /// Lock the application state. The guard must be released before the
    /// next await point.
    pub fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
