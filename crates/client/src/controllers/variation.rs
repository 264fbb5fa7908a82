//! Modal choice between recorded continuations.
//!
//! The menu owns its keyboard listener registration for exactly as long as it
//! is open: every path to `Closed` (commit, click, programmatic close, drop)
//! releases the guard.

use crate::keys::{Key, KeyListeners, ListenerGuard};

pub const VARIATION_MENU_LISTENER: &str = "variation-menu";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuState {
    Open { highlighted: usize },
    Closed,
}

/// Result of feeding one input to an open menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuInput {
    Highlighted(usize),
    Committed(usize),
    Ignored,
}

#[derive(Debug)]
pub struct VariationMenu {
    labels: Vec<String>,
    state: MenuState,
    listener: Option<ListenerGuard>,
}

impl VariationMenu {
    /// Open with the first option highlighted. `None` when there is nothing to choose.
    pub fn open(labels: Vec<String>, keys: &KeyListeners) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }
        Some(Self {
            labels,
            state: MenuState::Open { highlighted: 0 },
            listener: Some(keys.register(VARIATION_MENU_LISTENER)),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open { .. })
    }

    pub fn highlighted(&self) -> Option<usize> {
        match self.state {
            MenuState::Open { highlighted } => Some(highlighted),
            MenuState::Closed => None,
        }
    }

    /// Arrow keys cycle the highlight in either direction; Enter commits it.
    pub fn handle_key(&mut self, key: Key) -> MenuInput {
        let MenuState::Open { highlighted } = self.state else {
            return MenuInput::Ignored;
        };
        let count = self.labels.len();
        match key {
            Key::ArrowDown => {
                let next = (highlighted + 1) % count;
                self.state = MenuState::Open { highlighted: next };
                MenuInput::Highlighted(next)
            }
            Key::ArrowUp => {
                let next = (highlighted + count - 1) % count;
                self.state = MenuState::Open { highlighted: next };
                MenuInput::Highlighted(next)
            }
            Key::Enter => {
                self.close();
                MenuInput::Committed(highlighted)
            }
            _ => MenuInput::Ignored,
        }
    }

    /// Direct click on an option.
    pub fn click(&mut self, index: usize) -> MenuInput {
        if !self.is_open() || index >= self.labels.len() {
            return MenuInput::Ignored;
        }
        self.close();
        MenuInput::Committed(index)
    }

    pub fn close(&mut self) {
        self.state = MenuState::Closed;
        self.listener = None;
    }
}
