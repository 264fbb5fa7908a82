//! Keyboard input and the registry of global key listeners.
//!
//! A listener is registered by acquiring a [`ListenerGuard`]; dropping the
//! guard unregisters it, so a listener can never outlive the state that owns
//! the guard.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrowleft" | "left" => Ok(Key::ArrowLeft),
            "arrowright" | "right" => Ok(Key::ArrowRight),
            "arrowup" | "up" => Ok(Key::ArrowUp),
            "arrowdown" | "down" => Ok(Key::ArrowDown),
            "enter" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            other => Err(format!("Unknown key: {other}")),
        }
    }
}

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: u64,
    active: Vec<(u64, &'static str)>,
}

#[derive(Clone, Debug, Default)]
pub struct KeyListeners {
    table: Arc<Mutex<ListenerTable>>,
}

impl KeyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, ListenerTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(&self, owner: &'static str) -> ListenerGuard {
        let mut table = self.table();
        let id = table.next_id;
        table.next_id += 1;
        table.active.push((id, owner));
        tracing::debug!(owner, id, "Key listener registered");
        ListenerGuard {
            id,
            owner,
            table: Arc::clone(&self.table),
        }
    }

    pub fn is_registered(&self, owner: &str) -> bool {
        self.table().active.iter().any(|(_, o)| *o == owner)
    }

    pub fn count(&self, owner: &str) -> usize {
        self.table().active.iter().filter(|(_, o)| *o == owner).count()
    }

    pub fn active_count(&self) -> usize {
        self.table().active.len()
    }
}

/// Registration handle; unregisters on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    owner: &'static str,
    table: Arc<Mutex<ListenerTable>>,
}

impl ListenerGuard {
    pub fn owner(&self) -> &'static str {
        self.owner
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.active.retain(|(id, _)| *id != self.id);
        tracing::debug!(owner = self.owner, id = self.id, "Key listener removed");
    }
}
