//! Push channel: unsolicited roster updates over a WebSocket, with a
//! bounded reload-on-close policy.
//!
//! A close never reconnects in place. The host page is reloaded after a
//! fixed delay, and the tracker (which outlives the page) counts the
//! connection attempts so that the final close is terminal.

use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::api::RosterUpdate;
use crate::context::Context;
use crate::controllers::roster::{self, PushMerge};

pub const CONNECTION_LOST: &str = "Lost connection to the game list. Please reload the page.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Closed with a reload scheduled; `attempts` connections have closed so far.
    Closed { attempts: u32 },
    /// Attempt budget spent; nothing further is scheduled.
    Terminal { attempts: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Connection attempts allowed, the first one included.
    pub max_attempts: u32,
    pub reload_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            reload_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseAction {
    ScheduleReload { attempt: u32, after: Duration },
    GiveUp { attempts: u32 },
}

#[derive(Debug)]
pub struct ConnectionTracker {
    policy: ReconnectPolicy,
    state: ConnectionState,
    closes: u32,
}

impl ConnectionTracker {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Connecting,
            closes: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ConnectionState::Terminal { .. })
    }

    pub fn connecting(&mut self) {
        if !self.is_terminal() {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Opening does not reset the close count.
    pub fn opened(&mut self) {
        if !self.is_terminal() {
            self.state = ConnectionState::Open;
        }
    }

    pub fn closed(&mut self) -> CloseAction {
        if let ConnectionState::Terminal { attempts } = self.state {
            return CloseAction::GiveUp { attempts };
        }
        self.closes += 1;
        if self.closes < self.policy.max_attempts {
            self.state = ConnectionState::Closed {
                attempts: self.closes,
            };
            CloseAction::ScheduleReload {
                attempt: self.closes,
                after: self.policy.reload_delay,
            }
        } else {
            self.state = ConnectionState::Terminal {
                attempts: self.closes,
            };
            CloseAction::GiveUp {
                attempts: self.closes,
            }
        }
    }
}

/// Whatever owns the page. A reload rebuilds all client state.
pub trait PageHost: Send + Sync {
    fn reload(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushExit {
    Reloaded,
    Terminal,
}

/// Parse one text frame and merge it into the roster. Frames that are not
/// roster updates are logged and dropped.
pub fn handle_frame(ctx: &Context, text: &str) -> PushMerge {
    match serde_json::from_str::<RosterUpdate>(text) {
        Ok(update) => roster::apply_push_update(ctx, update),
        Err(e) => {
            tracing::warn!("Ignoring malformed push frame: {e}");
            PushMerge::Ignored
        }
    }
}

/// Run one connection to completion, then reload the host or give up.
pub async fn run(
    ctx: &Context,
    url: &str,
    tracker: &mut ConnectionTracker,
    host: &dyn PageHost,
) -> PushExit {
    if tracker.is_terminal() {
        return PushExit::Terminal;
    }
    tracker.connecting();
    ctx.view.show_connection(tracker.state());

    match connect_async(url).await {
        Ok((mut stream, _)) => {
            tracker.opened();
            ctx.view.show_connection(tracker.state());
            tracing::info!(url, "Connected to push channel");

            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        handle_frame(ctx, &text);
                    }
                    Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            handle_frame(ctx, text);
                        }
                        Err(e) => tracing::warn!("Ignoring non-UTF-8 push frame: {e}"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Push channel error: {e}");
                        break;
                    }
                }
            }
        }
        Err(e) => tracing::warn!(url, "Failed to connect push channel: {e}"),
    }

    tracing::info!("Disconnected from push channel");
    let action = tracker.closed();
    ctx.view.show_connection(tracker.state());

    match action {
        CloseAction::ScheduleReload { attempt, after } => {
            tracing::info!(attempt, delay_secs = after.as_secs(), "Scheduling reload");
            tokio::time::sleep(after).await;
            host.reload();
            PushExit::Reloaded
        }
        CloseAction::GiveUp { attempts } => {
            tracing::error!(attempts, "Max reconnect attempts reached");
            ctx.view.show_error(CONNECTION_LOST);
            PushExit::Terminal
        }
    }
}
