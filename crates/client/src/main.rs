//! Terminal driver for the game client.
//!
//! Reads one command per line from stdin and prints every view update.
//! The push channel runs alongside; a reload rebuilds the client state.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use client::api::{GameApi, HttpApi};
use client::controllers::replay::ReplayViewer;
use client::keys::Key;
use client::push::{self, ConnectionTracker, PageHost, PushExit};
use client::ui::{FenBoard, RecordingView};
use client::{App, Config};

const HELP: &str = "\
commands:
  move <from> <to>       drop a piece, e.g. `move e2 e4`
  promote <q|r|b|n>      finish a pending promotion
  cancel                 abandon a pending promotion
  back | next            step the cursor
  key <name>             left, right, up, down, enter, escape
  pick <n>               click variation n
  reset                  start a new game
  page <n>               follow a page link
  filter k=v [k=v ...]   apply roster filters
  clear                  clear roster filters
  eval <on|off>          toggle evaluation
  replay <id>            load a stored game; then `replay next|back`
  quit";

/// Owns the current page. A reload swaps in a freshly built [`App`].
struct Page {
    config: Config,
    api: Arc<dyn GameApi>,
    view: Arc<RecordingView>,
    app: watch::Sender<App>,
}

impl Page {
    fn new(config: Config, api: Arc<dyn GameApi>, view: Arc<RecordingView>) -> Self {
        let app = build_app(&config, &api, &view);
        Self {
            config,
            api,
            view,
            app: watch::Sender::new(app),
        }
    }

    fn current(&self) -> App {
        self.app.borrow().clone()
    }
}

fn build_app(config: &Config, api: &Arc<dyn GameApi>, view: &Arc<RecordingView>) -> App {
    App::new(api.clone(), Arc::new(FenBoard::new()), view.clone(), config)
}

impl PageHost for Page {
    fn reload(&self) {
        tracing::info!("Reloading page");
        self.app
            .send_replace(build_app(&self.config, &self.api, &self.view));
    }
}

async fn supervise_push(page: Arc<Page>) {
    let url = page.config.push_url.clone();
    let mut tracker = ConnectionTracker::new(page.config.reconnect);
    loop {
        let app = page.current();
        match push::run(app.context(), &url, &mut tracker, page.as_ref()).await {
            PushExit::Reloaded => page.current().start().await,
            PushExit::Terminal => break,
        }
    }
}

/// Returns `false` when the user asked to quit.
async fn dispatch(app: &App, replay: &mut Option<ReplayViewer>, line: &str) -> anyhow::Result<bool> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };
    let args: Vec<&str> = words.collect();

    match (command, args.as_slice()) {
        ("quit" | "exit", _) => return Ok(false),
        ("help", _) => println!("{HELP}"),
        ("move", [from, to]) => {
            let outcome = app.on_drop(from, to).await?;
            tracing::debug!(?outcome, "Drop handled");
        }
        ("move", [uci]) if uci.len() == 4 => {
            let (from, to) = uci.split_at(2);
            let outcome = app.on_drop(from, to).await?;
            tracing::debug!(?outcome, "Drop handled");
        }
        ("promote", [piece]) => {
            let outcome = app.choose_promotion(piece.parse()?).await?;
            tracing::debug!(?outcome, "Promotion handled");
        }
        ("cancel", []) => {
            if !app.cancel_promotion() {
                println!("no promotion pending");
            }
        }
        ("back", []) => {
            app.navigate_back().await;
        }
        ("next", []) => {
            app.navigate_next().await;
        }
        ("key", [name]) => {
            let key: Key = name.parse().map_err(|e: String| anyhow!(e))?;
            app.handle_key(key).await;
        }
        ("pick", [index]) => {
            let index: usize = index.parse().context("variation index")?;
            app.click_variation(index).await?;
        }
        ("reset", []) => {
            app.reset_game().await;
        }
        ("page", [number]) => {
            let number: u32 = number.parse().context("page number")?;
            app.go_to_page(number).await;
        }
        ("filter", pairs) if !pairs.is_empty() => {
            let fields = pairs
                .iter()
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .ok_or_else(|| anyhow!("expected key=value, got `{pair}`"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            app.submit_filters(&fields).await;
        }
        ("clear", []) => {
            app.clear_filters().await;
        }
        ("eval", ["on"]) => app.set_evaluation(true).await,
        ("eval", ["off"]) => app.set_evaluation(false).await,
        ("replay", ["next"]) => {
            let viewer = replay.as_mut().ok_or_else(|| anyhow!("no game loaded"))?;
            viewer.next()?;
        }
        ("replay", ["back"]) => {
            let viewer = replay.as_mut().ok_or_else(|| anyhow!("no game loaded"))?;
            viewer.back()?;
        }
        ("replay", [id]) => {
            let id: i64 = id.parse().context("game id")?;
            let mut viewer = app.replay_viewer();
            let moves = viewer.load(id).await?;
            println!("[replay] game {id}: {}", viewer.moves().join(" "));
            tracing::debug!(moves, "Replay ready");
            *replay = Some(viewer);
        }
        _ => bail!("unrecognised command `{line}` (try `help`)"),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    tracing::info!(base_url = %config.base_url, push_url = %config.push_url, "Starting client");

    let api: Arc<dyn GameApi> = Arc::new(HttpApi::new(&config)?);
    let view = Arc::new(RecordingView::echoing());
    let page = Arc::new(Page::new(config, api, view));

    page.current().start().await;
    let push_task = tokio::spawn(supervise_push(page.clone()));

    let mut replay = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let app = page.current();
        match dispatch(&app, &mut replay, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("[error] {e:#}"),
        }
    }

    push_task.abort();
    Ok(())
}
