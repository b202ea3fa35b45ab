//! `inbox` — terminal notification inbox for the portal.
//!
//! # Usage
//!
//! ```
//! inbox --url https://portal.example --user alice --password secret
//! inbox --config ~/.config/inbox/inbox.toml
//! inbox --once
//! ```

mod app;
mod client;
mod settings;
mod ui;

#[cfg(test)]
mod test_support;

use std::{
  fs::OpenOptions,
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, anyhow};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use inbox_core::{
  center::NotificationCenter,
  inbox::UnreadInbox,
  ledger::ReadLedger,
  panel::Panel,
  push::PushNotice,
  sync::SyncEngine,
};
use inbox_store_sqlite::SqliteStore;
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "inbox", version, about = "Terminal notification inbox for the portal")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "inbox.toml")]
  config: PathBuf,

  /// Base URL of the portal.
  #[arg(long)]
  url: Option<String>,

  /// API username.
  #[arg(long)]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long)]
  password: Option<String>,

  /// SQLite file for the local inbox.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Sync once, print the unread list, and exit.
  #[arg(long)]
  once: bool,

  /// Treat this JSON as an incoming push payload (`{title, body, url}`).
  #[arg(long, value_name = "JSON")]
  push_preview: Option<String>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // CLI flags override the config file and environment.
  let mut settings = Settings::load(&args.config)?;
  if let Some(url) = args.url {
    settings.url = url;
  }
  if let Some(user) = args.user {
    settings.username = user;
  }
  if let Some(password) = args.password {
    settings.password = password;
  }
  if let Some(store) = args.store {
    settings.store_path = settings::expand_tilde(&store);
  }

  init_tracing(&settings, args.once)?;

  let center = build_center(&settings).await?;
  let push = args
    .push_preview
    .as_deref()
    .and_then(|raw| PushNotice::from_payload(raw.as_bytes()));

  if args.once {
    return run_once(center, push).await;
  }

  let mut app = App::new(center);
  app.center.load_cached().await;
  match &push {
    Some(notice) => app.show_push(notice),
    None => app.start_reload(),
  }

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  app.flush_writes().await;
  run_result
}

/// Logs go to a file while the TUI owns the terminal, to stderr otherwise.
fn init_tracing(settings: &Settings, once: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if once {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .init();
    return Ok(());
  }

  if let Some(parent) = settings.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating log directory {}", parent.display()))?;
  }
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&settings.log_file)
    .with_context(|| format!("opening log file {}", settings.log_file.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

async fn build_center(settings: &Settings) -> Result<app::Center> {
  if let Some(parent) = settings.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating store directory {}", parent.display()))?;
  }
  let store = Arc::new(
    SqliteStore::open(&settings.store_path)
      .await
      .with_context(|| format!("failed to open store at {:?}", settings.store_path))?,
  );
  tracing::info!(path = %settings.store_path.display(), "opened inbox store");

  let client = ApiClient::new(ApiConfig {
    base_url: settings.url.clone(),
    username: settings.username.clone(),
    password: settings.password.clone(),
  })?;

  let engine = SyncEngine::from_parts(
    UnreadInbox::new(store.clone()),
    ReadLedger::with_capacity(store, settings.history_limit),
    Arc::new(client),
  )
  .with_fetch_limit(settings.fetch_limit);

  Ok(NotificationCenter::new(engine).with_panel(Panel::new(settings.close_delay())))
}

// ─── Headless mode ────────────────────────────────────────────────────────────

async fn run_once(mut center: app::Center, push: Option<PushNotice>) -> Result<()> {
  if let Some(notice) = push {
    println!("push: {} ({})", notice.title, notice.url);
  }

  center.load_cached().await;
  center.reload().await;

  for n in center.unread() {
    let when = n
      .created_at
      .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_else(|| "-".to_string());
    println!("{:<12} {:<8} {:<16} {}", n.id, n.kind, when, n.title);
  }
  println!("{} unread", center.unread_count());

  match center.error() {
    Some(err) => Err(anyhow!("{err}")),
    None => Ok(()),
  }
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.tick();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
