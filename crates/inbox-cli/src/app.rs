//! Application state and key dispatcher.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use inbox_core::{
  center::{NotificationCenter, PendingWrite},
  notification::Notification,
  push::PushNotice,
  sync::SyncReport,
};
use inbox_store_sqlite::SqliteStore;
use tokio::task::{JoinError, JoinSet};

use crate::client::ApiClient;

pub type Center = NotificationCenter<SqliteStore, ApiClient>;

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Unread list, loading/error flags, and panel state.
  pub center: Center,

  /// Cursor position within the unread list.
  pub cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Syncs in flight. A new reload never cancels an older one.
  reloads: JoinSet<inbox_core::Result<SyncReport>>,

  /// Acknowledgements not yet confirmed by the store.
  writes: JoinSet<usize>,
}

impl App {
  pub fn new(center: Center) -> Self {
    Self {
      center,
      cursor: 0,
      status_msg: String::new(),
      reloads: JoinSet::new(),
      writes: JoinSet::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Kick off a sync in the background.
  pub fn start_reload(&mut self) {
    let sync = self.center.begin_reload();
    self.reloads.spawn(sync);
  }

  /// Publish any syncs that have finished. Never blocks.
  pub fn poll_reloads(&mut self) {
    while let Some(joined) = self.reloads.try_join_next() {
      self.finish_reload(joined);
    }
  }

  /// Wait for every in-flight sync.
  pub async fn wait_for_reloads(&mut self) {
    while let Some(joined) = self.reloads.join_next().await {
      self.finish_reload(joined);
    }
  }

  fn finish_reload(&mut self, joined: Result<inbox_core::Result<SyncReport>, JoinError>) {
    // A panicked sync is handled like a storage failure: logged, list kept.
    let result = joined.unwrap_or_else(|e| Err(inbox_core::Error::storage(e)));
    self.center.finish_reload(result);
    self.clamp_cursor();
  }

  /// Show a push notice and pull the feed it announces.
  pub fn show_push(&mut self, notice: &PushNotice) {
    self.status_msg = match &notice.body {
      Some(body) => format!("🔔 {}: {} ({})", notice.title, body, notice.url),
      None => format!("🔔 {} ({})", notice.title, notice.url),
    };
    self.start_reload();
  }

  // ── Per-frame work ────────────────────────────────────────────────────────

  pub fn tick(&mut self) {
    self.center.tick(Instant::now());
    self.poll_reloads();
  }

  // ── Acknowledgement ───────────────────────────────────────────────────────

  /// The notification under the cursor, if any.
  pub fn cursor_notification(&self) -> Option<&Notification> { self.center.unread().get(self.cursor) }

  fn mark_cursor_read(&mut self) {
    let Some(id) = self.cursor_notification().map(|n| n.id.clone()) else {
      return;
    };
    let write = self.center.mark_read(&id);
    self.persist(write);
    self.clamp_cursor();
  }

  fn mark_all_read(&mut self) {
    let write = self.center.mark_all_read();
    self.persist(write);
    self.cursor = 0;
  }

  /// Spawn the storage half of an acknowledgement; the UI does not wait.
  fn persist(&mut self, write: PendingWrite<SqliteStore>) {
    if write.is_empty() {
      return;
    }
    self.writes.spawn(async move { write.commit().await.len() });
  }

  /// Wait for outstanding acknowledgements, e.g. before exiting.
  pub async fn flush_writes(&mut self) {
    while let Some(joined) = self.writes.join_next().await {
      match joined {
        Ok(recorded) => tracing::debug!(recorded, "acknowledgement persisted"),
        Err(e) => tracing::warn!(error = %e, "acknowledgement task failed"),
      }
    }
  }

  fn clamp_cursor(&mut self) {
    let len = self.center.unread_count();
    if self.cursor >= len {
      self.cursor = len.saturating_sub(1);
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Char('n') | KeyCode::Tab => self.center.toggle_panel(),

      KeyCode::Char('r') => {
        self.status_msg.clear();
        self.start_reload();
      }

      KeyCode::Esc => {
        if self.center.error().is_some() {
          self.center.dismiss_error();
        } else {
          self.center.close();
        }
      }

      _ if self.center.panel().is_open() => self.handle_panel_key(key),

      _ => {}
    }
    true
  }

  fn handle_panel_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.center.unread_count() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Enter | KeyCode::Char('x') => self.mark_cursor_read(),
      KeyCode::Char('a') => self.mark_all_read(),
      _ => {}
    }
  }
}
