//! Presentation adapter — the UI-facing notification state.
//!
//! [`NotificationCenter`] owns no persistent state. It keeps the last loaded
//! unread list, the loading and error flags, and the panel state machine.
//! Acknowledgements are applied to the in-memory list immediately; the
//! matching storage writes are handed back as a [`PendingWrite`] for the
//! caller to await or spawn.

use std::{collections::HashSet, future::Future, sync::Arc, time::Instant};

use tokio::sync::Mutex;

use crate::{
  Result,
  inbox::UnreadInbox,
  ledger::{ReadEntry, ReadLedger},
  notification::Notification,
  panel::Panel,
  store::KvStore,
  sync::{NotificationFeed, SyncEngine, SyncReport},
};

// ─── Pending writes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Acknowledge {
  Nothing,
  /// Delete these ids from the inbox, then record them.
  Ids(Vec<String>),
  /// Clear the inbox, then record these ids.
  All(Vec<String>),
}

/// The persistence half of an acknowledgement.
///
/// Removal from the inbox is issued before the ledger append, so an
/// interruption leaves an id in neither store rather than in both. A sync
/// merge never runs between the two writes. Failures are logged and never
/// roll back the in-memory state.
#[must_use = "an acknowledgement is only persisted once committed"]
pub struct PendingWrite<S> {
  inbox:  UnreadInbox<S>,
  ledger: ReadLedger<S>,
  writes: Arc<Mutex<()>>,
  action: Acknowledge,
}

impl<S: KvStore> PendingWrite<S> {
  /// Ids this write acknowledges.
  pub fn ids(&self) -> &[String] {
    match &self.action {
      Acknowledge::Nothing => &[],
      Acknowledge::Ids(ids) | Acknowledge::All(ids) => ids,
    }
  }

  pub fn is_empty(&self) -> bool { self.ids().is_empty() }

  /// Apply the write. Returns the ledger entries actually recorded.
  pub async fn commit(self) -> Vec<ReadEntry> {
    if matches!(self.action, Acknowledge::Nothing) {
      return Vec::new();
    }
    let _writes = self.writes.lock().await;

    let (removed, ids) = match self.action {
      Acknowledge::Nothing => return Vec::new(),
      Acknowledge::Ids(ids) => {
        let removed = match ids.as_slice() {
          [id] => self.inbox.remove(id).await,
          _ => self.inbox.remove_all(&ids).await,
        };
        (removed, ids)
      }
      Acknowledge::All(ids) => (self.inbox.clear().await, ids),
    };

    if let Err(e) = removed {
      // Recording now would leave the ids in both stores; they resurface
      // from the inbox on the next load instead.
      tracing::warn!(count = ids.len(), error = %e, "failed to remove acknowledged notifications");
      return Vec::new();
    }

    self.ledger.record_read(&ids).await
  }
}

// ─── Center ──────────────────────────────────────────────────────────────────

pub struct NotificationCenter<S, F> {
  engine:       SyncEngine<S, F>,
  unread:       Vec<Notification>,
  in_flight:    usize,
  /// Ids acknowledged while a reload was running. Those reloads loaded the
  /// inbox before the acknowledgement and must not publish them again.
  acknowledged: HashSet<String>,
  error:        Option<String>,
  panel:        Panel,
}

impl<S: KvStore, F: NotificationFeed> NotificationCenter<S, F> {
  pub fn new(engine: SyncEngine<S, F>) -> Self {
    Self {
      engine,
      unread: Vec::new(),
      in_flight: 0,
      acknowledged: HashSet::new(),
      error: None,
      panel: Panel::default(),
    }
  }

  pub fn with_panel(mut self, panel: Panel) -> Self {
    self.panel = panel;
    self
  }

  // ── State ─────────────────────────────────────────────────────────────────

  pub fn unread(&self) -> &[Notification] { &self.unread }

  pub fn unread_count(&self) -> usize { self.unread.len() }

  pub fn is_loading(&self) -> bool { self.in_flight > 0 }

  /// The last feed failure, if not yet dismissed.
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn dismiss_error(&mut self) { self.error = None; }

  pub fn engine(&self) -> &SyncEngine<S, F> { &self.engine }

  // ── Panel ─────────────────────────────────────────────────────────────────

  pub fn panel(&self) -> &Panel { &self.panel }

  pub fn open(&mut self) { self.panel.open(); }

  pub fn close(&mut self) { self.panel.close(Instant::now()); }

  pub fn toggle_panel(&mut self) { self.panel.toggle(Instant::now()); }

  pub fn tick(&mut self, now: Instant) { self.panel.tick(now); }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Show whatever the local inbox holds, without touching the network.
  pub async fn load_cached(&mut self) {
    match self.engine.inbox().load_all().await {
      Ok(unread) => self.unread = unread,
      Err(e) => tracing::warn!(error = %e, "could not load cached notifications"),
    }
  }

  /// Pull the feed and publish the merged inbox.
  pub async fn reload(&mut self)
  where
    S: 'static,
    F: 'static,
  {
    let sync = self.begin_reload();
    let result = sync.await;
    self.finish_reload(result);
  }

  /// First half of [`reload`](Self::reload): mark loading and return the
  /// sync to run. In-flight syncs are never cancelled by a newer one.
  pub fn begin_reload(&mut self) -> impl Future<Output = Result<SyncReport>> + Send + 'static
  where
    S: 'static,
    F: 'static,
  {
    self.in_flight += 1;
    let engine = self.engine.clone();
    async move { engine.sync().await }
  }

  /// Second half of [`reload`](Self::reload): publish the outcome.
  ///
  /// A feed failure keeps the previous list and sets the error message; a
  /// storage failure keeps the previous list silently.
  pub fn finish_reload(&mut self, result: Result<SyncReport>) {
    self.in_flight = self.in_flight.saturating_sub(1);
    match result {
      Ok(report) => {
        let acknowledged = &self.acknowledged;
        self.unread = report
          .unread
          .into_iter()
          .filter(|n| !acknowledged.contains(&n.id))
          .collect();
        self.error = None;
      }
      Err(e) if e.is_transport() => self.error = Some(e.to_string()),
      Err(e) => tracing::warn!(error = %e, "sync hit a storage error; keeping cached notifications"),
    }
    if self.in_flight == 0 {
      self.acknowledged.clear();
    }
  }

  // ── Acknowledgement ───────────────────────────────────────────────────────

  /// Drop `id` from the list now; persist via the returned write.
  pub fn mark_read(&mut self, id: &str) -> PendingWrite<S> {
    let before = self.unread.len();
    self.unread.retain(|n| n.id != id);
    let action = if self.unread.len() < before {
      Acknowledge::Ids(vec![id.to_owned()])
    } else {
      Acknowledge::Nothing
    };
    self.pending(action)
  }

  /// Clear the list now; persist via the returned write.
  pub fn mark_all_read(&mut self) -> PendingWrite<S> {
    let ids: Vec<String> = self.unread.drain(..).map(|n| n.id).collect();
    let action = if ids.is_empty() {
      Acknowledge::Nothing
    } else {
      Acknowledge::All(ids)
    };
    self.pending(action)
  }

  fn pending(&mut self, action: Acknowledge) -> PendingWrite<S> {
    if self.in_flight > 0
      && let Acknowledge::Ids(ids) | Acknowledge::All(ids) = &action
    {
      self.acknowledged.extend(ids.iter().cloned());
    }
    PendingWrite {
      inbox: self.engine.inbox().clone(),
      ledger: self.engine.ledger().clone(),
      writes: self.engine.write_lock(),
      action,
    }
  }
}
