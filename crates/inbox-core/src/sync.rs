//! Sync engine — pulls the remote feed and merges it into the unread inbox.
//!
//! A candidate is inserted only when its id is neither unread nor in the
//! read-history ledger. Inserts are keyed upserts, so repeated or concurrent
//! syncs converge on the same state.

use std::{collections::HashSet, future::Future, sync::Arc};

use tokio::sync::Mutex;

use crate::{
  Error, Result,
  inbox::UnreadInbox,
  ledger::ReadLedger,
  notification::{Notification, RemoteNotification},
  store::KvStore,
};

/// Number of most-recent records requested per sync.
pub const DEFAULT_FETCH_LIMIT: usize = 100;

// ─── Feed trait ──────────────────────────────────────────────────────────────

/// The remote source of notifications (`GET /api/notifications?limit=N`).
///
/// Records may come back in any order. A non-success response must be
/// reported as an error.
pub trait NotificationFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RemoteNotification>, Self::Error>> + Send + '_;
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Outcome of one [`SyncEngine::sync`] run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
  /// Records returned by the feed.
  pub fetched:        usize,
  pub inserted:       usize,
  /// Candidates suppressed because they were already read.
  pub skipped_read:   usize,
  /// Candidates already present in the inbox.
  pub skipped_unread: usize,
  /// The refreshed inbox, newest first.
  pub unread:         Vec<Notification>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct SyncEngine<S, F> {
  inbox:       UnreadInbox<S>,
  ledger:      ReadLedger<S>,
  feed:        Arc<F>,
  fetch_limit: usize,
  /// Held while merging and while an acknowledgement moves ids between
  /// stores. Shared by clones.
  writes:      Arc<Mutex<()>>,
}

impl<S, F> Clone for SyncEngine<S, F> {
  fn clone(&self) -> Self {
    Self {
      inbox:       self.inbox.clone(),
      ledger:      self.ledger.clone(),
      feed:        self.feed.clone(),
      fetch_limit: self.fetch_limit,
      writes:      self.writes.clone(),
    }
  }
}

impl<S: KvStore, F: NotificationFeed> SyncEngine<S, F> {
  /// Engine over a single store with the default ledger capacity.
  pub fn new(store: Arc<S>, feed: Arc<F>) -> Self {
    Self::from_parts(UnreadInbox::new(store.clone()), ReadLedger::new(store), feed)
  }

  pub fn from_parts(inbox: UnreadInbox<S>, ledger: ReadLedger<S>, feed: Arc<F>) -> Self {
    Self {
      inbox,
      ledger,
      feed,
      fetch_limit: DEFAULT_FETCH_LIMIT,
      writes: Arc::new(Mutex::new(())),
    }
  }

  pub fn with_fetch_limit(mut self, limit: usize) -> Self {
    self.fetch_limit = limit;
    self
  }

  pub fn inbox(&self) -> &UnreadInbox<S> { &self.inbox }

  pub fn ledger(&self) -> &ReadLedger<S> { &self.ledger }

  pub(crate) fn write_lock(&self) -> Arc<Mutex<()>> { self.writes.clone() }

  /// Fetch, deduplicate, merge, and return the refreshed inbox.
  ///
  /// Feed failures surface as [`Error::Transport`] and are never retried
  /// here. Storage failures while merging are logged; a failure to reload
  /// the inbox afterwards surfaces as [`Error::Storage`].
  pub async fn sync(&self) -> Result<SyncReport> {
    let remote = self.feed.fetch(self.fetch_limit).await.map_err(|e| {
      tracing::warn!(error = %e, "notification feed request failed");
      Error::Transport(e.to_string())
    })?;

    let mut report = SyncReport {
      fetched: remote.len(),
      ..SyncReport::default()
    };

    let mut seen = HashSet::new();
    let candidates: Vec<Notification> = remote
      .into_iter()
      .map(Notification::from_remote)
      .filter(|n| seen.insert(n.id.clone()))
      .collect();

    if !candidates.is_empty() {
      self.merge(candidates, &mut report).await;
    }

    report.unread = self.inbox.load_all().await?;

    tracing::info!(
      fetched = report.fetched,
      inserted = report.inserted,
      skipped_read = report.skipped_read,
      skipped_unread = report.skipped_unread,
      unread = report.unread.len(),
      "notification sync finished",
    );
    Ok(report)
  }

  async fn merge(&self, candidates: Vec<Notification>, report: &mut SyncReport) {
    let _writes = self.writes.lock().await;

    // Upserts are idempotent, so an unreadable inbox snapshot only costs
    // redundant writes.
    let unread = match self.inbox.ids().await {
      Ok(ids) => ids,
      Err(e) => {
        tracing::warn!(error = %e, "could not snapshot unread inbox");
        HashSet::new()
      }
    };

    // Without the ledger we cannot tell read items apart; insert nothing.
    let candidate_ids: Vec<&str> = candidates.iter().map(|n| n.id.as_str()).collect();
    let read = match self.ledger.contains_any(candidate_ids).await {
      Ok(read) => read,
      Err(e) => {
        tracing::warn!(error = %e, "could not consult read history; skipping merge");
        return;
      }
    };

    for notification in candidates {
      if read.contains(&notification.id) {
        tracing::debug!(id = %notification.id, "skipping already-read notification");
        report.skipped_read += 1;
        continue;
      }
      if unread.contains(&notification.id) {
        report.skipped_unread += 1;
        continue;
      }
      let id = notification.id.clone();
      match self.inbox.insert_if_absent(notification).await {
        Ok(()) => report.inserted += 1,
        Err(e) => tracing::warn!(id = %id, error = %e, "failed to store notification"),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;
  use crate::{
    memory::MemoryStore,
    testing::{ScriptedFeed, remote},
  };

  fn engine(feed: &Arc<ScriptedFeed>) -> (Arc<MemoryStore>, SyncEngine<MemoryStore, ScriptedFeed>) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), SyncEngine::new(store, feed.clone()))
  }

  fn ids(items: &[Notification]) -> Vec<String> { items.iter().map(|n| n.id.clone()).collect() }

  #[tokio::test]
  async fn first_sync_inserts_everything() {
    let feed = Arc::new(ScriptedFeed::new(vec![
      remote(1, "A", Some("2024-01-01T00:00:00Z")),
      remote(2, "B", Some("2024-01-02T00:00:00Z")),
    ]));
    let (_, e) = engine(&feed);

    let report = e.sync().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(ids(&report.unread), ["srv-2", "srv-1"]);
  }

  #[tokio::test]
  async fn sync_is_idempotent() {
    let feed = Arc::new(ScriptedFeed::new(vec![
      remote(1, "A", Some("2024-01-01T00:00:00Z")),
      remote(2, "B", None),
      remote(3, "C", Some("2024-01-03T00:00:00Z")),
    ]));
    let (_, e) = engine(&feed);

    let first = e.sync().await.unwrap();
    let second = e.sync().await.unwrap();
    assert_eq!(ids(&first.unread), ids(&second.unread));
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_unread, 3);
  }

  #[tokio::test]
  async fn read_ids_are_not_reinserted() {
    let feed = Arc::new(ScriptedFeed::new(vec![remote(1, "A", None), remote(2, "B", None)]));
    let (_, e) = engine(&feed);
    e.ledger().record_read(&["srv-1".to_owned()]).await;

    let report = e.sync().await.unwrap();
    assert_eq!(ids(&report.unread), ["srv-2"]);
    assert_eq!(report.skipped_read, 1);
  }

  #[tokio::test]
  async fn duplicates_within_one_batch_collapse() {
    let feed = Arc::new(ScriptedFeed::new(vec![remote(1, "A", None), remote(1, "A again", None)]));
    let (_, e) = engine(&feed);
    let report = e.sync().await.unwrap();
    assert_eq!(report.unread.len(), 1);
    assert_eq!(report.unread[0].title, "A");
  }

  #[tokio::test]
  async fn batch_order_does_not_change_the_result() {
    let batch = vec![
      remote(1, "A", Some("2024-01-01T00:00:00Z")),
      remote(2, "B", Some("2024-01-05T00:00:00Z")),
      remote(3, "C", Some("2024-01-03T00:00:00Z")),
    ];
    let mut reversed = batch.clone();
    reversed.reverse();

    let (_, forward) = engine(&Arc::new(ScriptedFeed::new(batch)));
    let (_, backward) = engine(&Arc::new(ScriptedFeed::new(reversed)));
    assert_eq!(
      ids(&forward.sync().await.unwrap().unread),
      ids(&backward.sync().await.unwrap().unread),
    );
  }

  #[tokio::test]
  async fn feed_failure_is_a_transport_error_and_leaves_the_inbox_alone() {
    let feed = Arc::new(ScriptedFeed::new(vec![remote(1, "A", None)]));
    let (_, e) = engine(&feed);
    e.sync().await.unwrap();

    feed.fail_with(503);
    let err = e.sync().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(e.inbox().load_all().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn fetch_limit_is_passed_to_the_feed() {
    let feed = Arc::new(ScriptedFeed::new(vec![]));
    let (_, e) = engine(&feed);
    e.clone().with_fetch_limit(7).sync().await.unwrap();
    e.sync().await.unwrap();
    assert_eq!(feed.limits(), [7, DEFAULT_FETCH_LIMIT]);
  }

  #[tokio::test]
  async fn storage_outage_during_reload_is_a_storage_error() {
    let feed = Arc::new(ScriptedFeed::new(vec![remote(1, "A", None)]));
    let (store, e) = engine(&feed);
    store.set_unavailable(true);
    let err = e.sync().await.unwrap_err();
    assert!(!err.is_transport());
  }

  #[tokio::test]
  async fn concurrent_syncs_converge_without_duplicates() {
    let feed = Arc::new(ScriptedFeed::new((1..=20).map(|i| remote(i, "x", None)).collect()));
    let (_, e) = engine(&feed);
    let (a, b) = tokio::join!(e.sync(), e.sync());
    a.unwrap();
    b.unwrap();

    let unread = e.inbox().load_all().await.unwrap();
    let unique: HashSet<_> = unread.iter().map(|n| n.id.clone()).collect();
    assert_eq!(unread.len(), 20);
    assert_eq!(unique.len(), 20);
  }

  #[tokio::test]
  async fn inbox_and_ledger_stay_disjoint() {
    let feed = Arc::new(ScriptedFeed::new((1..=6).map(|i| remote(i, "x", None)).collect()));
    let (_, e) = engine(&feed);
    e.sync().await.unwrap();

    let read = vec!["srv-2".to_owned(), "srv-4".to_owned()];
    e.inbox().remove_all(&read).await.unwrap();
    e.ledger().record_read(&read).await;
    e.sync().await.unwrap();

    let unread = e.inbox().ids().await.unwrap();
    let ledger: HashSet<String> = e.ledger().entries().await.unwrap().into_iter().map(|r| r.id).collect();
    assert!(unread.is_disjoint(&ledger));
    assert_eq!(unread.len(), 4);
  }
}
