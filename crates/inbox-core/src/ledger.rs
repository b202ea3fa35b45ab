//! Read-history ledger — the bounded record of acknowledged notification ids.
//!
//! The ledger keeps only ids (never payloads) together with a logical
//! `read_at` stamp. It is capped at [`DEFAULT_CAPACITY`] entries; once an id
//! falls out of the window the same server event is treated as new again.

use std::{
  collections::HashSet,
  sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
  },
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::{Keyed, KvStore, Partition},
};

/// Number of most-recent acknowledgements the ledger retains.
pub const DEFAULT_CAPACITY: usize = 500;

/// One acknowledged id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEntry {
  pub id:      String,
  /// Logical milliseconds; strictly increasing across every recorded entry.
  pub read_at: i64,
}

impl Keyed for ReadEntry {
  fn key(&self) -> &str { &self.id }
}

/// The read-history ledger over a [`KvStore`].
///
/// Cloning is cheap; clones share the logical clock.
pub struct ReadLedger<S> {
  store:     Arc<S>,
  capacity:  usize,
  last_read: Arc<AtomicI64>,
}

impl<S> Clone for ReadLedger<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      capacity:  self.capacity,
      last_read: self.last_read.clone(),
    }
  }
}

impl<S: KvStore> ReadLedger<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_capacity(store, DEFAULT_CAPACITY) }

  pub fn with_capacity(store: Arc<S>, capacity: usize) -> Self {
    Self {
      store,
      capacity,
      last_read: Arc::new(AtomicI64::new(0)),
    }
  }

  pub fn capacity(&self) -> usize { self.capacity }

  /// The subset of `ids` already recorded as read.
  pub async fn contains_any<I>(&self, ids: I) -> Result<HashSet<String>>
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    let wanted: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_owned()).collect();
    if wanted.is_empty() {
      return Ok(HashSet::new());
    }
    let entries = self.entries().await?;
    Ok(
      entries
        .into_iter()
        .map(|e| e.id)
        .filter(|id| wanted.contains(id))
        .collect(),
    )
  }

  /// Every entry, in store order.
  pub async fn entries(&self) -> Result<Vec<ReadEntry>> {
    self
      .store
      .get_all(Partition::ReadHistory)
      .await
      .map_err(Error::storage)
  }

  /// Number of entries currently held.
  pub async fn len(&self) -> Result<usize> { Ok(self.entries().await?.len()) }

  /// Record `ids` as read, then trim the ledger.
  ///
  /// Each id is stamped `base + position` so a batch keeps its relative
  /// order. Storage failures are logged and skipped; the returned entries are
  /// the ones actually written.
  pub async fn record_read(&self, ids: &[String]) -> Vec<ReadEntry> {
    if ids.is_empty() {
      return Vec::new();
    }

    let base = self.reserve(ids.len());
    let mut written = Vec::with_capacity(ids.len());
    for (offset, id) in ids.iter().enumerate() {
      let entry = ReadEntry {
        id:      id.clone(),
        read_at: base + offset as i64,
      };
      match self.store.put(Partition::ReadHistory, entry.clone()).await {
        Ok(()) => written.push(entry),
        Err(e) => tracing::warn!(id = %id, error = %e, "failed to record notification as read"),
      }
    }

    if let Err(e) = self.trim().await {
      tracing::warn!(error = %e, "failed to trim read history");
    }

    written
  }

  /// Drop everything beyond the `capacity` most recent entries.
  ///
  /// Entries with equal `read_at` keep the order returned by the store.
  /// Returns the number of evicted entries.
  pub async fn trim(&self) -> Result<usize> {
    let mut entries = self.entries().await?;
    if entries.len() <= self.capacity {
      return Ok(0);
    }

    entries.sort_by(|a, b| b.read_at.cmp(&a.read_at));
    let evicted: Vec<String> = entries.split_off(self.capacity).into_iter().map(|e| e.id).collect();
    let count = evicted.len();

    self
      .store
      .delete_many(Partition::ReadHistory, evicted)
      .await
      .map_err(Error::storage)?;

    tracing::debug!(evicted = count, "trimmed read history");
    Ok(count)
  }

  /// Reserve `n` consecutive stamps; the first is at least the current time
  /// and always above anything issued before.
  fn reserve(&self, n: usize) -> i64 {
    let now = Utc::now().timestamp_millis();
    let n = n as i64;
    let prev = match self
      .last_read
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1) + n - 1))
    {
      Ok(prev) | Err(prev) => prev,
    };
    now.max(prev + 1)
  }
}
