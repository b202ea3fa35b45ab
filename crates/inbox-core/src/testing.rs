//! Shared fixtures for the unit tests in this crate.

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::{
  memory::{MemoryError, MemoryStore},
  notification::{RemoteId, RemoteNotification},
  store::{Keyed, KvStore, Partition},
  sync::NotificationFeed,
};

#[derive(Debug, Error)]
#[error("feed answered {0}")]
pub struct FeedStatus(pub u16);

#[derive(Default)]
struct Script {
  records: Vec<RemoteNotification>,
  failure: Option<u16>,
  limits:  Vec<usize>,
}

/// A feed that serves a fixed list, or fails with a status, on demand.
#[derive(Default)]
pub struct ScriptedFeed {
  script: Mutex<Script>,
}

impl ScriptedFeed {
  pub fn new(records: Vec<RemoteNotification>) -> Self {
    Self {
      script: Mutex::new(Script {
        records,
        ..Script::default()
      }),
    }
  }

  pub fn set_records(&self, records: Vec<RemoteNotification>) {
    let mut s = self.script.lock().unwrap();
    s.records = records;
    s.failure = None;
  }

  pub fn fail_with(&self, status: u16) { self.script.lock().unwrap().failure = Some(status); }

  pub fn limits(&self) -> Vec<usize> { self.script.lock().unwrap().limits.clone() }
}

impl NotificationFeed for ScriptedFeed {
  type Error = FeedStatus;

  async fn fetch(&self, limit: usize) -> Result<Vec<RemoteNotification>, FeedStatus> {
    let mut s = self.script.lock().unwrap();
    s.limits.push(limit);
    match s.failure {
      Some(status) => Err(FeedStatus(status)),
      None => Ok(s.records.iter().take(limit).cloned().collect()),
    }
  }
}

pub fn remote(id: i64, title: &str, created_at: Option<&str>) -> RemoteNotification {
  RemoteNotification {
    id:         RemoteId::Number(id),
    kind:       Some("log".into()),
    title:      Some(title.into()),
    body:       None,
    created_at: created_at.map(str::to_owned),
  }
}

type Gate = (oneshot::Sender<()>, oneshot::Receiver<()>);

/// A [`MemoryStore`] whose next read-history `put`, once armed, parks until
/// released.
#[derive(Default)]
pub struct GatedStore {
  inner: MemoryStore,
  gate:  Mutex<Option<Gate>>,
}

impl GatedStore {
  /// Returns a receiver that fires once the `put` is parked, and the sender
  /// that lets it continue.
  pub fn arm(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
    let (reached_tx, reached_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    *self.gate.lock().unwrap() = Some((reached_tx, release_rx));
    (reached_rx, release_tx)
  }
}

impl KvStore for GatedStore {
  type Error = MemoryError;

  async fn put<V: Keyed>(&self, partition: Partition, value: V) -> Result<(), MemoryError> {
    let gate = match partition {
      Partition::ReadHistory => self.gate.lock().unwrap().take(),
      Partition::Unread => None,
    };
    if let Some((reached, release)) = gate {
      let _ = reached.send(());
      let _ = release.await;
    }
    self.inner.put(partition, value).await
  }

  async fn delete(&self, partition: Partition, key: String) -> Result<(), MemoryError> {
    self.inner.delete(partition, key).await
  }

  async fn delete_many(&self, partition: Partition, keys: Vec<String>) -> Result<(), MemoryError> {
    self.inner.delete_many(partition, keys).await
  }

  async fn get_all<V: Keyed>(&self, partition: Partition) -> Result<Vec<V>, MemoryError> {
    self.inner.get_all(partition).await
  }

  async fn clear(&self, partition: Partition) -> Result<(), MemoryError> {
    self.inner.clear(partition).await
  }
}
