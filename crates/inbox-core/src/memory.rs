//! [`MemoryStore`] — a non-durable [`KvStore`] for tests and ephemeral runs.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;

use crate::store::{Keyed, KvStore, Partition};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("store is unavailable")]
  Unavailable,

  #[error("store lock poisoned")]
  Poisoned,

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

type Partitions = HashMap<Partition, BTreeMap<String, serde_json::Value>>;

/// In-memory store. Values are kept as JSON so reads hand back fresh copies,
/// as a persistent backend would.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  data:        Arc<Mutex<Partitions>>,
  unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent operation fail with [`MemoryError::Unavailable`].
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn lock(&self) -> Result<MutexGuard<'_, Partitions>, MemoryError> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    self.data.lock().map_err(|_| MemoryError::Poisoned)
  }
}

impl KvStore for MemoryStore {
  type Error = MemoryError;

  async fn put<V: Keyed>(&self, partition: Partition, value: V) -> Result<(), MemoryError> {
    let key = value.key().to_owned();
    let json = serde_json::to_value(&value)?;
    self.lock()?.entry(partition).or_default().insert(key, json);
    Ok(())
  }

  async fn delete(&self, partition: Partition, key: String) -> Result<(), MemoryError> {
    if let Some(map) = self.lock()?.get_mut(&partition) {
      map.remove(&key);
    }
    Ok(())
  }

  async fn delete_many(&self, partition: Partition, keys: Vec<String>) -> Result<(), MemoryError> {
    if let Some(map) = self.lock()?.get_mut(&partition) {
      for key in &keys {
        map.remove(key);
      }
    }
    Ok(())
  }

  async fn get_all<V: Keyed>(&self, partition: Partition) -> Result<Vec<V>, MemoryError> {
    let values: Vec<serde_json::Value> = self
      .lock()?
      .get(&partition)
      .map(|map| map.values().cloned().collect())
      .unwrap_or_default();
    values
      .into_iter()
      .map(|v| serde_json::from_value(v).map_err(MemoryError::from))
      .collect()
  }

  async fn clear(&self, partition: Partition) -> Result<(), MemoryError> {
    self.lock()?.remove(&partition);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde::{Deserialize, Serialize};

  use super::*;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id:    String,
    value: u32,
  }

  impl Keyed for Item {
    fn key(&self) -> &str { &self.id }
  }

  fn item(id: &str, value: u32) -> Item { Item { id: id.into(), value } }

  #[tokio::test]
  async fn put_is_an_upsert() {
    let s = MemoryStore::new();
    s.put(Partition::Unread, item("a", 1)).await.unwrap();
    s.put(Partition::Unread, item("a", 2)).await.unwrap();
    let all: Vec<Item> = s.get_all(Partition::Unread).await.unwrap();
    assert_eq!(all, vec![item("a", 2)]);
  }

  #[tokio::test]
  async fn partitions_are_independent() {
    let s = MemoryStore::new();
    s.put(Partition::Unread, item("a", 1)).await.unwrap();
    s.put(Partition::ReadHistory, item("b", 1)).await.unwrap();
    s.clear(Partition::Unread).await.unwrap();

    let unread: Vec<Item> = s.get_all(Partition::Unread).await.unwrap();
    let read: Vec<Item> = s.get_all(Partition::ReadHistory).await.unwrap();
    assert!(unread.is_empty());
    assert_eq!(read.len(), 1);
  }

  #[tokio::test]
  async fn get_all_is_key_ordered_and_delete_many_removes() {
    let s = MemoryStore::new();
    for id in ["c", "a", "b"] {
      s.put(Partition::Unread, item(id, 0)).await.unwrap();
    }
    s.delete_many(Partition::Unread, vec!["b".into(), "zz".into()])
      .await
      .unwrap();
    let ids: Vec<String> = s
      .get_all::<Item>(Partition::Unread)
      .await
      .unwrap()
      .into_iter()
      .map(|i| i.id)
      .collect();
    assert_eq!(ids, ["a", "c"]);
  }

  #[tokio::test]
  async fn unavailable_store_fails_every_operation() {
    let s = MemoryStore::new();
    s.set_unavailable(true);
    assert!(s.put(Partition::Unread, item("a", 1)).await.is_err());
    assert!(s.get_all::<Item>(Partition::Unread).await.is_err());
    s.set_unavailable(false);
    assert!(s.put(Partition::Unread, item("a", 1)).await.is_ok());
  }
}
