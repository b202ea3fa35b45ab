//! Unread inbox — the notifications not yet acknowledged.

use std::{collections::HashSet, sync::Arc};

use crate::{
  Error, Result,
  notification::{Notification, sort_newest_first},
  store::{KvStore, Partition},
};

/// The unread inbox over a [`KvStore`]. Items live here until acknowledged.
pub struct UnreadInbox<S> {
  store: Arc<S>,
}

impl<S> Clone for UnreadInbox<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: KvStore> UnreadInbox<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// All unread notifications, newest first.
  pub async fn load_all(&self) -> Result<Vec<Notification>> {
    let mut items: Vec<Notification> = self
      .store
      .get_all(Partition::Unread)
      .await
      .map_err(Error::storage)?;
    sort_newest_first(&mut items);
    Ok(items)
  }

  /// Snapshot of the ids currently held.
  pub async fn ids(&self) -> Result<HashSet<String>> {
    let items: Vec<Notification> = self
      .store
      .get_all(Partition::Unread)
      .await
      .map_err(Error::storage)?;
    Ok(items.into_iter().map(|n| n.id).collect())
  }

  /// Store `notification`. Callers only pass ids that are neither unread nor
  /// read; a repeated id simply overwrites the identical record.
  pub async fn insert_if_absent(&self, notification: Notification) -> Result<()> {
    self
      .store
      .put(Partition::Unread, notification)
      .await
      .map_err(Error::storage)
  }

  pub async fn remove(&self, id: &str) -> Result<()> {
    self
      .store
      .delete(Partition::Unread, id.to_owned())
      .await
      .map_err(Error::storage)
  }

  pub async fn remove_all(&self, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }
    self
      .store
      .delete_many(Partition::Unread, ids.to_vec())
      .await
      .map_err(Error::storage)
  }

  pub async fn clear(&self) -> Result<()> {
    self
      .store
      .clear(Partition::Unread)
      .await
      .map_err(Error::storage)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{memory::MemoryStore, notification::NotificationKind};

  fn note(id: &str, day: Option<u32>) -> Notification {
    Notification {
      id:         id.into(),
      kind:       NotificationKind::Log,
      title:      format!("title {id}"),
      body:       None,
      created_at: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()),
    }
  }

  fn inbox() -> UnreadInbox<MemoryStore> { UnreadInbox::new(Arc::new(MemoryStore::new())) }

  #[tokio::test]
  async fn load_all_sorts_newest_first_with_undated_last() {
    let i = inbox();
    i.insert_if_absent(note("srv-a", None)).await.unwrap();
    i.insert_if_absent(note("srv-b", Some(2))).await.unwrap();
    i.insert_if_absent(note("srv-c", Some(9))).await.unwrap();

    let ids: Vec<String> = i.load_all().await.unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, ["srv-c", "srv-b", "srv-a"]);
  }

  #[tokio::test]
  async fn remove_and_remove_all() {
    let i = inbox();
    for id in ["srv-1", "srv-2", "srv-3"] {
      i.insert_if_absent(note(id, Some(1))).await.unwrap();
    }
    i.remove("srv-1").await.unwrap();
    i.remove_all(&["srv-2".to_owned()]).await.unwrap();
    assert_eq!(i.ids().await.unwrap(), HashSet::from(["srv-3".to_owned()]));

    i.clear().await.unwrap();
    assert!(i.load_all().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn repeated_insert_does_not_duplicate() {
    let i = inbox();
    i.insert_if_absent(note("srv-1", Some(1))).await.unwrap();
    i.insert_if_absent(note("srv-1", Some(1))).await.unwrap();
    assert_eq!(i.load_all().await.unwrap().len(), 1);
  }
}
