//! The `KvStore` trait and its partition names.
//!
//! The trait is implemented by storage backends (e.g. `inbox-store-sqlite`,
//! or [`MemoryStore`](crate::memory::MemoryStore) for tests). The ledger and
//! inbox depend on this abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use serde::{Serialize, de::DeserializeOwned};

// ─── Partitions ──────────────────────────────────────────────────────────────

/// A named partition of the store. Each partition is owned by exactly one
/// component and written by nobody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
  /// Owned by [`UnreadInbox`](crate::inbox::UnreadInbox).
  Unread,
  /// Owned by [`ReadLedger`](crate::ledger::ReadLedger).
  ReadHistory,
}

impl Partition {
  /// Name of the partition inside the local database.
  pub fn name(self) -> &'static str {
    match self {
      Self::Unread => "unread_notifications",
      Self::ReadHistory => "read_notifications",
    }
  }
}

impl fmt::Display for Partition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A value that carries its own unique key.
pub trait Keyed: Serialize + DeserializeOwned + Send + Sync + 'static {
  fn key(&self) -> &str;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a local, durable, partitioned key-value store.
///
/// Every operation is atomic within its partition. Nothing is atomic across
/// partitions: a logical action touching both is two independent writes.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tokio tasks.
pub trait KvStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert or replace `value` under its own key.
  fn put<V: Keyed>(
    &self,
    partition: Partition,
    value: V,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete one key. Deleting a missing key is not an error.
  fn delete(
    &self,
    partition: Partition,
    key: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete several keys as one atomic partition operation.
  fn delete_many(
    &self,
    partition: Partition,
    keys: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every value of the partition, in ascending key order.
  fn get_all<V: Keyed>(
    &self,
    partition: Partition,
  ) -> impl Future<Output = Result<Vec<V>, Self::Error>> + Send + '_;

  /// Remove every value of the partition.
  fn clear(
    &self,
    partition: Partition,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
