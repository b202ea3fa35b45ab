//! [`SqliteStore`] — the SQLite implementation of [`KvStore`].

use std::path::Path;

use inbox_core::store::{Keyed, KvStore, Partition};

use crate::{
  Error, Result,
  encode::{RawRow, encode_value},
  schema::{MIGRATIONS, PRAGMAS, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An inbox store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// The schema version recorded in the file.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get::<_, i64>(0))?))
      .await?;
    Ok(version)
  }

  async fn init_schema(&self) -> Result<()> {
    let found = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(conn.query_row("PRAGMA user_version", [], |r| r.get::<_, i64>(0))?)
      })
      .await?;

    if !(0..=SCHEMA_VERSION).contains(&found) {
      return Err(Error::UnsupportedSchema {
        found,
        supported: SCHEMA_VERSION,
      });
    }
    if found == SCHEMA_VERSION {
      return Ok(());
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for migration in &MIGRATIONS[found as usize..] {
          tx.execute_batch(migration)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(from = found, to = SCHEMA_VERSION, "migrated inbox store schema");
    Ok(())
  }
}

// ─── KvStore impl ────────────────────────────────────────────────────────────

impl KvStore for SqliteStore {
  type Error = Error;

  async fn put<V: Keyed>(&self, partition: Partition, value: V) -> Result<()> {
    let table = partition.name();
    let key = value.key().to_owned();
    let value_json = encode_value(&value)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO {table} (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json"
          ),
          rusqlite::params![key, value_json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, partition: Partition, key: String) -> Result<()> {
    let table = partition.name();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("DELETE FROM {table} WHERE key = ?1"),
          rusqlite::params![key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_many(&self, partition: Partition, keys: Vec<String>) -> Result<()> {
    if keys.is_empty() {
      return Ok(());
    }
    let table = partition.name();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&format!("DELETE FROM {table} WHERE key = ?1"))?;
          for key in &keys {
            stmt.execute(rusqlite::params![key])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_all<V: Keyed>(&self, partition: Partition) -> Result<Vec<V>> {
    let table = partition.name();

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT key, value_json FROM {table} ORDER BY key"))?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawRow {
              key:        row.get(0)?,
              value_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // A corrupt row is logged and skipped so it cannot hide the rest.
    Ok(raws.into_iter().filter_map(|raw| raw.decode().ok()).collect())
  }

  async fn clear(&self, partition: Partition) -> Result<()> {
    let table = partition.name();

    self
      .conn
      .call(move |conn| {
        conn.execute(&format!("DELETE FROM {table}"), [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
