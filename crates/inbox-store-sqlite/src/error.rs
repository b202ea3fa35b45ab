//! Error type for `inbox-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The file was written by a newer version of this store, or its version
  /// is not one this store ever wrote.
  #[error("database schema version {found} is not supported (expected 0..={supported})")]
  UnsupportedSchema { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
