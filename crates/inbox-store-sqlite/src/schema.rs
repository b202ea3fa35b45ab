//! SQL schema for the inbox SQLite store.
//!
//! The applied version lives in `PRAGMA user_version`. Migrations run in
//! order from the stored version up to [`SCHEMA_VERSION`]; a file with a
//! higher version is refused rather than guessed at.

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Connection settings applied on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Ordered migrations; entry `i` upgrades version `i` to `i + 1`.
pub const MIGRATIONS: &[&str] = &[
  // v1: one table per partition. Values are the JSON-encoded record; the
  // read-history value carries its `read_at` stamp.
  "
CREATE TABLE IF NOT EXISTS unread_notifications (
    key         TEXT PRIMARY KEY,   -- notification id, e.g. 'srv-42'
    value_json  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS read_notifications (
    key         TEXT PRIMARY KEY,   -- acknowledged notification id
    value_json  TEXT NOT NULL       -- {\"id\":…, \"read_at\":…}
);

PRAGMA user_version = 1;
",
];
