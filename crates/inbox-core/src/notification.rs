//! Notification types — the unit stored in the unread inbox.
//!
//! A notification is immutable once stored. Its local id is derived from the
//! server record's own id, so re-fetching the same server event always yields
//! the same local id.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Keyed;

/// Prefix joined to the server id to form a local notification id.
pub const LOCAL_ID_PREFIX: &str = "srv-";

/// Title used when the server record carries none.
pub const DEFAULT_TITLE: &str = "Notification";

/// Derive the local id for a server-side id.
pub fn local_id(server_id: &str) -> String { format!("{LOCAL_ID_PREFIX}{server_id}") }

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Display grouping tag. Unknown tags are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
  #[default]
  Log,
  Other(String),
}

impl NotificationKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Log => "log",
      Self::Other(s) => s,
    }
  }
}

impl From<String> for NotificationKind {
  fn from(s: String) -> Self {
    match s.as_str() {
      "log" => Self::Log,
      _ => Self::Other(s),
    }
  }
}

impl From<NotificationKind> for String {
  fn from(kind: NotificationKind) -> Self {
    match kind {
      NotificationKind::Log => "log".to_owned(),
      NotificationKind::Other(s) => s,
    }
  }
}

impl fmt::Display for NotificationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

// ─── Notification ────────────────────────────────────────────────────────────

/// A notification as held in the unread inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id:         String,
  #[serde(rename = "type", default)]
  pub kind:       NotificationKind,
  pub title:      String,
  #[serde(default)]
  pub body:       Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
  /// Map a server record to its local form.
  pub fn from_remote(remote: RemoteNotification) -> Self {
    let created_at = remote.created_at.as_deref().and_then(parse_timestamp);
    Self {
      id: local_id(&remote.id.to_string()),
      kind: remote.kind.map(NotificationKind::from).unwrap_or_default(),
      title: remote
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
      body: remote.body,
      created_at,
    }
  }

  /// Milliseconds since the epoch used for ordering; absent sorts as 0.
  pub fn sort_key(&self) -> i64 {
    self.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
  }
}

impl Keyed for Notification {
  fn key(&self) -> &str { &self.id }
}

/// Sort newest first. Stable, so equal timestamps keep their incoming order.
pub fn sort_newest_first(items: &mut [Notification]) {
  items.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  // Database-style timestamps without an offset are taken as UTC.
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
    .ok()
    .map(|n| n.and_utc())
}

// ─── Wire format ─────────────────────────────────────────────────────────────

/// Server ids arrive as either JSON strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
  Number(i64),
  Text(String),
}

impl fmt::Display for RemoteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// One record of `GET /api/notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNotification {
  pub id:         RemoteId,
  #[serde(rename = "type", default)]
  pub kind:       Option<String>,
  #[serde(default)]
  pub title:      Option<String>,
  #[serde(default)]
  pub body:       Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

/// Response envelope of `GET /api/notifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedPage {
  #[serde(default)]
  pub notifications: Vec<RemoteNotification>,
}
