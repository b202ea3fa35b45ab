//! Push payloads — wake-up messages that are displayed, never stored.
//!
//! A push carries `{ title?, body?, url? }`. It only produces something to
//! show; the inbox reflects what a sync pulls, not what a push announces.

use serde::Deserialize;

use crate::notification::DEFAULT_TITLE;

/// Where a click on a push notice leads when the payload names no url.
pub const DEFAULT_URL: &str = "/";

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  body:  Option<String>,
  #[serde(default)]
  url:   Option<String>,
}

/// A notice ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotice {
  pub title: String,
  pub body:  Option<String>,
  pub url:   String,
}

impl PushNotice {
  /// Parse a raw push payload. Malformed input is logged and dropped.
  pub fn from_payload(data: &[u8]) -> Option<Self> {
    let payload: PushPayload = match serde_json::from_slice(data) {
      Ok(p) => p,
      Err(e) => {
        tracing::debug!(error = %e, "ignoring malformed push payload");
        return None;
      }
    };

    Some(Self {
      title: payload
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
      body:  payload.body,
      url:   payload
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_URL.to_owned()),
    })
  }
}
