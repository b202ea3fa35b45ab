//! Async HTTP client for the portal's notification feed.

use std::time::Duration;

use inbox_core::{
  notification::{FeedPage, RemoteNotification},
  sync::NotificationFeed,
};
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Connection settings for the portal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET /api/notifications → {0}")]
  Status(StatusCode),
}

/// Async HTTP client for `GET /api/notifications`.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }
}

impl NotificationFeed for ApiClient {
  type Error = ClientError;

  /// `GET /api/notifications?limit=<limit>`
  async fn fetch(&self, limit: usize) -> Result<Vec<RemoteNotification>, ClientError> {
    let resp = self
      .auth(self.client.get(self.url("/notifications")))
      .query(&[("limit", limit.to_string())])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(ClientError::Status(resp.status()));
    }
    let page: FeedPage = resp.json().await?;
    tracing::debug!(count = page.notifications.len(), "fetched notifications");
    Ok(page.notifications)
  }
}
