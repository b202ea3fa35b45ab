//! Helpers shared by the unit tests of this binary.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}")
}

/// A feed that always answers with `notifications`.
pub fn feed_router(notifications: Value) -> Router {
  Router::new().route(
    "/api/notifications",
    get(move || {
      let body = json!({ "notifications": notifications });
      async move { Json(body) }
    }),
  )
}
