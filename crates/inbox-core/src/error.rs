//! Error types for `inbox-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The remote feed was unreachable or answered with a non-success status.
  #[error("could not reach the notification feed: {0}")]
  Transport(String),

  /// The local store failed to open, read, or write.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap any backend error as [`Error::Storage`].
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }

  /// Only transport errors are meant to reach the user.
  pub fn is_transport(&self) -> bool { matches!(self, Self::Transport(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
