//! Layered configuration: defaults, then the TOML file, then `INBOX_*`
//! environment variables, then command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use inbox_core::{ledger::DEFAULT_CAPACITY, sync::DEFAULT_FETCH_LIMIT};
use serde::Deserialize;

/// Runtime settings for the `inbox` client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base URL of the portal (the feed lives at `{url}/api/notifications`).
  pub url:            String,
  pub username:       String,
  pub password:       String,
  /// SQLite file holding the unread inbox and the read history.
  pub store_path:     PathBuf,
  pub fetch_limit:    usize,
  pub history_limit:  usize,
  /// Exit delay of the notification panel.
  pub close_delay_ms: u64,
  /// Where logs go while the terminal UI owns the screen.
  pub log_file:       PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      url:            "http://localhost:3000".to_owned(),
      username:       String::new(),
      password:       String::new(),
      store_path:     PathBuf::from("~/.local/share/inbox/inbox.db"),
      fetch_limit:    DEFAULT_FETCH_LIMIT,
      history_limit:  DEFAULT_CAPACITY,
      close_delay_ms: 200,
      log_file:       PathBuf::from("inbox.log"),
    }
  }
}

impl Settings {
  /// Read `file` (optional) and the `INBOX_*` environment.
  pub fn load(file: &Path) -> Result<Self> {
    let layered = config::Config::builder()
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("INBOX"))
      .build()
      .with_context(|| format!("reading config file {}", file.display()))?;

    let mut settings: Settings = layered
      .try_deserialize()
      .context("parsing configuration")?;
    settings.store_path = expand_tilde(&settings.store_path);
    settings.log_file = expand_tilde(&settings.log_file);
    Ok(settings)
  }

  pub fn close_delay(&self) -> Duration { Duration::from_millis(self.close_delay_ms) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(s.fetch_limit, DEFAULT_FETCH_LIMIT);
    assert_eq!(s.history_limit, DEFAULT_CAPACITY);
    assert_eq!(s.close_delay(), Duration::from_millis(200));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "url = \"https://portal.example\"\nfetch_limit = 25\nstore_path = \"/tmp/x.db\"").unwrap();

    let s = Settings::load(&path).unwrap();
    assert_eq!(s.url, "https://portal.example");
    assert_eq!(s.fetch_limit, 25);
    assert_eq!(s.store_path, PathBuf::from("/tmp/x.db"));
    assert_eq!(s.history_limit, DEFAULT_CAPACITY);
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/a/b")), PathBuf::from(home).join("a/b"));
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
