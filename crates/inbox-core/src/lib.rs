//! Core types and trait definitions for the notification inbox.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend and the remote feed are injected through the
//! [`store::KvStore`] and [`sync::NotificationFeed`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod center;
pub mod error;
pub mod inbox;
pub mod ledger;
pub mod memory;
pub mod notification;
pub mod panel;
pub mod push;
pub mod store;
pub mod sync;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
