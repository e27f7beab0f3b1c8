//! SQLite backend for the Vigia safety store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Every committed write publishes
//! its collection tag on a broadcast bus, which is what drives the live
//! feeds in `vigia-app`.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
