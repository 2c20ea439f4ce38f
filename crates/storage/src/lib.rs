//! Storage abstraction and implementations for ShiftTrack.
//!
//! This crate provides a trait-based storage interface with a JSON file
//! reference implementation, an in-memory backend and an optional SQLite
//! backend behind the `sqlite` feature.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory_storage::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStorage;
