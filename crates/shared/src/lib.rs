//! Shared library for the Anime Explorer workspace.
//!
//! This crate provides the plumbing used by the explorer crate and its CLI:
//! - Configuration management
//! - Logging infrastructure
//! - Key-value storage backends (JSON files, SQLite, in-memory)

pub mod config;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use logging::LogConfig;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
