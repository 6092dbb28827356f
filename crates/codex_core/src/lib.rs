//! Core domain library for Codex (models, sessions, client storage, config).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across Codex crates.
pub mod constants;
/// Error types for client storage.
pub mod error;
/// Data models exchanged with the gateway.
pub mod models;
/// Session value objects and their persistence.
pub mod session;
/// Durable/volatile client storage with validated decoding.
pub mod storage;
/// Closed set of application views.
pub mod view;

pub use config::Config;
pub use constants::*;
pub use error::StoreError;
pub use session::{AdminSession, AdminSessionStore, Session, SessionStore, ViewedSnippets};
pub use storage::{ClientStore, FileStore, MemoryStore, Stored};
pub use view::View;
