//! Client-side synchronization core for Rankfile, a real-time turn-based board
//! game played against an authoritative server over WebSocket.
//!
//! The crate keeps per-game snapshot histories in sync with the server, decodes
//! the compact board encoding, and derives presentation cues by diffing
//! consecutive snapshots.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ClientConfig;
pub use error::ClientError;
pub use ui::run as run_client;
