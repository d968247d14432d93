//! Interactive terminal client.

pub mod cli;
mod runner;
pub mod session;
pub mod sound;

pub use runner::run;
pub use session::{HistoryView, Navigation, SessionCommand, SessionConfig, SyncSession};
pub use sound::ConsoleSoundPlayer;
