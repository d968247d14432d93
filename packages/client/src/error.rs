//! Errors surfaced by the client entry point.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("Failed to start input thread: {0}")]
    InputThread(#[from] std::io::Error),
}
