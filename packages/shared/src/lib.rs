//! Shared utilities for Rankfile binaries and libraries.

pub mod logger;
pub mod time;
