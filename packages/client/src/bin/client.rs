//! Interactive Rankfile client.
//!
//! Connects to a game server and reads commands from the terminal.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rankfile-client -- --url ws://127.0.0.1:8080/ws --username alice
//! ```

use clap::Parser;
use rankfile_client::ClientConfig;
use rankfile_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ClientConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the client
    if let Err(e) = rankfile_client::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
