//! Command line configuration.

use std::time::Duration;

use clap::Parser;

use crate::{
    error::ClientError,
    infrastructure::transport::TransportConfig,
    ui::SessionConfig,
};

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

/// Rankfile client: follow and play real-time board games from the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "rankfile-client", version, about)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Name used when creating and joining games
    #[arg(short, long, default_value = "guest")]
    pub username: String,

    /// Route tag stamped on every outbound message
    #[arg(long, default_value = "game")]
    pub route: String,

    /// Heartbeat interval while connected, in seconds
    #[arg(long, default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// Delay before the first reconnect attempt, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub reconnect_initial_delay_ms: u64,

    /// Upper bound of the reconnect delay, in seconds
    #[arg(long, default_value_t = 30)]
    pub reconnect_max_delay_secs: u64,

    /// Reconnect attempts before giving up
    #[arg(long, default_value_t = 5)]
    pub max_reconnect_attempts: u32,

    /// How long display messages stay visible, in seconds
    #[arg(long, default_value_t = 5)]
    pub message_ttl_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: "guest".to_string(),
            route: "game".to_string(),
            heartbeat_secs: 30,
            reconnect_initial_delay_ms: 1000,
            reconnect_max_delay_secs: 30,
            max_reconnect_attempts: 5,
            message_ttl_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Reject values the transport cannot work with.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ClientError::InvalidConfig(format!(
                "url must start with ws:// or wss:// (got '{}')",
                self.url
            )));
        }
        if self.username.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "username must not be empty".to_string(),
            ));
        }
        if self.heartbeat_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "heartbeat interval must be at least one second".to_string(),
            ));
        }
        if self.reconnect_initial_delay_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "reconnect delay must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&ClientConfig> for TransportConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            route: config.route.clone(),
            heartbeat_interval: Duration::from_secs(config.heartbeat_secs),
            reconnect_initial_delay: Duration::from_millis(config.reconnect_initial_delay_ms),
            reconnect_max_delay: Duration::from_secs(config.reconnect_max_delay_secs),
            max_reconnect_attempts: config.max_reconnect_attempts,
        }
    }
}

impl From<&ClientConfig> for SessionConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            username: config.username.clone(),
            message_ttl: Duration::from_secs(config.message_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_defaults_match_default_impl() {
        // テスト項目: 引数なしで解析した設定は Default と一致する
        // when (操作):
        let parsed = ClientConfig::parse_from(["rankfile-client"]);

        // then (期待する結果):
        assert_eq!(parsed, ClientConfig::default());
    }

    #[test]
    fn test_default_transport_config_matches_protocol() {
        // テスト項目: 既定値から導いたトランスポート設定はプロトコルの既定値と一致する
        assert_eq!(
            TransportConfig::from(&ClientConfig::default()),
            TransportConfig::default()
        );
    }

    #[test]
    fn test_parse_overrides() {
        // テスト項目: コマンドライン引数で既定値を上書きできる
        // when (操作):
        let config = ClientConfig::parse_from([
            "rankfile-client",
            "--url",
            "wss://example.com/game",
            "-u",
            "alice",
            "--max-reconnect-attempts",
            "2",
            "--message-ttl-secs",
            "10",
        ]);

        // then (期待する結果):
        assert_eq!(config.url, "wss://example.com/game");
        assert_eq!(SessionConfig::from(&config).username, "alice");
        assert_eq!(
            SessionConfig::from(&config).message_ttl,
            Duration::from_secs(10)
        );
        assert_eq!(TransportConfig::from(&config).max_reconnect_attempts, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        // テスト項目: 不正な URL・空のユーザー名・0 秒のハートビートは拒否される
        let http = ClientConfig {
            url: "http://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(http.validate(), Err(ClientError::InvalidConfig(_))));

        let blank = ClientConfig {
            username: "  ".to_string(),
            ..ClientConfig::default()
        };
        assert!(blank.validate().is_err());

        let no_heartbeat = ClientConfig {
            heartbeat_secs: 0,
            ..ClientConfig::default()
        };
        assert!(no_heartbeat.validate().is_err());
    }
}
