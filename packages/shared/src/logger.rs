//! Logger setup shared by every Rankfile binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when it is set. Otherwise the binary's own target and the
/// client library are logged at `default_level`.
///
/// # Arguments
///
/// * `bin_name` - Binary name, usually `env!("CARGO_BIN_NAME")`
/// * `default_level` - Level used when `RUST_LOG` is absent (e.g. `"info"`)
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(bin_name, default_level)));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true).with_target(true))
        .try_init();
}

const LIBRARY_TARGET: &str = "rankfile_client";

fn default_directives(bin_name: &str, default_level: &str) -> String {
    let target = bin_name.replace('-', "_");
    if target == LIBRARY_TARGET {
        format!("{target}={default_level}")
    } else {
        format!("{target}={default_level},{LIBRARY_TARGET}={default_level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_normalizes_bin_name() {
        // テスト項目: バイナリ名のハイフンはターゲット名のアンダースコアに変換される
        // when (操作):
        let directives = default_directives("rankfile-replay", "debug");

        // then (期待する結果):
        assert_eq!(directives, "rankfile_replay=debug,rankfile_client=debug");
    }

    #[test]
    fn test_default_directives_for_client_binary_are_not_duplicated() {
        // テスト項目: クライアント本体のバイナリではライブラリのディレクティブを重複させない
        // when (操作):
        let directives = default_directives("rankfile-client", "info");

        // then (期待する結果):
        assert_eq!(directives, "rankfile_client=info");
    }

    #[test]
    fn test_default_directives_parse_as_env_filter() {
        // テスト項目: 生成したディレクティブは EnvFilter として解釈できる
        // given (前提条件):
        let directives = default_directives("some-tool", "info");

        // when (操作):
        let result = EnvFilter::try_new(directives);

        // then (期待する結果):
        assert!(result.is_ok());
    }
}
