//! ログ出力の初期化

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// 標準出力へのログ出力を初期化する
///
/// ログレベルは`RUST_LOG`環境変数に従い、未設定時は`info`。
/// 二重初期化はエラーにせず無視する。
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(env_filter)
        .try_init();
}
