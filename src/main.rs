use anyhow::{Context, Result};
use sayt::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    sayt::logging::init_logging();

    let config = AppConfig::from_env().context("設定の読み込みに失敗")?;
    sayt::app::serve(config).await
}
