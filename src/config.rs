use crate::types::{ConfigError, ConfigResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// コンテンツAPIのベースURLを指定する環境変数
pub const ENV_CONTENT_API_URL: &str = "CONTENT_API_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";
pub const ENV_QUERY_STALE_SECS: &str = "QUERY_STALE_SECS";
pub const ENV_LOCAL_STORE_PATH: &str = "LOCAL_STORE_PATH";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_STALE_SECS: u64 = 300;
const DEFAULT_LOCAL_STORE_PATH: &str = ".sayt/storage.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// コンテンツAPIのベースURL（末尾のスラッシュは除去済み）
    pub api_base_url: String,
    /// 1リクエストあたりのタイムアウト
    pub request_timeout: Duration,
    /// 読み取り結果のキャッシュ鮮度期間
    pub stale_time: Duration,
    /// 認証情報を保持するローカルストアのパス
    pub local_store_path: PathBuf,
    /// サーバーの待ち受けアドレス
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `.env`の読み込みは呼び出し側（main）で行う。
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup(ENV_CONTENT_API_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::missing_env_var(ENV_CONTENT_API_URL))?;
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::invalid_value(
                ENV_CONTENT_API_URL,
                format!("http(s)のURLではありません: {}", api_base_url),
            ));
        }

        let timeout_secs = parse_secs(&lookup, ENV_API_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;
        let stale_secs = parse_secs(&lookup, ENV_QUERY_STALE_SECS, DEFAULT_STALE_SECS)?;

        let local_store_path = lookup(ENV_LOCAL_STORE_PATH)
            .unwrap_or_else(|| DEFAULT_LOCAL_STORE_PATH.to_string())
            .into();

        let bind_addr = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_value(ENV_BIND_ADDR, e.to_string()))?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            stale_time: Duration::from_secs(stale_secs),
            local_store_path,
            bind_addr,
        })
    }
}

fn parse_secs<F>(lookup: &F, name: &str, default: u64) -> ConfigResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid_value(name, format!("{} ({})", raw, e)))?;
            if secs == 0 {
                return Err(ConfigError::invalid_value(name, "0秒は指定できません"));
            }
            Ok(secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[ctor::ctor]
    fn init_test_env() {
        std::env::set_var(ENV_CONTENT_API_URL, "https://cms.example.com/api/");
    }

    #[test]
    fn test_from_env_uses_process_environment() {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.api_base_url, "https://cms.example.com/api");
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            AppConfig::from_lookup(lookup_from(&[(ENV_CONTENT_API_URL, "http://localhost:8080")]))
                .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.stale_time, Duration::from_secs(300));
        assert_eq!(config.local_store_path, PathBuf::from(".sayt/storage.json"));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn test_missing_base_url() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::missing_env_var(ENV_CONTENT_API_URL)
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let not_http = AppConfig::from_lookup(lookup_from(&[(ENV_CONTENT_API_URL, "ftp://x")]));
        assert!(matches!(
            not_http,
            Err(ConfigError::InvalidValue { .. })
        ));

        let bad_timeout = AppConfig::from_lookup(lookup_from(&[
            (ENV_CONTENT_API_URL, "http://localhost"),
            (ENV_API_TIMEOUT_SECS, "abc"),
        ]));
        assert!(bad_timeout.is_err(), "数値でないタイムアウトはエラーになるべき");

        let zero_stale = AppConfig::from_lookup(lookup_from(&[
            (ENV_CONTENT_API_URL, "http://localhost"),
            (ENV_QUERY_STALE_SECS, "0"),
        ]));
        assert!(zero_stale.is_err(), "0秒の鮮度期間はエラーになるべき");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_CONTENT_API_URL, "http://localhost"),
            (ENV_API_TIMEOUT_SECS, "3"),
            (ENV_QUERY_STALE_SECS, "60"),
            (ENV_LOCAL_STORE_PATH, "/tmp/store.json"),
            (ENV_BIND_ADDR, "0.0.0.0:8081"),
        ]))
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.stale_time, Duration::from_secs(60));
        assert_eq!(config.local_store_path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.bind_addr.port(), 8081);
    }
}
