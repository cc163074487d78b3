//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的なエラー型を管理します。
//! - `ApiError`: コンテンツAPI呼び出しの失敗
//! - `ConfigError`: 環境変数・設定値の不備
//! - `StorageError`: ローカルストアの読み書き失敗

pub mod config;
pub mod error;
pub mod infra;

pub use config::{ConfigError, ConfigResult};
pub use error::{ApiError, ApiResult};
pub use infra::{StorageError, StorageResult};
