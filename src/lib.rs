//! 多言語コンテンツサイトのバックエンド
//!
//! - `domain::router`: 言語プレフィックスのルーターゲート
//! - `domain::query`: キャッシュ付きのコンテンツAPIデータアクセス層
//! - `domain::content`: ブログ・ニュース・ギャラリー・プロフィールの取得
//! - `app`: ページを返すHTTPサーバー

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod types;
