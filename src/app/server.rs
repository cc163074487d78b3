use super::pages;
use crate::config::AppConfig;
use crate::domain::locale::{Dictionary, Locale};
use crate::domain::query::{DataAccess, QueryCache, RetryPolicy, TracingNotifier};
use crate::domain::router::{locale_of, route_request, RouteDecision};
use crate::infra::api::http::ReqwestApiClient;
use crate::infra::storage::file::{LocalStore, StoredCredential};
use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: u32 = 9;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub access: DataAccess,
    pub dictionary: Arc<Dictionary>,
    pub api_base_url: String,
    pub page_size: u32,
}

impl AppState {
    pub fn new(access: DataAccess, dictionary: Dictionary, api_base_url: &str) -> Self {
        Self {
            access,
            dictionary: Arc::new(dictionary),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// 言語ルーターゲート
///
/// 全ルートの前段で動き、言語プレフィックスの無いパスを既定言語へリダイレクトする。
pub async fn locale_gate(request: Request, next: Next) -> Response {
    let uri = request.uri().clone();
    match route_request(uri.path(), uri.query()) {
        RouteDecision::PassThrough => next.run(request).await,
        RouteDecision::Redirect(target) => {
            tracing::debug!(from = %uri, to = %target, "言語プレフィックスへリダイレクト");
            Redirect::temporary(&target).into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// どのルートにも一致しないパス（言語はパス先頭から推定）
async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    let locale = locale_of(request.uri().path()).unwrap_or(Locale::DEFAULT);
    pages::not_found(&state, locale)
}

/// ルーターを組み立てる
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/favicon.ico", get(favicon))
        .route("/:locale", get(pages::home_page))
        .route("/:locale/", get(pages::home_page))
        .route("/:locale/about", get(pages::about_page))
        .route("/:locale/contact", get(pages::contact_page))
        .route("/:locale/blog", get(pages::blog_list))
        .route("/:locale/blog/:id", get(pages::blog_detail))
        .route("/:locale/news", get(pages::news_list))
        .route("/:locale/news/:id", get(pages::news_detail))
        .route("/:locale/gallery", get(pages::gallery_index))
        .route("/:locale/gallery/:category_id", get(pages::gallery_page))
        .route("/:locale/profile", get(pages::profile_page))
        .route("/:locale/login", get(pages::login_page))
        .fallback(fallback)
        .layer(middleware::from_fn(locale_gate))
        .with_state(state)
}

/// 設定からアプリケーション状態を組み立てる
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let store = LocalStore::new(config.local_store_path.clone());
    let credentials = Arc::new(StoredCredential::new(store));
    let client = ReqwestApiClient::new(&config.api_base_url, config.request_timeout, credentials)
        .context("APIクライアントの初期化に失敗")?;

    let access = DataAccess::new(
        Arc::new(client),
        Arc::new(QueryCache::new(config.stale_time)),
        RetryPolicy::default(),
        Arc::new(TracingNotifier),
    );
    let dictionary = Dictionary::load_embedded().context("言語辞書の読み込みに失敗")?;

    Ok(AppState::new(access, dictionary, &config.api_base_url))
}

/// サーバーを起動し、Ctrl+Cで停止する
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = build_state(&config)?;
    let access = state.access.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("待ち受けに失敗: {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, api = %config.api_base_url, "サーバーを起動しました");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーの実行に失敗")?;

    access.cache().clear();
    tracing::info!("サーバーを停止しました");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルの待ち受けに失敗");
    }
}
