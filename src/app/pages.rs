use super::server::AppState;
use crate::domain::content::{
    fetch_article, fetch_articles, fetch_categories, fetch_gallery, fetch_profile, image_url,
    AbortController, ArticleKind,
};
use crate::domain::locale::{Locale, LocaleError};
use crate::types::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

/// 全ページ共通のナビゲーション文言キー
const NAV_KEYS: [&str; 8] = [
    "nav.home",
    "nav.about",
    "nav.contact",
    "nav.blog",
    "nav.news",
    "nav.gallery",
    "nav.profile",
    "nav.login",
];

const SUMMARY_CHARS: usize = 160;

/// ページのモデル（マークアップは持たない）
#[derive(Debug, Clone, Serialize)]
pub struct PageModel {
    pub locale: Locale,
    pub page: &'static str,
    pub title: String,
    pub nav: HashMap<String, String>,
    pub data: Value,
}

/// ページ描画の失敗。いずれも「見つかりません」表示になる
#[derive(Error, Debug)]
pub enum PageError {
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    #[error(transparent)]
    Locale(#[from] LocaleError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// 一覧ページのクエリ。ページ番号は数値でなくても受け取り、後で検証する
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
}

impl ListParams {
    /// 省略時は1ページ目。数値でなければ見つかりません扱い
    pub fn page(&self) -> Result<u32, PageError> {
        match self.page.as_deref() {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| PageError::NotFound(format!("不正なページ番号: {}", raw))),
        }
    }
}

type PageResult = Result<PageModel, PageError>;

fn page_model(state: &AppState, locale: Locale, page: &'static str, title_key: &str, data: Value) -> PageResult {
    Ok(PageModel {
        locale,
        page,
        title: state.dictionary.lookup(locale, title_key)?.to_string(),
        nav: state.dictionary.lookup_all(locale, &NAV_KEYS)?,
        data,
    })
}

/// ページの結果をレスポンスにする（失敗時は言語別の404ページ）
fn render(state: &AppState, locale: Locale, result: PageResult) -> Response {
    match result {
        Ok(model) => Json(model).into_response(),
        Err(e) => {
            tracing::warn!(%locale, error = %e, "ページを表示できません");
            not_found(state, locale)
        }
    }
}

/// 言語別の「見つかりません」ページ
pub fn not_found(state: &AppState, locale: Locale) -> Response {
    let body = state
        .dictionary
        .lookup_all(locale, &["not_found.title", "not_found.message"])
        .map(|texts| {
            json!({
                "locale": locale,
                "page": "not_found",
                "title": texts["not_found.title"],
                "message": texts["not_found.message"],
            })
        });

    match body {
        Ok(body) => (StatusCode::NOT_FOUND, Json(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "404ページの文言がありません");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

/// パスの言語コードを解釈する（ゲート通過後なので通常は失敗しない）
fn parse_locale(state: &AppState, code: &str) -> Result<Locale, Response> {
    Locale::from_code(code).ok_or_else(|| not_found(state, Locale::DEFAULT))
}

fn parse_id(raw: &str) -> Result<i64, PageError> {
    raw.parse::<i64>()
        .map_err(|_| PageError::NotFound(format!("不正なID: {}", raw)))
}

pub async fn home_page(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = page_model(&state, locale, "home", "nav.home", Value::Null);
    render(&state, locale, result)
}

pub async fn about_page(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = page_model(&state, locale, "about", "nav.about", Value::Null);
    render(&state, locale, result)
}

pub async fn contact_page(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = page_model(&state, locale, "contact", "nav.contact", Value::Null);
    render(&state, locale, result)
}

pub async fn login_page(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = login_model(&state, locale);
    render(&state, locale, result)
}

fn login_model(state: &AppState, locale: Locale) -> PageResult {
    let labels = state
        .dictionary
        .lookup_all(locale, &["login.email", "login.password", "login.submit"])?;
    page_model(state, locale, "login", "nav.login", json!({ "labels": labels }))
}

async fn article_list(state: &AppState, locale: Locale, kind: ArticleKind, page: u32) -> PageResult {
    let paged = fetch_articles(&state.access, kind, page, state.page_size).await?;
    let items: Vec<Value> = paged
        .items
        .iter()
        .map(|article| {
            json!({
                "id": article.id,
                "title": article.title,
                "summary": article.summary(SUMMARY_CHARS),
                "image": article.image_id.map(|id| image_url(&state.api_base_url, id)),
                "createdAt": article.created_at,
            })
        })
        .collect();

    let data = json!({
        "items": items,
        "page": paged.page,
        "totalPages": paged.total_pages,
        "hasNext": paged.has_next(),
    });
    page_model(state, locale, kind.resource(), kind.label_key(), data)
}

async fn article_detail(state: &AppState, locale: Locale, kind: ArticleKind, raw_id: &str) -> PageResult {
    let id = parse_id(raw_id)?;
    let article = fetch_article(&state.access, kind, Some(id))
        .await?
        .ok_or_else(|| PageError::NotFound(format!("{}/{}", kind.resource(), id)))?;

    let data = json!({
        "article": article,
        "image": article.image_id.map(|id| image_url(&state.api_base_url, id)),
    });
    page_model(state, locale, kind.resource(), kind.label_key(), data)
}

pub async fn blog_list(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    params: Option<Query<ListParams>>,
) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = match params.map(|Query(params)| params).unwrap_or_default().page() {
        Ok(page) => article_list(&state, locale, ArticleKind::Blog, page).await,
        Err(e) => Err(e),
    };
    render(&state, locale, result)
}

pub async fn blog_detail(
    State(state): State<AppState>,
    Path((locale, id)): Path<(String, String)>,
) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = article_detail(&state, locale, ArticleKind::Blog, &id).await;
    render(&state, locale, result)
}

pub async fn news_list(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    params: Option<Query<ListParams>>,
) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = match params.map(|Query(params)| params).unwrap_or_default().page() {
        Ok(page) => article_list(&state, locale, ArticleKind::News, page).await,
        Err(e) => Err(e),
    };
    render(&state, locale, result)
}

pub async fn news_detail(
    State(state): State<AppState>,
    Path((locale, id)): Path<(String, String)>,
) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = article_detail(&state, locale, ArticleKind::News, &id).await;
    render(&state, locale, result)
}

pub async fn gallery_index(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = match fetch_categories(&state.access).await {
        Ok(categories) => page_model(
            &state,
            locale,
            "gallery",
            "nav.gallery",
            json!({ "categories": categories }),
        ),
        Err(e) => Err(e.into()),
    };
    render(&state, locale, result)
}

pub async fn gallery_page(
    State(state): State<AppState>,
    Path((locale, category_id)): Path<(String, String)>,
) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = gallery_model(&state, locale, &category_id).await;
    render(&state, locale, result)
}

async fn gallery_model(state: &AppState, locale: Locale, raw_category_id: &str) -> PageResult {
    let category_id = parse_id(raw_category_id)?;

    // ハンドラが破棄されるとコントローラも破棄され、取得が中断される
    let controller = AbortController::new();
    let pictures = fetch_gallery(&state.access, category_id, controller.signal()).await?;

    let pictures: Vec<Value> = pictures
        .iter()
        .map(|picture| {
            json!({
                "id": picture.id,
                "title": picture.title,
                "url": image_url(&state.api_base_url, picture.file_id),
            })
        })
        .collect();

    page_model(
        state,
        locale,
        "gallery",
        "nav.gallery",
        json!({ "categoryId": category_id, "pictures": pictures }),
    )
}

pub async fn profile_page(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let locale = match parse_locale(&state, &locale) {
        Ok(locale) => locale,
        Err(response) => return response,
    };
    let result = match fetch_profile(&state.access).await {
        Ok(Some(profile)) => page_model(
            &state,
            locale,
            "profile",
            "nav.profile",
            json!({ "profile": profile, "fullName": profile.full_name() }),
        ),
        Ok(None) => Err(PageError::NotFound("profile".to_string())),
        Err(e) => Err(e.into()),
    };
    render(&state, locale, result)
}
