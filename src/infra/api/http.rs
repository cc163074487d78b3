use super::credential::CredentialProvider;
use crate::types::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// コンテンツAPIクライアントの抽象化トレイト
///
/// 実際のHTTP通信とモック実装の両方を統一的に扱うためのインターフェース。
/// `path`はベースURLからの相対パスで、クエリ文字列を含んでよい。
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// GETしてJSON本文を返す
    async fn get(&self, path: &str) -> ApiResult<Value>;

    /// 本文を置き換え（作成または更新）してJSON本文を返す
    async fn put(&self, path: &str, body: &Value) -> ApiResult<Value>;

    /// クエリパラメータ付きでDELETEしてJSON本文を返す
    async fn delete(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value>;
}

/// `reqwest` を使用した本番用のAPIクライアント実装
///
/// ベースURLとタイムアウトは構築時に固定し、認証トークンは
/// リクエストごとに`CredentialProvider`から取得する。
pub struct ReqwestApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

impl ReqwestApiClient {
    /// 新しいAPIクライアントを作成
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(base_url, format!("クライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            credentials,
        })
    }

    /// ベースURLと相対パスを結合する
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self.credentials.token().unwrap_or_default();
        self.client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> ApiResult<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !status.is_success() {
            let message = error_message_from_body(&text)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "不明なエラー".to_string());
            return Err(ApiError::status(url, status.as_u16(), message));
        }

        parse_body(url, &text)
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::timeout(url, self.timeout.as_secs())
        } else {
            ApiError::network(url, error.to_string())
        }
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        let url = self.url_for(path);
        tracing::debug!(%url, "GET");
        self.send(&url, self.request(Method::GET, &url)).await
    }

    async fn put(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let url = self.url_for(path);
        tracing::debug!(%url, "PUT");
        self.send(&url, self.request(Method::PUT, &url).json(body))
            .await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = self.url_for(path);
        tracing::debug!(%url, ?query, "DELETE");
        self.send(&url, self.request(Method::DELETE, &url).query(query))
            .await
    }
}

/// ベースURLと相対パスをスラッシュ1つで結合する
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// 空の本文はnullとして扱う
fn parse_body(url: &str, text: &str) -> ApiResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::decode(url, e.to_string()))
}

/// エラー応答の本文から`message`または`error`フィールドを取り出す
fn error_message_from_body(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

/// モッククライアントへの呼び出し記録
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

/// テスト用のモックAPIクライアント
///
/// 実際のHTTPリクエストを行わずに、定義済みのレスポンスやエラーを順に返す。
/// 最後の1件は使い切らずに返し続ける。
pub struct MockApiClient {
    responses: Mutex<VecDeque<ApiResult<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
    delay: Option<Duration>,
}

impl MockApiClient {
    /// 成功レスポンスを返すモッククライアントを作成
    pub fn new_success(response: Value) -> Self {
        Self::from_sequence(vec![Ok(response)])
    }

    /// エラーを返すモッククライアントを作成
    pub fn new_error(error: ApiError) -> Self {
        Self::from_sequence(vec![Err(error)])
    }

    /// 指定順にレスポンスを返すモッククライアントを作成
    pub fn from_sequence(responses: Vec<ApiResult<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// 応答前に待機する時間を設定
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// これまでの呼び出し回数
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// これまでの呼び出し記録
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn respond(&self, call: RecordedCall) -> ApiResult<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = match self.responses.lock() {
            Ok(responses) => responses,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.unwrap_or_else(|| Err(ApiError::network("mock", "レスポンスが未設定です")))
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        self.respond(RecordedCall {
            method: "GET",
            path: path.to_string(),
            body: None,
            query: Vec::new(),
        })
        .await
    }

    async fn put(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.respond(RecordedCall {
            method: "PUT",
            path: path.to_string(),
            body: Some(body.clone()),
            query: Vec::new(),
        })
        .await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        self.respond(RecordedCall {
            method: "DELETE",
            path: path.to_string(),
            body: None,
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        })
        .await
    }
}
