use super::cache::{Envelope, QueryCache};
use super::key::QueryKey;
use super::notify::{Notification, Notifier};
use super::retry::RetryPolicy;
use crate::infra::api::http::ApiClient;
use crate::types::{ApiError, ApiResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// 読み取り操作の結果
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// パスが空のため取得していない
    Disabled,
    Success(T),
    Failed(ApiError),
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryState::Disabled)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryState<U> {
        match self {
            QueryState::Disabled => QueryState::Disabled,
            QueryState::Success(data) => QueryState::Success(f(data)),
            QueryState::Failed(e) => QueryState::Failed(e),
        }
    }
}

impl QueryState<Option<Value>> {
    /// 取得できた`content`（読み込み前・欠落・失敗時は`None`）
    pub fn into_content(self) -> Option<Value> {
        match self {
            QueryState::Success(content) => content,
            _ => None,
        }
    }
}

/// 書き込み・削除操作の状態（`Idle → InFlight → {Succeeded, Failed}`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// 書き込み（作成または全置換）のリクエスト
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub path: String,
    pub body: Value,
    /// 成功時に破棄するキャッシュのキー
    pub invalidate: QueryKey,
    pub success_message: Option<String>,
}

/// 削除のリクエスト（`id`はクエリパラメータとして付与される）
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub path: String,
    pub id: String,
    pub invalidate: QueryKey,
    pub success_message: String,
}

type SuccessCallback = Box<dyn FnOnce(&Value) + Send>;
type ErrorCallback = Box<dyn FnOnce(&ApiError) + Send>;

/// 呼び出し側が渡す成功・失敗時のコールバック
#[derive(Default)]
pub struct MutationCallbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl MutationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ApiError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }
}

/// コンテンツAPIへのデータアクセス層
///
/// HTTPクライアント・クエリキャッシュ・再試行ポリシー・通知先を束ねる。
/// クローンは同じキャッシュを共有する。
#[derive(Clone)]
pub struct DataAccess {
    client: Arc<dyn ApiClient>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
    notifier: Arc<dyn Notifier>,
}

impl DataAccess {
    pub fn new(
        client: Arc<dyn ApiClient>,
        cache: Arc<QueryCache>,
        retry: RetryPolicy,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            cache,
            retry,
            notifier,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn client(&self) -> &dyn ApiClient {
        self.client.as_ref()
    }

    /// 読み取り: レスポンスの`content`を返す
    ///
    /// `path`が空なら通信せず`Disabled`を返す。失敗は通知せず呼び出し側に任せる。
    pub async fn get(&self, path: &str, key: &QueryKey) -> QueryState<Option<Value>> {
        self.get_envelope(path, key)
            .await
            .map(|envelope| envelope.content)
    }

    /// 読み取り: ページ数などを含む封筒全体を返す
    pub async fn get_envelope(&self, path: &str, key: &QueryKey) -> QueryState<Envelope> {
        if path.is_empty() {
            return QueryState::Disabled;
        }

        let result = self
            .cache
            .get_or_fetch(key, || self.fetch_with_retry(path))
            .await;

        match result {
            Ok(envelope) => QueryState::Success(envelope),
            Err(e) => {
                tracing::warn!(%key, error = %e, "読み取りに失敗");
                QueryState::Failed(e)
            }
        }
    }

    async fn fetch_with_retry(&self, path: &str) -> ApiResult<Envelope> {
        let mut attempt = 0;
        loop {
            match self.client.get(path).await {
                Ok(body) => return Ok(Envelope::from_body(body)),
                Err(e) if attempt < self.retry.max_retries && !matches!(e, ApiError::Aborted { .. }) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(path, attempt, ?delay, error = %e, "再試行します");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 書き込み・削除の状態を追跡するハンドルを作る
    pub fn mutation(&self) -> Mutation {
        let (status, _) = watch::channel(OperationStatus::Idle);
        Mutation {
            access: self.clone(),
            status,
        }
    }

    /// 書き込み（作成または全置換）を1回実行する
    pub async fn put(&self, request: PutRequest, callbacks: MutationCallbacks) -> ApiResult<Value> {
        self.mutation().put(request, callbacks).await
    }

    /// 削除を1回実行する
    pub async fn delete(
        &self,
        request: DeleteRequest,
        callbacks: MutationCallbacks,
    ) -> ApiResult<Value> {
        self.mutation().delete(request, callbacks).await
    }
}

/// 書き込み・削除操作のハンドル
///
/// 呼び出しごとに`Idle`から`InFlight`を経て`Succeeded`か`Failed`に遷移する。
pub struct Mutation {
    access: DataAccess,
    status: watch::Sender<OperationStatus>,
}

impl Mutation {
    pub fn status(&self) -> OperationStatus {
        *self.status.borrow()
    }

    /// 状態遷移の購読
    pub fn subscribe(&self) -> watch::Receiver<OperationStatus> {
        self.status.subscribe()
    }

    pub async fn put(&self, request: PutRequest, callbacks: MutationCallbacks) -> ApiResult<Value> {
        self.status.send_replace(OperationStatus::InFlight);
        let result = self
            .access
            .client
            .put(&request.path, &request.body)
            .await;
        self.settle(
            result,
            &request.invalidate,
            request.success_message.as_deref(),
            callbacks,
        )
        .await
    }

    pub async fn delete(
        &self,
        request: DeleteRequest,
        callbacks: MutationCallbacks,
    ) -> ApiResult<Value> {
        self.status.send_replace(OperationStatus::InFlight);
        let query = [("id", request.id.clone())];
        let result = self.access.client.delete(&request.path, &query).await;
        self.settle(
            result,
            &request.invalidate,
            Some(request.success_message.as_str()),
            callbacks,
        )
        .await
    }

    /// 成功時は通知・キャッシュ破棄・成功コールバック、失敗時はエラーコールバックと通知
    async fn settle(
        &self,
        result: ApiResult<Value>,
        invalidate: &QueryKey,
        success_message: Option<&str>,
        callbacks: MutationCallbacks,
    ) -> ApiResult<Value> {
        let notifier = &self.access.notifier;
        match &result {
            Ok(payload) => {
                if let Some(message) = success_message {
                    notifier.notify(Notification::Success(message.to_string()));
                }
                self.access.cache.invalidate(invalidate).await;
                if let Some(on_success) = callbacks.on_success {
                    on_success(payload);
                }
                self.status.send_replace(OperationStatus::Succeeded);
            }
            Err(e) => {
                tracing::warn!(key = %invalidate, error = %e, "書き込みに失敗");
                if let Some(on_error) = callbacks.on_error {
                    on_error(e);
                }
                notifier.notify(Notification::Error(e.to_string()));
                self.status.send_replace(OperationStatus::Failed);
            }
        }
        result
    }
}
