use super::key::QueryKey;
use crate::types::{ApiError, ApiResult};
use moka::future::Cache;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// レスポンスの封筒（`content`と、ページ付き一覧なら`totalPages`）
///
/// 期待するフィールドが無い場合はエラーにせず欠落として扱う。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub content: Option<Value>,
    pub total_pages: Option<u32>,
}

impl Envelope {
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) => Self {
                content: map.remove("content").filter(|v| !v.is_null()),
                total_pages: map
                    .get("totalPages")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok()),
            },
            _ => Self::default(),
        }
    }
}

/// 既定の最大エントリ数
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// クエリキー単位の読み取りキャッシュ
///
/// アプリケーションのルートで明示的に生成して共有する。
/// エントリは鮮度期間を過ぎると失効し、件数は`max_entries`で上限を持つ。
/// 破棄時やテストの後始末には`clear`を使う。
pub struct QueryCache {
    stale_time: Duration,
    cache: Cache<QueryKey, Envelope>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self::with_capacity(stale_time, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(stale_time: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(stale_time)
            .build();
        Self { stale_time, cache }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// 鮮度期間内のキャッシュがあれば返し、無ければ`fetch`で取得して保存する
    ///
    /// 同じキーで同時に呼ばれた場合、取得は1回だけ行われ、
    /// 待っていた呼び出しは成功でも失敗でも同じ結果を受け取る。
    /// 失敗はキャッシュしない。
    pub async fn get_or_fetch<F, Fut>(&self, key: &QueryKey, fetch: F) -> ApiResult<Envelope>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Envelope>>,
    {
        if let Some(envelope) = self.cache.get(key).await {
            tracing::debug!(%key, "キャッシュヒット");
            return Ok(envelope);
        }

        self.cache
            .try_get_with(key.clone(), fetch())
            .await
            .map_err(|e: Arc<ApiError>| ApiError::clone(&e))
    }

    /// キーの現在のキャッシュ
    pub async fn get(&self, key: &QueryKey) -> Option<Envelope> {
        self.cache.get(key).await
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.cache.contains_key(key)
    }

    /// キーが完全一致するキャッシュだけを破棄する
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.cache.remove(key).await.is_some();
        if removed {
            tracing::debug!(%key, "キャッシュを破棄");
        }
        removed
    }

    /// 全キャッシュを破棄する
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// 現在のエントリ数（失効・追い出しの保留処理を済ませてから数える）
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_key;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn envelope(content: Value) -> Envelope {
        Envelope {
            content: Some(content),
            total_pages: None,
        }
    }

    #[test]
    fn test_envelope_from_body() {
        let env = Envelope::from_body(json!({"content": [1, 2], "totalPages": 4}));
        assert_eq!(env.content, Some(json!([1, 2])));
        assert_eq!(env.total_pages, Some(4));

        // contentが無い・nullの場合は欠落扱い
        assert_eq!(Envelope::from_body(json!({"data": 1})).content, None);
        assert_eq!(Envelope::from_body(json!({"content": null})).content, None);
        assert_eq!(Envelope::from_body(json!([1, 2])), Envelope::default());
        assert_eq!(Envelope::from_body(Value::Null), Envelope::default());
    }

    #[tokio::test]
    async fn test_fresh_entry_is_reused_until_stale() {
        let cache = QueryCache::new(Duration::from_millis(200));
        let key = query_key!["article", 1];
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(envelope(json!("v")))
                })
                .await;
            assert_eq!(result.unwrap().content, Some(json!("v")));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 失効はmokaの実時間で判定される
        tokio::time::sleep(Duration::from_millis(300)).await;
        cache
            .get_or_fetch(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(envelope(json!("v2")))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(&key).await.unwrap().content, Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = query_key!["news"];

        let result = cache
            .get_or_fetch(&key, || async { Err(ApiError::network("u", "down")) })
            .await;
        assert_eq!(result.unwrap_err(), ApiError::network("u", "down"));
        assert!(!cache.contains(&key));
    }

    #[tokio::test]
    async fn test_concurrent_failing_fetches_share_one_call() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = query_key!["article", 9];
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Err(ApiError::status("u", 500, "boom"))
        };
        let (a, b) = tokio::join!(cache.get_or_fetch(&key, fetch), cache.get_or_fetch(&key, fetch));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert!(!cache.contains(&key));
    }

    #[tokio::test]
    async fn test_stale_entries_are_evicted() {
        let cache = QueryCache::new(Duration::from_millis(100));
        for page in 0..50 {
            cache
                .get_or_fetch(&query_key!["blog", "list", page], || async {
                    Ok(envelope(json!([])))
                })
                .await
                .unwrap();
        }
        assert_eq!(cache.len().await, 50);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_entry_count_is_bounded() {
        let cache = QueryCache::with_capacity(Duration::from_secs(60), 10);
        for id in 0..200 {
            cache
                .get_or_fetch(&query_key!["article", id], || async move {
                    Ok(envelope(json!(id)))
                })
                .await
                .unwrap();
        }
        assert!(cache.len().await <= 10);
    }

    #[tokio::test]
    async fn test_invalidate_is_exact() {
        let cache = QueryCache::new(Duration::from_secs(60));
        for id in [5, 6] {
            cache
                .get_or_fetch(&query_key!["article", id], || async move {
                    Ok(envelope(json!(id)))
                })
                .await
                .unwrap();
        }

        assert!(cache.invalidate(&query_key!["article", 5]).await);
        assert!(!cache.contains(&query_key!["article", 5]));
        assert!(cache.contains(&query_key!["article", 6]));
        assert!(!cache.invalidate(&query_key!["article"]).await);

        cache.clear();
        assert!(!cache.contains(&query_key!["article", 6]));
    }
}
