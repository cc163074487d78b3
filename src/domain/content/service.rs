use super::abort::AbortSignal;
use super::model::{Article, ArticleKind, Category, Paged, Picture, Profile};
use crate::domain::query::{
    DataAccess, DeleteRequest, MutationCallbacks, PutRequest, QueryKey, QueryState,
};
use crate::infra::api::http::join_url;
use crate::query_key;
use crate::types::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

const PROFILE_PATH: &str = "user/me";
const CATEGORY_LIST_PATH: &str = "category/list";

/// プロフィールのクエリキー
pub fn profile_key() -> QueryKey {
    query_key!["profile"]
}

/// 記事一覧のクエリキー（ページとページサイズごとに別キー）
pub fn article_list_key(kind: ArticleKind, page: u32, page_size: u32) -> QueryKey {
    query_key![kind.resource(), "list", page, page_size]
}

/// 記事詳細のクエリキー
pub fn article_key(kind: ArticleKind, id: i64) -> QueryKey {
    query_key![kind.resource(), id]
}

/// カテゴリ別ギャラリーのクエリキー
pub fn gallery_key(category_id: i64) -> QueryKey {
    query_key!["picture", "category", category_id]
}

/// ファイルIDから画像のダウンロードURLを組み立てる
pub fn image_url(api_base_url: &str, file_id: i64) -> String {
    join_url(api_base_url, &format!("file/download/{}", file_id))
}

/// `content`を型に変換する（欠落時は`None`）
fn decode_content<T: DeserializeOwned>(path: &str, content: Option<Value>) -> ApiResult<Option<T>> {
    content
        .map(|value| serde_json::from_value(value).map_err(|e| ApiError::decode(path, e.to_string())))
        .transpose()
}

fn into_result<T>(state: QueryState<T>) -> ApiResult<Option<T>> {
    match state {
        QueryState::Disabled => Ok(None),
        QueryState::Success(data) => Ok(Some(data)),
        QueryState::Failed(e) => Err(e),
    }
}

/// 記事一覧をページ単位で取得する
pub async fn fetch_articles(
    access: &DataAccess,
    kind: ArticleKind,
    page: u32,
    page_size: u32,
) -> ApiResult<Paged<Article>> {
    let page = page.max(1);
    let path = format!("{}/list?page={}&pageSize={}", kind.resource(), page, page_size);
    let key = article_list_key(kind, page, page_size);

    let envelope = into_result(access.get_envelope(&path, &key).await)?.unwrap_or_default();
    let items: Vec<Article> = decode_content(&path, envelope.content)?.unwrap_or_default();

    Ok(Paged {
        items,
        page,
        total_pages: envelope.total_pages.unwrap_or(1),
    })
}

/// 記事を1件取得する
///
/// `id`が未確定（`None`）の間は通信せず`None`を返す。
pub async fn fetch_article(
    access: &DataAccess,
    kind: ArticleKind,
    id: Option<i64>,
) -> ApiResult<Option<Article>> {
    let (path, key) = match id {
        Some(id) => (format!("{}/{}", kind.resource(), id), article_key(kind, id)),
        None => (String::new(), query_key![kind.resource(), "pending"]),
    };

    let content = into_result(access.get(&path, &key).await)?.flatten();
    decode_content(&path, content)
}

/// 画像カテゴリの一覧を取得する
pub async fn fetch_categories(access: &DataAccess) -> ApiResult<Vec<Category>> {
    let content = into_result(
        access
            .get(CATEGORY_LIST_PATH, &query_key!["category", "list"])
            .await,
    )?
    .flatten();
    Ok(decode_content(CATEGORY_LIST_PATH, content)?.unwrap_or_default())
}

/// カテゴリのギャラリー画像を取得する
///
/// `abort`が中断されると取得を打ち切り`ApiError::Aborted`を返す。
pub async fn fetch_gallery(
    access: &DataAccess,
    category_id: i64,
    mut abort: AbortSignal,
) -> ApiResult<Vec<Picture>> {
    let path = format!("picture/list?categoryId={}", category_id);
    let key = gallery_key(category_id);

    if abort.is_aborted() {
        return Err(ApiError::aborted(path));
    }

    let state = tokio::select! {
        state = access.get(&path, &key) => state,
        _ = abort.aborted() => {
            tracing::debug!(%path, "ギャラリー取得を中断");
            return Err(ApiError::aborted(path.clone()));
        }
    };

    let content = into_result(state)?.flatten();
    Ok(decode_content(&path, content)?.unwrap_or_default())
}

/// サインイン中のユーザーのプロフィールを取得する
pub async fn fetch_profile(access: &DataAccess) -> ApiResult<Option<Profile>> {
    let content = into_result(access.get(PROFILE_PATH, &profile_key()).await)?.flatten();
    decode_content(PROFILE_PATH, content)
}

/// プロフィールを保存し、プロフィールのキャッシュを破棄する
pub async fn save_profile(
    access: &DataAccess,
    profile: &Profile,
    success_message: &str,
    callbacks: MutationCallbacks,
) -> ApiResult<Value> {
    let body = serde_json::to_value(profile)
        .map_err(|e| ApiError::decode(PROFILE_PATH, e.to_string()))?;

    access
        .put(
            PutRequest {
                path: PROFILE_PATH.to_string(),
                body,
                invalidate: profile_key(),
                success_message: Some(success_message.to_string()),
            },
            callbacks,
        )
        .await
}

/// 記事を削除し、呼び出し側が表示中の一覧キーを破棄する
pub async fn remove_article(
    access: &DataAccess,
    kind: ArticleKind,
    id: i64,
    visible_list: QueryKey,
    success_message: &str,
    callbacks: MutationCallbacks,
) -> ApiResult<Value> {
    let result = access
        .delete(
            DeleteRequest {
                path: kind.resource().to_string(),
                id: id.to_string(),
                invalidate: visible_list,
                success_message: success_message.to_string(),
            },
            callbacks,
        )
        .await;

    // 削除済みの詳細が残らないようにする
    if result.is_ok() {
        access.cache().invalidate(&article_key(kind, id)).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::abort::AbortController;
    use crate::domain::query::{QueryCache, RecordingNotifier, RetryPolicy};
    use crate::infra::api::http::MockApiClient;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn access_with(client: Arc<MockApiClient>) -> DataAccess {
        DataAccess::new(
            client,
            Arc::new(QueryCache::new(Duration::from_secs(300))),
            RetryPolicy::none(),
            Arc::new(RecordingNotifier::new()),
        )
    }

    #[tokio::test]
    async fn test_fetch_articles_paged() {
        let client = Arc::new(MockApiClient::new_success(json!({
            "content": [
                {"id": 1, "title": "Birinchi"},
                {"id": 2, "title": "Ikkinchi"}
            ],
            "totalPages": 5
        })));
        let access = access_with(client.clone());

        let paged = fetch_articles(&access, ArticleKind::News, 2, 10).await.unwrap();

        assert_eq!(paged.items.len(), 2);
        assert_eq!(paged.page, 2);
        assert_eq!(paged.total_pages, 5);
        assert_eq!(client.calls()[0].path, "news/list?page=2&pageSize=10");
        assert!(access.cache().contains(&article_list_key(ArticleKind::News, 2, 10)));
    }

    #[tokio::test]
    async fn test_fetch_articles_without_content_is_empty() {
        let client = Arc::new(MockApiClient::new_success(json!({})));
        let access = access_with(client);

        let paged = fetch_articles(&access, ArticleKind::Blog, 0, 10).await.unwrap();

        assert!(paged.items.is_empty());
        assert_eq!(paged.page, 1);
        assert_eq!(paged.total_pages, 1);
    }

    #[tokio::test]
    async fn test_fetch_article_pending_id() {
        let client = Arc::new(MockApiClient::new_success(json!({"content": {"id": 1, "title": "t"}})));
        let access = access_with(client.clone());

        let pending = fetch_article(&access, ArticleKind::Blog, None).await.unwrap();
        assert_eq!(pending, None);
        assert_eq!(client.call_count(), 0, "ID未確定の間は通信しない");

        let article = fetch_article(&access, ArticleKind::Blog, Some(1)).await.unwrap();
        assert_eq!(article.unwrap().title, "t");
        assert_eq!(client.calls()[0].path, "blog/1");
    }

    #[tokio::test]
    async fn test_fetch_article_decode_error() {
        let client = Arc::new(MockApiClient::new_success(json!({"content": {"title": 5}})));
        let access = access_with(client);

        let result = fetch_article(&access, ArticleKind::News, Some(3)).await;
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_categories() {
        let client = Arc::new(MockApiClient::new_success(json!({
            "content": [{"id": 1, "name": "Tabiat"}, {"id": 2, "name": "Shahar"}]
        })));
        let access = access_with(client);

        let categories = fetch_categories(&access).await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].name, "Shahar");
    }

    #[tokio::test]
    async fn test_fetch_gallery() {
        let client = Arc::new(MockApiClient::new_success(json!({
            "content": [{"id": 9, "fileId": 100, "categoryId": 4}]
        })));
        let access = access_with(client.clone());
        let controller = AbortController::new();

        let pictures = fetch_gallery(&access, 4, controller.signal()).await.unwrap();

        assert_eq!(pictures[0].file_id, 100);
        assert_eq!(client.calls()[0].path, "picture/list?categoryId=4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_gallery_aborted_in_flight() {
        let client = Arc::new(
            MockApiClient::new_success(json!({"content": []})).with_delay(Duration::from_secs(10)),
        );
        let access = access_with(client.clone());
        let controller = AbortController::new();
        let signal = controller.signal();

        let (result, _) = tokio::join!(fetch_gallery(&access, 4, signal), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.abort();
        });

        assert!(matches!(result, Err(ApiError::Aborted { .. })));
        assert!(!access.cache().contains(&gallery_key(4)));
    }

    #[tokio::test]
    async fn test_fetch_gallery_already_aborted() {
        let client = Arc::new(MockApiClient::new_success(json!({"content": []})));
        let access = access_with(client.clone());
        let controller = AbortController::new();
        controller.abort();

        let result = fetch_gallery(&access, 1, controller.signal()).await;

        assert!(matches!(result, Err(ApiError::Aborted { .. })));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_save_profile_invalidates_profile() {
        let client = Arc::new(MockApiClient::new_success(json!({
            "content": {"firstName": "Aziz", "lastName": "Karimov", "email": "a@example.com"}
        })));
        let access = access_with(client.clone());

        let profile = fetch_profile(&access).await.unwrap().unwrap();
        assert!(access.cache().contains(&profile_key()));

        save_profile(&access, &profile, "Saqlandi", MutationCallbacks::new())
            .await
            .unwrap();

        assert!(!access.cache().contains(&profile_key()));
        let put = &client.calls()[1];
        assert_eq!(put.path, "user/me");
        assert_eq!(put.body.as_ref().unwrap()["firstName"], "Aziz");
    }

    #[tokio::test]
    async fn test_remove_article() {
        let client = Arc::new(MockApiClient::new_success(json!({"content": []})));
        let access = access_with(client.clone());
        let list_key = article_list_key(ArticleKind::Blog, 1, 10);
        fetch_articles(&access, ArticleKind::Blog, 1, 10).await.unwrap();
        fetch_articles(&access, ArticleKind::Blog, 2, 10).await.unwrap();

        remove_article(
            &access,
            ArticleKind::Blog,
            7,
            list_key.clone(),
            "O'chirildi",
            MutationCallbacks::new(),
        )
        .await
        .unwrap();

        assert!(!access.cache().contains(&list_key));
        assert!(access.cache().contains(&article_list_key(ArticleKind::Blog, 2, 10)));
        let delete = &client.calls()[2];
        assert_eq!(delete.path, "blog");
        assert_eq!(delete.query, vec![("id".to_string(), "7".to_string())]);
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("https://cms.example.com/api", 55),
            "https://cms.example.com/api/file/download/55"
        );
    }
}
