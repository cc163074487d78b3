//! コンテンツAPIのデータアクセス層
//!
//! 読み取り（キャッシュ・重複排除・再試行付き）と、書き込み・削除
//! （通知とキャッシュ破棄付き）の3操作を提供する。

pub mod access;
pub mod cache;
pub mod key;
pub mod notify;
pub mod retry;

pub use access::{
    DataAccess, DeleteRequest, Mutation, MutationCallbacks, OperationStatus, PutRequest, QueryState,
};
pub use cache::{Envelope, QueryCache, DEFAULT_MAX_ENTRIES};
pub use key::QueryKey;
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use retry::RetryPolicy;
