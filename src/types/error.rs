use thiserror::Error;

/// コンテンツAPI呼び出しのエラー型
///
/// ネットワーク断・タイムアウト・非成功ステータスはいずれも
/// 失敗した操作として同列に扱う（ステータス別の分岐は行わない）。
/// 待機中の呼び出し元へ配れるよう、原因はメッセージ文字列で保持する。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// タイムアウト
    #[error("リクエストがタイムアウトしました: {url} ({timeout_secs}秒)")]
    Timeout { url: String, timeout_secs: u64 },

    /// ネットワークエラー
    #[error("ネットワークエラー: {url} - {message}")]
    Network { url: String, message: String },

    /// 非成功のHTTPステータス
    #[error("HTTPステータス{status}: {url} - {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// レスポンスの解析失敗
    #[error("レスポンスの解析に失敗: {url} - {message}")]
    Decode { url: String, message: String },

    /// URLの組み立て失敗
    #[error("不正なURL: {path} - {message}")]
    InvalidUrl { path: String, message: String },

    /// 呼び出し元による中断
    #[error("リクエストが中断されました: {url}")]
    Aborted { url: String },
}

impl ApiError {
    /// タイムアウトエラーを作成
    pub fn timeout<U: Into<String>>(url: U, timeout_secs: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_secs,
        }
    }

    /// ネットワークエラーを作成
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// ステータスエラーを作成
    pub fn status<U: Into<String>, M: Into<String>>(url: U, status: u16, message: M) -> Self {
        Self::Status {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// 解析エラーを作成
    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// URL組み立てエラーを作成
    pub fn invalid_url<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::InvalidUrl {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 中断エラーを作成
    pub fn aborted<U: Into<String>>(url: U) -> Self {
        Self::Aborted { url: url.into() }
    }

    /// 404相当の応答かどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// APIエラーのResult型エイリアス
pub type ApiResult<T> = std::result::Result<T, ApiError>;
