use thiserror::Error;

/// 永続ストレージ層のエラー型
/// ローカルストアファイルの読み書きとシリアライゼーションのエラーを定義
#[derive(Error, Debug)]
pub enum StorageError {
    /// ファイルシステムエラー
    #[error("ファイルシステムエラー: {path} - {source}")]
    FileSystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// シリアライゼーションエラー
    #[error("シリアライゼーションエラー: {context} - {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// ファイルシステムエラーを作成
    pub fn file_system<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// シリアライゼーションエラーを作成
    pub fn serialization<C: Into<String>>(context: C, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}

/// ストレージエラーのResult型エイリアス
pub type StorageResult<T> = std::result::Result<T, StorageError>;
