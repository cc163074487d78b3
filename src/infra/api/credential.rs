/// 認証トークンの供給元
///
/// リクエストごとに呼び出されるため、サインイン後のトークン更新は
/// クライアントを作り直さずに反映される。
pub trait CredentialProvider: Send + Sync {
    /// 現在のベアラートークン（未サインインなら`None`）
    fn token(&self) -> Option<String>;
}

/// 固定値のトークンを返す実装
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    token: Option<String>,
}

impl StaticCredential {
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// トークン無し
    pub fn none() -> Self {
        Self { token: None }
    }
}

impl CredentialProvider for StaticCredential {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}
