use crate::infra::api::credential::CredentialProvider;
use crate::types::{StorageError, StorageResult};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// サインイン済みフラグのキー
pub const KEY_IS_AUTH: &str = "isAuth";
/// トークンを含むユーザー情報（JSON文字列）のキー
pub const KEY_USER: &str = "user";

// 文字列キー -> 文字列値
type StoreMap = BTreeMap<String, String>;

/// 文字列キーのローカルストア（JSONファイル1つに保存する）
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル全体を読み込む（ファイルが無ければ空）
    fn load(&self) -> StorageResult<StoreMap> {
        let path = self.path.display().to_string();
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreMap::new()),
            Err(e) => return Err(StorageError::file_system(path, e)),
        };
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StorageError::serialization(path, e))
    }

    fn save(&self, map: &StoreMap) -> StorageResult<()> {
        let path = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::file_system(parent.display().to_string(), e))?;
        }
        let text = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::serialization(path.clone(), e))?;
        std::fs::write(&self.path, text).map_err(|e| StorageError::file_system(path, e))
    }

    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    /// サインイン完了時の保存（フラグとトークン）
    pub fn sign_in(&self, token: &str) -> StorageResult<()> {
        let mut map = self.load()?;
        map.insert(KEY_IS_AUTH.to_string(), "true".to_string());
        map.insert(KEY_USER.to_string(), json!({ "token": token }).to_string());
        self.save(&map)
    }

    pub fn sign_out(&self) -> StorageResult<()> {
        let mut map = self.load()?;
        map.remove(KEY_IS_AUTH);
        map.remove(KEY_USER);
        self.save(&map)
    }

    pub fn is_authenticated(&self) -> StorageResult<bool> {
        Ok(self.get_item(KEY_IS_AUTH)?.as_deref() == Some("true"))
    }

    /// 保存済みのベアラートークン
    ///
    /// ユーザー情報が壊れたJSONの場合もトークン無しとして扱う。
    pub fn stored_token(&self) -> StorageResult<Option<String>> {
        let Some(user) = self.get_item(KEY_USER)? else {
            return Ok(None);
        };
        let token = serde_json::from_str::<Value>(&user)
            .ok()
            .and_then(|v| v.get("token").and_then(Value::as_str).map(str::to_string));
        Ok(token)
    }
}

/// ローカルストアからリクエストごとにトークンを読む`CredentialProvider`
#[derive(Debug, Clone)]
pub struct StoredCredential {
    store: LocalStore,
}

impl StoredCredential {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }
}

impl CredentialProvider for StoredCredential {
    fn token(&self) -> Option<String> {
        match self.store.stored_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "ローカルストアからトークンを読めませんでした");
                None
            }
        }
    }
}
