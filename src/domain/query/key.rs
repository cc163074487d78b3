use serde::Serialize;
use std::fmt;

/// 読み取り結果をキャッシュする論理キー
///
/// 同じキーは同じ結果集合を指す。別リソースには必ず別キーを使うこと。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self(parts.into_iter().map(|p| p.to_string()).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(part: &str) -> Self {
        Self(vec![part.to_string()])
    }
}

impl From<String> for QueryKey {
    fn from(part: String) -> Self {
        Self(vec![part])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// 文字列・数値の並びから`QueryKey`を作る
///
/// ```
/// use sayt::query_key;
/// let key = query_key!["article", 5];
/// assert_eq!(key.parts(), ["article", "5"]);
/// ```
#[macro_export]
macro_rules! query_key {
    ($($part:expr),* $(,)?) => {
        $crate::domain::query::QueryKey::new(vec![$($part.to_string()),*])
    };
}
