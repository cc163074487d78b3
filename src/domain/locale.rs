use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 対応言語
///
/// URLの先頭セグメントとして使われるコードの唯一の定義。
/// ルーターゲートと言語別テキストの両方がここを参照する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Uz,
    Ru,
    En,
    Ger,
}

impl Locale {
    /// 対応言語の一覧（URLコードの正準リスト）
    pub const ALL: [Locale; 4] = [Locale::Uz, Locale::Ru, Locale::En, Locale::Ger];

    /// 言語プレフィックスが無い場合に補う既定言語
    pub const DEFAULT: Locale = Locale::Uz;

    /// URLセグメントとして使うコード
    pub fn code(self) -> &'static str {
        match self {
            Locale::Uz => "uz",
            Locale::Ru => "ru",
            Locale::En => "en",
            Locale::Ger => "ger",
        }
    }

    /// コードから言語を引く（大文字小文字は区別する）
    pub fn from_code(code: &str) -> Option<Locale> {
        Self::ALL.into_iter().find(|locale| locale.code() == code)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| LocaleError::UnknownLocale {
            code: s.to_string(),
        })
    }
}

/// 言語関連のエラー型
#[derive(Error, Debug)]
pub enum LocaleError {
    /// 未対応の言語コード
    #[error("未対応の言語コード: {code}")]
    UnknownLocale { code: String },

    /// 辞書にキーが存在しない
    #[error("辞書にキーがありません: {locale}/{key}")]
    MissingKey { locale: Locale, key: String },

    /// 辞書に言語のテーブルが存在しない
    #[error("辞書に言語テーブルがありません: {locale}")]
    MissingTable { locale: Locale },

    /// 辞書YAMLの解析失敗
    #[error("辞書の解析に失敗: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },
}

/// 言語エラーのResult型エイリアス
pub type LocaleResult<T> = std::result::Result<T, LocaleError>;

// YAMLファイルの構造に対応する型（言語コード -> キー -> 文言）
type MessageMap = HashMap<String, HashMap<String, String>>;

const EMBEDDED_MESSAGES: &str = include_str!("data/messages.yaml");

/// 言語別のUI文言辞書
#[derive(Debug, Clone)]
pub struct Dictionary {
    tables: HashMap<Locale, HashMap<String, String>>,
}

impl Dictionary {
    /// バイナリに埋め込まれた辞書を読み込む
    pub fn load_embedded() -> LocaleResult<Self> {
        Self::from_yaml_str(EMBEDDED_MESSAGES)
    }

    /// YAML文字列から辞書を組み立てる
    ///
    /// 未対応の言語コードのテーブルはエラー、対応言語のテーブル欠落もエラー。
    pub fn from_yaml_str(yaml: &str) -> LocaleResult<Self> {
        let raw: MessageMap =
            serde_yaml::from_str(yaml).map_err(|source| LocaleError::Parse { source })?;

        let mut tables = HashMap::new();
        for (code, messages) in raw {
            let locale = code.parse::<Locale>()?;
            tables.insert(locale, messages);
        }

        if let Some(locale) = Locale::ALL.into_iter().find(|l| !tables.contains_key(l)) {
            return Err(LocaleError::MissingTable { locale });
        }

        Ok(Self { tables })
    }

    /// 指定言語の文言を引く
    pub fn lookup(&self, locale: Locale, key: &str) -> LocaleResult<&str> {
        self.tables
            .get(&locale)
            .ok_or(LocaleError::MissingTable { locale })?
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| LocaleError::MissingKey {
                locale,
                key: key.to_string(),
            })
    }

    /// 複数キーをまとめて引く（いずれかが欠けていればエラー）
    pub fn lookup_all(&self, locale: Locale, keys: &[&str]) -> LocaleResult<HashMap<String, String>> {
        keys.iter()
            .map(|key| Ok((key.to_string(), self.lookup(locale, key)?.to_string())))
            .collect()
    }
}
