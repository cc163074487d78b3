use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 記事の種別（ブログ投稿・ニュース）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleKind {
    Blog,
    News,
}

impl ArticleKind {
    /// APIのリソース名
    pub fn resource(self) -> &'static str {
        match self {
            ArticleKind::Blog => "blog",
            ArticleKind::News => "news",
        }
    }

    /// ナビゲーション文言の辞書キー
    pub fn label_key(self) -> &'static str {
        match self {
            ArticleKind::Blog => "nav.blog",
            ArticleKind::News => "nav.news",
        }
    }
}

// 記事の投稿者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub id: i64,
    pub name: String,
}

// 記事エンティティ（ブログ投稿・ニュース共通）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// 画像ファイルのID（ダウンロードURLは`image_url`で組み立てる）
    #[serde(default)]
    pub image_id: Option<i64>,
    #[serde(default)]
    pub publisher: Option<Publisher>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Article {
    /// 一覧表示用の要約（先頭`max_chars`文字）
    pub fn summary(&self, max_chars: usize) -> String {
        let text = self.description.as_deref().unwrap_or("");
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let mut summary: String = text.chars().take(max_chars).collect();
        summary.push('…');
        summary
    }
}

// 画像カテゴリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ギャラリーの画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub file_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
}

// ユーザープロフィール
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_id: Option<i64>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

// ページ付き一覧
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Paged<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
