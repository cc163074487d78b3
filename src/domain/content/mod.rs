pub mod abort;
pub mod model;
pub mod service;

// 公開APIの再エクスポート

// model.rsから
pub use model::{Article, ArticleKind, Category, Paged, Picture, Profile, Publisher};

// service.rsから
pub use service::{
    article_key, article_list_key, fetch_article, fetch_articles, fetch_categories, fetch_gallery,
    fetch_profile, gallery_key, image_url, profile_key, remove_article, save_profile,
};

// abort.rsから
pub use abort::{AbortController, AbortSignal};
