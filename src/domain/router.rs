use super::locale::Locale;

/// ゲートの対象外となるパス（フレームワーク資産・APIプロキシはセグメント単位、faviconは完全一致）
const EXEMPT_PREFIXES: [&str; 2] = ["/_next", "/api"];
const EXEMPT_EXACT: [&str; 1] = ["/favicon.ico"];

/// ゲートの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// そのまま通す
    PassThrough,
    /// 指定パスへリダイレクトする
    Redirect(String),
}

/// パスが`prefix`そのもの、または`prefix/`で始まるかどうか
///
/// `/uzbek-news`のように文字列としては前方一致するが別セグメントのものは除外する。
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// ゲート対象外のパスかどうか
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_EXACT.contains(&path) || EXEMPT_PREFIXES.iter().any(|p| has_segment_prefix(path, p))
}

/// パス先頭の言語セグメントを取り出す
pub fn locale_of(path: &str) -> Option<Locale> {
    Locale::ALL
        .into_iter()
        .find(|locale| has_segment_prefix(path, &format!("/{}", locale.code())))
}

/// リクエストパスを判定する
///
/// 対応言語のセグメントで始まるパスと対象外パスは通過、それ以外は
/// 既定言語を前置したパスへリダイレクトする。ルート`/`は`/uz`になる。
/// `query`はリダイレクト先にそのまま引き継ぐ。
pub fn route_request(path: &str, query: Option<&str>) -> RouteDecision {
    if is_exempt(path) || locale_of(path).is_some() {
        return RouteDecision::PassThrough;
    }

    let mut target = format!("/{}", Locale::DEFAULT.code());
    if path != "/" && !path.is_empty() {
        if !path.starts_with('/') {
            target.push('/');
        }
        target.push_str(path);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    RouteDecision::Redirect(target)
}
