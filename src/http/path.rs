//! Request path normalization
//!
//! All path handling is lexical. After `clean_path` the result is rooted,
//! contains no `.`/`..` segments and no empty segments, so joining its
//! segments onto a directory can never climb above that directory.

/// Percent-decode a raw URI path. `None` if the bytes are not UTF-8.
pub fn decode_path(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(std::borrow::Cow::into_owned)
}

/// Percent-encode each segment of a decoded path, keeping the `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical form of a request path
///
/// - always starts with `/`
/// - `//` and `/./` collapse, `..` removes the previous segment (never above root)
/// - a trailing `/` is kept
///
/// # Examples
/// ```
/// use dirserve::http::path::clean_path;
/// assert_eq!(clean_path("/a/./b/../c/"), "/a/c/");
/// assert_eq!(clean_path("/../../etc/passwd"), "/etc/passwd");
/// assert_eq!(clean_path(""), "/");
/// ```
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }

    if cleaned.is_empty() {
        cleaned.push('/');
    } else if path.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}

/// Last non-empty segment of a path, `/` for the root
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("/")
}
