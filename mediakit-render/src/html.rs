//! Small HTML helpers shared by renderers.

/// Escapes text for use in element content or a quoted attribute value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Schemes a rendered link or image may use.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Cleans a user-supplied URL for an `href` or `src`, or `None` when its
/// scheme is not allowed.
///
/// Control characters are dropped (browsers ignore them inside a scheme,
/// so `java\tscript:` is `javascript:`) and spaces are percent-encoded.
/// Relative references starting with `/`, `#` or `?` pass unchanged; any
/// other scheme-less value is taken as a host and gets `http://`.
pub fn safe_url(url: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(url.len());
    for c in url.trim().chars() {
        match c {
            ' ' => cleaned.push_str("%20"),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with(['/', '#', '?']) {
        return Some(cleaned);
    }
    let scheme_end = cleaned.find(':');
    let path_start = cleaned.find(['/', '?', '#']);
    match scheme_end {
        Some(end) if path_start.is_none_or(|p| end < p) => {
            let scheme = cleaned[..end].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str()).then_some(cleaned)
        }
        _ => Some(format!("http://{cleaned}")),
    }
}

/// Upper-cases the first character: `"widget-x"` becomes `"Widget-x"`.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders `key="value"` pairs, escaping values.
pub(crate) fn attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!(" {k}=\"{}\"", escape(v)))
        .collect()
}
