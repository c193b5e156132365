// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative href against a base URL.
///
/// Returns `None` for hrefs that do not produce a navigable target
/// (`javascript:` handlers, `mailto:` addresses, unparseable input).
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || !is_navigable(href) {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Whether an href points somewhere a fetch could follow.
pub fn is_navigable(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:"))
}
