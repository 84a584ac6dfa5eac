//! Canonical comparison keys for brand names and website URLs.
//!
//! Keys are only ever compared against each other. They are never stored on a
//! lead or shown to the user.

/// Canonical comparison key for a website URL.
///
/// Lower-cases and trims, then strips one leading `http://` or `https://`,
/// one leading `www.`, and one trailing slash, in that order.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let without_www = without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme);
    without_www
        .strip_suffix('/')
        .unwrap_or(without_www)
        .to_string()
}

/// Canonical comparison key for a brand display name.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Turn a bare domain into a clickable link by prepending `https://`.
///
/// Strings that already carry an `http://` or `https://` prefix are returned
/// unchanged. An empty input stays empty.
#[must_use]
pub fn ensure_absolute_url(url: &str) -> String {
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
