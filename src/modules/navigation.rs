// Pure navigation logic - no Tauri imports allowed.
// URL bar handling that can be unit tested.

use url::Url;

use crate::settings::Settings;

/// Turns URL bar text into the URL the active tab should load.
///
/// Anything that does not already start with `http` is assumed to be a plain
/// HTTP address. The check is a string prefix, so `https://...` and
/// `httpbin.org` both pass through untouched.
pub fn url_from_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("http") {
        Some(trimmed.to_string())
    } else {
        Some(format!("http://{}", trimmed))
    }
}

/// Parses URL bar text into a navigable [`Url`].
pub fn parse_input(input: &str) -> Result<Url, String> {
    let candidate = url_from_input(input).ok_or_else(|| "empty address".to_string())?;
    Url::parse(&candidate).map_err(|e| format!("invalid address '{}': {}", candidate, e))
}

/// The URL a new tab opens when none is given.
pub fn default_tab_url(settings: &Settings) -> Result<Url, url::ParseError> {
    Url::parse(settings.search_engine.home_url())
}

/// Local pages are not echoed in the URL bar.
pub fn shows_in_url_bar(url: &Url) -> bool {
    url.scheme() != "file"
}
