//! Query-string rewriting for image URLs.

/// Query keys the retry cache-buster owns.
pub const CACHE_BUST_KEYS: [&str; 2] = ["retry", "t"];

/// Sets query parameters on `url`, replacing any existing values for the same
/// keys and preserving every other parameter after the new ones.
///
/// # Arguments
/// * `url` - The original image URL
/// * `params` - Key/value pairs to set, in output order
#[must_use]
pub fn set_query_params(url: &str, params: &[(&str, String)]) -> String {
    let (base_url, existing_params) = if let Some(idx) = url.find('?') {
        (&url[..idx], Some(&url[idx + 1..]))
    } else {
        (url, None)
    };

    let mut query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    if let Some(existing) = existing_params {
        for param in existing.split('&').filter(|p| !p.is_empty()) {
            let key = param.split('=').next().unwrap_or("");
            if !params.iter().any(|(owned, _)| *owned == key) {
                query.push(param.to_string());
            }
        }
    }

    if query.is_empty() {
        base_url.to_string()
    } else {
        format!("{}?{}", base_url, query.join("&"))
    }
}

/// Appends `retry=<attempt>&t=<timestamp_ms>` so a retried request cannot be
/// served a cached failure.
#[must_use]
pub fn cache_busted(url: &str, attempt: u32, timestamp_ms: i64) -> String {
    let (base_url, existing_params) = url.split_once('?').unwrap_or((url, ""));
    let bust = format!("retry={attempt}&t={timestamp_ms}");

    let mut query: Vec<&str> = existing_params
        .split('&')
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let key = p.split('=').next().unwrap_or("");
            !CACHE_BUST_KEYS.contains(&key)
        })
        .collect();
    query.push(&bust);

    format!("{}?{}", base_url, query.join("&"))
}

/// Returns the URL with any cache-busting parameters removed.
#[must_use]
pub fn strip_cache_bust(url: &str) -> String {
    let Some((base_url, existing_params)) = url.split_once('?') else {
        return url.to_string();
    };

    let kept: Vec<&str> = existing_params
        .split('&')
        .filter(|p| {
            let key = p.split('=').next().unwrap_or("");
            !p.is_empty() && !CACHE_BUST_KEYS.contains(&key)
        })
        .collect();

    if kept.is_empty() {
        base_url.to_string()
    } else {
        format!("{}?{}", base_url, kept.join("&"))
    }
}
