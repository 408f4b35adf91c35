//! URL canonicalization and raw-content URL construction.

use hakken_core::RepositoryCoordinate;

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL before fetching.
///
/// Trims whitespace, defaults the scheme to https, lowercases the host and
/// drops the fragment. Only http and https are accepted.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Map a blob page URL onto the raw-content host.
///
/// `https://github.com/{owner}/{name}/blob/{ref}/{path}` becomes
/// `{raw_base}/{owner}/{name}/{ref}/{path}`. URLs already under `raw_base`
/// pass through. Anything else yields None.
pub fn to_raw_url(html_url: &str, raw_base: &str) -> Option<String> {
    let raw_base = raw_base.trim_end_matches('/');
    if html_url.starts_with(raw_base) && html_url[raw_base.len()..].starts_with('/') {
        return Some(html_url.to_string());
    }

    let url = url::Url::parse(html_url).ok()?;
    if !matches!(url.host_str(), Some("github.com" | "www.github.com")) {
        return None;
    }

    // segments stay percent-encoded as the API returned them
    let segments: Vec<&str> = url.path_segments()?.collect();
    match segments.as_slice() {
        [owner, name, "blob", reference, path @ ..]
            if !path.is_empty() && ![owner, name, reference].iter().any(|s| s.is_empty()) =>
        {
            Some(format!("{raw_base}/{owner}/{name}/{reference}/{}", path.join("/")))
        }
        _ => None,
    }
}

/// Build `{raw_base}/{owner}/{name}/{reference}/{path}`, percent-encoding
/// every path segment.
pub fn raw_content_url(
    raw_base: &str, repository: &RepositoryCoordinate, reference: &str, path: &str,
) -> Result<String, UrlError> {
    let mut url = url::Url::parse(raw_base).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| UrlError::InvalidUrl(format!("cannot be a base: {raw_base}")))?;
        segments
            .pop_if_empty()
            .push(&repository.owner)
            .push(&repository.name)
            .push(reference)
            .extend(path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url.to_string())
}
