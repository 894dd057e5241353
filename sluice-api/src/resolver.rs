//! The seam to the metadata resolution layer.
//!
//! Scraping service pages is a separate concern; the API only needs
//! something that turns a validated URL into a [`MediaRecord`] or a typed
//! failure.

use async_trait::async_trait;
use url::Url;

use sluice_plan::{ErrorCode, MediaRecord, ResolveError};

#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &Url) -> Result<MediaRecord, ResolveError>;
}

/// Syntactic validation of a submitted link. Anything that is not an
/// absolute http(s) URL with a host is rejected before the resolver runs.
pub fn validate_link(raw: &str) -> Result<Url, ResolveError> {
    let url = Url::parse(raw.trim()).map_err(|_| ResolveError::new(ErrorCode::LinkInvalid))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ResolveError::new(ErrorCode::LinkInvalid));
    }
    Ok(url)
}

/// Placeholder used until a real resolver is wired in: every link is
/// reported as unsupported.
pub struct UnconfiguredResolver;

#[async_trait]
impl MediaResolver for UnconfiguredResolver {
    async fn resolve(&self, _url: &Url) -> Result<MediaRecord, ResolveError> {
        Err(ResolveError::new(ErrorCode::LinkUnsupported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_http_urls_pass() {
        assert!(validate_link("https://example.com/watch?v=1").is_ok());
        assert!(validate_link("  http://example.com/x ").is_ok());
    }

    #[test]
    fn non_http_and_relative_links_are_invalid() {
        for raw in ["ftp://example.com/x", "file:///etc/passwd", "not a link", "/relative"] {
            let err = validate_link(raw).unwrap_err();
            assert_eq!(err.code, ErrorCode::LinkInvalid, "{raw}");
        }
    }
}
