use crate::UrlError;
use url::Url;

/// Ensures a URL string carries an explicit scheme
///
/// Bare hostnames as entered by users ("example.com") are prefixed with
/// `https://`. Strings that already carry a scheme are returned trimmed but
/// otherwise untouched, so unsupported schemes still reach [`canonicalize`]
/// and get rejected there.
///
/// # Examples
///
/// ```
/// use sitegauge::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("example.com"), "https://example.com");
/// assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
/// ```
pub fn ensure_scheme(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Checks whether a string is a usable HTTP(S) URL
///
/// A URL is considered valid when it parses and has both a scheme and a host.
pub fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Canonicalizes a user-entered site reference into a parsed URL
///
/// Applies [`ensure_scheme`], parses, and rejects non-HTTP(S) schemes and
/// hostless URLs. The canonical string form of the returned URL is what keys
/// every map in a pipeline run.
pub fn canonicalize(raw: &str) -> Result<Url, UrlError> {
    let with_scheme = ensure_scheme(raw);
    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scheme_adds_https() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
    }

    #[test]
    fn test_ensure_scheme_keeps_http() {
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_ensure_scheme_keeps_https() {
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_ensure_scheme_trims_whitespace() {
        assert_eq!(ensure_scheme("  example.com  "), "https://example.com");
    }

    #[test]
    fn test_ensure_scheme_empty() {
        assert_eq!(ensure_scheme(""), "");
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com/page"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_canonicalize_bare_domain() {
        let url = canonicalize("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_preserves_path() {
        let url = canonicalize("https://example.com/pricing").unwrap();
        assert_eq!(url.as_str(), "https://example.com/pricing");
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        let result = canonicalize("ftp://example.com");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_canonicalize_rejects_garbage() {
        assert!(canonicalize("https://").is_err());
    }
}
