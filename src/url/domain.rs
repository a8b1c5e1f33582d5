use url::Url;

/// Extracts the domain (host) from a URL, lowercased
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `scheme://host[:port]` origin used for auxiliary file checks
/// (robots.txt, sitemap.xml)
///
/// An explicit port is kept; auxiliary probes must hit the same address the
/// page came from.
pub fn origin(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Second-level suffixes where the registered name sits one label deeper
/// (e.g. "shop.co.uk" registers "shop", not "co").
const COMPOUND_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.nz", "co.jp",
    "co.in", "com.br", "com.mx",
];

/// Splits a host into its registered name and public suffix
///
/// This is a heuristic, not a full public-suffix-list lookup: the last label
/// is the suffix unless the final two labels form a known compound suffix
/// ("co.uk" and friends). A leading `www.` is stripped first.
///
/// Returns `None` for hosts without a dot (e.g. "localhost").
pub fn registered_domain(host: &str) -> Option<(String, String)> {
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if COMPOUND_SUFFIXES.contains(&last_two.as_str()) {
        if labels.len() < 3 {
            return None;
        }
        Some((labels[labels.len() - 3].to_string(), last_two))
    } else {
        Some((
            labels[labels.len() - 2].to_string(),
            labels[labels.len() - 1].to_string(),
        ))
    }
}

/// Extracts the bare domain name used in search-fallback queries
///
/// "https://www.acme-tools.co.uk/about" yields "acme-tools".
pub fn bare_domain_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    registered_domain(host).map(|(name, _)| name)
}
