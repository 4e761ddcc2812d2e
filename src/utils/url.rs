//! URL utility functions

use url::Url;

/// Parse URL and extract components
pub fn parse_url(url_str: &str) -> Result<Url, url::ParseError> {
    Url::parse(url_str)
}

/// Check if the URL can be relayed over plain HTTP or HTTPS
pub fn is_relayable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().map_or(false, |h| !h.is_empty())
}
