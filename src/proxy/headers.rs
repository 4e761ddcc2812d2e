//! Header rewriting applied on both legs of a relay
//!
//! - hop-by-hop stripping (RFC 7230 section 6.1)
//! - additive copying that keeps every value of a repeated header
//! - `X-Forwarded-For` chain composition

use hyper::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::proxy::core::RelayError;

/// Connection-scoped headers that are never forwarded to the next hop.
pub const HOP_HEADERS: [&str; 8] = [
    "Connection",
    "Keep-Alive",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "TE",
    "Trailers",
    "Transfer-Encoding",
    "Upgrade",
];

/// Header carrying the chain of client addresses, oldest first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Separator between entries of the forwarding chain.
const CHAIN_SEPARATOR: &[u8] = b", ";

/// Remove every hop-by-hop header, all values included.
///
/// Names that merely resemble a hop header (`Connection-Id`, `X-Upgrade`)
/// are left alone. Calling this twice is the same as calling it once.
pub fn sanitize(headers: &mut HeaderMap) {
    let mut removed = 0;
    for name in HOP_HEADERS {
        // `remove` drops every value stored under the name
        if headers.remove(name).is_some() {
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Stripped {} hop-by-hop header name(s)", removed);
    }
}

/// Append every value of `source` onto `destination`.
///
/// Existing values in `destination` are kept and the copied ones follow
/// them in their original order, so repeated headers such as `Set-Cookie`
/// survive as separate entries.
pub fn copy(destination: &mut HeaderMap, source: &HeaderMap) {
    for (name, value) in source.iter() {
        destination.append(name.clone(), value.clone());
    }
}

/// Append `address` to the `X-Forwarded-For` chain.
///
/// All prior values are joined with `", "` and replaced by a single header
/// entry ending in `address`. The address is used exactly as given, port
/// suffix included.
pub fn append_client_address(headers: &mut HeaderMap, address: &str) -> Result<(), RelayError> {
    validate_client_address(address)?;

    let mut chain: Vec<u8> = Vec::new();
    for prior in headers.get_all(X_FORWARDED_FOR) {
        chain.extend_from_slice(prior.as_bytes());
        chain.extend_from_slice(CHAIN_SEPARATOR);
    }
    chain.extend_from_slice(address.as_bytes());

    let value = HeaderValue::from_bytes(&chain).map_err(|e| {
        RelayError::MalformedInput(format!("invalid {} chain: {}", X_FORWARDED_FOR, e))
    })?;
    headers.insert(X_FORWARDED_FOR, value);
    Ok(())
}

/// Reject caller addresses that would corrupt the chain or the header block.
fn validate_client_address(address: &str) -> Result<(), RelayError> {
    if address.is_empty() {
        return Err(RelayError::MalformedInput("empty client address".to_string()));
    }
    if address.contains(',') {
        return Err(RelayError::MalformedInput(format!(
            "client address must not contain ',': {:?}",
            address
        )));
    }
    if address.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(RelayError::MalformedInput(format!(
            "client address contains whitespace or control characters: {:?}",
            address
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_sanitize_removes_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Connection", "keep-alive".parse().unwrap());
        headers.insert("Keep-Alive", "timeout=5".parse().unwrap());
        headers.insert("Proxy-Authenticate", "Basic".parse().unwrap());
        headers.insert("Proxy-Authorization", "Basic abc123".parse().unwrap());
        headers.insert("Te", "trailers".parse().unwrap());
        headers.insert("Trailers", "X-Custom".parse().unwrap());
        headers.insert("Transfer-Encoding", "chunked".parse().unwrap());
        headers.insert("Upgrade", "websocket".parse().unwrap());
        headers.insert("Content-Type", "application/json".parse().unwrap());

        sanitize(&mut headers);

        for name in HOP_HEADERS {
            assert!(headers.get(name).is_none(), "hop header {} should be gone", name);
        }
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_sanitize_removes_every_value_of_a_hop_header() {
        let mut headers = HeaderMap::new();
        headers.append("connection", "keep-alive".parse().unwrap());
        headers.append("connection", "upgrade".parse().unwrap());

        sanitize(&mut headers);

        assert!(headers.get_all("Connection").iter().next().is_none());
    }

    #[test]
    fn test_sanitize_keeps_lookalike_names() {
        let mut headers = HeaderMap::new();
        headers.insert("Connection-Id", "42".parse().unwrap());
        headers.insert("X-Upgrade", "no".parse().unwrap());
        headers.insert("Trailer", "Expires".parse().unwrap());

        sanitize(&mut headers);

        assert_eq!(headers.get("connection-id").unwrap(), "42");
        assert_eq!(headers.get("x-upgrade").unwrap(), "no");
        assert_eq!(headers.get("trailer").unwrap(), "Expires");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut headers = HeaderMap::new();
        headers.insert("Upgrade", "h2c".parse().unwrap());
        headers.append("Set-Cookie", "a=1".parse().unwrap());
        headers.append("Set-Cookie", "b=2".parse().unwrap());

        sanitize(&mut headers);
        let once = headers.clone();
        sanitize(&mut headers);

        assert_eq!(headers, once);
        assert_eq!(values(&headers, "set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_copy_preserves_multiple_values() {
        let mut src = HeaderMap::new();
        src.insert("Content-Type", "application/json".parse().unwrap());
        src.append("X-Custom", "value1".parse().unwrap());
        src.append("X-Custom", "value2".parse().unwrap());

        let mut dst = HeaderMap::new();
        copy(&mut dst, &src);

        assert_eq!(dst.get("content-type").unwrap(), "application/json");
        assert_eq!(values(&dst, "x-custom"), vec!["value1", "value2"]);
    }

    #[test]
    fn test_copy_appends_after_existing_values() {
        let mut src = HeaderMap::new();
        src.append("Set-Cookie", "b=2".parse().unwrap());
        src.append("Set-Cookie", "c=3".parse().unwrap());

        let mut dst = HeaderMap::new();
        dst.append("set-cookie", "a=1".parse().unwrap());
        dst.insert("X-Untouched", "yes".parse().unwrap());
        copy(&mut dst, &src);

        assert_eq!(values(&dst, "Set-Cookie"), vec!["a=1", "b=2", "c=3"]);
        assert_eq!(values(&dst, "x-untouched"), vec!["yes"]);
    }

    #[test]
    fn test_append_client_address() {
        let cases: [(&str, &[&str], &str, &str); 3] = [
            ("no prior X-Forwarded-For", &[], "192.168.1.1", "192.168.1.1"),
            ("single prior", &["10.0.0.1"], "192.168.1.1", "10.0.0.1, 192.168.1.1"),
            (
                "multiple prior",
                &["10.0.0.1", "10.0.0.2"],
                "192.168.1.1",
                "10.0.0.1, 10.0.0.2, 192.168.1.1",
            ),
        ];

        for (name, prior, host, expected) in cases {
            let mut headers = HeaderMap::new();
            for p in prior {
                headers.append("X-Forwarded-For", p.parse().unwrap());
            }

            append_client_address(&mut headers, host).unwrap();

            assert_eq!(values(&headers, X_FORWARDED_FOR), vec![expected], "case: {}", name);
        }
    }

    #[test]
    fn test_append_client_address_keeps_port_and_duplicates() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1:4000".parse().unwrap());

        append_client_address(&mut headers, "10.0.0.1:4000").unwrap();

        assert_eq!(
            headers.get(X_FORWARDED_FOR).unwrap(),
            "10.0.0.1:4000, 10.0.0.1:4000"
        );
    }

    #[test]
    fn test_append_client_address_rejects_injection() {
        for bad in ["", "1.2.3.4, 5.6.7.8", "1.2.3.4\r\nX-Evil: 1", "1.2.3.4 "] {
            let mut headers = HeaderMap::new();
            let err = append_client_address(&mut headers, bad).unwrap_err();
            assert!(matches!(err, RelayError::MalformedInput(_)), "accepted {:?}", bad);
            assert!(headers.is_empty());
        }
    }
}
