//! Relay orchestration
//!
//! One inbound request becomes one outbound request and, at most, one
//! response. There is no retry and no state shared between relays.

use hyper::header::HeaderMap;
use hyper::{Method, Request, Uri};
use std::net::SocketAddr;
use tracing::debug;

use crate::proxy::core::{RelayError, RelayRequest, RelayResponse, Transport};
use crate::proxy::headers::{append_client_address, copy, sanitize};
use crate::proxy::streaming::guard_body;
use crate::utils::url::{parse_url, is_relayable};

/// Relay `inbound` to its destination through `transport`.
///
/// Dropping the returned future cancels the in-flight transport call. On a
/// transport failure nothing has been produced for the caller.
pub async fn relay(inbound: RelayRequest, transport: &dyn Transport) -> Result<RelayResponse, RelayError> {
    validate_target(&inbound.method, &inbound.uri)?;

    let RelayRequest {
        method,
        uri,
        headers,
        body,
        client_addr,
    } = inbound;
    let target = uri.to_string();

    let mut outbound = Request::new(body);
    *outbound.method_mut() = method;
    *outbound.uri_mut() = uri;

    copy(outbound.headers_mut(), &headers);
    sanitize(outbound.headers_mut());
    append_client_address(outbound.headers_mut(), &client_host(&client_addr))?;

    debug!(
        "🔄 Relaying {} {} via {} ({} headers)",
        outbound.method(),
        target,
        transport.name(),
        outbound.headers().len()
    );

    let backend_response = transport.execute(outbound).await?;

    let (parts, body) = backend_response.into_parts();
    let mut backend_headers = parts.headers;
    sanitize(&mut backend_headers);

    let mut headers = HeaderMap::new();
    copy(&mut headers, &backend_headers);

    debug!("✅ Upstream {} answered {}", target, parts.status);

    Ok(RelayResponse {
        status: parts.status,
        headers,
        body: guard_body(body, target),
    })
}

/// Fail fast on requests a forward proxy cannot relay.
fn validate_target(method: &Method, uri: &Uri) -> Result<(), RelayError> {
    if *method == Method::CONNECT {
        return Err(RelayError::MalformedInput(
            "CONNECT tunneling is not supported".to_string(),
        ));
    }
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(RelayError::MalformedInput(format!(
            "request target must be an absolute URL, got {:?}",
            uri.to_string()
        )));
    }

    let url = parse_url(&uri.to_string())
        .map_err(|e| RelayError::MalformedInput(format!("invalid URL {}: {}", uri, e)))?;
    if !is_relayable(&url) {
        return Err(RelayError::MalformedInput(format!(
            "unsupported protocol scheme {:?}",
            url.scheme()
        )));
    }
    Ok(())
}

/// Address recorded in the forwarding chain for a caller.
///
/// Socket addresses contribute only their IP, the conventional
/// `X-Forwarded-For` entry; anything else is kept verbatim.
fn client_host(client_addr: &str) -> std::borrow::Cow<'_, str> {
    match client_addr.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string().into(),
        Err(_) => client_addr.into(),
    }
}
