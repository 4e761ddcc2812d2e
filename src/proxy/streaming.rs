//! Body streaming for relayed responses
//!
//! Bodies are never collected in memory: chunks move from the backend to the
//! caller one at a time, paced by whoever consumes them.
//! - [`guard_body`] tags mid-stream failures as streaming failures
//! - [`copy_body`] drains a body into any `AsyncWrite`

use futures::TryStreamExt;
use hyper::body::HttpBody;
use hyper::Body;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::proxy::core::RelayError;

/// Wrap a backend body so that read errors surface as
/// [`RelayError::StreamingFailure`] and get logged.
///
/// At this point the status line and headers are already on their way to the
/// caller, so hyper aborts the connection when the wrapped stream fails.
pub fn guard_body(body: Body, context: String) -> Body {
    // fully qualified: `HttpBody` also has a `map_err`
    let stream = TryStreamExt::map_err(body, move |e| {
        warn!("💥 Body stream for {} failed after headers were sent: {}", context, e);
        RelayError::StreamingFailure(e.to_string())
    });
    Body::wrap_stream(stream)
}

/// Copy `body` into `writer` chunk by chunk and flush it.
pub async fn copy_body<W>(mut body: Body, writer: &mut W) -> Result<u64, RelayError>
where
    W: AsyncWrite + Unpin,
{
    let mut total: u64 = 0;

    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| RelayError::StreamingFailure(format!("read failed: {}", e)))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| RelayError::StreamingFailure(format!("write failed: {}", e)))?;
        total += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| RelayError::StreamingFailure(format!("flush failed: {}", e)))?;

    debug!("Streamed {} body bytes", total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io;

    fn failing_body() -> Body {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"partial ")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "backend went away")),
        ];
        Body::wrap_stream(futures::stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_copy_body_streams_all_chunks() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"backend ")),
            Ok(Bytes::from_static(b"response")),
        ];
        let body = Body::wrap_stream(futures::stream::iter(chunks));
        let mut sink: Vec<u8> = Vec::new();

        let written = copy_body(body, &mut sink).await.unwrap();

        assert_eq!(written, 16);
        assert_eq!(sink, b"backend response");
    }

    #[tokio::test]
    async fn test_copy_body_reports_streaming_failure() {
        let mut sink: Vec<u8> = Vec::new();

        let err = copy_body(failing_body(), &mut sink).await.unwrap_err();

        assert!(matches!(err, RelayError::StreamingFailure(_)));
        // Bytes that were already forwarded stay forwarded
        assert_eq!(sink, b"partial ");
    }

    #[tokio::test]
    async fn test_guard_body_passes_data_through() {
        let body = guard_body(Body::from("unchanged"), "test".to_string());

        let bytes = hyper::body::to_bytes(body).await.unwrap();

        assert_eq!(&bytes[..], b"unchanged");
    }

    #[tokio::test]
    async fn test_guard_body_surfaces_failure() {
        let body = guard_body(failing_body(), "test".to_string());

        let err = hyper::body::to_bytes(body).await.unwrap_err();

        let cause = err.into_cause().expect("wrapped stream error is kept as the cause");
        assert!(cause.to_string().starts_with("streaming failure"));
    }
}
