//! Proxy server implementation

use crate::config::settings::ProxyConfig;
use crate::models::RelayLog;
use crate::proxy::core::{RelayRequest, Transport, TransportFactory};
use crate::proxy::relay::relay;
use crate::utils::{
    build_error_response, build_health_response, elapsed_ms, is_health_check,
    log_incoming_request, log_relay_failure, log_relay_success,
};
use crate::{log_debug, log_info};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Settings every request handler needs
#[derive(Clone)]
struct HandlerContext {
    transport: Arc<dyn Transport>,
    log_transactions: bool,
    started_at: Instant,
}

pub struct ProxyServer {
    listen_addr: SocketAddr,
    context: HandlerContext,
}

impl ProxyServer {
    /// Create a proxy server around an existing transport
    pub fn new(listen_addr: SocketAddr, transport: Arc<dyn Transport>) -> Self {
        Self {
            listen_addr,
            context: HandlerContext {
                transport,
                log_transactions: true,
                started_at: Instant::now(),
            },
        }
    }

    /// Create a proxy server with the transport selected by the configuration
    pub fn with_config(config: &ProxyConfig) -> crate::Result<Self> {
        let transport = TransportFactory::from_config(config)?;
        let mut server = Self::new(config.listen_addr, transport);
        server.context.log_transactions = config.logging.log_transactions;
        Ok(server)
    }

    /// Start the proxy server and run until Ctrl-C
    pub async fn start(self) -> crate::Result<()> {
        self.serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("🛑 Shutdown signal received, draining connections");
        })
        .await
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.listen_addr)?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        let context = self.context.clone();
        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let remote_addr = conn.remote_addr();
            let context = context.clone();
            log_debug!("New connection from: {}", remote_addr);

            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let context = context.clone();
                    async move { handle_request(req, remote_addr, &context).await }
                }))
            }
        });

        listener.set_nonblocking(true)?;
        let server = Server::from_tcp(listener)?.serve(make_svc);
        log_info!(
            "Proxy server listening on {} (transport: {})",
            server.local_addr(),
            self.context.transport.name()
        );
        log_info!("Test with: curl -x http://{} http://httpbin.org/get", server.local_addr());

        server.with_graceful_shutdown(shutdown).await?;

        log_info!("Proxy server stopped");
        Ok(())
    }
}

/// Handle one inbound request: answer health checks locally, relay the rest
async fn handle_request(
    req: Request<Body>,
    remote_addr: SocketAddr,
    context: &HandlerContext,
) -> Result<Response<Body>, Infallible> {
    let start_time = Instant::now();
    let method = req.method().to_string();
    let uri = req.uri().to_string();

    log_incoming_request(&method, &uri, &remote_addr);

    if is_health_check(req.uri()) {
        return Ok(build_health_response(
            req.method(),
            context.transport.name(),
            elapsed_ms(context.started_at),
        ));
    }

    let entry = RelayLog::new(method, uri, remote_addr.to_string(), context.transport.name());
    let inbound = RelayRequest::from_hyper(req, remote_addr);

    match relay(inbound, context.transport.as_ref()).await {
        Ok(response) => {
            let entry = entry.succeeded(response.status.as_u16(), elapsed_ms(start_time));
            log_relay_success(&entry, context.log_transactions);
            Ok(response.into_hyper())
        }
        Err(e) => {
            let status = e.status_code();
            let entry = entry.failed(status.as_u16(), e.to_string(), elapsed_ms(start_time));
            log_relay_failure(&entry, &e, context.log_transactions);
            Ok(build_error_response(
                status,
                status.canonical_reason().unwrap_or("Proxy Error"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::core::TransportError;
    use async_trait::async_trait;
    use hyper::{Method, StatusCode};

    /// Answers every request with a fixed outcome
    struct StaticTransport {
        outcome: fn() -> Result<Response<Body>, TransportError>,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn execute(&self, _request: Request<Body>) -> Result<Response<Body>, TransportError> {
            (self.outcome)()
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    fn context(outcome: fn() -> Result<Response<Body>, TransportError>) -> HandlerContext {
        HandlerContext {
            transport: Arc::new(StaticTransport { outcome }),
            log_transactions: false,
            started_at: Instant::now(),
        }
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Connection", "keep-alive")
            .body(Body::empty())
            .unwrap()
    }

    fn remote() -> SocketAddr {
        "127.0.0.1:12345".parse().unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_relayed_response_is_returned() {
        let ctx = context(|| {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("X-Backend", "test")
                .header("Transfer-Encoding", "chunked")
                .body(Body::from("backend response"))
                .unwrap())
        });

        let response = handle_request(request(Method::GET, "http://backend.test/"), remote(), &ctx)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-backend").unwrap(), "test");
        assert!(response.headers().get("transfer-encoding").is_none());
        assert_eq!(body_string(response).await, "backend response");
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_bad_gateway() {
        let ctx = context(|| Err(TransportError::Connect("connection refused".to_string())));

        let response = handle_request(request(Method::GET, "http://backend.test/"), remote(), &ctx)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_string(response).await, "Bad Gateway\n");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let ctx = context(|| Err(TransportError::Timeout("30s".to_string())));

        let response = handle_request(request(Method::GET, "http://backend.test/"), remote(), &ctx)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_origin_form_request_is_rejected() {
        let ctx = context(|| panic!("transport must not be called"));

        let response = handle_request(request(Method::GET, "/not-a-proxy-request"), remote(), &ctx)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_check_is_answered_locally() {
        let ctx = context(|| panic!("transport must not be called"));

        let response = handle_request(request(Method::GET, "/health"), remote(), &ctx)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("\"transport\":\"static\""));
    }

    #[tokio::test]
    async fn test_server_relays_end_to_end() {
        let backend_svc = make_service_fn(|_conn| async {
            Ok::<_, Infallible>(service_fn(|_req: Request<Body>| async {
                Ok::<_, Infallible>(Response::new(Body::from("backend response")))
            }))
        });
        let backend = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(backend_svc);
        let backend_addr = backend.local_addr();
        tokio::spawn(backend);

        // Bound before serving, so connections queue until the server accepts them
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let proxy_addr = listener.local_addr().unwrap();
        let transport: Arc<dyn Transport> = Arc::new(crate::proxy::http_client::HyperTransport::new());
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let proxy = ProxyServer::new(proxy_addr, transport);
        let running = tokio::spawn(proxy.serve_listener(listener, async {
            let _ = stop_rx.await;
        }));

        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::http(format!("http://{}", proxy_addr)).unwrap())
            .build()
            .unwrap();
        let body = client
            .get(format!("http://{}/", backend_addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(body, "backend response");
        stop_tx.send(()).unwrap();
        running.await.unwrap().unwrap();
    }
}
