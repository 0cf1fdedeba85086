//! HTTP server setup and its lifecycle component.
//!
//! # Responsibilities
//! - Wrap application routes with the correlation, wide event, trace and timeout layers
//! - Serve plain HTTP/1.1 and HTTP/2 (h2c), or TLS when configured
//! - Plug into the lifecycle runtime: build at setup, bind at start, drain at stop

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::{
    http::{HeaderName, StatusCode},
    middleware, Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::correlation::{correlation_middleware, CorrelationHeader};
use crate::http::error::HttpError;
use crate::http::wide_event::{wide_event_middleware, WideEventState};
use crate::lifecycle::{BoxError, Setup, Shutdown, Starter, Stopper};
use crate::net::tls::load_tls_config;
use crate::observability::EventContext;

/// How long in-flight requests get to finish once the server is stopped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Address the server actually bound, filled in once it starts.
#[derive(Debug, Clone, Default)]
pub struct LocalAddr(Arc<OnceLock<SocketAddr>>);

impl LocalAddr {
    pub fn get(&self) -> Option<SocketAddr> {
        self.0.get().copied()
    }

    fn set(&self, addr: SocketAddr) {
        let _ = self.0.set(addr);
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    config: ServerConfig,
    address: SocketAddr,
    router: Router,
    local_addr: LocalAddr,
}

impl HttpServer {
    /// Build a server around `routes`.
    ///
    /// Every request gets a correlation id and one wide event derived from `root`.
    pub fn new(config: ServerConfig, routes: Router, root: EventContext) -> Result<Self, HttpError> {
        let address = config
            .address
            .parse()
            .map_err(|source| HttpError::InvalidAddress {
                address: config.address.clone(),
                source,
            })?;
        let header = HeaderName::from_bytes(config.correlation_header.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(config.correlation_header.clone()))?;

        let router = Self::build_router(&config, routes, root, header);
        Ok(Self {
            config,
            address,
            router,
            local_addr: LocalAddr::default(),
        })
    }

    /// Build a server that only serves TLS.
    pub fn new_tls(config: ServerConfig, routes: Router, root: EventContext) -> Result<Self, HttpError> {
        if !config.tls.enabled {
            return Err(HttpError::TlsDisabled);
        }
        Self::new(config, routes, root)
    }

    /// Wrap application routes with the middleware stack.
    ///
    /// Outermost first: trace, correlation id, wide event, timeout. The timeout
    /// sits inside the wide event so timed-out requests are still recorded.
    fn build_router(
        config: &ServerConfig,
        routes: Router,
        root: EventContext,
        header: HeaderName,
    ) -> Router {
        let mut router = routes;
        if let Some(secs) = config.request_timeout_secs {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(secs),
            ));
        }

        router
            .layer(middleware::from_fn_with_state(
                WideEventState::new(config.wide_event_name.as_str(), root),
                wide_event_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                CorrelationHeader(header),
                correlation_middleware,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn is_tls(&self) -> bool {
        self.config.tls.enabled
    }

    /// Handle that reports the bound address once the server is started.
    pub fn local_addr(&self) -> LocalAddr {
        self.local_addr.clone()
    }

    /// Bind and start serving in a background task.
    ///
    /// The returned stopper triggers graceful shutdown and waits for the task.
    pub async fn start(self) -> Result<Stopper, HttpError> {
        let shutdown = Shutdown::new();

        let (addr, task) = if self.config.tls.enabled {
            self.spawn_tls(&shutdown).await?
        } else {
            self.spawn_plain(&shutdown).await?
        };

        self.local_addr.set(addr);
        tracing::info!(address = %addr, tls = self.config.tls.enabled, "HTTP server started");

        Ok(Stopper::new(move || stop_server(addr, shutdown, task)))
    }

    async fn spawn_plain(
        &self,
        shutdown: &Shutdown,
    ) -> Result<(SocketAddr, JoinHandle<std::io::Result<()>>), HttpError> {
        let listener = TcpListener::bind(self.address).await.map_err(HttpError::Bind)?;
        let addr = listener.local_addr().map_err(HttpError::Bind)?;

        let app = self.router.clone();
        let signalled = shutdown.signalled();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signalled)
                .await
        });

        Ok((addr, task))
    }

    async fn spawn_tls(
        &self,
        shutdown: &Shutdown,
    ) -> Result<(SocketAddr, JoinHandle<std::io::Result<()>>), HttpError> {
        let tls = load_tls_config(
            Path::new(&self.config.tls.cert_file),
            Path::new(&self.config.tls.key_file),
        )
        .await
        .map_err(HttpError::Tls)?;

        let handle = axum_server::Handle::new();
        let server = axum_server::bind_rustls(self.address, tls).handle(handle.clone());
        let app = self.router.clone().into_make_service();
        let task = tokio::spawn(async move { server.serve(app).await });

        let graceful = handle.clone();
        let signalled = shutdown.signalled();
        tokio::spawn(async move {
            signalled.await;
            graceful.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        match handle.listening().await {
            Some(addr) => Ok((addr, task)),
            None => {
                let err = match task.await {
                    Ok(Err(e)) => e,
                    _ => std::io::Error::new(
                        std::io::ErrorKind::AddrNotAvailable,
                        "TLS listener exited before binding",
                    ),
                };
                shutdown.trigger();
                Err(HttpError::Bind(err))
            }
        }
    }
}

async fn stop_server(addr: SocketAddr, shutdown: Shutdown, task: JoinHandle<std::io::Result<()>>) {
    shutdown.trigger();

    let abort = task.abort_handle();
    match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
        Ok(Ok(Ok(()))) => tracing::info!(address = %addr, "HTTP server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(address = %addr, error = %e, "HTTP server exited with error"),
        Ok(Err(e)) => tracing::error!(address = %addr, error = %e, "HTTP server task failed"),
        Err(_) => {
            tracing::warn!(address = %addr, "HTTP server did not drain in time, aborting");
            abort.abort();
        }
    }
}

/// Lifecycle component for an HTTP server.
///
/// The server is built during setup (config errors fail the build phase) and
/// bound during start. The returned [`LocalAddr`] is filled in once it is bound.
pub fn http_component(config: ServerConfig, routes: Router, root: EventContext) -> (Setup, LocalAddr) {
    let local_addr = LocalAddr::default();
    let bound = local_addr.clone();

    let setup = Setup::new("http-server", move || {
        let mut server = HttpServer::new(config, routes, root)?;
        server.local_addr = bound;
        Ok(Some(Starter::new(move || async move {
            let stopper = server.start().await?;
            Ok::<_, BoxError>(Some(stopper))
        })))
    });

    (setup, local_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    fn config() -> ServerConfig {
        ServerConfig {
            address: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn invalid_address_is_rejected() {
        let config = ServerConfig {
            address: "nowhere".into(),
            ..ServerConfig::default()
        };
        let err = HttpServer::new(config, Router::new(), EventContext::default()).err();
        assert!(matches!(err, Some(HttpError::InvalidAddress { .. })));
    }

    #[test]
    fn tls_only_server_requires_tls() {
        let err = HttpServer::new_tls(config(), Router::new(), EventContext::default()).err();
        assert!(matches!(err, Some(HttpError::TlsDisabled)));
    }

    #[tokio::test]
    async fn router_applies_configured_header() {
        let config = ServerConfig {
            correlation_header: "x-request-id".into(),
            ..config()
        };
        let sink = Arc::new(MemorySink::new());
        let server = HttpServer::new(
            config,
            Router::new().route("/", get(|| async { "ok" })),
            EventContext::new(sink.clone()),
        )
        .unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "r-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "r-1");
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.records()[0].get("correlation_id").and_then(|v| v.as_str()),
            Some("r-1")
        );
    }

    #[tokio::test]
    async fn slow_handlers_time_out_and_are_still_recorded() {
        let config = ServerConfig {
            request_timeout_secs: Some(1),
            ..config()
        };
        let sink = Arc::new(MemorySink::new());
        let server = HttpServer::new(
            config,
            Router::new().route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            ),
            EventContext::new(sink.clone()),
        )
        .unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            sink.records()[0].get("status"),
            Some(&crate::observability::Value::U64(408))
        );
    }

    #[tokio::test]
    async fn start_binds_and_stop_releases() {
        let server = HttpServer::new(config(), Router::new(), EventContext::default()).unwrap();
        let local_addr = server.local_addr();
        assert!(local_addr.get().is_none());

        let stopper = server.start().await.unwrap();
        let addr = local_addr.get().unwrap();
        assert_ne!(addr.port(), 0);

        crate::lifecycle::Runtime::new([Setup::new("already-started", move || {
            Ok(Some(Starter::new(move || async move {
                Ok::<_, BoxError>(Some(stopper))
            })))
        })])
        .unwrap()
        .run_until(async {})
        .await
        .unwrap();

        // The port is free again once the stopper ran.
        TcpListener::bind(addr).await.unwrap();
    }
}
