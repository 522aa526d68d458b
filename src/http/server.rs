//! Local development server.
//!
//! # Responsibilities
//! - Expose every route of a handler table at its configured path
//! - Convert HTTP requests into proxy events and proxy responses back
//! - Synthesize the invocation context the platform would provide
//! - Stop accepting connections on shutdown and drain in-flight requests
//!
//! # Design Decisions
//! - Requests go through the same `RouteHandler::invoke` path as the Lambda
//!   runtime, so each request builds, registers and drops its own application
//! - Routes sharing a path are grouped; the first route whose methods accept
//!   the request wins
//! - Invocation failures surface as `502 Bad Gateway`, as API Gateway does
//!   when an integration errors
//! - Oversized bodies are `413`, unreadable bodies `400`
//! - Paths are checked before mounting; a table whose paths cannot share one
//!   router is refused instead of panicking

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::adapter::{BodyError, InvocationContext, ProxyEvent, ProxyResponse};
use crate::config::AppConfig;
use crate::handlers::factory::check_path;
use crate::handlers::{BuildError, GatewayHandlers, RouteHandler};

/// One route bound to a path.
#[derive(Clone)]
struct Binding {
    methods: Vec<String>,
    handler: RouteHandler<ProxyEvent, ProxyResponse>,
}

impl Binding {
    fn accepts(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Settings shared by every request on one path.
#[derive(Clone)]
struct PathState {
    bindings: Arc<Vec<Binding>>,
    max_body_bytes: usize,
    timeout: Duration,
}

/// HTTP server that invokes route handlers the way the platform would.
pub struct LocalServer {
    router: Router,
    routes: usize,
}

impl LocalServer {
    /// Mount every handler in `handlers` at the path its route declares.
    /// Routes without a handler in the table are skipped.
    pub fn new(config: &AppConfig, handlers: &GatewayHandlers) -> Result<Self, BuildError> {
        let mut by_path: BTreeMap<&str, Vec<Binding>> = BTreeMap::new();
        let mut mounted = Vec::new();

        for route in &config.routes {
            let Some(handler) = handlers.get(&route.name) else {
                tracing::warn!(route = %route.name, "No handler for route, skipping");
                continue;
            };
            check_path(route, &mounted)?;
            mounted.push(route.clone());
            by_path.entry(route.path.as_str()).or_default().push(Binding {
                methods: route.methods.clone(),
                handler: handler.clone(),
            });
        }

        let mut router = Router::new();
        for (path, bindings) in by_path {
            let state = PathState {
                bindings: Arc::new(bindings),
                max_body_bytes: config.http.max_body_bytes,
                timeout: Duration::from_secs(config.http.request_timeout_secs),
            };
            router = router.route(
                path,
                any(move |request: Request| {
                    let state = state.clone();
                    async move { invoke_route(state, request).await }
                }),
            );
        }

        Ok(Self {
            router: router.layer(TraceLayer::new_for_http()),
            routes: mounted.len(),
        })
    }

    /// Number of routes mounted.
    pub fn routes(&self) -> usize {
        self.routes
    }

    /// The underlying router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a shutdown signal arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes, "Local server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("Local server stopped");
        Ok(())
    }
}

async fn invoke_route(state: PathState, request: Request) -> Response {
    let method = request.method().as_str().to_string();
    let Some(binding) = state.bindings.iter().find(|b| b.accepts(&method)) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };
    let route = binding.handler.route();

    let event = match ProxyEvent::from_http(request, state.max_body_bytes).await {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(route, error = %e, "Rejected request body");
            let status = match &e {
                BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                BodyError::Read(_) => StatusCode::BAD_REQUEST,
            };
            return (status, e.to_string()).into_response();
        }
    };

    let context = InvocationContext::local(route, state.timeout);
    let start = Instant::now();
    match binding.handler.invoke(event, context).await {
        Ok(response) => {
            tracing::debug!(
                route,
                status = response.status_code(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Local invocation complete"
            );
            response.into_response()
        }
        Err(e) => {
            tracing::error!(route, phase = e.phase(), error = %e, "Local invocation failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ControllerRegistry;
    use crate::config::RouteDescriptor;
    use crate::handlers::build_handlers;
    use axum::body::Body;
    use tower::ServiceExt;

    fn server(routes: Vec<RouteDescriptor>) -> LocalServer {
        server_with(AppConfig {
            routes,
            ..Default::default()
        })
    }

    fn server_with(config: AppConfig) -> LocalServer {
        let config = Arc::new(config);
        let table = build_handlers(config.clone(), ControllerRegistry::builtin(), None).unwrap();
        LocalServer::new(&config, &table).unwrap()
    }

    async fn call(server: &LocalServer, method: &str, uri: &str) -> Response {
        send(server, method, uri, Body::empty()).await
    }

    async fn send(server: &LocalServer, method: &str, uri: &str, body: Body) -> Response {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap();
        server.router().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_shared_path_selects_by_method() {
        let server = server(vec![
            RouteDescriptor::new("read", "/items")
                .with_controller("fixed")
                .with_methods(["get"])
                .with_setting("body", "read"),
            RouteDescriptor::new("write", "/items")
                .with_controller("fixed")
                .with_methods(["post"])
                .with_setting("status", 201)
                .with_setting("body", "write"),
        ]);
        assert_eq!(server.routes(), 2);

        let read = call(&server, "GET", "/items").await;
        assert_eq!(read.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(read.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"read");

        let write = call(&server, "POST", "/items").await;
        assert_eq!(write.status(), StatusCode::CREATED);

        let other = call(&server, "DELETE", "/items").await;
        assert_eq!(other.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_invocation_failure_is_bad_gateway() {
        let server = server(vec![RouteDescriptor::new("users", "/users").with_controller("missing")]);

        let response = call(&server, "GET", "/users").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let mut config = AppConfig {
            routes: vec![RouteDescriptor::new("upload", "/upload").with_controller("echo")],
            ..Default::default()
        };
        config.http.max_body_bytes = 8;
        let server = server_with(config);

        let response = send(&server, "POST", "/upload", Body::from(vec![b'x'; 64])).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let server = server(vec![RouteDescriptor::new("upload", "/upload").with_controller("echo")]);
        let chunks = futures_util::stream::iter(vec![Err::<axum::body::Bytes, _>(
            std::io::Error::other("connection reset"),
        )]);

        let response = send(&server, "POST", "/upload", Body::from_stream(chunks)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflicting_paths_refused() {
        let by_id = Arc::new(AppConfig {
            routes: vec![RouteDescriptor::new("by_id", "/items/{id}").with_controller("health")],
            ..Default::default()
        });
        let by_name = Arc::new(AppConfig {
            routes: vec![RouteDescriptor::new("by_name", "/items/{name}").with_controller("health")],
            ..Default::default()
        });
        let mut table = build_handlers(by_id.clone(), ControllerRegistry::builtin(), None).unwrap();
        let other = build_handlers(by_name.clone(), ControllerRegistry::builtin(), None).unwrap();
        for handler in other.iter() {
            table.insert(handler.clone());
        }

        let combined = AppConfig {
            routes: vec![by_id.routes[0].clone(), by_name.routes[0].clone()],
            ..Default::default()
        };
        let err = LocalServer::new(&combined, &table).err().unwrap();
        assert_eq!(
            err,
            BuildError::ConflictingPath {
                route: "by_name".into(),
                other: "by_id".into(),
            }
        );
    }
}
