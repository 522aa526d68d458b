//! Per-invocation application instance.
//!
//! # Responsibilities
//! - Own a fresh axum `Router` for exactly one invocation
//! - Mount route handlers restricted to the route's methods
//! - Collect extensions contributed by plugins
//! - Apply the shared middleware stack when finalized
//!
//! # Design Decisions
//! - Middleware is applied in `into_router`, after every route is mounted,
//!   because axum layers only wrap routes that already exist
//! - Every instance gets a v4 UUID so logs and tests can tell instances apart
//! - A path is mounted at most once per instance and is checked first, so a
//!   bad path fails the registration instead of panicking inside axum

use std::sync::Arc;
use std::time::Duration;

use axum::handler::Handler;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::{any, on, MethodFilter, MethodRouter};
use axum::{Extension, Router};
use thiserror::Error;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::validation::{is_valid_path, paths_conflict};
use crate::config::{AppConfig, RouteDescriptor};

type Finalizer = Box<dyn FnOnce(Router) -> Router + Send>;

/// A handler could not be mounted on the instance's router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("route '{route}' cannot be bound to method '{method}'")]
    Method { route: String, method: String },

    #[error("invalid route path '{0}'")]
    InvalidPath(String),

    #[error("route path '{path}' conflicts with mounted path '{existing}'")]
    Conflict { path: String, existing: String },
}

/// A freshly constructed application, owned by a single invocation.
pub struct App {
    id: Uuid,
    config: Arc<AppConfig>,
    router: Router,
    finalizers: Vec<Finalizer>,
    registered: Vec<String>,
    paths: Vec<String>,
}

impl App {
    /// Create an empty application sharing the given configuration.
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            router: Router::new(),
            finalizers: Vec::new(),
            registered: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Unique id of this instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The configuration this instance was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Route names whose controllers were registered on this instance.
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    pub(crate) fn mark_registered(&mut self, route: &str) {
        self.registered.push(route.to_string());
    }

    /// Mount `handler` at the route's path for the route's methods.
    pub fn mount<H, T>(&mut self, route: &RouteDescriptor, handler: H) -> Result<&mut Self, MountError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let method_router = match method_filter(route)? {
            Some(filter) => on(filter, handler),
            None => any(handler),
        };
        self.route(&route.path, method_router)
    }

    /// Add a raw axum method router at `path`.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> Result<&mut Self, MountError> {
        if !is_valid_path(path) {
            return Err(MountError::InvalidPath(path.to_string()));
        }
        if let Some(existing) = self
            .paths
            .iter()
            .find(|existing| *existing == path || paths_conflict(existing, path))
        {
            return Err(MountError::Conflict {
                path: path.to_string(),
                existing: existing.clone(),
            });
        }

        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self.paths.push(path.to_string());
        Ok(self)
    }

    /// Make `value` available to handlers through `axum::Extension`.
    pub fn insert_extension<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.finalizers
            .push(Box::new(move |router: Router| router.layer(Extension(value))));
        self
    }

    /// Finalize the instance into a router with the shared middleware stack.
    pub fn into_router(self) -> Router {
        let http = &self.config.http;
        let mut router = self.router;

        for finalize in self.finalizers {
            router = finalize(router);
        }

        for (name, value) in &http.default_headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
                }
                _ => tracing::warn!(header = %name, "Skipping invalid default header"),
            }
        }

        router
            .layer(RequestBodyLimitLayer::new(http.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(http.request_timeout_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

/// Combined method filter for a route, or `None` for any method.
fn method_filter(route: &RouteDescriptor) -> Result<Option<MethodFilter>, MountError> {
    let mut combined: Option<MethodFilter> = None;

    for name in &route.methods {
        let filter = Method::from_bytes(name.to_ascii_uppercase().as_bytes())
            .ok()
            .and_then(|method| MethodFilter::try_from(method).ok())
            .ok_or_else(|| MountError::Method {
                route: route.name.clone(),
                method: name.clone(),
            })?;
        combined = Some(match combined {
            Some(existing) => existing.or(filter),
            None => filter,
        });
    }

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> App {
        App::new(Arc::new(AppConfig::default()))
    }

    #[test]
    fn test_instances_have_distinct_ids() {
        assert_ne!(app().id(), app().id());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let route = RouteDescriptor::new("odd", "/").with_methods(["BREW"]);
        let err = app().mount(&route, || async { "" }).unwrap_err();
        assert_eq!(
            err,
            MountError::Method {
                route: "odd".into(),
                method: "BREW".into(),
            }
        );
    }

    #[test]
    fn test_unmountable_paths_rejected() {
        let mut app = app();
        for path in ["items", "/files/{*rest}/meta"] {
            let err = app.route(path, any(|| async { "" })).unwrap_err();
            assert_eq!(err, MountError::InvalidPath(path.into()));
        }

        app.route("/items/{id}", any(|| async { "" })).unwrap();
        let err = app.route("/items/{name}", any(|| async { "" })).unwrap_err();
        assert_eq!(
            err,
            MountError::Conflict {
                path: "/items/{name}".into(),
                existing: "/items/{id}".into(),
            }
        );
        assert!(app.route("/items/{id}", any(|| async { "" })).is_err());
        assert!(app.route("/items/{id}/tags", any(|| async { "" })).is_ok());
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let mut config = AppConfig::default();
        config.http.request_timeout_secs = 1;

        let mut app = App::new(Arc::new(config));
        app.route(
            "/slow",
            any(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        )
        .unwrap();

        let response = app
            .into_router()
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_mount_restricts_methods() {
        let route = RouteDescriptor::new("get", "/items/{id}").with_methods(["get", "HEAD"]);
        let mut app = app();
        app.mount(&route, || async { "item" }).unwrap();
        let router = app.into_router();

        let ok = router
            .clone()
            .oneshot(Request::get("/items/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert!(ok.headers().contains_key("x-request-id"));

        let denied = router
            .oneshot(Request::post("/items/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_extension_and_default_headers() {
        let mut config = AppConfig::default();
        config
            .http
            .default_headers
            .insert("x-frame-options".into(), "DENY".into());

        let route = RouteDescriptor::new("greet", "/");
        let mut app = App::new(Arc::new(config));
        app.insert_extension(String::from("hello"));
        app.mount(&route, |Extension(greeting): Extension<String>| async move { greeting })
            .unwrap();

        let response = app
            .into_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }
}
