//! Per-route handler construction.
//!
//! # Responsibilities
//! - Turn the route table into one invocation function per route name
//! - Run warm-up, construction, registration and dispatch, in that order,
//!   on every invocation
//! - Record a span, a counter and a latency histogram per invocation
//!
//! # Design Decisions
//! - `build` does no application work; everything is deferred to invocation
//! - Each invocation owns its application instance; nothing is cached
//! - Handlers capture only `Arc`s to read-only data, so the same handler can
//!   run concurrently without locks
//! - Duplicate route names are rejected rather than overwritten
//! - Paths axum would panic on are rejected at build, never at invocation

use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::Instrument;

use crate::adapter::{ApiGatewayAdapter, EventAdapter, InvocationContext, ProxyEvent, ProxyResponse};
use crate::app::{AppInitializer, ControllerRegistrar, ControllerRegistry, DefaultInitializer};
use crate::config::validation::{is_valid_path, paths_conflict};
use crate::config::{AppConfig, RouteDescriptor};
use crate::handlers::error::{BuildError, InvocationError};
use crate::handlers::hooks::BeforeStart;
use crate::handlers::table::{HandlerTable, RouteHandler};
use crate::observability::metrics;

/// Handler table produced by the default axum + API Gateway stack.
pub type GatewayHandlers = HandlerTable<ProxyEvent, ProxyResponse>;

/// Builds handler tables from an initializer, a registrar and an adapter.
pub struct HandlerFactory<I, R, E> {
    initializer: Arc<I>,
    registrar: Arc<R>,
    adapter: Arc<E>,
}

impl<I, R, E> HandlerFactory<I, R, E>
where
    I: AppInitializer,
    R: ControllerRegistrar<I::App>,
    E: EventAdapter<I::App>,
{
    pub fn new(initializer: I, registrar: R, adapter: E) -> Self {
        Self {
            initializer: Arc::new(initializer),
            registrar: Arc::new(registrar),
            adapter: Arc::new(adapter),
        }
    }

    /// Produce one handler per route, keyed by route name.
    pub fn build(
        &self,
        config: impl Into<Arc<AppConfig>>,
        before_start: Option<BeforeStart>,
    ) -> Result<HandlerTable<E::Event, E::Response>, BuildError> {
        let config = config.into();
        let mut table = HandlerTable::with_capacity(config.routes.len());

        for (index, route) in config.routes.iter().enumerate() {
            if route.name.trim().is_empty() {
                return Err(BuildError::MissingName { index });
            }
            check_path(route, &config.routes[..index])?;
            let handler = self.route_handler(&config, route, before_start.clone());
            if !table.insert(handler) {
                return Err(BuildError::DuplicateRoute(route.name.clone()));
            }
        }

        tracing::debug!(
            routes = table.len(),
            warm_up = before_start.is_some(),
            "Handler table built"
        );
        Ok(table)
    }

    fn route_handler(
        &self,
        config: &Arc<AppConfig>,
        route: &RouteDescriptor,
        before_start: Option<BeforeStart>,
    ) -> RouteHandler<E::Event, E::Response> {
        let initializer = Arc::clone(&self.initializer);
        let registrar = Arc::clone(&self.registrar);
        let adapter = Arc::clone(&self.adapter);
        let config = Arc::clone(config);
        let descriptor = Arc::new(route.clone());

        RouteHandler::new(&route.name, move |event, context: InvocationContext| {
            let initializer = Arc::clone(&initializer);
            let registrar = Arc::clone(&registrar);
            let adapter = Arc::clone(&adapter);
            let config = Arc::clone(&config);
            let route = Arc::clone(&descriptor);
            let before_start = before_start.clone();
            let span = tracing::info_span!(
                "invocation",
                route = %route.name,
                request_id = %context.request_id
            );

            async move {
                let start = Instant::now();
                let result = run_invocation(
                    &*initializer,
                    &*registrar,
                    &*adapter,
                    &config,
                    &route,
                    before_start.as_ref(),
                    event,
                    context,
                )
                .await;

                match &result {
                    Ok(_) => {
                        metrics::record_invocation(&route.name, "ok", start);
                        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Invocation complete");
                    }
                    Err(e) => {
                        metrics::record_invocation(&route.name, e.phase(), start);
                        tracing::error!(phase = e.phase(), error = %e, "Invocation failed");
                    }
                }
                result
            }
            .instrument(span)
            .boxed()
        })
    }
}

/// Reject a path axum cannot mount, or one that cannot share a router with
/// the routes before it.
pub(crate) fn check_path(route: &RouteDescriptor, earlier: &[RouteDescriptor]) -> Result<(), BuildError> {
    if !is_valid_path(&route.path) {
        return Err(BuildError::InvalidPath {
            route: route.name.clone(),
            path: route.path.clone(),
        });
    }
    match earlier.iter().find(|other| paths_conflict(&other.path, &route.path)) {
        Some(other) => Err(BuildError::ConflictingPath {
            route: route.name.clone(),
            other: other.name.clone(),
        }),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_invocation<I, R, E>(
    initializer: &I,
    registrar: &R,
    adapter: &E,
    config: &Arc<AppConfig>,
    route: &RouteDescriptor,
    before_start: Option<&BeforeStart>,
    event: E::Event,
    context: InvocationContext,
) -> Result<E::Response, InvocationError>
where
    I: AppInitializer,
    R: ControllerRegistrar<I::App>,
    E: EventAdapter<I::App>,
{
    if let Some(hook) = before_start {
        hook.run().await.map_err(InvocationError::BeforeStart)?;
    }

    let mut app = initializer
        .init(config)
        .await
        .map_err(InvocationError::Initialize)?;

    registrar
        .register(&mut app, route)
        .map_err(InvocationError::Register)?;

    adapter
        .dispatch(app, event, context)
        .await
        .map_err(InvocationError::Dispatch)
}

impl<I, R, E> Clone for HandlerFactory<I, R, E> {
    fn clone(&self) -> Self {
        Self {
            initializer: Arc::clone(&self.initializer),
            registrar: Arc::clone(&self.registrar),
            adapter: Arc::clone(&self.adapter),
        }
    }
}

/// Build handlers with the default stack: [`DefaultInitializer`], the given
/// controller registry, and an [`ApiGatewayAdapter`] configured from
/// `config.adapter`.
pub fn build_handlers(
    config: impl Into<Arc<AppConfig>>,
    registry: ControllerRegistry,
    before_start: Option<BeforeStart>,
) -> Result<GatewayHandlers, BuildError> {
    let config = config.into();
    let adapter = ApiGatewayAdapter::from_config(&config.adapter);
    HandlerFactory::new(DefaultInitializer::new(), registry, adapter).build(config, before_start)
}
