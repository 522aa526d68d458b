//! Route name → invocation function table.

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::adapter::InvocationContext;
use crate::handlers::error::InvocationError;

type InvokeFn<Ev, Resp> =
    dyn Fn(Ev, InvocationContext) -> BoxFuture<'static, Result<Resp, InvocationError>> + Send + Sync;

/// The invocation entrypoint for one route.
///
/// Cloning is cheap and every clone is independently invocable; calls share
/// no mutable state.
pub struct RouteHandler<Ev, Resp> {
    route: Arc<str>,
    invoke: Arc<InvokeFn<Ev, Resp>>,
}

impl<Ev, Resp> RouteHandler<Ev, Resp> {
    pub(crate) fn new<F>(route: &str, invoke: F) -> Self
    where
        F: Fn(Ev, InvocationContext) -> BoxFuture<'static, Result<Resp, InvocationError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            route: Arc::from(route),
            invoke: Arc::new(invoke),
        }
    }

    /// Name of the route this handler serves.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Handle one platform invocation.
    pub fn invoke(
        &self,
        event: Ev,
        context: InvocationContext,
    ) -> BoxFuture<'static, Result<Resp, InvocationError>> {
        (self.invoke)(event, context)
    }
}

impl<Ev, Resp> Clone for RouteHandler<Ev, Resp> {
    fn clone(&self) -> Self {
        Self {
            route: Arc::clone(&self.route),
            invoke: Arc::clone(&self.invoke),
        }
    }
}

impl<Ev, Resp> std::fmt::Debug for RouteHandler<Ev, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteHandler")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// Handlers keyed by route name. Iterates in route declaration order.
pub struct HandlerTable<Ev, Resp> {
    handlers: HashMap<String, RouteHandler<Ev, Resp>>,
    order: Vec<String>,
}

impl<Ev, Resp> HandlerTable<Ev, Resp> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            handlers: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Insert a handler. Returns false, leaving the table unchanged, when the
    /// name is already taken.
    pub(crate) fn insert(&mut self, handler: RouteHandler<Ev, Resp>) -> bool {
        let name = handler.route().to_string();
        if self.handlers.contains_key(&name) {
            return false;
        }
        self.order.push(name.clone());
        self.handlers.insert(name, handler);
        true
    }

    pub fn get(&self, route: &str) -> Option<&RouteHandler<Ev, Resp>> {
        self.handlers.get(route)
    }

    pub fn contains(&self, route: &str) -> bool {
        self.handlers.contains_key(route)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Route names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Handlers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteHandler<Ev, Resp>> {
        self.order.iter().filter_map(|name| self.handlers.get(name))
    }

    /// Take ownership of a single handler, dropping the rest.
    pub fn remove(&mut self, route: &str) -> Option<RouteHandler<Ev, Resp>> {
        self.order.retain(|name| name != route);
        self.handlers.remove(route)
    }
}

impl<Ev, Resp> Index<&str> for HandlerTable<Ev, Resp> {
    type Output = RouteHandler<Ev, Resp>;

    /// Panics if no route has this name.
    fn index(&self, route: &str) -> &Self::Output {
        self.get(route)
            .unwrap_or_else(|| panic!("no handler for route '{route}'"))
    }
}

impl<Ev, Resp> std::fmt::Debug for HandlerTable<Ev, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("routes", &self.order)
            .finish()
    }
}
