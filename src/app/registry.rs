//! Controller registration.
//!
//! # Responsibilities
//! - Map a route's controller key to its request-handling logic
//! - Attach exactly one route's controller to an application instance
//!
//! # Design Decisions
//! - Registry is built once and shared read-only by every handler
//! - Unknown controller keys fail the invocation, not the build

use std::collections::HashMap;
use std::sync::Arc;

use axum::BoxError;
use thiserror::Error;

use crate::app::controllers;
use crate::app::instance::App;
use crate::config::RouteDescriptor;

/// Attaches a route's controller to an application instance in place.
pub trait ControllerRegistrar<A>: Send + Sync + 'static {
    fn register(&self, app: &mut A, route: &RouteDescriptor) -> Result<(), BoxError>;
}

/// Request-handling logic bound to a route.
pub trait Controller: Send + Sync + 'static {
    fn register(&self, app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError>;
}

impl<F> Controller for F
where
    F: Fn(&mut App, &RouteDescriptor) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn register(&self, app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError> {
        self(app, route)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no controller registered under '{key}' (route '{route}')")]
    UnknownController { key: String, route: String },
}

/// Controllers keyed by name.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `echo`, `health` and `fixed` controllers.
    pub fn builtin() -> Self {
        Self::new()
            .controller("echo", controllers::echo)
            .controller("health", controllers::health)
            .controller("fixed", controllers::fixed)
    }

    /// Register `controller` under `key`, replacing any previous one.
    pub fn controller(mut self, key: impl Into<String>, controller: impl Controller) -> Self {
        self.controllers.insert(key.into(), Arc::new(controller));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.controllers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl ControllerRegistrar<App> for ControllerRegistry {
    fn register(&self, app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError> {
        let key = route.controller_key();
        let controller = self
            .controllers
            .get(key)
            .ok_or_else(|| RegistryError::UnknownController {
                key: key.to_string(),
                route: route.name.clone(),
            })?;

        controller.register(app, route)?;
        app.mark_registered(&route.name);

        tracing::debug!(instance = %app.id(), route = %route.name, controller = key, "Controller registered");
        Ok(())
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.keys())
            .finish()
    }
}
