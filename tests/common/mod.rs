//! Shared stub collaborators for integration tests.
//!
//! Every stub appends to one [`EventLog`] so tests can assert on the order
//! of phases across collaborators.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::BoxError;
use sls_axum::adapter::{EventAdapter, InvocationContext};
use sls_axum::app::{AppInitializer, ControllerRegistrar};
use sls_axum::config::{AppConfig, RouteDescriptor};

/// Ordered record of side effects.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Application stand-in: an id and the routes registered on it.
#[derive(Debug)]
pub struct StubApp {
    pub id: usize,
    pub routes: Vec<String>,
}

/// Initializer that numbers each instance it constructs.
#[derive(Clone, Default)]
pub struct CountingInitializer {
    pub log: EventLog,
    pub count: Arc<AtomicUsize>,
    pub fail_with: Option<&'static str>,
}

impl CountingInitializer {
    pub fn calls(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl AppInitializer for CountingInitializer {
    type App = StubApp;

    fn init(&self, _config: &Arc<AppConfig>) -> impl Future<Output = Result<StubApp, BoxError>> + Send {
        let id = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.push(format!("init:{id}"));
        let result: Result<StubApp, BoxError> = match self.fail_with {
            Some(message) => Err(message.into()),
            None => Ok(StubApp { id, routes: Vec::new() }),
        };
        async move { result }
    }
}

/// Registrar recording `(instance id, route name)` pairs.
#[derive(Clone, Default)]
pub struct RecordingRegistrar {
    pub log: EventLog,
    pub registrations: Arc<Mutex<Vec<(usize, String)>>>,
}

impl RecordingRegistrar {
    pub fn pairs(&self) -> Vec<(usize, String)> {
        self.registrations.lock().unwrap().clone()
    }
}

impl ControllerRegistrar<StubApp> for RecordingRegistrar {
    fn register(&self, app: &mut StubApp, route: &RouteDescriptor) -> Result<(), BoxError> {
        self.log.push(format!("register:{}:{}", app.id, route.name));
        self.registrations
            .lock()
            .unwrap()
            .push((app.id, route.name.clone()));
        app.routes.push(route.name.clone());
        Ok(())
    }
}

/// What the recording adapter hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub instance: usize,
    pub routes: Vec<String>,
    pub event: String,
    pub request_id: String,
}

/// Error returned by a failing [`RecordingAdapter`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct DispatchFailure {
    pub reason: &'static str,
}

/// Adapter that echoes the instance it was given, optionally after a delay.
/// With `fail_with` set it logs the dispatch and fails with [`DispatchFailure`].
#[derive(Clone, Default)]
pub struct RecordingAdapter {
    pub log: EventLog,
    pub delay: Duration,
    pub fail_with: Option<&'static str>,
}

impl EventAdapter<StubApp> for RecordingAdapter {
    type Event = String;
    type Response = Dispatched;

    fn dispatch(
        &self,
        app: StubApp,
        event: String,
        context: InvocationContext,
    ) -> impl Future<Output = Result<Dispatched, BoxError>> + Send {
        let log = self.log.clone();
        let delay = self.delay;
        let fail_with = self.fail_with;
        async move {
            log.push(format!("dispatch:{}:{event}", app.id));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(reason) = fail_with {
                return Err(DispatchFailure { reason }.into());
            }
            Ok(Dispatched {
                instance: app.id,
                routes: app.routes,
                event,
                request_id: context.request_id,
            })
        }
    }
}

/// Route table with one route per name, each bound to `/<name>`.
pub fn routes(names: &[&str]) -> AppConfig {
    AppConfig {
        routes: names
            .iter()
            .map(|name| RouteDescriptor::new(*name, format!("/{name}")))
            .collect(),
        ..Default::default()
    }
}
