//! Per-route serverless handlers for axum applications.
//!
//! A route table goes in; one invocation function per route comes out. Each
//! invocation builds a fresh application, registers only its own route's
//! controller, dispatches the platform event and returns the platform
//! response.
//!
//! ```text
//!   AppConfig ──▶ HandlerFactory::build ──▶ HandlerTable { "list" → fn, "get" → fn, ... }
//!
//!   invoke(event, context):
//!       before_start? ──▶ AppInitializer::init ──▶ ControllerRegistrar::register
//!                                                         │
//!       ProxyResponse ◀── EventAdapter::dispatch ◀────────┘
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use adapter::{ApiGatewayAdapter, EventAdapter, InvocationContext, ProxyEvent, ProxyResponse};
pub use app::{App, AppInitializer, ControllerRegistrar, ControllerRegistry, DefaultInitializer};
pub use config::{AppConfig, RouteDescriptor};
pub use handlers::{
    build_handlers, BeforeStart, BuildError, GatewayHandlers, HandlerFactory, HandlerTable,
    InvocationError, RouteHandler,
};
pub use http::LocalServer;
pub use lifecycle::Shutdown;
