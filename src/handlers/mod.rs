//! Handler factory subsystem.
//!
//! # Data Flow
//! ```text
//! Build time (once):
//!     AppConfig.routes
//!     → factory.rs (one RouteHandler per route name)
//!     → table.rs (HandlerTable, declaration order kept)
//!
//! Invocation time (every call):
//!     (event, context)
//!     → hooks.rs (optional warm-up)
//!     → AppInitializer (fresh instance)
//!     → ControllerRegistrar (this route only)
//!     → EventAdapter (dispatch)
//!     → response or InvocationError
//! ```
//!
//! # Design Decisions
//! - No state shared between invocations; the handler is safe to call
//!   concurrently
//! - Errors from every phase surface unchanged, tagged with their phase

pub mod error;
pub mod factory;
pub mod hooks;
pub mod table;

pub use error::{BuildError, InvocationError};
pub use factory::{build_handlers, GatewayHandlers, HandlerFactory};
pub use hooks::BeforeStart;
pub use table::{HandlerTable, RouteHandler};
