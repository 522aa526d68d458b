//! Event adaptation subsystem.
//!
//! # Data Flow
//! ```text
//! Platform invocation (event, context)
//!     → gateway.rs (event → http::Request, context as extension)
//!     → App router (oneshot, no socket)
//!     → gateway.rs (http::Response → proxy response)
//!     → returned to the platform
//! ```
//!
//! # Design Decisions
//! - The adapter consumes the application instance; nothing survives the call
//! - Adapter failures are returned untouched for the platform to report

pub mod context;
pub mod event;
pub mod gateway;

use std::future::Future;

use axum::BoxError;

pub use context::InvocationContext;
pub use event::{BodyError, PayloadVersion, ProxyEvent, ProxyResponse};
pub use gateway::ApiGatewayAdapter;

/// Converts one platform invocation into a completed response using a
/// freshly built application instance.
pub trait EventAdapter<A>: Send + Sync + 'static {
    /// Platform event payload.
    type Event: Send + 'static;
    /// Platform response payload.
    type Response: Send + 'static;

    /// Adapt `app` and run the invocation through it.
    fn dispatch(
        &self,
        app: A,
        event: Self::Event,
        context: InvocationContext,
    ) -> impl Future<Output = Result<Self::Response, BoxError>> + Send;
}
