//! HTTP surface outside the Lambda runtime.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, path + method → route handler)
//!     → ProxyEvent::from_http (v1 event, local request context)
//!     → RouteHandler::invoke (fresh application per request)
//!     → ProxyResponse::into_response
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::LocalServer;
