//! Request identification.
//!
//! # Responsibilities
//! - Name the request id header shared by the adapter and the middleware
//!
//! # Design Decisions
//! - The Lambda request id seeds `x-request-id` when the client sent none,
//!   so application logs and platform logs correlate
//! - Generation and propagation use tower-http's request-id layers

use axum::http::HeaderName;

/// Request id header, read and written by every application instance.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
