//! Built-in controllers.
//!
//! - `echo`: reflects the request back as JSON
//! - `health`: liveness probe
//! - `fixed`: a static response taken from the route's settings

use std::collections::BTreeMap;

use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::adapter::InvocationContext;
use crate::app::instance::App;
use crate::config::RouteDescriptor;

/// A route setting has the wrong shape for its controller.
#[derive(Debug, Error)]
#[error("route '{route}': setting '{key}' {reason}")]
pub struct SettingError {
    pub route: String,
    pub key: &'static str,
    pub reason: &'static str,
}

/// Mounts a handler that answers with a JSON description of the request.
pub fn echo(app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError> {
    let name = route.name.clone();
    app.mount(route, move |request: Request| {
        let name = name.clone();
        async move { echo_request(&name, request).await }
    })?;
    Ok(())
}

async fn echo_request(route: &str, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let headers: BTreeMap<String, String> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let request_id = parts
        .extensions
        .get::<InvocationContext>()
        .map(|ctx| ctx.request_id.clone());

    Json(json!({
        "route": route,
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
        "request_id": request_id,
    }))
    .into_response()
}

/// Mounts a liveness handler.
pub fn health(app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError> {
    let body = json!({
        "status": "ok",
        "route": route.name,
        "version": env!("CARGO_PKG_VERSION"),
    });
    app.mount(route, move || {
        let body = body.clone();
        async move { Json(body) }
    })?;
    Ok(())
}

/// Mounts a handler answering with `settings.status`, `settings.body` and
/// `settings.content_type`.
pub fn fixed(app: &mut App, route: &RouteDescriptor) -> Result<(), BoxError> {
    let invalid = |key, reason| SettingError {
        route: route.name.clone(),
        key,
        reason,
    };

    let status = match route.settings.get("status") {
        None => StatusCode::OK,
        Some(value) => value
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| invalid("status", "must be an HTTP status code"))?,
    };

    let body = match route.settings.get("body") {
        None => String::new(),
        Some(Value::String(body)) => body.clone(),
        Some(_) => return Err(invalid("body", "must be a string").into()),
    };

    let content_type = match route.settings.get("content_type") {
        None => HeaderValue::from_static("text/plain; charset=utf-8"),
        Some(value) => value
            .as_str()
            .and_then(|v| HeaderValue::from_str(v).ok())
            .ok_or_else(|| invalid("content_type", "must be a valid header value"))?,
    };

    app.mount(route, move || {
        let response = (status, [(header::CONTENT_TYPE, content_type.clone())], body.clone());
        async move { response }
    })?;
    Ok(())
}
