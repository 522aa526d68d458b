//! API Gateway proxy integration adapter.
//!
//! # Responsibilities
//! - Convert a proxy event plus invocation context into an `http::Request`
//! - Drive the finalized application router without a socket
//! - Convert the `http::Response` back into the proxy response format
//!
//! # Design Decisions
//! - An invalid path, cookie or body fails the invocation
//! - The gateway request context rides along as a request extension
//! - The response mirrors the request's payload version
//! - Bodies are base64 encoded unless they are known text and valid UTF-8

use std::future::Future;

use aws_lambda_events::encodings::Body as PayloadBody;
use aws_lambda_events::event::apigw::{ApiGatewayProxyResponse, ApiGatewayV2httpResponse};
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use axum::BoxError;
use tower::ServiceExt;

use crate::adapter::context::InvocationContext;
use crate::adapter::event::{PayloadVersion, ProxyEvent, ProxyResponse};
use crate::adapter::EventAdapter;
use crate::app::App;
use crate::config::AdapterConfig;
use crate::http::X_REQUEST_ID;

/// Adapts [`App`] instances to API Gateway proxy events.
#[derive(Debug, Clone, Default)]
pub struct ApiGatewayAdapter {
    binary_content_types: Vec<String>,
}

impl ApiGatewayAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            binary_content_types: config
                .binary_content_types
                .iter()
                .map(|ct| ct.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Always base64 encode responses of this content type.
    pub fn binary_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.binary_content_types
            .push(content_type.into().to_ascii_lowercase());
        self
    }

    /// Build the framework request for one event.
    pub fn to_request(&self, mut event: ProxyEvent, context: InvocationContext) -> Result<Request, BoxError> {
        // Version 1.0 paths arrive decoded; re-encode before building the URI.
        let mut base = url::Url::parse("http://localhost")?;
        base.set_path(event.path());
        let mut uri = base.path().to_string();
        if let Some(query) = event.query_string() {
            uri.push('?');
            uri.push_str(&query);
        }

        let body = event.take_body()?;
        let mut request = axum::http::Request::builder()
            .method(event.method())
            .uri(uri)
            .body(Body::from(body))?;

        let headers = request.headers_mut();
        for (name, value) in event.headers() {
            headers.append(name.clone(), value.clone());
        }
        if let Some(cookie) = event.cookie_header() {
            headers.insert(header::COOKIE, HeaderValue::from_str(&cookie)?);
        }
        if !headers.contains_key(X_REQUEST_ID) && !context.request_id.is_empty() {
            headers.insert(X_REQUEST_ID, HeaderValue::from_str(&context.request_id)?);
        }

        match event {
            ProxyEvent::V1(event) => {
                request.extensions_mut().insert(event.request_context);
            }
            ProxyEvent::V2(event) => {
                request.extensions_mut().insert(event.request_context);
            }
        }
        request.extensions_mut().insert(context);
        Ok(request)
    }

    /// Convert the framework response into the event's payload format.
    pub async fn to_proxy_response(
        &self,
        response: Response,
        version: PayloadVersion,
    ) -> Result<ProxyResponse, BoxError> {
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await?;

        let (body, is_base64_encoded) = if bytes.is_empty() {
            (None, false)
        } else {
            match std::str::from_utf8(&bytes) {
                Ok(text) if !self.is_binary(&parts.headers) => {
                    (Some(PayloadBody::Text(text.to_string())), false)
                }
                _ => (Some(PayloadBody::Binary(bytes.to_vec())), true),
            }
        };
        let status_code = i64::from(parts.status.as_u16());

        match version {
            PayloadVersion::V1 => {
                let mut headers = HeaderMap::new();
                for name in parts.headers.keys() {
                    if let Some(last) = parts.headers.get_all(name).iter().last() {
                        headers.insert(name.clone(), last.clone());
                    }
                }

                let mut proxied = ApiGatewayProxyResponse::default();
                proxied.status_code = status_code;
                proxied.headers = headers;
                proxied.multi_value_headers = parts.headers;
                proxied.body = body;
                proxied.is_base64_encoded = is_base64_encoded;
                Ok(ProxyResponse::V1(proxied))
            }
            PayloadVersion::V2 => {
                let mut headers = HeaderMap::new();
                let mut cookies = Vec::new();
                for name in parts.headers.keys() {
                    let values: Vec<&str> = parts
                        .headers
                        .get_all(name)
                        .iter()
                        .filter_map(|v| v.to_str().ok())
                        .collect();
                    if values.is_empty() {
                        continue;
                    }

                    if *name == header::SET_COOKIE {
                        cookies.extend(values.into_iter().map(str::to_string));
                    } else {
                        headers.insert(name.clone(), HeaderValue::from_str(&values.join(","))?);
                    }
                }

                let mut proxied = ApiGatewayV2httpResponse::default();
                proxied.status_code = status_code;
                proxied.headers = headers;
                proxied.cookies = cookies;
                proxied.body = body;
                proxied.is_base64_encoded = is_base64_encoded;
                Ok(ProxyResponse::V2(proxied))
            }
        }
    }

    fn is_binary(&self, headers: &HeaderMap) -> bool {
        if headers.contains_key(header::CONTENT_ENCODING) {
            return true;
        }
        let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        self.binary_content_types.iter().any(|ct| *ct == essence) || !is_textual(&essence)
    }
}

fn is_textual(essence: &str) -> bool {
    essence.starts_with("text/")
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
        || matches!(
            essence,
            "application/json"
                | "application/javascript"
                | "application/xml"
                | "application/x-www-form-urlencoded"
                | "application/graphql"
        )
}

impl EventAdapter<App> for ApiGatewayAdapter {
    type Event = ProxyEvent;
    type Response = ProxyResponse;

    fn dispatch(
        &self,
        app: App,
        event: ProxyEvent,
        context: InvocationContext,
    ) -> impl Future<Output = Result<ProxyResponse, BoxError>> + Send {
        let version = event.payload_version();
        let request = self.to_request(event, context);
        let router = app.into_router();

        async move {
            let response = match router.oneshot(request?).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            self.to_proxy_response(response, version).await
        }
    }
}
