//! API Gateway proxy payloads.
//!
//! REST APIs deliver version 1.0 events, HTTP APIs deliver version 2.0. Both
//! are the `aws_lambda_events` types; this module only tells them apart and
//! reads the fields the adapter needs.

use std::collections::HashMap;

use aws_lambda_events::event::apigw::{
    ApiGatewayProxyRequest, ApiGatewayProxyResponse, ApiGatewayV2httpRequest,
    ApiGatewayV2httpResponse,
};
use aws_lambda_events::encodings::Body as PayloadBody;
use aws_lambda_events::query_map::QueryMap;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Payload format of an API Gateway proxy integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    V1,
    V2,
}

/// An API Gateway proxy integration event of either payload version.
///
/// Deserialization looks at `version`: `"2.0"` selects the HTTP API format,
/// anything else the REST format.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProxyEvent {
    V1(ApiGatewayProxyRequest),
    V2(ApiGatewayV2httpRequest),
}

impl Default for ProxyEvent {
    fn default() -> Self {
        Self::V1(ApiGatewayProxyRequest::default())
    }
}

impl<'de> Deserialize<'de> for ProxyEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("version").and_then(Value::as_str) == Some("2.0") {
            serde_json::from_value(value).map(Self::V2).map_err(D::Error::custom)
        } else {
            serde_json::from_value(value).map(Self::V1).map_err(D::Error::custom)
        }
    }
}

impl From<ApiGatewayProxyRequest> for ProxyEvent {
    fn from(request: ApiGatewayProxyRequest) -> Self {
        Self::V1(request)
    }
}

impl From<ApiGatewayV2httpRequest> for ProxyEvent {
    fn from(request: ApiGatewayV2httpRequest) -> Self {
        Self::V2(request)
    }
}

/// The request body could not be turned into an event.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),
}

impl ProxyEvent {
    pub fn payload_version(&self) -> PayloadVersion {
        match self {
            Self::V1(_) => PayloadVersion::V1,
            Self::V2(_) => PayloadVersion::V2,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::V1(r) => r.http_method.clone(),
            Self::V2(r) => r.request_context.http.method.clone(),
        }
    }

    /// Request path; "/" when the event carries none.
    pub fn path(&self) -> &str {
        let path = match self {
            Self::V1(r) => r.path.as_deref(),
            Self::V2(r) => r.raw_path.as_deref(),
        };
        path.filter(|p| !p.is_empty()).unwrap_or("/")
    }

    /// Encoded query string without the leading '?', if any.
    pub fn query_string(&self) -> Option<String> {
        let query = match self {
            Self::V2(r) => r.raw_query_string.clone().unwrap_or_default(),
            Self::V1(r) => {
                let params = if r.multi_value_query_string_parameters.is_empty() {
                    &r.query_string_parameters
                } else {
                    &r.multi_value_query_string_parameters
                };
                let mut pairs: Vec<(&str, &str)> = params.iter().collect();
                pairs.sort_by(|a, b| a.0.cmp(b.0));

                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in pairs {
                    serializer.append_pair(key, value);
                }
                serializer.finish()
            }
        };
        (!query.is_empty()).then_some(query)
    }

    /// Request headers, multi-value headers preferred for version 1.0.
    pub fn headers(&self) -> &HeaderMap {
        match self {
            Self::V1(r) if !r.multi_value_headers.is_empty() => &r.multi_value_headers,
            Self::V1(r) => &r.headers,
            Self::V2(r) => &r.headers,
        }
    }

    /// Version 2.0 cookies folded into a single `cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        match self {
            Self::V2(r) => r
                .cookies
                .as_ref()
                .filter(|cookies| !cookies.is_empty())
                .map(|cookies| cookies.join("; ")),
            Self::V1(_) => None,
        }
    }

    pub fn source_ip(&self) -> Option<&str> {
        match self {
            Self::V1(r) => r.request_context.identity.source_ip.as_deref(),
            Self::V2(r) => r.request_context.http.source_ip.as_deref(),
        }
    }

    /// Gateway request id from the request context.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::V1(r) => r.request_context.request_id.as_deref(),
            Self::V2(r) => r.request_context.request_id.as_deref(),
        }
    }

    /// Remove and decode the body.
    pub fn take_body(&mut self) -> Result<Vec<u8>, base64::DecodeError> {
        let (body, encoded) = match self {
            Self::V1(r) => (r.body.take(), r.is_base64_encoded),
            Self::V2(r) => (r.body.take(), r.is_base64_encoded),
        };
        match body {
            None => Ok(Vec::new()),
            Some(body) if encoded => STANDARD.decode(body),
            Some(body) => Ok(body.into_bytes()),
        }
    }

    /// Build a version 1.0 event from an HTTP request, as API Gateway would.
    pub async fn from_http(request: Request, max_body_bytes: usize) -> Result<Self, BodyError> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, max_body_bytes)
            .await
            .map_err(|e| {
                if exceeds_limit(&e) {
                    BodyError::TooLarge { limit: max_body_bytes }
                } else {
                    BodyError::Read(e)
                }
            })?;

        let mut query: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(raw) = parts.uri.query() {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                query.entry(key.into_owned()).or_default().push(value.into_owned());
            }
        }
        let query = QueryMap::from(query);

        let mut event = ApiGatewayProxyRequest::default();
        event.http_method = parts.method;
        event.path = Some(parts.uri.path().to_string());
        event.headers = parts.headers.clone();
        event.multi_value_headers = parts.headers;
        event.query_string_parameters = query.clone();
        event.multi_value_query_string_parameters = query;
        event.request_context.request_id = Some(Uuid::new_v4().to_string());
        event.request_context.stage = Some("local".to_string());

        if !bytes.is_empty() {
            match std::str::from_utf8(&bytes) {
                Ok(text) => event.body = Some(text.to_string()),
                Err(_) => {
                    event.body = Some(STANDARD.encode(&bytes));
                    event.is_base64_encoded = true;
                }
            }
        }

        Ok(Self::V1(event))
    }
}

fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// An API Gateway proxy integration response, in the event's payload version.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProxyResponse {
    V1(ApiGatewayProxyResponse),
    V2(ApiGatewayV2httpResponse),
}

impl ProxyResponse {
    pub fn status_code(&self) -> i64 {
        match self {
            Self::V1(r) => r.status_code,
            Self::V2(r) => r.status_code,
        }
    }

    /// Single-value headers. Version 2.0 repeated headers are comma joined.
    pub fn headers(&self) -> &HeaderMap {
        match self {
            Self::V1(r) => &r.headers,
            Self::V2(r) => &r.headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_base64_encoded(&self) -> bool {
        match self {
            Self::V1(r) => r.is_base64_encoded,
            Self::V2(r) => r.is_base64_encoded,
        }
    }

    fn body(&self) -> Option<&PayloadBody> {
        match self {
            Self::V1(r) => r.body.as_ref(),
            Self::V2(r) => r.body.as_ref(),
        }
    }

    /// Decoded body bytes.
    pub fn body_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self.body() {
            Some(PayloadBody::Binary(bytes)) => Ok(bytes.clone()),
            Some(PayloadBody::Text(text)) if self.is_base64_encoded() => STANDARD.decode(text),
            Some(PayloadBody::Text(text)) => Ok(text.clone().into_bytes()),
            _ => Ok(Vec::new()),
        }
    }

    /// Body text, when the body is not binary.
    pub fn body_text(&self) -> Option<&str> {
        match self.body() {
            Some(PayloadBody::Text(text)) if !self.is_base64_encoded() => Some(text),
            _ => None,
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = u16::try_from(self.status_code())
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok());
        let Some(status) = status else {
            return (StatusCode::BAD_GATEWAY, "Invalid status code from handler").into_response();
        };
        let Ok(body) = self.body_bytes() else {
            return (StatusCode::BAD_GATEWAY, "Invalid base64 body from handler").into_response();
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;

        match self {
            Self::V1(r) => {
                let headers = if r.multi_value_headers.is_empty() {
                    r.headers
                } else {
                    r.multi_value_headers
                };
                *response.headers_mut() = headers;
            }
            Self::V2(r) => {
                *response.headers_mut() = r.headers;
                for cookie in &r.cookies {
                    if let Ok(value) = HeaderValue::from_str(cookie) {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                }
            }
        }

        response
    }
}
