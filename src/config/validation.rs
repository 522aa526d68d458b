//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Route names present and unique
//! - Paths and methods well formed, no two paths axum would refuse to
//!   route side by side
//! - Value ranges (timeouts > 0, header names/values valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::MethodFilter;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has no name")]
    EmptyRouteName { index: usize },

    #[error("route name '{0}' is declared more than once")]
    DuplicateRouteName(String),

    #[error("route '{route}' has invalid path '{path}'")]
    InvalidPath { route: String, path: String },

    #[error("route '{route}' path conflicts with route '{other}'")]
    ConflictingPath { route: String, other: String },

    #[error("route '{route}' lists unknown method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid default header '{name}'")]
    InvalidHeader { name: String },
}

/// Paths must be absolute axum patterns: `{name}` captures and a
/// `{*rest}` wildcard as the last segment, no legacy `:name` segments.
pub(crate) fn is_valid_path(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let last = segments.len() - 1;

    segments.iter().enumerate().all(|(i, segment)| {
        if segment.starts_with(':') || segment.starts_with('*') {
            return false;
        }
        match capture(segment) {
            Some(Capture::Wildcard(name)) => i == last && is_capture_name(name),
            Some(Capture::Param(name)) => is_capture_name(name),
            None => !segment.contains(['{', '}']),
        }
    })
}

/// Whether two valid paths bind different capture names at the same
/// position of a shared prefix. axum rejects such pairs in one router.
pub(crate) fn paths_conflict(a: &str, b: &str) -> bool {
    for (left, right) in a.split('/').zip(b.split('/')) {
        if left == right {
            continue;
        }
        return matches!(
            (capture(left), capture(right)),
            (Some(Capture::Param(_)), Some(Capture::Param(_)))
                | (Some(Capture::Wildcard(_)), Some(Capture::Wildcard(_)))
        );
    }
    false
}

enum Capture<'a> {
    Param(&'a str),
    Wildcard(&'a str),
}

fn capture(segment: &str) -> Option<Capture<'_>> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    Some(match inner.strip_prefix('*') {
        Some(name) => Capture::Wildcard(name),
        None => Capture::Param(inner),
    })
}

fn is_capture_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['{', '}', '*'])
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if !is_valid_path(&route.path) {
            errors.push(ValidationError::InvalidPath {
                route: route.name.clone(),
                path: route.path.clone(),
            });
        } else if let Some(other) = config.routes[..index]
            .iter()
            .find(|other| paths_conflict(&other.path, &route.path))
        {
            errors.push(ValidationError::ConflictingPath {
                route: route.name.clone(),
                other: other.name.clone(),
            });
        }

        for method in &route.methods {
            let routable = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .ok()
                .and_then(|m| MethodFilter::try_from(m).ok())
                .is_some();
            if !routable {
                errors.push(ValidationError::InvalidMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }
    }

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for (name, value) in &config.http.default_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeader { name: name.clone() });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
