//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the handler
//! factory. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration shared by every route handler.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Route definitions, in declaration order.
    pub routes: Vec<RouteDescriptor>,

    /// Middleware settings applied to every application instance.
    pub http: HttpConfig,

    /// Event adapter settings.
    pub adapter: AdapterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Local development server settings.
    pub local: LocalConfig,
}

impl AppConfig {
    /// Look up a route by name.
    pub fn route(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name == name)
    }
}

/// A named binding between a path pattern and a controller.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteDescriptor {
    /// Unique route identifier; the key of the handler table.
    #[serde(default)]
    pub name: String,

    /// Axum path pattern (e.g. "/items/{id}").
    #[serde(default = "default_path")]
    pub path: String,

    /// Allowed HTTP methods. Empty means any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Controller registry key. Defaults to the route name.
    #[serde(default)]
    pub controller: Option<String>,

    /// Controller-specific settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

fn default_path() -> String {
    "/".to_string()
}

impl RouteDescriptor {
    /// Create a route bound to `path` whose controller key is its own name.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            methods: Vec::new(),
            controller: None,
            settings: Map::new(),
        }
    }

    /// Set the controller key.
    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Restrict the route to the given methods.
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Add a controller setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// The controller registry key for this route.
    pub fn controller_key(&self) -> &str {
        self.controller.as_deref().unwrap_or(&self.name)
    }
}

/// Middleware configuration for every application instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout (total handler time) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Response headers added when the handler did not set them.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_body_bytes: 6 * 1024 * 1024, // Lambda synchronous payload limit
            default_headers: BTreeMap::new(),
        }
    }
}

/// Event adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// Content types always returned base64 encoded.
    pub binary_content_types: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Colored output. CloudWatch renders escape codes literally.
    pub ansi: bool,

    /// Include timestamps. CloudWatch stamps every line already.
    pub with_time: bool,

    /// Enable the metrics endpoint (local server only).
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: false,
            with_time: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Local development server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_defaults() {
        let route: RouteDescriptor = toml::from_str(r#"name = "list""#).unwrap();
        assert_eq!(route.path, "/");
        assert!(route.methods.is_empty());
        assert_eq!(route.controller_key(), "list");
        assert!(route.settings.is_empty());
    }

    #[test]
    fn test_controller_key_override() {
        let route = RouteDescriptor::new("status", "/status").with_controller("health");
        assert_eq!(route.controller_key(), "health");
    }

    #[test]
    fn test_settings_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [[routes]]
            name = "teapot"
            path = "/tea"
            controller = "fixed"
            settings = { status = 418, body = "short and stout" }
            "#,
        )
        .unwrap();

        let route = config.route("teapot").unwrap();
        assert_eq!(route.settings["status"], 418);
        assert_eq!(route.settings["body"], "short and stout");
        assert_eq!(config.http.request_timeout_secs, 30);
    }
}
