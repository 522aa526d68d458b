//! Application construction.

use std::future::Future;
use std::sync::Arc;

use axum::BoxError;

use crate::app::instance::App;
use crate::config::AppConfig;

/// Builds a new, unconfigured application instance for one invocation.
///
/// Implementations must not hand out the same instance twice.
pub trait AppInitializer: Send + Sync + 'static {
    /// The application type produced.
    type App: Send + 'static;

    /// Construct a fresh application from the full configuration.
    fn init(&self, config: &Arc<AppConfig>) -> impl Future<Output = Result<Self::App, BoxError>> + Send;
}

type Plugin = Arc<dyn Fn(&mut App) -> Result<(), BoxError> + Send + Sync>;

/// Builds [`App`] instances and applies shared plugins to each of them.
#[derive(Clone, Default)]
pub struct DefaultInitializer {
    plugins: Vec<Plugin>,
}

impl DefaultInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin run on every fresh instance, in insertion order.
    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: Fn(&mut App) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.plugins.push(Arc::new(plugin));
        self
    }

    fn build(&self, config: &Arc<AppConfig>) -> Result<App, BoxError> {
        let mut app = App::new(Arc::clone(config));
        for plugin in &self.plugins {
            plugin(&mut app)?;
        }
        tracing::debug!(instance = %app.id(), plugins = self.plugins.len(), "Application initialized");
        Ok(app)
    }
}

impl AppInitializer for DefaultInitializer {
    type App = App;

    fn init(&self, config: &Arc<AppConfig>) -> impl Future<Output = Result<App, BoxError>> + Send {
        let result = self.build(config);
        async move { result }
    }
}

impl std::fmt::Debug for DefaultInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultInitializer")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plugins_run_in_order() {
        let initializer = DefaultInitializer::new()
            .plugin(|app| {
                app.insert_extension(1u8);
                Ok(())
            })
            .plugin(|_| Err("second plugin failed".into()));

        let err = initializer
            .init(&Arc::new(AppConfig::default()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "second plugin failed");
    }

    #[tokio::test]
    async fn test_fresh_instance_per_call() {
        let initializer = DefaultInitializer::new();
        let config = Arc::new(AppConfig::default());

        let a = initializer.init(&config).await.unwrap();
        let b = initializer.init(&config).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.registered().is_empty());
    }
}
