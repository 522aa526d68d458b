//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc with every route handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a cold start is the only reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AdapterConfig;
pub use schema::AppConfig;
pub use schema::HttpConfig;
pub use schema::LocalConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouteDescriptor;
pub use validation::{validate_config, ValidationError};
