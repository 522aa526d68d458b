//! Application subsystem.
//!
//! # Data Flow
//! ```text
//! Per invocation:
//!     AppConfig (shared, read-only)
//!     → initializer.rs (fresh App + shared plugins)
//!     → registry.rs (attach this route's controller only)
//!     → instance.rs (finalize into axum Router + middleware)
//!     → handed to the event adapter
//! ```
//!
//! # Design Decisions
//! - An App is never shared: one per invocation, dropped when it completes
//! - Initializer and registrar are traits so the handler factory can be
//!   driven by any framework, not only axum

pub mod controllers;
pub mod initializer;
pub mod instance;
pub mod registry;

pub use initializer::{AppInitializer, DefaultInitializer};
pub use instance::{App, MountError};
pub use registry::{Controller, ControllerRegistrar, ControllerRegistry, RegistryError};
