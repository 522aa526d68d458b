//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every invocation produces:
//!     → logging.rs (structured log events inside an `invocation` span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → CloudWatch Logs (stdout)
//!     → Prometheus scrape (local server only)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Route name and request id are attached to every invocation span

pub mod logging;
pub mod metrics;
