//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sls_invocations_total` (counter): invocations by route and outcome
//!   (`ok` or the failing phase)
//! - `sls_invocation_duration_seconds` (histogram): latency by route
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so Lambda
//!   deployments pay nothing by default
//! - The Prometheus endpoint is only started by the local server

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Record one finished invocation.
pub fn record_invocation(route: &str, outcome: &'static str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    ::metrics::counter!(
        "sls_invocations_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("sls_invocation_duration_seconds", "route" => route.to_string())
        .record(elapsed);
}

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}
