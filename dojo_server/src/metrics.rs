//! Prometheus metrics for monitoring the bracket service.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener.
//! Without an installed exporter every recording call is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and durations
//! - **Bracket Metrics**: Draws, results, rounds, completed tournaments, errors
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use dojo_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::brackets_generated_total(false);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Bracket Metrics
// ============================================================================

/// Increment generated brackets counter; `redraw` marks a replaced round 1.
pub fn brackets_generated_total(redraw: bool) {
    metrics::counter!("brackets_generated_total",
        "redraw" => redraw.to_string()
    )
    .increment(1);
}

/// Record the entrant count of a fresh draw.
pub fn bracket_entrants(count: usize) {
    metrics::histogram!("bracket_entrants").record(count as f64);
}

/// Increment recorded match results counter.
pub fn match_results_recorded_total() {
    metrics::counter!("match_results_recorded_total").increment(1);
}

/// Increment advanced rounds counter.
pub fn rounds_advanced_total() {
    metrics::counter!("rounds_advanced_total").increment(1);
}

/// Increment completed tournaments counter.
pub fn tournaments_completed_total() {
    metrics::counter!("tournaments_completed_total").increment(1);
}

/// Increment rejected bracket operations counter.
pub fn bracket_errors_total(kind: &'static str) {
    metrics::counter!("bracket_errors_total",
        "kind" => kind
    )
    .increment(1);
}
