//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; those records are
//! forwarded into the `tracing` subscriber installed here.

use dojo_brackets::BracketKey;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use dojo_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a bracket lifecycle event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of event (`generated`, `result_recorded`, ...)
/// * `key` - Event and category of the bracket
/// * `version` - Bracket version after the event
/// * `request_id` - Id of the request that caused the event
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use dojo_brackets::BracketKey;
/// use dojo_server::logging::log_bracket_event;
/// use uuid::Uuid;
///
/// let key = BracketKey::new(Uuid::new_v4(), Uuid::new_v4());
/// log_bracket_event("generated", &key, 1, "req-42", "Round 1 drawn with 5 entrants");
/// ```
pub fn log_bracket_event(
    event_type: &str,
    key: &BracketKey,
    version: u64,
    request_id: &str,
    message: &str,
) {
    tracing::info!(
        event_type = event_type,
        request_id = request_id,
        event_id = %key.event_id,
        category_id = %key.category_id,
        version = version,
        "BRACKET: {}",
        message
    );
}

/// Log API request/response
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if status_code >= 500 {
        tracing::error!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}
