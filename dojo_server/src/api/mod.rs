//! HTTP API for the bracket service.
//!
//! # Modules
//!
//! - [`brackets`]: Bracket listing, generation, results and advancement
//! - [`request_id`]: Request correlation and access logging
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Server health status
//! - `GET /api/v1/events/{event_id}/brackets` - Brackets of an event
//! - `GET /api/v1/events/{event_id}/categories/{category_id}/bracket` - One bracket
//! - `POST /api/v1/events/{event_id}/categories/{category_id}/bracket` - Generate round 1
//! - `POST /api/v1/events/{event_id}/categories/{category_id}/bracket/results` - Record a result
//! - `POST /api/v1/events/{event_id}/categories/{category_id}/bracket/advance` - Next round
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use dojo_brackets::{BracketManager, InMemoryBracketStore, db::StaticParticipantSource};
//! use dojo_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     bracket_manager: Arc::new(BracketManager::new(Arc::new(InMemoryBracketStore::new()))),
//!     participants: Arc::new(StaticParticipantSource::new()),
//!     database: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod brackets;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use dojo_brackets::{BracketManager, Database, ParticipantSource};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// - `bracket_manager`: Serialised, versioned bracket operations
/// - `participants`: Resolves entrants when a draw request names none
/// - `database`: Connection pool when running on PostgreSQL
#[derive(Clone)]
pub struct AppState {
    pub bracket_manager: Arc<BracketManager>,
    pub participants: Arc<dyn ParticipantSource>,
    pub database: Option<Database>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET  /health
/// GET  /api/v1/events/{event_id}/brackets
/// GET  /api/v1/events/{event_id}/categories/{category_id}/bracket
/// POST /api/v1/events/{event_id}/categories/{category_id}/bracket
/// POST /api/v1/events/{event_id}/categories/{category_id}/bracket/results
/// POST /api/v1/events/{event_id}/categories/{category_id}/bracket/advance
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/brackets",
            get(brackets::list_event_brackets),
        )
        .route(
            "/events/{event_id}/categories/{category_id}/bracket",
            get(brackets::get_bracket).post(brackets::generate_bracket),
        )
        .route(
            "/events/{event_id}/categories/{category_id}/bracket/results",
            axum::routing::post(brackets::record_result),
        )
        .route(
            "/events/{event_id}/categories/{category_id}/bracket/advance",
            axum::routing::post(brackets::advance_bracket),
        )
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","storage":"memory","database":null,"version":"0.1.0","timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(database) => ("postgres", Some(database.health_check().await.is_ok())),
        None => ("memory", None),
    };

    let overall_healthy = db_healthy.unwrap_or(true);

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if overall_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
