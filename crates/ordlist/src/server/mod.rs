mod error;
mod listing;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use ordlist_core::{ListingNetwork, ListingService};

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub listings: Arc<ListingService>,
    pub network: ListingNetwork,
    pub request_timeout: Duration,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, allowed_origins: &[HeaderValue]) -> Router {
    let shared = Arc::new(state);

    let listing_api = Router::new()
        .route("/api/v1/create-listing", post(listing::create_listing))
        .route("/api/v1/confirm-listing", post(listing::publish_listing))
        .route("/api/v1/relist", post(listing::request_relist))
        .route("/api/v1/confirm-relist", post(listing::confirm_relist))
        .route("/api/v1/listing/{ordinal_id}", get(listing::get_listing));

    let router = Router::new()
        .route("/api/v1/health", get(health))
        .merge(listing_api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .layer(TraceLayer::new_for_http());

    // Without configured origins no CORS headers are sent at all, so only
    // same-origin and non-browser clients can call the API.
    let router = if allowed_origins.is_empty() {
        router
    } else {
        router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins.iter().cloned()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
    };

    router.with_state(shared)
}

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "network": state.network,
        "chain": state.network.to_bitcoin().to_string(),
    }))
}

async fn api_not_found() -> error::AppError {
    error::AppError::NotFound("API route not found".to_string())
}
