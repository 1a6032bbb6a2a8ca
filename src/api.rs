use shuttle_axum::axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

pub const ROOT_TEXT: &str = "weekly-curator is running";

/// Liveness routes; the curation pipeline runs off the scheduler, not HTTP.
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(|| async { ROOT_TEXT }))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::very_permissive())
}
