use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        // Score endpoints
        .route("/api/videos", get(handlers::get_videos))
        .route("/api/players", get(handlers::get_players))
        .route("/api/trends", get(handlers::get_trends))
        // System endpoints
        .route("/api/status", get(handlers::get_status))
        .route("/health", get(handlers::health_handler))
        .with_state(state)
        .layer(cors)
}
