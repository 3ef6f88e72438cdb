use axum::{http::HeaderValue, routing::get, Router};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health::{health_check, root};
use super::rutinas::rutina_routes;

pub fn create_routes(db: PgPool) -> Router {
    // Dev frontend origins (Vite and CRA defaults).
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://localhost:3000"),
        ])
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/rutinas", rutina_routes(db))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
