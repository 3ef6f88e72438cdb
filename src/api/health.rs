use axum::response::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "rutinas-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "rutinas-api",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/rutinas"
    }))
}
