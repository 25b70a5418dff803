use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::store::SchedulingStore;

pub fn create_router(store: Arc<SchedulingStore>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", scheduling_routes(store))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "clinic-scheduling-api"
    }))
}
