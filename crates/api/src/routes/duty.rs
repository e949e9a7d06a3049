use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/duties", get(handlers::duty::list_duties))
        .route("/api/duties/bulk-upsert", post(handlers::duty::bulk_upsert))
        .route(
            "/api/duties/generate-rotation",
            post(handlers::duty::generate_rotation),
        )
        .route("/api/duties/:id", delete(handlers::duty::delete_duty))
}
