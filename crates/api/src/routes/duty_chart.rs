use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/duty-charts",
            post(handlers::duty_chart::create_duty_chart),
        )
        .route("/api/duty-charts", get(handlers::duty_chart::list_duty_charts))
        .route(
            "/api/duty-charts/import",
            post(handlers::import::import_duty_chart),
        )
        .route("/api/duty-charts/:id", get(handlers::duty_chart::get_duty_chart))
        .route(
            "/api/duty-charts/:id",
            put(handlers::duty_chart::update_duty_chart),
        )
}
