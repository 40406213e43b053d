use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::services::SchedulingEngine;

pub fn scheduling_routes(engine: Arc<SchedulingEngine>) -> Router {
    Router::new()
        .route("/providers", post(handlers::add_provider))
        .route("/providers/{provider_id}", get(handlers::get_provider))
        .route("/providers/{provider_id}/availability", put(handlers::update_availability))
        .route(
            "/appointments",
            post(handlers::schedule_appointment).get(handlers::list_appointments),
        )
        .route("/appointments/{request_id}", delete(handlers::cancel_appointment))
        .with_state(engine)
}
