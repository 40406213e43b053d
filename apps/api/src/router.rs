use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::{scheduling_routes, SchedulingEngine};

pub fn create_router(engine: Arc<SchedulingEngine>) -> Router {
    Router::new()
        .route("/", get(|| async { "Slot allocator API is running!" }))
        .merge(scheduling_routes(engine))
}
