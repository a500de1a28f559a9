use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    Router::new()
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability))
        .route(
            "/{doctor_id}/schedules",
            get(handlers::list_schedules).post(handlers::add_schedule),
        )
        .route(
            "/schedules/{schedule_id}",
            put(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
