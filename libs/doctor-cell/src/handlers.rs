use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{AvailabilityQuery, ScheduleRequest};
use crate::services::{AvailabilityService, ScheduleService};

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let slots = availability_service
        .get_doctor_availability(doctor_id, query.date)
        .await?;

    Ok(Json(json!(slots)))
}

// ==============================================================================
// SCHEDULE MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let schedules = schedule_service.list_schedules(&user, doctor_id).await?;

    Ok(Json(json!(schedules)))
}

#[axum::debug_handler]
pub async fn add_schedule(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service.add_schedule(&user, doctor_id, request).await?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service.update_schedule(&user, schedule_id, request).await?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    schedule_service.delete_schedule(&user, schedule_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor schedule deleted"
    })))
}
