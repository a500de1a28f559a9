use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{BookAppointmentRequest, StatusUpdateRequest};
use crate::services::{AppointmentQueryService, BookingService, StatusService};

// ==============================================================================
// BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service.book_appointment(&user, request).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let status_service = StatusService::new(&state);

    let appointment = status_service
        .update_status(&user, appointment_id, request)
        .await?;

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// READS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let query_service = AppointmentQueryService::new(&state);

    let appointment = query_service.get_appointment(&user, appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let query_service = AppointmentQueryService::new(&state);

    let appointments = query_service.list_for_patient(&user, patient_id).await?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let query_service = AppointmentQueryService::new(&state);

    let appointments = query_service.list_for_doctor(&user, doctor_id).await?;

    Ok(Json(json!(appointments)))
}
