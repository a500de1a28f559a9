use assert_matches::assert_matches;
use axum::{
    body::Body,
    extract::{Extension, Path, State},
    http::{header::AUTHORIZATION, Request, StatusCode},
    Json,
};
use chrono::Weekday;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::handlers::*;
use appointment_cell::models::{BookAppointmentRequest, StatusUpdateRequest};
use appointment_cell::router::appointment_routes;
use shared_models::error::AppError;
use shared_models::AppointmentStatus;
use shared_utils::test_utils::{time, JwtTestUtils, TestContext, TestUser};

async fn seeded() -> (TestContext, Uuid, TestUser) {
    let ctx = TestContext::new();
    let doctor = ctx.seed_doctor(&TestUser::doctor("okafor@example.com"), "Ada", "Okafor").await;
    ctx.seed_weekly(doctor.id, Weekday::Mon, time(9, 0), time(12, 0), 30).await;
    let patient_user = TestUser::patient("pat@example.com");
    ctx.seed_patient(Some(&patient_user), "Sam", "Reyes").await;
    (ctx, doctor.id, patient_user)
}

fn booking_body(doctor_id: Uuid, start: &str) -> BookAppointmentRequest {
    serde_json::from_value(json!({
        "doctor_id": doctor_id,
        "appointment_date": "2030-01-14",
        "appointment_time": start,
        "reason_for_visit": "Recurring migraines",
        "notes_by_patient": "Mostly mornings"
    }))
    .unwrap()
}

#[tokio::test]
async fn book_handler_returns_enriched_appointment() {
    let (ctx, doctor_id, patient_user) = seeded().await;

    let Json(body) = book_appointment(
        State(ctx.state.clone()),
        Extension(patient_user.to_user()),
        Json(booking_body(doctor_id, "10:30")),
    )
    .await
    .unwrap();

    assert_eq!(body["status"], "SCHEDULED");
    assert_eq!(body["appointment_date"], "2030-01-14");
    assert_eq!(body["appointment_time"], "10:30");
    assert_eq!(body["duration_minutes"], 30);
    assert_eq!(body["doctor_first_name"], "Ada");
    assert_eq!(body["patient_last_name"], "Reyes");
    assert_eq!(body["notes_by_doctor_or_staff"], json!([]));
}

#[tokio::test]
async fn status_handler_applies_the_transition() {
    let (ctx, doctor_id, patient_user) = seeded().await;
    let Json(booked) = book_appointment(
        State(ctx.state.clone()),
        Extension(patient_user.to_user()),
        Json(booking_body(doctor_id, "09:00")),
    )
    .await
    .unwrap();
    let appointment_id: Uuid = serde_json::from_value(booked["id"].clone()).unwrap();

    let Json(body) = update_appointment_status(
        State(ctx.state.clone()),
        Path(appointment_id),
        Extension(TestUser::receptionist("desk@example.com").to_user()),
        Json(StatusUpdateRequest {
            new_status: AppointmentStatus::NoShow,
            notes: Some("No answer by phone".to_string()),
            cancellation_reason: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["status"], "NO_SHOW");
    assert_eq!(body["notes_by_doctor_or_staff"][0]["actor"], "desk@example.com");
    assert_eq!(body["notes_by_doctor_or_staff"][0]["text"], "No answer by phone");

    let Json(fetched) = get_appointment(
        State(ctx.state.clone()),
        Path(appointment_id),
        Extension(patient_user.to_user()),
    )
    .await
    .unwrap();
    assert_eq!(fetched["status"], "NO_SHOW");
}

#[tokio::test]
async fn listing_handlers_return_arrays() {
    let (ctx, doctor_id, patient_user) = seeded().await;
    let Json(booked) = book_appointment(
        State(ctx.state.clone()),
        Extension(patient_user.to_user()),
        Json(booking_body(doctor_id, "11:00")),
    )
    .await
    .unwrap();
    let patient_id: Uuid = serde_json::from_value(booked["patient_id"].clone()).unwrap();
    let admin = TestUser::admin("admin@example.com").to_user();

    let Json(for_patient) = get_patient_appointments(State(ctx.state.clone()), Path(patient_id), Extension(admin.clone()))
        .await
        .unwrap();
    assert_eq!(for_patient.as_array().map(Vec::len), Some(1));

    let Json(for_doctor) = get_doctor_appointments(State(ctx.state.clone()), Path(doctor_id), Extension(admin))
        .await
        .unwrap();
    assert_eq!(for_doctor[0]["appointment_time"], "11:00");
}

#[tokio::test]
async fn handler_errors_map_to_http_errors() {
    let (ctx, doctor_id, patient_user) = seeded().await;

    let misaligned = book_appointment(
        State(ctx.state.clone()),
        Extension(patient_user.to_user()),
        Json(booking_body(doctor_id, "09:10")),
    )
    .await;
    assert_matches!(misaligned, Err(AppError::BadRequest(_)));

    let missing = get_appointment(
        State(ctx.state.clone()),
        Path(Uuid::new_v4()),
        Extension(patient_user.to_user()),
    )
    .await;
    assert_matches!(missing, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn routes_require_a_bearer_token() {
    let (ctx, _, _) = seeded().await;

    let response = appointment_routes(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn routes_book_then_forbid_patient_completion() {
    let (ctx, doctor_id, patient_user) = seeded().await;
    let token = JwtTestUtils::create_test_token(&patient_user, &ctx.config.jwt_secret, None);

    let booked = appointment_routes(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "doctor_id": doctor_id,
                        "appointment_date": "2030-01-14",
                        "appointment_time": "09:30",
                        "reason_for_visit": "Blood pressure review"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(booked.status(), StatusCode::OK);

    let body = axum::body::to_bytes(booked.into_body(), usize::MAX).await.unwrap();
    let booked: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let appointment_id = booked["id"].as_str().unwrap().to_string();

    let completed = appointment_routes(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}/status", appointment_id))
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({"new_status": "COMPLETED"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(completed.status(), StatusCode::FORBIDDEN);
}
