use assert_matches::assert_matches;
use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{header::AUTHORIZATION, Request, StatusCode},
    Json,
};
use chrono::Weekday;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::handlers::*;
use doctor_cell::models::{AvailabilityQuery, ScheduleRequest};
use doctor_cell::router::doctor_routes;
use shared_models::error::AppError;
use shared_utils::test_utils::{date, time, JwtTestUtils, TestContext, TestUser};

fn monday_morning() -> ScheduleRequest {
    serde_json::from_value(json!({
        "day_of_week": "MONDAY",
        "start_time": "09:00",
        "end_time": "12:00",
        "slot_duration_minutes": 30,
        "notes": "Outpatient clinic"
    }))
    .unwrap()
}

#[tokio::test]
async fn availability_handler_returns_hhmm_pairs() {
    let ctx = TestContext::new();
    let doctor = ctx.seed_doctor(&TestUser::doctor("doc@example.com"), "Ada", "Okafor").await;
    ctx.seed_weekly(doctor.id, Weekday::Mon, time(9, 0), time(10, 0), 30).await;

    let Json(body) = get_doctor_availability(
        State(ctx.state.clone()),
        Path(doctor.id),
        Query(AvailabilityQuery { date: date(2030, 1, 14) }),
        Extension(TestUser::patient("pat@example.com").to_user()),
    )
    .await
    .unwrap();

    assert_eq!(
        body,
        json!([
            {"start_time": "09:00", "end_time": "09:30"},
            {"start_time": "09:30", "end_time": "10:00"}
        ])
    );
}

#[tokio::test]
async fn add_schedule_handler_echoes_flat_entry_with_doctor_name() {
    let ctx = TestContext::new();
    let doctor_user = TestUser::doctor("doc@example.com");
    let doctor = ctx.seed_doctor(&doctor_user, "Ada", "Okafor").await;

    let Json(body) = add_schedule(
        State(ctx.state.clone()),
        Path(doctor.id),
        Extension(doctor_user.to_user()),
        Json(monday_morning()),
    )
    .await
    .unwrap();

    assert_eq!(body["doctor_name"], "Ada Okafor");
    assert_eq!(body["day_of_week"], "MONDAY");
    assert_eq!(body["specific_date"], Value::Null);
    assert_eq!(body["start_time"], "09:00");
    assert_eq!(body["end_time"], "12:00");
    assert_eq!(body["is_available"], true);
}

#[tokio::test]
async fn patient_cannot_add_schedules() {
    let ctx = TestContext::new();
    let doctor = ctx.seed_doctor(&TestUser::doctor("doc@example.com"), "Ada", "Okafor").await;

    let result = add_schedule(
        State(ctx.state.clone()),
        Path(doctor.id),
        Extension(TestUser::patient("pat@example.com").to_user()),
        Json(monday_morning()),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn update_and_delete_handlers() {
    let ctx = TestContext::new();
    let admin = TestUser::admin("admin@example.com").to_user();
    let doctor = ctx.seed_doctor(&TestUser::doctor("doc@example.com"), "Ada", "Okafor").await;
    let entry = ctx.seed_weekly(doctor.id, Weekday::Mon, time(9, 0), time(12, 0), 30).await;

    let mut request = monday_morning();
    request.slot_duration_minutes = 15;
    let Json(updated) = update_schedule(
        State(ctx.state.clone()),
        Path(entry.id),
        Extension(admin.clone()),
        Json(request),
    )
    .await
    .unwrap();
    assert_eq!(updated["slot_duration_minutes"], 15);

    let Json(deleted) = delete_schedule(State(ctx.state.clone()), Path(entry.id), Extension(admin.clone()))
        .await
        .unwrap();
    assert_eq!(deleted["success"], true);

    let again = delete_schedule(State(ctx.state.clone()), Path(entry.id), Extension(admin)).await;
    assert_matches!(again, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn routes_require_a_bearer_token() {
    let ctx = TestContext::new();
    let app = doctor_routes(ctx.state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability?date=2030-01-14", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn routes_serve_availability_and_not_found() {
    let ctx = TestContext::new();
    let doctor = ctx.seed_doctor(&TestUser::doctor("doc@example.com"), "Ada", "Okafor").await;
    ctx.seed_weekly(doctor.id, Weekday::Mon, time(9, 0), time(12, 0), 30).await;
    let token = JwtTestUtils::create_test_token(
        &TestUser::receptionist("desk@example.com"),
        &ctx.config.jwt_secret,
        None,
    );

    let request = |doctor_id: Uuid| {
        Request::builder()
            .uri(format!("/{}/availability?date=2030-01-14", doctor_id))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    let found = doctor_routes(ctx.state.clone()).oneshot(request(doctor.id)).await.unwrap();
    assert_eq!(found.status(), StatusCode::OK);

    let missing = doctor_routes(ctx.state.clone()).oneshot(request(Uuid::new_v4())).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_routes_accept_json_bodies() {
    let ctx = TestContext::new();
    let doctor_user = TestUser::doctor("doc@example.com");
    let doctor = ctx.seed_doctor(&doctor_user, "Ada", "Okafor").await;
    let token = JwtTestUtils::create_test_token(&doctor_user, &ctx.config.jwt_secret, None);

    let response = doctor_routes(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/schedules", doctor.id))
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "specific_date": "2030-01-09",
                        "start_time": "08:00",
                        "end_time": "08:00",
                        "slot_duration_minutes": 15
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
