use assert_matches::assert_matches;
use chrono::Weekday;

use appointment_cell::models::{AppointmentError, AppointmentResponse, BookAppointmentRequest};
use appointment_cell::services::{AppointmentQueryService, BookingService};
use shared_models::{Doctor, Patient};
use shared_utils::test_utils::{date, time, TestContext, TestUser};

struct Fixture {
    ctx: TestContext,
    doctor_user: TestUser,
    doctor: Doctor,
    patient_user: TestUser,
    patient: Patient,
    appointment: AppointmentResponse,
}

async fn fixture() -> Fixture {
    let ctx = TestContext::new();
    let doctor_user = TestUser::doctor("okafor@example.com");
    let doctor = ctx.seed_doctor(&doctor_user, "Ada", "Okafor").await;
    ctx.seed_weekly(doctor.id, Weekday::Mon, time(9, 0), time(12, 0), 30).await;
    let patient_user = TestUser::patient("pat@example.com");
    let patient = ctx.seed_patient(Some(&patient_user), "Sam", "Reyes").await;

    let appointment = BookingService::new(&ctx.state)
        .book_appointment(
            &patient_user.to_user(),
            BookAppointmentRequest {
                doctor_id: doctor.id,
                patient_id: None,
                appointment_date: date(2030, 1, 14),
                appointment_time: time(9, 0),
                reason_for_visit: "Knee pain after fall".to_string(),
                notes_by_patient: None,
            },
        )
        .await
        .unwrap();

    Fixture {
        ctx,
        doctor_user,
        doctor,
        patient_user,
        patient,
        appointment,
    }
}

#[tokio::test]
async fn owners_and_front_desk_can_read_an_appointment() {
    let f = fixture().await;
    let query = AppointmentQueryService::new(&f.ctx.state);

    for user in [
        f.patient_user.to_user(),
        f.doctor_user.to_user(),
        TestUser::receptionist("desk@example.com").to_user(),
        TestUser::admin("admin@example.com").to_user(),
    ] {
        let appointment = query.get_appointment(&user, f.appointment.id).await.unwrap();
        assert_eq!(appointment.doctor_specialization.as_deref(), Some("General Practice"));
        assert_eq!(appointment.patient_last_name.as_deref(), Some("Reyes"));
    }
}

#[tokio::test]
async fn strangers_cannot_read_an_appointment() {
    let f = fixture().await;
    let query = AppointmentQueryService::new(&f.ctx.state);

    let other_patient = TestUser::patient("other@example.com");
    f.ctx.seed_patient(Some(&other_patient), "Lee", "Park").await;
    let other_doctor = TestUser::doctor("mensah@example.com");
    f.ctx.seed_doctor(&other_doctor, "Kofi", "Mensah").await;

    for user in [
        other_patient.to_user(),
        other_doctor.to_user(),
        TestUser::nurse("nurse@example.com").to_user(),
    ] {
        assert_matches!(
            query.get_appointment(&user, f.appointment.id).await,
            Err(AppointmentError::Forbidden(_))
        );
    }

    assert_matches!(
        query
            .get_appointment(&TestUser::admin("admin@example.com").to_user(), uuid::Uuid::new_v4())
            .await,
        Err(AppointmentError::NotFound(_))
    );
}

#[tokio::test]
async fn patient_listing_is_self_or_staff() {
    let f = fixture().await;
    let query = AppointmentQueryService::new(&f.ctx.state);

    let own = query.list_for_patient(&f.patient_user.to_user(), f.patient.id).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].doctor_last_name.as_deref(), Some("Okafor"));

    let nurse = query
        .list_for_patient(&TestUser::nurse("nurse@example.com").to_user(), f.patient.id)
        .await
        .unwrap();
    assert_eq!(nurse.len(), 1);

    let other_patient = TestUser::patient("other@example.com");
    f.ctx.seed_patient(Some(&other_patient), "Lee", "Park").await;
    assert_matches!(
        query.list_for_patient(&other_patient.to_user(), f.patient.id).await,
        Err(AppointmentError::Forbidden(_))
    );

    assert_matches!(
        query.list_for_patient(&f.patient_user.to_user(), uuid::Uuid::new_v4()).await,
        Err(AppointmentError::PatientNotFound(_))
    );
}

#[tokio::test]
async fn doctor_listing_is_self_or_front_desk() {
    let f = fixture().await;
    let query = AppointmentQueryService::new(&f.ctx.state);

    let own = query.list_for_doctor(&f.doctor_user.to_user(), f.doctor.id).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].patient_first_name.as_deref(), Some("Sam"));

    let desk = query
        .list_for_doctor(&TestUser::receptionist("desk@example.com").to_user(), f.doctor.id)
        .await
        .unwrap();
    assert_eq!(desk.len(), 1);

    for user in [
        f.patient_user.to_user(),
        TestUser::nurse("nurse@example.com").to_user(),
        TestUser::doctor("mensah@example.com").to_user(),
    ] {
        assert_matches!(
            query.list_for_doctor(&user, f.doctor.id).await,
            Err(AppointmentError::Forbidden(_))
        );
    }
}
