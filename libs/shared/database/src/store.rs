use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Appointment, Doctor, Patient, ScheduleEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation reported by the backend.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Malformed stored record: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Recurring and date-specific working-time rows keyed by doctor.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry>;

    async fn update_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry>;

    async fn delete_schedule(&self, schedule_id: Uuid) -> StoreResult<()>;

    async fn get_schedule(&self, schedule_id: Uuid) -> StoreResult<Option<ScheduleEntry>>;

    async fn schedules_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<ScheduleEntry>>;

    /// Date-override rows for exactly `date`, available or not.
    async fn schedules_for_date(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<ScheduleEntry>>;

    /// Recurring rows for `weekday`, available or not.
    async fn schedules_for_weekday(&self, doctor_id: Uuid, weekday: Weekday) -> StoreResult<Vec<ScheduleEntry>>;
}

/// Bookings. `insert_appointment` must reject a second slot-holding row for
/// the same doctor, date and start time with [`StoreError::Conflict`].
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>>;

    async fn appointments_for_doctor_on(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    async fn appointments_for_patient_on(&self, patient_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Appointment>>;

    async fn appointments_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>>;
}

/// Read access to doctor and patient profiles, plus seeding.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Option<Doctor>>;

    async fn get_patient(&self, patient_id: Uuid) -> StoreResult<Option<Patient>>;

    async fn find_doctor_by_user(&self, user_id: &str) -> StoreResult<Option<Doctor>>;

    async fn find_patient_by_user(&self, user_id: &str) -> StoreResult<Option<Patient>>;

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient>;
}
