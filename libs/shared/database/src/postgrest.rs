use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{time::weekday, Appointment, Doctor, Patient, ScheduleEntry};

use crate::store::{AppointmentStore, DirectoryStore, ScheduleStore, StoreError, StoreResult};
use crate::supabase::{SupabaseClient, SupabaseError};

const SCHEDULES: &str = "/rest/v1/doctor_schedules";
const APPOINTMENTS: &str = "/rest/v1/appointments";
const DOCTORS: &str = "/rest/v1/doctors";
const PATIENTS: &str = "/rest/v1/patients";

impl From<SupabaseError> for StoreError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::Conflict(body) => StoreError::Conflict(body),
            SupabaseError::NotFound(body) => StoreError::NotFound(body),
            SupabaseError::Decode(e) => StoreError::Decode(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// PostgREST-backed store. The `appointments` table is expected to carry a
/// partial unique index on `(doctor_id, appointment_date, appointment_time)`
/// over non-cancelled rows, which surfaces here as a 409.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        Ok(self.supabase.request(Method::GET, path, None, None).await?)
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        Ok(self.select(path).await?.into_iter().next())
    }

    async fn write<T>(&self, method: Method, path: &str, record: &T, what: &str) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let body = serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?;
        let rows: Vec<T> = self
            .supabase
            .request_with_headers(
                method,
                path,
                None,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))
    }
}

#[async_trait]
impl ScheduleStore for SupabaseStore {
    async fn insert_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry> {
        debug!("Inserting schedule {} for doctor {}", entry.id, entry.doctor_id);
        self.write(Method::POST, SCHEDULES, &entry, "Schedule").await
    }

    async fn update_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry> {
        let path = format!("{}?id=eq.{}", SCHEDULES, entry.id);
        self.write(Method::PATCH, &path, &entry, "Schedule").await
    }

    async fn delete_schedule(&self, schedule_id: Uuid) -> StoreResult<()> {
        let path = format!("{}?id=eq.{}", SCHEDULES, schedule_id);
        let deleted: Vec<ScheduleEntry> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        if deleted.is_empty() {
            return Err(StoreError::NotFound(format!("Schedule {}", schedule_id)));
        }
        Ok(())
    }

    async fn get_schedule(&self, schedule_id: Uuid) -> StoreResult<Option<ScheduleEntry>> {
        self.select_one(&format!("{}?id=eq.{}", SCHEDULES, schedule_id)).await
    }

    async fn schedules_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<ScheduleEntry>> {
        self.select(&format!("{}?doctor_id=eq.{}&order=start_time.asc", SCHEDULES, doctor_id))
            .await
    }

    async fn schedules_for_date(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<ScheduleEntry>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&specific_date=eq.{}&order=start_time.asc",
            SCHEDULES, doctor_id, date
        ))
        .await
    }

    async fn schedules_for_weekday(&self, doctor_id: Uuid, day: Weekday) -> StoreResult<Vec<ScheduleEntry>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&day_of_week=eq.{}&specific_date=is.null&order=start_time.asc",
            SCHEDULES,
            doctor_id,
            weekday::name(day)
        ))
        .await
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        debug!("Inserting appointment {} for doctor {}", appointment.id, appointment.doctor_id);
        self.write(Method::POST, APPOINTMENTS, &appointment, "Appointment").await
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, appointment.id);
        self.write(Method::PATCH, &path, &appointment, "Appointment").await
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one(&format!("{}?id=eq.{}", APPOINTMENTS, appointment_id)).await
    }

    async fn appointments_for_doctor_on(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&appointment_date=eq.{}&order=appointment_time.asc",
            APPOINTMENTS, doctor_id, date
        ))
        .await
    }

    async fn appointments_for_patient_on(&self, patient_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        self.select(&format!(
            "{}?patient_id=eq.{}&appointment_date=eq.{}&order=appointment_time.asc",
            APPOINTMENTS, patient_id, date
        ))
        .await
    }

    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Appointment>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            APPOINTMENTS, doctor_id
        ))
        .await
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>> {
        self.select(&format!(
            "{}?patient_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            APPOINTMENTS, patient_id
        ))
        .await
    }
}

#[async_trait]
impl DirectoryStore for SupabaseStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("{}?id=eq.{}", DOCTORS, doctor_id)).await
    }

    async fn get_patient(&self, patient_id: Uuid) -> StoreResult<Option<Patient>> {
        self.select_one(&format!("{}?id=eq.{}", PATIENTS, patient_id)).await
    }

    async fn find_doctor_by_user(&self, user_id: &str) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("{}?user_id=eq.{}", DOCTORS, user_id)).await
    }

    async fn find_patient_by_user(&self, user_id: &str) -> StoreResult<Option<Patient>> {
        self.select_one(&format!("{}?user_id=eq.{}", PATIENTS, user_id)).await
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.write(Method::POST, DOCTORS, &doctor, "Doctor").await
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        self.write(Method::POST, PATIENTS, &patient, "Patient").await
    }
}
