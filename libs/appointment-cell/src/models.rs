use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::models::ScheduleError;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::time::format_time;
use shared_models::{Appointment, AppointmentStatus, Doctor, Patient, StatusNote};

pub const REASON_MIN_CHARS: usize = 5;
pub const REASON_MAX_CHARS: usize = 255;
pub const PATIENT_NOTES_MAX_CHARS: usize = 500;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    /// Required when staff book; must be absent or the caller's own profile for patients.
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    #[serde(with = "shared_models::time::hhmm")]
    pub appointment_time: NaiveTime,
    pub reason_for_visit: String,
    #[serde(default)]
    pub notes_by_patient: Option<String>,
}

impl BookAppointmentRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), AppointmentError> {
        if self.appointment_date < today {
            return Err(AppointmentError::ValidationError(
                "Appointment date must be today or in the future.".to_string(),
            ));
        }

        let reason = self.reason_for_visit.trim();
        if reason.is_empty() {
            return Err(AppointmentError::ValidationError("Reason for visit is required.".to_string()));
        }
        let reason_len = reason.chars().count();
        if !(REASON_MIN_CHARS..=REASON_MAX_CHARS).contains(&reason_len) {
            return Err(AppointmentError::ValidationError(format!(
                "Reason must be between {} and {} characters.",
                REASON_MIN_CHARS, REASON_MAX_CHARS
            )));
        }

        if let Some(notes) = &self.notes_by_patient {
            if notes.chars().count() > PATIENT_NOTES_MAX_CHARS {
                return Err(AppointmentError::ValidationError(format!(
                    "Patient notes must be at most {} characters.",
                    PATIENT_NOTES_MAX_CHARS
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub new_status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Appointment enriched with directory names for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_first_name: Option<String>,
    pub patient_last_name: Option<String>,
    pub patient_unique_id: Option<String>,
    pub doctor_id: Uuid,
    pub doctor_first_name: Option<String>,
    pub doctor_last_name: Option<String>,
    pub doctor_specialization: Option<String>,
    pub doctor_department_name: Option<String>,
    pub appointment_date: NaiveDate,
    #[serde(with = "shared_models::time::hhmm")]
    pub appointment_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub reason_for_visit: String,
    pub notes_by_patient: Option<String>,
    pub notes_by_doctor_or_staff: Vec<StatusNote>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AppointmentResponse {
    pub fn from_parts(appointment: Appointment, patient: Option<&Patient>, doctor: Option<&Doctor>) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            patient_first_name: patient.map(|p| p.first_name.clone()),
            patient_last_name: patient.map(|p| p.last_name.clone()),
            patient_unique_id: patient.and_then(|p| p.patient_unique_id.clone()),
            doctor_id: appointment.doctor_id,
            doctor_first_name: doctor.map(|d| d.first_name.clone()),
            doctor_last_name: doctor.map(|d| d.last_name.clone()),
            doctor_specialization: doctor.and_then(|d| d.specialization.clone()),
            doctor_department_name: doctor.and_then(|d| d.department_name.clone()),
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            duration_minutes: appointment.duration_minutes,
            status: appointment.status,
            reason_for_visit: appointment.reason_for_visit,
            notes_by_patient: appointment.notes_by_patient,
            notes_by_doctor_or_staff: appointment.notes_by_doctor_or_staff,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found with ID: {0}")]
    NotFound(Uuid),

    #[error("Patient not found with ID: {0}")]
    PatientNotFound(Uuid),

    #[error("Doctor not found with ID: {0}")]
    DoctorNotFound(Uuid),

    #[error("Patient profile not found for logged-in user: {0}")]
    PatientProfileMissing(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Patient ID is required when staff is booking an appointment.")]
    PatientIdRequired,

    #[error("The selected time slot {} is not available for Dr. {doctor} on {date}.", format_time(*.time))]
    SlotNotAvailable {
        time: NaiveTime,
        date: NaiveDate,
        doctor: String,
    },

    #[error("Patient already has an overlapping appointment at the selected time.")]
    PatientOverlap,

    #[error("Dr. {0} already has an overlapping appointment at the selected time. Please try a different slot.")]
    DoctorOverlap(String),

    #[error("Cannot change status of a {from} appointment to {to}.")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound(_)
            | AppointmentError::PatientNotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::PatientProfileMissing(_) => AppError::NotFound(error.to_string()),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::PatientIdRequired
            | AppointmentError::SlotNotAvailable { .. }
            | AppointmentError::PatientOverlap
            | AppointmentError::DoctorOverlap(_)
            | AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(error.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Schedule(e) => AppError::from(e),
            AppointmentError::Store(StoreError::NotFound(what)) => AppError::NotFound(format!("{} not found", what)),
            AppointmentError::Store(StoreError::Conflict(msg)) => AppError::Conflict(msg),
            AppointmentError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(reason: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: Uuid::new_v4(),
            patient_id: None,
            appointment_date: NaiveDate::from_ymd_opt(2030, 1, 14).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            reason_for_visit: reason.to_string(),
            notes_by_patient: None,
        }
    }

    #[test]
    fn reason_length_is_bounded() {
        let today = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();

        assert!(request("Chest pain").validate(today).is_ok());
        assert_matches!(request("Flu").validate(today), Err(AppointmentError::ValidationError(_)));
        assert_matches!(request("   ").validate(today), Err(AppointmentError::ValidationError(_)));
        assert_matches!(request(&"x".repeat(256)).validate(today), Err(AppointmentError::ValidationError(_)));
    }

    #[test]
    fn past_dates_and_long_notes_are_rejected() {
        let today = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
        assert_matches!(request("Chest pain").validate(today), Err(AppointmentError::ValidationError(_)));

        let mut long_notes = request("Chest pain");
        long_notes.notes_by_patient = Some("n".repeat(501));
        assert_matches!(
            long_notes.validate(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()),
            Err(AppointmentError::ValidationError(_))
        );
    }

    #[test]
    fn slot_errors_are_bad_requests() {
        let error = AppointmentError::SlotNotAvailable {
            time: NaiveTime::from_hms_opt(9, 1, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2030, 1, 14).unwrap(),
            doctor: "Okafor".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "The selected time slot 09:01 is not available for Dr. Okafor on 2030-01-14."
        );
        assert_matches!(AppError::from(error), AppError::BadRequest(_));
    }
}
