use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::time::intervals_overlap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    CancelledByPatient,
    CancelledByStaff,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::CancelledByPatient,
        AppointmentStatus::CancelledByStaff,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rescheduled,
    ];

    pub fn is_cancelled(self) -> bool {
        matches!(self, AppointmentStatus::CancelledByPatient | AppointmentStatus::CancelledByStaff)
    }

    /// No transition leaves a terminal status, apart from re-applying the same value.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::CancelledByPatient
                | AppointmentStatus::CancelledByStaff
                | AppointmentStatus::NoShow
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::CancelledByPatient => "CANCELLED_BY_PATIENT",
            AppointmentStatus::CancelledByStaff => "CANCELLED_BY_STAFF",
            AppointmentStatus::NoShow => "NO_SHOW",
            AppointmentStatus::Rescheduled => "RESCHEDULED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributed entry in the staff note log. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNote {
    pub actor: String,
    pub status: AppointmentStatus,
    pub recorded_at: NaiveDateTime,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "crate::time::hhmm")]
    pub appointment_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub reason_for_visit: String,
    #[serde(default)]
    pub notes_by_patient: Option<String>,
    #[serde(default)]
    pub notes_by_doctor_or_staff: Vec<StatusNote>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(self.duration_minutes as i64)
    }

    /// Cancelled appointments no longer hold their slot.
    pub fn holds_slot(&self) -> bool {
        !self.status.is_cancelled()
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        intervals_overlap(self.starts_at(), self.ends_at(), start, end)
    }

    pub fn append_note(&mut self, note: StatusNote) {
        self.notes_by_doctor_or_staff.push(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment_at(hour: u32, minute: u32, duration_minutes: i32) -> Appointment {
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let created = date.and_hms_opt(8, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            appointment_date: date,
            appointment_time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            reason_for_visit: "Annual check-up".to_string(),
            notes_by_patient: None,
            notes_by_doctor_or_staff: Vec::new(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn overlap_is_half_open() {
        let appointment = appointment_at(9, 0, 30);
        let date = appointment.appointment_date;

        assert!(!appointment.overlaps(date.and_hms_opt(9, 30, 0).unwrap(), date.and_hms_opt(10, 0, 0).unwrap()));
        assert!(appointment.overlaps(date.and_hms_opt(9, 29, 0).unwrap(), date.and_hms_opt(9, 59, 0).unwrap()));
    }

    #[test]
    fn cancelled_appointments_release_their_slot() {
        let mut appointment = appointment_at(9, 0, 30);
        assert!(appointment.holds_slot());

        appointment.status = AppointmentStatus::CancelledByStaff;
        assert!(!appointment.holds_slot());

        appointment.status = AppointmentStatus::NoShow;
        assert!(appointment.holds_slot());
    }

    #[test]
    fn status_serializes_in_screaming_snake_case() {
        let value = serde_json::to_value(AppointmentStatus::CancelledByPatient).unwrap();
        assert_eq!(value, "CANCELLED_BY_PATIENT");
        assert!(!AppointmentStatus::Rescheduled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
    }
}
