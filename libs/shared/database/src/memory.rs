use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{Appointment, Doctor, Patient, ScheduleEntry, ScheduleRule};

use crate::store::{AppointmentStore, DirectoryStore, ScheduleStore, StoreError, StoreResult};

/// Process-local store. Default backend and the fixture for cell tests.
#[derive(Default)]
pub struct MemoryStore {
    schedules: RwLock<HashMap<Uuid, ScheduleEntry>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_schedules(mut entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    entries.sort_by_key(|entry| (entry.start_time, entry.created_at));
    entries
}

fn sorted_appointments(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|appointment| (appointment.starts_at(), appointment.created_at));
    appointments
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn insert_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry> {
        let mut schedules = self.schedules.write().await;
        if schedules.contains_key(&entry.id) {
            return Err(StoreError::Conflict(format!("schedule {} already exists", entry.id)));
        }
        schedules.insert(entry.id, entry.clone());
        debug!("Stored schedule {} for doctor {}", entry.id, entry.doctor_id);
        Ok(entry)
    }

    async fn update_schedule(&self, entry: ScheduleEntry) -> StoreResult<ScheduleEntry> {
        let mut schedules = self.schedules.write().await;
        match schedules.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(entry)
            }
            None => Err(StoreError::NotFound(format!("Schedule {}", entry.id))),
        }
    }

    async fn delete_schedule(&self, schedule_id: Uuid) -> StoreResult<()> {
        self.schedules
            .write()
            .await
            .remove(&schedule_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Schedule {}", schedule_id)))
    }

    async fn get_schedule(&self, schedule_id: Uuid) -> StoreResult<Option<ScheduleEntry>> {
        Ok(self.schedules.read().await.get(&schedule_id).cloned())
    }

    async fn schedules_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<ScheduleEntry>> {
        let schedules = self.schedules.read().await;
        Ok(sorted_schedules(
            schedules.values().filter(|entry| entry.doctor_id == doctor_id).cloned().collect(),
        ))
    }

    async fn schedules_for_date(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<ScheduleEntry>> {
        let schedules = self.schedules.read().await;
        Ok(sorted_schedules(
            schedules
                .values()
                .filter(|entry| entry.doctor_id == doctor_id && entry.rule == ScheduleRule::DateOverride(date))
                .cloned()
                .collect(),
        ))
    }

    async fn schedules_for_weekday(&self, doctor_id: Uuid, weekday: Weekday) -> StoreResult<Vec<ScheduleEntry>> {
        let schedules = self.schedules.read().await;
        Ok(sorted_schedules(
            schedules
                .values()
                .filter(|entry| entry.doctor_id == doctor_id && entry.rule == ScheduleRule::RecurringWeekly(weekday))
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut appointments = self.appointments.write().await;

        // Unique (doctor, date, start) among slot-holding rows
        let duplicate = appointments.values().any(|existing| {
            existing.holds_slot()
                && existing.doctor_id == appointment.doctor_id
                && existing.appointment_date == appointment.appointment_date
                && existing.appointment_time == appointment.appointment_time
        });
        if duplicate {
            warn!(
                "Rejected duplicate booking for doctor {} at {} {}",
                appointment.doctor_id, appointment.appointment_date, appointment.appointment_time
            );
            return Err(StoreError::Conflict(format!(
                "doctor {} already has an appointment at {} {}",
                appointment.doctor_id, appointment.appointment_date, appointment.appointment_time
            )));
        }

        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(appointment)
            }
            None => Err(StoreError::NotFound(format!("Appointment {}", appointment.id))),
        }
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn appointments_for_doctor_on(&self, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sorted_appointments(
            appointments
                .values()
                .filter(|a| a.doctor_id == doctor_id && a.appointment_date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn appointments_for_patient_on(&self, patient_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sorted_appointments(
            appointments
                .values()
                .filter(|a| a.patient_id == patient_id && a.appointment_date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sorted_appointments(
            appointments.values().filter(|a| a.doctor_id == doctor_id).cloned().collect(),
        ))
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sorted_appointments(
            appointments.values().filter(|a| a.patient_id == patient_id).cloned().collect(),
        ))
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<Option<Doctor>> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn get_patient(&self, patient_id: Uuid) -> StoreResult<Option<Patient>> {
        Ok(self.patients.read().await.get(&patient_id).cloned())
    }

    async fn find_doctor_by_user(&self, user_id: &str) -> StoreResult<Option<Doctor>> {
        Ok(self
            .doctors
            .read()
            .await
            .values()
            .find(|doctor| doctor.user_id == user_id)
            .cloned())
    }

    async fn find_patient_by_user(&self, user_id: &str) -> StoreResult<Option<Patient>> {
        Ok(self
            .patients
            .read()
            .await
            .values()
            .find(|patient| patient.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let mut doctors = self.doctors.write().await;
        if doctors.values().any(|existing| existing.user_id == doctor.user_id) {
            return Err(StoreError::Conflict(format!("user {} already has a doctor profile", doctor.user_id)));
        }
        doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        let mut patients = self.patients.write().await;
        if let Some(user_id) = patient.user_id.as_deref() {
            if patients.values().any(|existing| existing.user_id.as_deref() == Some(user_id)) {
                return Err(StoreError::Conflict(format!("user {} already has a patient profile", user_id)));
            }
        }
        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }
}
