use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::ClinicStores;
use shared_models::auth::{Role, User};
use shared_models::{Appointment, Doctor, Patient};
use shared_utils::AppState;

use crate::models::{AppointmentError, AppointmentResponse};
use crate::services::policy::{
    can_view_appointment, can_view_doctor_appointments, can_view_patient_appointments, require_role,
    resolve_ownership,
};

/// Read side: single appointments and per-patient/per-doctor listings.
pub struct AppointmentQueryService {
    stores: ClinicStores,
}

impl AppointmentQueryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    pub async fn get_appointment(&self, user: &User, appointment_id: Uuid) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .stores
            .appointments
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        let role = require_role(user)?;
        let is_owner = resolve_ownership(self.stores.directory.as_ref(), user, role, &appointment).await?;
        if !can_view_appointment(role, is_owner) {
            warn!("User {} ({}) denied view of appointment {}", user.id, role, appointment_id);
            return Err(AppointmentError::Forbidden(
                "You are not authorized to view this appointment.".to_string(),
            ));
        }

        enrich(&self.stores, appointment).await
    }

    pub async fn list_for_patient(&self, user: &User, patient_id: Uuid) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let patient = self
            .stores
            .directory
            .get_patient(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound(patient_id))?;

        let role = require_role(user)?;
        let is_self = role == Role::Patient && patient.user_id.as_deref() == Some(user.id.as_str());
        if !can_view_patient_appointments(role, is_self) {
            return Err(AppointmentError::Forbidden(
                "You are not authorized to view appointments for this patient.".to_string(),
            ));
        }

        let appointments = self.stores.appointments.appointments_for_patient(patient_id).await?;
        debug!("Found {} appointments for patient {}", appointments.len(), patient_id);

        let mut doctors: HashMap<Uuid, Option<Doctor>> = HashMap::new();
        let mut responses = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            if !doctors.contains_key(&appointment.doctor_id) {
                let doctor = self.stores.directory.get_doctor(appointment.doctor_id).await?;
                doctors.insert(appointment.doctor_id, doctor);
            }
            let doctor = doctors.get(&appointment.doctor_id).and_then(Option::as_ref);
            responses.push(AppointmentResponse::from_parts(appointment, Some(&patient), doctor));
        }

        Ok(responses)
    }

    pub async fn list_for_doctor(&self, user: &User, doctor_id: Uuid) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let doctor = self
            .stores
            .directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound(doctor_id))?;

        let role = require_role(user)?;
        let is_self = role == Role::Doctor && doctor.user_id == user.id;
        if !can_view_doctor_appointments(role, is_self) {
            return Err(AppointmentError::Forbidden(
                "You are not authorized to view appointments for this doctor.".to_string(),
            ));
        }

        let appointments = self.stores.appointments.appointments_for_doctor(doctor_id).await?;
        debug!("Found {} appointments for doctor {}", appointments.len(), doctor_id);

        let mut patients: HashMap<Uuid, Option<Patient>> = HashMap::new();
        let mut responses = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            if !patients.contains_key(&appointment.patient_id) {
                let patient = self.stores.directory.get_patient(appointment.patient_id).await?;
                patients.insert(appointment.patient_id, patient);
            }
            let patient = patients.get(&appointment.patient_id).and_then(Option::as_ref);
            responses.push(AppointmentResponse::from_parts(appointment, patient, Some(&doctor)));
        }

        Ok(responses)
    }
}

/// Attaches patient and doctor names to a stored appointment.
pub async fn enrich(stores: &ClinicStores, appointment: Appointment) -> Result<AppointmentResponse, AppointmentError> {
    let patient = stores.directory.get_patient(appointment.patient_id).await?;
    let doctor = stores.directory.get_doctor(appointment.doctor_id).await?;

    Ok(AppointmentResponse::from_parts(appointment, patient.as_ref(), doctor.as_ref()))
}
