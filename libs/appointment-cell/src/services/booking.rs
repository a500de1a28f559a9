use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use shared_database::{ClinicStores, StoreError};
use shared_models::auth::{Role, User};
use shared_models::{Appointment, AppointmentStatus, Doctor, Patient};
use shared_utils::{AppState, Clock, KeyedLocks};

use crate::models::{AppointmentError, AppointmentResponse, BookAppointmentRequest};
use crate::services::conflict::{booking_window, find_overlap};
use crate::services::policy::{can_book, require_role};

/// Slot length used when no schedule entry is in force for the booked date.
pub const FALLBACK_DURATION_MINUTES: i32 = 30;

pub struct BookingService {
    stores: ClinicStores,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks>,
    availability: AvailabilityService,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            clock: state.clock.clone(),
            locks: state.booking_locks.clone(),
            availability: AvailabilityService::new(state),
        }
    }

    /// Validates the requested slot and commits a `SCHEDULED` appointment.
    ///
    /// Everything from the availability read to the insert runs while holding
    /// the doctor's and the patient's scheduling locks.
    pub async fn book_appointment(
        &self,
        user: &User,
        request: BookAppointmentRequest,
    ) -> Result<AppointmentResponse, AppointmentError> {
        debug!(
            "Booking request from {} for doctor {} at {} {}",
            user.id, request.doctor_id, request.appointment_date, request.appointment_time
        );

        let patient_id = self.resolve_patient(user, &request).await?;

        request.validate(self.clock.today())?;

        let patient = self
            .stores
            .directory
            .get_patient(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound(patient_id))?;
        let doctor = self
            .stores
            .directory
            .get_doctor(request.doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound(request.doctor_id))?;

        let _guard = self.locks.acquire(&[doctor.id, patient.id]).await;

        let appointment = self.validate_and_commit(&doctor, &patient, request).await?;

        info!(
            "Appointment {} booked for patient {} with doctor {} at {} {}",
            appointment.id, patient.id, doctor.id, appointment.appointment_date, appointment.appointment_time
        );

        Ok(AppointmentResponse::from_parts(appointment, Some(&patient), Some(&doctor)))
    }

    /// The patient a booking is for, given who is asking.
    async fn resolve_patient(&self, user: &User, request: &BookAppointmentRequest) -> Result<Uuid, AppointmentError> {
        let role = require_role(user)?;
        if !can_book(role) {
            warn!("User {} with role {} attempted to book", user.id, role);
            return Err(AppointmentError::Forbidden(
                "User role not authorized to book appointments.".to_string(),
            ));
        }

        match role {
            Role::Patient => {
                let own = self
                    .stores
                    .directory
                    .find_patient_by_user(&user.id)
                    .await?
                    .ok_or_else(|| AppointmentError::PatientProfileMissing(user.display_name().to_string()))?;

                match request.patient_id {
                    Some(requested) if requested != own.id => Err(AppointmentError::Forbidden(
                        "Patients can only book appointments for themselves.".to_string(),
                    )),
                    _ => Ok(own.id),
                }
            }
            _ => request.patient_id.ok_or(AppointmentError::PatientIdRequired),
        }
    }

    async fn validate_and_commit(
        &self,
        doctor: &Doctor,
        patient: &Patient,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let date = request.appointment_date;
        let start = request.appointment_time;

        let slots = self.availability.compute_availability(doctor.id, date).await?;
        if !slots.iter().any(|slot| slot.start_time == start) {
            warn!("Rejected booking: {} {} is not an open slot for doctor {}", date, start, doctor.id);
            return Err(AppointmentError::SlotNotAvailable {
                time: start,
                date,
                doctor: doctor.last_name.clone(),
            });
        }

        // An open slot implies a covering entry unless the schedule changed between the two reads
        let duration_minutes = match self.availability.slot_duration_for(doctor.id, date, start).await? {
            Some(minutes) => minutes,
            None => {
                warn!(
                    "No schedule entry for doctor {} on {}, assuming {} minute slots",
                    doctor.id, date, FALLBACK_DURATION_MINUTES
                );
                FALLBACK_DURATION_MINUTES
            }
        };

        let (window_start, window_end) = booking_window(date, start, duration_minutes);

        let patient_day = self.stores.appointments.appointments_for_patient_on(patient.id, date).await?;
        if let Some(existing) = find_overlap(&patient_day, window_start, window_end) {
            warn!("Rejected booking: patient {} already booked in {}", patient.id, existing.id);
            return Err(AppointmentError::PatientOverlap);
        }

        let doctor_day = self.stores.appointments.appointments_for_doctor_on(doctor.id, date).await?;
        if let Some(existing) = find_overlap(&doctor_day, window_start, window_end) {
            warn!("Rejected booking: doctor {} already booked in {}", doctor.id, existing.id);
            return Err(AppointmentError::DoctorOverlap(doctor.last_name.clone()));
        }

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            appointment_date: date,
            appointment_time: start,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            reason_for_visit: request.reason_for_visit.trim().to_string(),
            notes_by_patient: request.notes_by_patient,
            notes_by_doctor_or_staff: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        match self.stores.appointments.insert_appointment(appointment).await {
            Ok(saved) => Ok(saved),
            Err(StoreError::Conflict(detail)) => {
                warn!("Store rejected duplicate slot for doctor {}: {}", doctor.id, detail);
                Err(AppointmentError::DoctorOverlap(doctor.last_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
