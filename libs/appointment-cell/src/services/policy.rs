//! Capability checks, evaluated once per request against the caller's role.
//!
//! The pure functions take ownership as a flag so they can be tested without
//! any store; [`resolve_ownership`] computes that flag from the directory.

use tracing::debug;

use shared_database::DirectoryStore;
use shared_models::auth::{Role, User};
use shared_models::{Appointment, AppointmentStatus};

use crate::models::AppointmentError;

pub fn can_book(role: Role) -> bool {
    matches!(role, Role::Patient | Role::Admin | Role::Receptionist)
}

/// Whether `role` may move an appointment from `from` to `to`. Whether the
/// transition itself is legal is checked separately.
pub fn can_transition(role: Role, from: AppointmentStatus, to: AppointmentStatus, is_owner: bool) -> bool {
    match role {
        Role::Admin | Role::Receptionist => true,
        Role::Doctor => {
            is_owner
                && matches!(
                    to,
                    AppointmentStatus::Completed | AppointmentStatus::NoShow | AppointmentStatus::CancelledByStaff
                )
        }
        Role::Patient => {
            is_owner
                && to == AppointmentStatus::CancelledByPatient
                && (from == AppointmentStatus::Scheduled || from == to)
        }
        Role::Nurse => false,
    }
}

pub fn can_view_appointment(role: Role, is_owner: bool) -> bool {
    match role {
        Role::Admin | Role::Receptionist => true,
        Role::Doctor | Role::Patient => is_owner,
        Role::Nurse => false,
    }
}

/// Clinical staff may look up any patient's appointments; patients only their own.
pub fn can_view_patient_appointments(role: Role, is_self: bool) -> bool {
    match role {
        Role::Admin | Role::Receptionist | Role::Doctor | Role::Nurse => true,
        Role::Patient => is_self,
    }
}

pub fn can_view_doctor_appointments(role: Role, is_self: bool) -> bool {
    match role {
        Role::Admin | Role::Receptionist => true,
        Role::Doctor => is_self,
        Role::Nurse | Role::Patient => false,
    }
}

pub fn require_role(user: &User) -> Result<Role, AppointmentError> {
    user.role().ok_or_else(|| {
        debug!("User {} carries unrecognised role {:?}", user.id, user.role);
        AppointmentError::Forbidden("User role not recognised.".to_string())
    })
}

/// Whether the caller is the appointment's doctor (for doctors) or patient
/// (for patients). Always false for other roles.
pub async fn resolve_ownership(
    directory: &dyn DirectoryStore,
    user: &User,
    role: Role,
    appointment: &Appointment,
) -> Result<bool, AppointmentError> {
    let owner = match role {
        Role::Doctor => directory
            .find_doctor_by_user(&user.id)
            .await?
            .is_some_and(|doctor| doctor.id == appointment.doctor_id),
        Role::Patient => directory
            .find_patient_by_user(&user.id)
            .await?
            .is_some_and(|patient| patient.id == appointment.patient_id),
        _ => false,
    };
    Ok(owner)
}
