use std::sync::Arc;

use chrono::Timelike;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::ClinicStores;
use shared_models::auth::{Role, User};
use shared_models::{Doctor, ScheduleEntry, ScheduleRule};
use shared_utils::{AppState, Clock};

use crate::models::{ScheduleError, ScheduleRequest, ScheduleResponse};

pub const MIN_SLOT_MINUTES: i32 = 5;

/// Admin, or the doctor whose schedule it is.
pub fn can_manage_schedule(role: Role, is_doctor_self: bool) -> bool {
    match role {
        Role::Admin => true,
        Role::Doctor => is_doctor_self,
        _ => false,
    }
}

pub fn can_view_schedules(role: Role, is_doctor_self: bool) -> bool {
    match role {
        Role::Admin | Role::Receptionist => true,
        Role::Doctor => is_doctor_self,
        _ => false,
    }
}

pub struct ScheduleService {
    stores: ClinicStores,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            clock: state.clock.clone(),
        }
    }

    pub async fn add_schedule(
        &self,
        user: &User,
        doctor_id: Uuid,
        request: ScheduleRequest,
    ) -> Result<ScheduleResponse, ScheduleError> {
        debug!("Adding schedule for doctor {}", doctor_id);

        let doctor = self.require_doctor(doctor_id).await?;
        self.authorize(user, &doctor, can_manage_schedule)?;

        let rule = self.validate(&request)?;
        let now = self.clock.now();
        let entry = ScheduleEntry {
            id: Uuid::new_v4(),
            doctor_id,
            rule,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_duration_minutes: request.slot_duration_minutes,
            is_available: request.is_available,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };
        self.reject_overlaps(&entry).await?;

        let saved = self.stores.schedules.insert_schedule(entry).await?;
        info!("Schedule {} created for doctor {} ({})", saved.id, doctor_id, saved.rule);

        Ok(ScheduleResponse {
            schedule: saved,
            doctor_name: doctor.full_name(),
        })
    }

    pub async fn list_schedules(&self, user: &User, doctor_id: Uuid) -> Result<Vec<ScheduleResponse>, ScheduleError> {
        let doctor = self.require_doctor(doctor_id).await?;
        self.authorize(user, &doctor, can_view_schedules)?;

        let doctor_name = doctor.full_name();
        let schedules = self.stores.schedules.schedules_for_doctor(doctor_id).await?;

        Ok(schedules
            .into_iter()
            .map(|schedule| ScheduleResponse {
                schedule,
                doctor_name: doctor_name.clone(),
            })
            .collect())
    }

    /// Replaces every editable field of an entry. Owner and creation time are kept.
    pub async fn update_schedule(
        &self,
        user: &User,
        schedule_id: Uuid,
        request: ScheduleRequest,
    ) -> Result<ScheduleResponse, ScheduleError> {
        let existing = self.require_schedule(schedule_id).await?;
        let doctor = self.require_doctor(existing.doctor_id).await?;
        self.authorize(user, &doctor, can_manage_schedule)?;

        let rule = self.validate(&request)?;
        let entry = ScheduleEntry {
            rule,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_duration_minutes: request.slot_duration_minutes,
            is_available: request.is_available,
            notes: request.notes,
            updated_at: self.clock.now(),
            ..existing
        };
        self.reject_overlaps(&entry).await?;

        let saved = self.stores.schedules.update_schedule(entry).await?;
        info!("Schedule {} updated", saved.id);

        Ok(ScheduleResponse {
            schedule: saved,
            doctor_name: doctor.full_name(),
        })
    }

    pub async fn delete_schedule(&self, user: &User, schedule_id: Uuid) -> Result<(), ScheduleError> {
        let existing = self.require_schedule(schedule_id).await?;
        let doctor = self.require_doctor(existing.doctor_id).await?;
        self.authorize(user, &doctor, can_manage_schedule)?;

        self.stores.schedules.delete_schedule(schedule_id).await?;
        info!("Schedule {} deleted", schedule_id);
        Ok(())
    }

    async fn require_doctor(&self, doctor_id: Uuid) -> Result<Doctor, ScheduleError> {
        self.stores
            .directory
            .get_doctor(doctor_id)
            .await?
            .ok_or(ScheduleError::DoctorNotFound(doctor_id))
    }

    async fn require_schedule(&self, schedule_id: Uuid) -> Result<ScheduleEntry, ScheduleError> {
        self.stores
            .schedules
            .get_schedule(schedule_id)
            .await?
            .ok_or(ScheduleError::ScheduleNotFound(schedule_id))
    }

    fn authorize(
        &self,
        user: &User,
        doctor: &Doctor,
        capability: fn(Role, bool) -> bool,
    ) -> Result<(), ScheduleError> {
        let role = user
            .role()
            .ok_or_else(|| ScheduleError::Forbidden("Unrecognised role".to_string()))?;

        let is_doctor_self = role == Role::Doctor && doctor.user_id == user.id;
        if capability(role, is_doctor_self) {
            Ok(())
        } else {
            warn!("User {} ({}) denied access to schedules of doctor {}", user.id, role, doctor.id);
            Err(ScheduleError::Forbidden(
                "You are not authorized to manage this doctor's schedule.".to_string(),
            ))
        }
    }

    fn validate(&self, request: &ScheduleRequest) -> Result<ScheduleRule, ScheduleError> {
        // Slots are advertised and booked as HH:mm
        for bound in [request.start_time, request.end_time] {
            if bound.second() != 0 || bound.nanosecond() != 0 {
                return Err(ScheduleError::TimeNotOnMinute(bound));
            }
        }

        if request.start_time >= request.end_time {
            return Err(ScheduleError::InvalidTimeRange);
        }

        if request.slot_duration_minutes < MIN_SLOT_MINUTES {
            return Err(ScheduleError::SlotTooShort {
                min: MIN_SLOT_MINUTES,
                got: request.slot_duration_minutes,
            });
        }

        if let Some(date) = request.specific_date {
            if date < self.clock.today() {
                return Err(ScheduleError::DateInPast(date));
            }
        }

        // Specific date wins when both are supplied
        ScheduleRule::from_parts(request.day_of_week, request.specific_date).ok_or(ScheduleError::MissingRule)
    }

    async fn reject_overlaps(&self, entry: &ScheduleEntry) -> Result<(), ScheduleError> {
        if !entry.is_available {
            return Ok(());
        }

        let siblings = self.stores.schedules.schedules_for_doctor(entry.doctor_id).await?;
        let clash = siblings
            .iter()
            .find(|other| other.id != entry.id && other.is_available && entry.conflicts_with(other));

        match clash {
            Some(other) => Err(ScheduleError::Overlapping {
                existing: other.id,
                window: format!(
                    "{} {}-{}",
                    other.rule,
                    shared_models::time::format_time(other.start_time),
                    shared_models::time::format_time(other.end_time)
                ),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_capabilities() {
        assert!(can_manage_schedule(Role::Admin, false));
        assert!(can_manage_schedule(Role::Doctor, true));
        assert!(!can_manage_schedule(Role::Doctor, false));
        assert!(!can_manage_schedule(Role::Receptionist, false));

        assert!(can_view_schedules(Role::Receptionist, false));
        assert!(!can_view_schedules(Role::Patient, false));
        assert!(!can_view_schedules(Role::Nurse, false));
    }
}
