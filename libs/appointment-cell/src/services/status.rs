use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use shared_database::ClinicStores;
use shared_models::auth::User;
use shared_utils::{AppState, Clock, KeyedLocks};

use crate::models::{AppointmentError, AppointmentResponse, StatusUpdateRequest};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::policy::{can_transition, require_role, resolve_ownership};
use crate::services::query::enrich;

pub struct StatusService {
    stores: ClinicStores,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks>,
    lifecycle: AppointmentLifecycleService,
}

impl StatusService {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            clock: state.clock.clone(),
            locks: state.booking_locks.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Moves an appointment to `request.new_status`.
    ///
    /// The caller's capability is checked before the transition itself, so a
    /// patient asking for `COMPLETED` is refused rather than told it is invalid.
    pub async fn update_status(
        &self,
        user: &User,
        appointment_id: Uuid,
        request: StatusUpdateRequest,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let _guard = self.locks.acquire(&[appointment_id]).await;

        let mut appointment = self
            .stores
            .appointments
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        let role = require_role(user)?;
        let is_owner = resolve_ownership(self.stores.directory.as_ref(), user, role, &appointment).await?;

        let current = appointment.status;
        if !can_transition(role, current, request.new_status, is_owner) {
            warn!(
                "User {} ({}) may not move appointment {} from {} to {}",
                user.id, role, appointment_id, current, request.new_status
            );
            return Err(AppointmentError::Forbidden(format!(
                "You are not authorized to update this appointment to status: {}",
                request.new_status
            )));
        }

        self.lifecycle.validate_status_transition(current, request.new_status)?;

        let now = self.clock.now();
        appointment.status = request.new_status;
        if let Some(note) = self.lifecycle.note_for(&request, user.display_name(), now) {
            appointment.append_note(note);
        }
        appointment.updated_at = now;

        let saved = self.stores.appointments.update_appointment(appointment).await?;
        info!("Appointment {} status {} -> {} by {}", saved.id, current, saved.status, user.id);

        enrich(&self.stores, saved).await
    }
}
