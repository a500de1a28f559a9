use chrono::NaiveDateTime;
use tracing::{debug, warn};

use shared_models::{AppointmentStatus, StatusNote};

use crate::models::{AppointmentError, StatusUpdateRequest};

/// The appointment status state machine.
///
/// `SCHEDULED` may move to any terminal status. Terminal statuses only accept
/// the same value again. `RESCHEDULED` is never entered.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status || self.get_valid_transitions(current_status).contains(&new_status) {
            return Ok(());
        }

        warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
        Err(AppointmentError::InvalidStatusTransition {
            from: current_status,
            to: new_status,
        })
    }

    /// Statuses reachable from `current_status`, excluding re-application of the same value.
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => AppointmentStatus::ALL
                .into_iter()
                .filter(|status| status.is_terminal())
                .collect(),
            _ => vec![],
        }
    }

    /// Note recorded alongside a transition. Explicit notes take precedence;
    /// a patient cancellation otherwise records its reason.
    pub fn note_for(
        &self,
        request: &StatusUpdateRequest,
        actor: &str,
        recorded_at: NaiveDateTime,
    ) -> Option<StatusNote> {
        let non_blank = |text: &Option<String>| {
            text.as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let text = non_blank(&request.notes).or_else(|| {
            (request.new_status == AppointmentStatus::CancelledByPatient)
                .then(|| non_blank(&request.cancellation_reason))
                .flatten()
        })?;

        Some(StatusNote {
            actor: actor.to_string(),
            status: request.new_status,
            recorded_at,
            text,
        })
    }
}
