use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::ClinicStores;
use shared_models::{Appointment, ScheduleEntry};
use shared_utils::{AppState, Clock};

use crate::models::{AvailabilitySlot, ScheduleError};

/// Computes bookable slots from a doctor's schedule entries and bookings.
///
/// Read-only; every call recomputes from the stores.
pub struct AvailabilityService {
    stores: ClinicStores,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(state.stores.clone(), state.clock.clone())
    }

    pub fn with_stores(stores: ClinicStores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    /// Slots for an existing doctor on `date`.
    pub async fn get_doctor_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, ScheduleError> {
        if self.stores.directory.get_doctor(doctor_id).await?.is_none() {
            return Err(ScheduleError::DoctorNotFound(doctor_id));
        }

        self.compute_availability(doctor_id, date).await
    }

    /// Ordered bookable slots for `doctor_id` on `date`.
    pub async fn compute_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, ScheduleError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        let working = self.working_entries(doctor_id, date).await?;
        if working.is_empty() {
            debug!("Doctor {} has no working hours on {}", doctor_id, date);
            return Ok(Vec::new());
        }

        let booked: Vec<Appointment> = self
            .stores
            .appointments
            .appointments_for_doctor_on(doctor_id, date)
            .await?
            .into_iter()
            .filter(Appointment::holds_slot)
            .collect();

        let now = self.clock.now();
        let same_day = date == now.date();

        let mut slots: Vec<AvailabilitySlot> = working
            .iter()
            .flat_map(|entry| tile_entry(entry, date))
            .filter(|(start, end)| !booked.iter().any(|appointment| appointment.overlaps(*start, *end)))
            .filter(|(start, _)| !same_day || *start > now)
            .map(|(start, end)| AvailabilitySlot::new(start.time(), end.time()))
            .collect();

        // Overlapping entries can interleave their tiles
        slots.sort_by_key(|slot| slot.start_time);

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// Available entries in force on `date`, sorted by start time.
    ///
    /// Any date-override row for `date` replaces the weekly pattern entirely,
    /// so a single unavailable override blanks out the day.
    pub async fn working_entries(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let overrides = self.stores.schedules.schedules_for_date(doctor_id, date).await?;

        let candidates = if overrides.is_empty() {
            self.stores
                .schedules
                .schedules_for_weekday(doctor_id, date.weekday())
                .await?
        } else {
            debug!("Using {} date override(s) for doctor {} on {}", overrides.len(), doctor_id, date);
            overrides
        };

        let mut working: Vec<ScheduleEntry> = candidates
            .into_iter()
            .filter(|entry| entry.is_available)
            .collect();
        working.sort_by_key(|entry| entry.start_time);

        Ok(working)
    }

    /// Slot length for a booking starting at `start` on `date`: the entry
    /// covering `start`, else the first entry in force that day.
    pub async fn slot_duration_for(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
    ) -> Result<Option<i32>, ScheduleError> {
        let working = self.working_entries(doctor_id, date).await?;

        Ok(working
            .iter()
            .find(|entry| entry.covers(start))
            .or_else(|| working.first())
            .map(|entry| entry.slot_duration_minutes))
    }
}

/// Tiles an entry's working interval on `date` into full-length slots.
/// A trailing remainder shorter than the slot length is dropped.
pub fn tile_entry(entry: &ScheduleEntry, date: NaiveDate) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    if entry.slot_duration_minutes <= 0 {
        warn!(
            "Schedule {} has non-positive slot duration {}, skipping",
            entry.id, entry.slot_duration_minutes
        );
        return Vec::new();
    }

    let step = entry.slot_duration();
    let end = date.and_time(entry.end_time);
    let mut cursor = date.and_time(entry.start_time);
    let mut tiles = Vec::new();

    while cursor + step <= end {
        tiles.push((cursor, cursor + step));
        cursor += step;
    }

    tiles
}
