use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::Appointment;

/// `[start, start + minutes)` on `date`.
pub fn booking_window(date: NaiveDate, start: NaiveTime, minutes: i32) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(start);
    (start, start + Duration::minutes(minutes as i64))
}

/// First slot-holding appointment intersecting `[start, end)`.
pub fn find_overlap(appointments: &[Appointment], start: NaiveDateTime, end: NaiveDateTime) -> Option<&Appointment> {
    appointments
        .iter()
        .find(|appointment| appointment.holds_slot() && appointment.overlaps(start, end))
}
