use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::time::{self, intervals_overlap};

/// Which days a schedule entry governs.
///
/// A date override replaces the weekly pattern for that date wholesale when
/// slots are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleRule {
    RecurringWeekly(Weekday),
    DateOverride(NaiveDate),
}

impl ScheduleRule {
    /// Builds a rule from the nullable column pair. When both are present the
    /// specific date wins; when neither is present there is no rule.
    pub fn from_parts(day_of_week: Option<Weekday>, specific_date: Option<NaiveDate>) -> Option<Self> {
        match (day_of_week, specific_date) {
            (_, Some(date)) => Some(ScheduleRule::DateOverride(date)),
            (Some(day), None) => Some(ScheduleRule::RecurringWeekly(day)),
            (None, None) => None,
        }
    }

    pub fn day_of_week(&self) -> Option<Weekday> {
        match self {
            ScheduleRule::RecurringWeekly(day) => Some(*day),
            ScheduleRule::DateOverride(_) => None,
        }
    }

    pub fn specific_date(&self) -> Option<NaiveDate> {
        match self {
            ScheduleRule::RecurringWeekly(_) => None,
            ScheduleRule::DateOverride(date) => Some(*date),
        }
    }
}

impl fmt::Display for ScheduleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleRule::RecurringWeekly(day) => write!(f, "every {}", time::weekday::name(*day)),
            ScheduleRule::DateOverride(date) => write!(f, "on {}", date),
        }
    }
}

/// One row of a doctor's working-time definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleRow", into = "ScheduleRow")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub rule: ScheduleRule,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub is_available: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ScheduleEntry {
    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(self.slot_duration_minutes as i64)
    }

    /// Whether `time` falls in `[start_time, end_time)`.
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Same rule and intersecting working intervals.
    pub fn conflicts_with(&self, other: &ScheduleEntry) -> bool {
        self.rule == other.rule
            && intervals_overlap(self.start_time, self.end_time, other.start_time, other.end_time)
    }
}

/// Flat storage/wire shape: nullable `day_of_week` and `specific_date` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    #[serde(default, with = "crate::time::weekday::option")]
    pub day_of_week: Option<Weekday>,
    #[serde(default)]
    pub specific_date: Option<NaiveDate>,
    #[serde(with = "crate::time::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::time::hhmm")]
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub is_available: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schedule {id} has neither day_of_week nor specific_date")]
pub struct MissingScheduleRule {
    pub id: Uuid,
}

impl TryFrom<ScheduleRow> for ScheduleEntry {
    type Error = MissingScheduleRule;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let rule = ScheduleRule::from_parts(row.day_of_week, row.specific_date)
            .ok_or(MissingScheduleRule { id: row.id })?;

        Ok(ScheduleEntry {
            id: row.id,
            doctor_id: row.doctor_id,
            rule,
            start_time: row.start_time,
            end_time: row.end_time,
            slot_duration_minutes: row.slot_duration_minutes,
            is_available: row.is_available,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<ScheduleEntry> for ScheduleRow {
    fn from(entry: ScheduleEntry) -> Self {
        ScheduleRow {
            id: entry.id,
            doctor_id: entry.doctor_id,
            day_of_week: entry.rule.day_of_week(),
            specific_date: entry.rule.specific_date(),
            start_time: entry.start_time,
            end_time: entry.end_time,
            slot_duration_minutes: entry.slot_duration_minutes,
            is_available: entry.is_available,
            notes: entry.notes,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    #[test]
    fn specific_date_wins_when_both_columns_are_set() {
        let rule = ScheduleRule::from_parts(Some(Weekday::Fri), Some(monday()));
        assert_eq!(rule, Some(ScheduleRule::DateOverride(monday())));
        assert_eq!(ScheduleRule::from_parts(None, None), None);
    }

    #[test]
    fn row_without_rule_is_rejected() {
        let row = json!({
            "id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "day_of_week": null,
            "specific_date": null,
            "start_time": "09:00:00",
            "end_time": "12:00:00",
            "slot_duration_minutes": 30,
            "is_available": true,
            "notes": null,
            "created_at": "2030-01-01T08:00:00",
            "updated_at": "2030-01-01T08:00:00"
        });

        assert!(serde_json::from_value::<ScheduleEntry>(row).is_err());

        let id = Uuid::nil();
        assert_eq!(
            MissingScheduleRule { id }.to_string(),
            format!("schedule {} has neither day_of_week nor specific_date", id)
        );
    }

    #[test]
    fn recurring_entry_serializes_flat() {
        let row = json!({
            "id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "day_of_week": "MONDAY",
            "start_time": "09:00",
            "end_time": "12:00",
            "slot_duration_minutes": 30,
            "is_available": true,
            "created_at": "2030-01-01T08:00:00",
            "updated_at": "2030-01-01T08:00:00"
        });

        let entry: ScheduleEntry = serde_json::from_value(row).unwrap();
        assert_eq!(entry.rule, ScheduleRule::RecurringWeekly(Weekday::Mon));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["day_of_week"], "MONDAY");
        assert_eq!(back["specific_date"], serde_json::Value::Null);
        assert_eq!(back["start_time"], "09:00");
    }
}
