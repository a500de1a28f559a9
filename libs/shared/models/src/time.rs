//! Wall-clock helpers shared by the scheduling cells.
//!
//! All times are local and carry no timezone. Times of day travel as `HH:mm`
//! strings; weekdays travel as upper-case English names (`MONDAY`).

use chrono::NaiveTime;

pub const TIME_FORMAT: &str = "%H:%M";

/// Half-open overlap test: `[a_start, a_end)` and `[b_start, b_end)` share at least one instant.
pub fn intervals_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Accepts `HH:mm` and the `HH:mm:ss` shape databases hand back.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S%.f"))
        .ok()
}

pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:mm", raw)))
    }
}

pub mod weekday {
    use chrono::Weekday;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn name(day: Weekday) -> &'static str {
        match day {
            Weekday::Mon => "MONDAY",
            Weekday::Tue => "TUESDAY",
            Weekday::Wed => "WEDNESDAY",
            Weekday::Thu => "THURSDAY",
            Weekday::Fri => "FRIDAY",
            Weekday::Sat => "SATURDAY",
            Weekday::Sun => "SUNDAY",
        }
    }

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(name(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Weekday>()
            .map_err(|_| D::Error::custom(format!("invalid day of week '{}'", raw)))
    }

    pub mod option {
        use chrono::Weekday;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(day: &Option<Weekday>, serializer: S) -> Result<S::Ok, S::Error> {
            match day {
                Some(day) => serializer.serialize_some(super::name(*day)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Weekday>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|value| {
                value
                    .parse::<Weekday>()
                    .map_err(|_| D::Error::custom(format!("invalid day of week '{}'", value)))
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let half_past = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        assert!(!intervals_overlap(nine, half_past, half_past, ten));
        assert!(intervals_overlap(nine, ten, half_past, ten));
    }

    #[test]
    fn parses_database_time_shapes() {
        let expected = NaiveTime::from_hms_opt(14, 5, 0);
        assert_eq!(parse_time("14:05"), expected);
        assert_eq!(parse_time("14:05:00"), expected);
        assert_eq!(parse_time("2pm"), None);
    }
}
