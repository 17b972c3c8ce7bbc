//! Day/night determination from sunrise and sunset instants.
//!
//! The phase is `Daylight` only while `sunrise < now < sunset`. Both
//! boundaries count as night. The sun times are assumed to belong to the
//! current day; no date rollover is attempted.

use chrono::{DateTime, Utc};
use plantagotchi_types::{DayNightStatus, DayPhase, SunTimes};

/// Determine the day phase at `now`.
pub fn determine(sun: &SunTimes, now: DateTime<Utc>) -> DayPhase {
    if now > sun.sunrise && now < sun.sunset {
        DayPhase::Daylight
    } else {
        DayPhase::Nighttime
    }
}

/// Build the status record shown to the player.
pub fn status(sun: SunTimes, checked_at: DateTime<Utc>) -> DayNightStatus {
    DayNightStatus {
        phase: determine(&sun, checked_at),
        sun,
        checked_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn sun(rise: &str, set: &str) -> SunTimes {
        SunTimes {
            sunrise: DateTime::parse_from_rfc3339(rise).unwrap(),
            sunset: DateTime::parse_from_rfc3339(set).unwrap(),
        }
    }

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    fn six_to_six() -> SunTimes {
        sun("2024-06-01T06:00:00+00:00", "2024-06-01T18:00:00+00:00")
    }

    #[test]
    fn noon_is_daylight() {
        assert_eq!(
            determine(&six_to_six(), at("2024-06-01T12:00:00Z")),
            DayPhase::Daylight
        );
    }

    #[test]
    fn late_evening_is_night() {
        assert_eq!(
            determine(&six_to_six(), at("2024-06-01T22:00:00Z")),
            DayPhase::Nighttime
        );
    }

    #[test]
    fn before_sunrise_is_night() {
        assert_eq!(
            determine(&six_to_six(), at("2024-06-01T03:30:00Z")),
            DayPhase::Nighttime
        );
    }

    #[test]
    fn exact_boundaries_are_night() {
        let sun = six_to_six();
        assert_eq!(
            determine(&sun, at("2024-06-01T06:00:00Z")),
            DayPhase::Nighttime
        );
        assert_eq!(
            determine(&sun, at("2024-06-01T18:00:00Z")),
            DayPhase::Nighttime
        );
    }

    #[test]
    fn one_second_inside_is_day() {
        let sun = six_to_six();
        assert_eq!(
            determine(&sun, at("2024-06-01T06:00:01Z")),
            DayPhase::Daylight
        );
        assert_eq!(
            determine(&sun, at("2024-06-01T17:59:59Z")),
            DayPhase::Daylight
        );
    }

    #[test]
    fn offsets_compare_as_instants() {
        // 08:00+02:00 is 06:00Z.
        let sun = sun("2024-06-01T08:00:00+02:00", "2024-06-01T20:00:00+02:00");
        assert_eq!(
            determine(&sun, at("2024-06-01T06:00:00Z")),
            DayPhase::Nighttime
        );
        assert_eq!(
            determine(&sun, at("2024-06-01T07:00:00Z")),
            DayPhase::Daylight
        );
    }

    #[test]
    fn status_marks_night_as_dark() {
        let checked_at = at("2024-06-01T23:00:00Z");
        let status = status(six_to_six(), checked_at);
        assert!(status.is_dark());
        assert_eq!(status.checked_at, checked_at);
    }
}
