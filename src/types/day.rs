//! Day-of-week and hour-slot types

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PlannerError;

/// Day of the week, written as its full English name ("Monday")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Day(Weekday);

impl Day {
    #[cfg(test)]
    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    /// Weekday of a local timestamp
    pub fn of(now: &NaiveDateTime) -> Self {
        Self(now.weekday())
    }

    pub fn succ(self) -> Self {
        Self(self.0.succ())
    }

    /// Days from `self` forward to `other` (0..=6)
    pub fn days_until(self, other: Day) -> u32 {
        let from = self.0.num_days_from_monday();
        let to = other.0.num_days_from_monday();
        (to + 7 - from) % 7
    }

    pub const fn as_str(self) -> &'static str {
        match self.0 {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Weekday>()
            .map(Day)
            .map_err(|_| PlannerError::InvalidDay(s.to_string()))
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// First and last hour a courier takes bookings for
pub const FIRST_SERVICE_HOUR: u8 = 9;
pub const LAST_SERVICE_HOUR: u8 = 23;

/// Hour-of-day bucket labelled like "2 PM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    hour: u8,
}

impl TimeSlot {
    /// Slot containing the given timestamp
    pub fn containing(now: &NaiveDateTime) -> Self {
        Self { hour: now.hour() as u8 }
    }

    pub fn is_service_slot(self) -> bool {
        (FIRST_SERVICE_HOUR..=LAST_SERVICE_HOUR).contains(&self.hour)
    }

    /// True once the clock has reached this slot's hour
    pub fn has_passed(self, now: &NaiveDateTime) -> bool {
        u32::from(self.hour) <= now.hour()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (display_hour, suffix) = match self.hour {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        write!(f, "{} {}", display_hour, suffix)
    }
}

impl FromStr for TimeSlot {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlannerError::InvalidTimeSlot(s.to_string());

        let mut parts = s.split_whitespace();
        let hour: u8 = parts.next().and_then(|h| h.parse().ok()).ok_or_else(invalid)?;
        let suffix = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() || !(1..=12).contains(&hour) {
            return Err(invalid());
        }

        let hour = match suffix.to_ascii_uppercase().as_str() {
            "AM" if hour == 12 => 0,
            "AM" => hour,
            "PM" if hour == 12 => 12,
            "PM" => hour + 12,
            _ => return Err(invalid()),
        };
        Ok(Self { hour })
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn day_parses_full_and_short_names() {
        assert_eq!("Monday".parse::<Day>().unwrap(), Day::new(Weekday::Mon));
        assert_eq!("fri".parse::<Day>().unwrap(), Day::new(Weekday::Fri));
        assert!("Funday".parse::<Day>().is_err());
    }

    #[test]
    fn day_displays_full_name() {
        assert_eq!(Day::new(Weekday::Sun).to_string(), "Sunday");
        assert_eq!(Day::new(Weekday::Sun).succ().to_string(), "Monday");
    }

    #[test]
    fn day_distance_wraps_the_week() {
        let sat = Day::new(Weekday::Sat);
        assert_eq!(sat.days_until(Day::new(Weekday::Sat)), 0);
        assert_eq!(sat.days_until(Day::new(Weekday::Mon)), 2);
    }

    #[test]
    fn day_of_timestamp() {
        // 2024-06-12 was a Wednesday
        assert_eq!(Day::of(&at(10)).to_string(), "Wednesday");
    }

    #[test]
    fn slot_parses_twelve_hour_labels() {
        assert_eq!("2 PM".parse::<TimeSlot>().unwrap().hour, 14);
        assert_eq!("12 PM".parse::<TimeSlot>().unwrap().hour, 12);
        assert_eq!("12 AM".parse::<TimeSlot>().unwrap().hour, 0);
        assert_eq!("9 am".parse::<TimeSlot>().unwrap().hour, 9);
    }

    #[test]
    fn slot_rejects_malformed_labels() {
        for label in ["", "14", "13 PM", "0 AM", "2 XM", "2 PM extra"] {
            assert!(label.parse::<TimeSlot>().is_err(), "accepted {:?}", label);
        }
    }

    #[test]
    fn slot_display_round_trips() {
        for hour in 0..24 {
            let slot = TimeSlot { hour };
            assert_eq!(slot.to_string().parse::<TimeSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn slot_passes_once_its_hour_starts() {
        let now = at(14);
        assert!("2 PM".parse::<TimeSlot>().unwrap().has_passed(&now));
        assert!(!"3 PM".parse::<TimeSlot>().unwrap().has_passed(&now));
    }

    #[test]
    fn service_slots_run_from_nine_to_eleven() {
        let slots: Vec<String> = (0..24)
            .map(|hour| TimeSlot { hour })
            .filter(|slot| slot.is_service_slot())
            .map(|slot| slot.to_string())
            .collect();
        assert_eq!(slots.first().map(String::as_str), Some("9 AM"));
        assert_eq!(slots.last().map(String::as_str), Some("11 PM"));
        assert_eq!(slots.len(), 15);
    }
}
