// libs/shared/models/src/primitives.rs
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::Weekday;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive bounds for a timezone offset, in minutes east of UTC.
pub const MIN_TIMEZONE_OFFSET_MINUTES: i32 = -720;
pub const MAX_TIMEZONE_OFFSET_MINUTES: i32 = 840;

/// Minimum enforced break after a session, in minutes.
pub const MIN_AFTER_SESSION_BREAK_MINUTES: i32 = 15;

/// Minimum gap between two slots of the same therapist on the same UTC day.
pub const MIN_SLOT_GAP_MINUTES: i32 = 30;

// ==============================================================================
// PREFIXED IDENTIFIERS
// ==============================================================================

macro_rules! prefixed_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4()))
            }

            pub fn from_string(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

prefixed_id!(TherapistId, "therapist");
prefixed_id!(ClientId, "client");
prefixed_id!(TimeSlotId, "timeslot");
prefixed_id!(BookingId, "booking");
prefixed_id!(SessionId, "session");
prefixed_id!(SpecializationId, "specialization");
prefixed_id!(NotificationId, "notification");

// ==============================================================================
// WALL-CLOCK TIME AND WEEKDAYS
// ==============================================================================

/// Wall-clock time of day in strict `HH:MM` form (24-hour, zero-padded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Time24h {
    hour: u8,
    minute: u8,
}

fn time24h_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").unwrap())
}

impl Time24h {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_from_midnight(&self) -> i32 {
        self.hour as i32 * 60 + self.minute as i32
    }

    /// Builds a `Time24h` from a minute count that may run past midnight in
    /// either direction; the caller keeps track of the day shift.
    pub fn from_minutes_wrapped(minutes: i32) -> Self {
        let wrapped = minutes.rem_euclid(24 * 60);
        Self {
            hour: (wrapped / 60) as u8,
            minute: (wrapped % 60) as u8,
        }
    }
}

impl FromStr for Time24h {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !time24h_pattern().is_match(value) {
            return Err(format!("invalid time, expected HH:MM: {value:?}"));
        }
        let hour: u8 = value[0..2].parse().map_err(|_| "invalid hour".to_string())?;
        let minute: u8 = value[3..5].parse().map_err(|_| "invalid minute".to_string())?;
        Ok(Self { hour, minute })
    }
}

impl TryFrom<String> for Time24h {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Time24h> for String {
    fn from(value: Time24h) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Time24h {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Day of week with case-sensitive English names, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        match self {
            DayOfWeek::Sunday => DayOfWeek::Monday,
            DayOfWeek::Monday => DayOfWeek::Tuesday,
            DayOfWeek::Tuesday => DayOfWeek::Wednesday,
            DayOfWeek::Wednesday => DayOfWeek::Thursday,
            DayOfWeek::Thursday => DayOfWeek::Friday,
            DayOfWeek::Friday => DayOfWeek::Saturday,
            DayOfWeek::Saturday => DayOfWeek::Sunday,
        }
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Self {
        match self {
            DayOfWeek::Sunday => DayOfWeek::Saturday,
            DayOfWeek::Monday => DayOfWeek::Sunday,
            DayOfWeek::Tuesday => DayOfWeek::Monday,
            DayOfWeek::Wednesday => DayOfWeek::Tuesday,
            DayOfWeek::Thursday => DayOfWeek::Wednesday,
            DayOfWeek::Friday => DayOfWeek::Thursday,
            DayOfWeek::Saturday => DayOfWeek::Friday,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Case-sensitive on purpose: "monday" is rejected.
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str() == value)
            .ok_or_else(|| format!("invalid day of week: {value:?}"))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// OFFSETS AND CONTACT NUMBERS
// ==============================================================================

/// Signed minutes east of UTC, inclusive range -720..=+840.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TimezoneOffset(i32);

impl TimezoneOffset {
    pub const UTC: TimezoneOffset = TimezoneOffset(0);

    pub fn try_new(minutes: i32) -> Result<Self, String> {
        if !(MIN_TIMEZONE_OFFSET_MINUTES..=MAX_TIMEZONE_OFFSET_MINUTES).contains(&minutes) {
            return Err(format!(
                "timezone offset {minutes} outside [{MIN_TIMEZONE_OFFSET_MINUTES}, {MAX_TIMEZONE_OFFSET_MINUTES}]"
            ));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for TimezoneOffset {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<TimezoneOffset> for i32 {
    fn from(value: TimezoneOffset) -> Self {
        value.0
    }
}

/// WhatsApp contact number: `+` followed by 8 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WhatsAppNumber(String);

fn whatsapp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+[0-9]{8,15}$").unwrap())
}

impl WhatsAppNumber {
    pub fn try_new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if !whatsapp_pattern().is_match(&value) {
            return Err(format!("invalid WhatsApp number: {value:?}"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WhatsAppNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<WhatsAppNumber> for String {
    fn from(value: WhatsAppNumber) -> Self {
        value.0
    }
}

impl fmt::Display for WhatsAppNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
