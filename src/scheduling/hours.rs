//! Veterinarian working hours.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::api::Veterinarian;
use crate::error::SchedulingError;

/// Working hours exactly as published by the clinic, `"HH:MM"` each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

/// Parsed, inclusive time-of-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl WorkingHours {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Hours published by a veterinarian, if both ends are present.
    pub fn from_veterinarian(vet: &Veterinarian) -> Result<Self, SchedulingError> {
        let published = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (published(&vet.start_time), published(&vet.end_time)) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(SchedulingError::NoWorkingHours {
                veterinarian_id: vet.id.clone(),
            }),
        }
    }

    /// Parse both ends. A malformed value is an error, never an open window.
    pub fn window(&self) -> Result<HoursWindow, SchedulingError> {
        let window = HoursWindow {
            start: parse_hhmm(&self.start)?,
            end: parse_hhmm(&self.end)?,
        };
        if window.start > window.end {
            tracing::warn!(
                start = %self.start,
                end = %self.end,
                "Working hours end before they start; no time will be accepted"
            );
        }
        Ok(window)
    }
}

impl HoursWindow {
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether `time` falls within `[start, end]`, compared at minute precision.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let selected = minute_of_day(time);
        minute_of_day(self.start) <= selected && selected <= minute_of_day(self.end)
    }
}

/// Minutes since midnight, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Parse `"H:MM"` / `"HH:MM"` into a time of day.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, SchedulingError> {
    let invalid = |reason: &str| SchedulingError::InvalidWorkingHours {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (hour, minute) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid("expected HH:MM"))?;

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hour) || hour.len() > 2 || !all_digits(minute) || minute.len() != 2 {
        return Err(invalid("expected HH:MM"));
    }

    let hour: u32 = hour.parse().map_err(|_| invalid("hour is not a number"))?;
    let minute: u32 = minute.parse().map_err(|_| invalid("minute is not a number"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| invalid("time of day out of range"))
}
