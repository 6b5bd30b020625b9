//! Slot generation for a single machine-day.
//!
//! Business hours and slot width come from the `settings` table, with the
//! defaults below for any key that is missing or unusable. Slots run from
//! the start time (inclusive) to the end time (exclusive) and never cross
//! midnight of the requested date.

use std::collections::HashSet;

use thiserror::Error;
use time::{
    macros::{format_description, time},
    Date, Duration, PrimitiveDateTime, Time,
};

use crate::models::Slot;

pub const DEFAULT_START_TIME: Time = time!(09:00);
pub const DEFAULT_END_TIME: Time = time!(21:00);
pub const DEFAULT_SLOT_MINUTES: i64 = 60;

pub const START_TIME_KEY: &str = "start_time";
pub const END_TIME_KEY: &str = "end_time";
pub const SLOT_DURATION_KEY: &str = "slot_duration";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid date {0:?}, expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid time {0:?}, expected HH:MM.")]
    InvalidTime(String),

    #[error("Start time must be before end time.")]
    EmptyWindow,

    #[error("Slot duration must be a positive number of minutes.")]
    NonPositiveDuration,
}

pub fn parse_date(value: &str) -> Result<Date, ScheduleError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ScheduleError::InvalidDate(value.to_string()))
}

pub fn parse_clock(value: &str) -> Result<Time, ScheduleError> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]"))
        .map_err(|_| ScheduleError::InvalidTime(value.to_string()))
}

pub fn format_clock(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSettings {
    start_time: Time,
    end_time: Time,
    slot_minutes: i64,
}

impl Default for SlotSettings {
    fn default() -> Self {
        SlotSettings {
            start_time: DEFAULT_START_TIME,
            end_time: DEFAULT_END_TIME,
            slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl SlotSettings {
    pub fn new(start_time: Time, end_time: Time, slot_minutes: i64) -> Result<Self, ScheduleError> {
        if start_time >= end_time {
            return Err(ScheduleError::EmptyWindow);
        }
        if slot_minutes <= 0 {
            return Err(ScheduleError::NonPositiveDuration);
        }

        Ok(SlotSettings {
            start_time,
            end_time,
            slot_minutes,
        })
    }

    /// Reads stored key/value rows. Unknown keys are ignored and each
    /// recognized key that fails to parse keeps its default.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = SlotSettings::default();

        for (key, value) in pairs {
            match key {
                START_TIME_KEY => {
                    if let Ok(start_time) = parse_clock(value) {
                        settings.start_time = start_time;
                    }
                }
                END_TIME_KEY => {
                    if let Ok(end_time) = parse_clock(value) {
                        settings.end_time = end_time;
                    }
                }
                SLOT_DURATION_KEY => match value.trim().parse::<i64>() {
                    Ok(minutes) if minutes > 0 => settings.slot_minutes = minutes,
                    _ => {}
                },
                _ => {}
            }
        }

        settings
    }

    pub fn start_time(&self) -> Time {
        self.start_time
    }

    pub fn end_time(&self) -> Time {
        self.end_time
    }

    pub fn slot_minutes(&self) -> i64 {
        self.slot_minutes
    }

    pub fn slot_times(&self, date: Date) -> Vec<Time> {
        let step = Duration::minutes(self.slot_minutes);
        let end = PrimitiveDateTime::new(date, self.end_time);
        let mut current = PrimitiveDateTime::new(date, self.start_time);
        let mut times = Vec::new();

        while current < end {
            times.push(current.time());
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        times
    }
}

/// Every generated slot for `date`, marked unavailable when its time is in
/// `booked` or when the whole date is blocked.
pub fn availability(
    settings: &SlotSettings,
    date: Date,
    booked: &HashSet<String>,
    blocked: bool,
) -> Vec<Slot> {
    settings
        .slot_times(date)
        .into_iter()
        .map(|slot_time| {
            let time = format_clock(slot_time);
            let available = !blocked && !booked.contains(&time);
            Slot { time, available }
        })
        .collect()
}
