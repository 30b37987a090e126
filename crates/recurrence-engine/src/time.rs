//! 12-hour time entry with clamping.
//!
//! Raw hour/minute input is clamped into range when the field loses focus
//! (`blur`) rather than rejected: hour 1..=12, minute 0..=59.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    #[default]
    Am,
    Pm,
}

pub fn clamp_hour(raw: i64) -> u8 {
    raw.clamp(1, 12) as u8
}

pub fn clamp_minute(raw: i64) -> u8 {
    raw.clamp(0, 59) as u8
}

/// Hour, minute and AM/PM as entered in the time picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInput {
    hour: u8,
    minute: u8,
    meridiem: Meridiem,
}

impl Default for TimeInput {
    /// 9:00 AM
    fn default() -> Self {
        Self {
            hour: 9,
            minute: 0,
            meridiem: Meridiem::Am,
        }
    }
}

impl TimeInput {
    pub fn new(hour: i64, minute: i64, meridiem: Meridiem) -> Self {
        Self {
            hour: clamp_hour(hour),
            minute: clamp_minute(minute),
            meridiem,
        }
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        let (pm, hour) = time.hour12();
        Self {
            hour: hour as u8,
            minute: time.minute() as u8,
            meridiem: if pm { Meridiem::Pm } else { Meridiem::Am },
        }
    }

    /// Commit raw field values, clamping them into range.
    pub fn blur(&mut self, hour: i64, minute: i64) {
        self.hour = clamp_hour(hour);
        self.minute = clamp_minute(minute);
    }

    pub fn set_meridiem(&mut self, meridiem: Meridiem) {
        self.meridiem = meridiem;
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        let hour = match (self.hour, self.meridiem) {
            (12, Meridiem::Am) => 0,
            (12, Meridiem::Pm) => 12,
            (h, Meridiem::Am) => h,
            (h, Meridiem::Pm) => h + 12,
        };
        NaiveTime::from_hms_opt(hour.into(), self.minute.into(), 0).unwrap_or(NaiveTime::MIN)
    }
}
