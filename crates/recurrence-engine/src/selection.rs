//! Picker selection buffers.
//!
//! Each picker collects the user's choices in one of these buffers before the
//! builder turns them into a [`RecurrenceDescriptor`]. The buffers enforce
//! their own invariants at toggle time, so a builder can never be handed a
//! selection it would have to repair.

use std::fmt;

use chrono::{Datelike, Month, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::descriptor::{
    normalize_signed, normalize_weekdays, weekday_from_number, Frequency, RecurrenceDescriptor,
    LAST_DAY, LAST_OCCURRENCE,
};
use crate::error::{RecurrenceError, Result};

/// Selected weekdays, kept in Sunday-first order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekdaySet(Vec<Weekday>);

impl WeekdaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from weekday numbers (0 = Sunday .. 6 = Saturday); unknown numbers are dropped.
    pub fn from_numbers(numbers: &[u8]) -> Self {
        numbers.iter().filter_map(|&n| weekday_from_number(n)).collect()
    }

    /// Add the day if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, day: Weekday) -> bool {
        if let Some(i) = self.0.iter().position(|d| *d == day) {
            self.0.remove(i);
            false
        } else {
            self.0.push(day);
            normalize_weekdays(&mut self.0);
            true
        }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Weekday] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut days: Vec<Weekday> = iter.into_iter().collect();
        normalize_weekdays(&mut days);
        Self(days)
    }
}

/// Selected days of the month (1..=31, or -1 for the last day).
///
/// 31 and -1 are mutually exclusive: selecting one drops the other, so a
/// 31-day month is never counted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthDaySet(Vec<i8>);

impl MonthDaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw day numbers, skipping out-of-range values. When both 31
    /// and -1 appear the later one wins.
    pub fn from_days(days: &[i8]) -> Self {
        let mut set = Self::new();
        for &day in days.iter().filter(|&&d| is_month_day(d)) {
            if !set.contains(day) {
                set.select(day);
            }
        }
        set
    }

    /// Toggle a day. Returns whether it is now selected.
    ///
    /// # Errors
    /// Returns `RecurrenceError::InvalidRule` for a day outside {-1, 1..=31}.
    pub fn toggle(&mut self, day: i8) -> Result<bool> {
        if !is_month_day(day) {
            return Err(RecurrenceError::InvalidRule(format!(
                "month day {} out of range",
                day
            )));
        }
        if let Some(i) = self.0.iter().position(|d| *d == day) {
            self.0.remove(i);
            return Ok(false);
        }
        self.select(day);
        Ok(true)
    }

    fn select(&mut self, day: i8) {
        match day {
            31 => self.0.retain(|d| *d != LAST_DAY),
            LAST_DAY => self.0.retain(|d| *d != 31),
            _ => {}
        }
        self.0.push(day);
        normalize_signed(&mut self.0);
    }

    pub fn contains(&self, day: i8) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

fn is_month_day(day: i8) -> bool {
    day == LAST_DAY || (1..=31).contains(&day)
}

/// Longest length of `month` in any year (February counts 29).
fn max_days_in_month(month: u8) -> i8 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// A yearly calendar day: month 1..=12 and a day that exists in that month
/// in some year, or -1 for the month's last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    month: u8,
    day: i8,
}

impl MonthDay {
    /// # Errors
    /// Returns `RecurrenceError::InvalidDate` for a month outside 1..=12 or a
    /// day the month never has (Feb 29 is accepted).
    pub fn new(month: u8, day: i8) -> Result<Self> {
        let valid = (1..=12).contains(&month)
            && (day == LAST_DAY || (1..=max_days_in_month(month)).contains(&day));
        if !valid {
            return Err(RecurrenceError::InvalidDate(format!(
                "month {} has no day {}",
                month, day
            )));
        }
        Ok(Self { month, day })
    }

    /// The last day of `month`, whatever its length in a given year.
    ///
    /// # Errors
    /// Returns `RecurrenceError::InvalidDate` for a month outside 1..=12.
    pub fn last_of(month: u8) -> Result<Self> {
        Self::new(month, LAST_DAY)
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of month, -1 for the last day.
    pub fn day(&self) -> i8 {
        self.day
    }

    pub fn is_last_day(&self) -> bool {
        self.day == LAST_DAY
    }
}

impl From<NaiveDate> for MonthDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            month: date.month() as u8,
            day: date.day() as i8,
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = Month::try_from(self.month)
            .map(|m| m.name())
            .unwrap_or("?");
        if self.is_last_day() {
            write!(f, "the last day of {}", month)
        } else {
            write!(f, "{} {}", month, crate::describe::ordinal(self.day.unsigned_abs().into()))
        }
    }
}

/// Yearly picker selection, kept in selection order (the first pick decides
/// what survives a multi-month reduction).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearlyDateSet(Vec<MonthDay>);

impl YearlyDateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection that rebuilds `d` exactly, if the yearly picker can express it:
    /// a bare yearly rule, or one month with one or more days.
    pub fn from_descriptor(d: &RecurrenceDescriptor) -> Option<Self> {
        if d.frequency != Frequency::Yearly
            || d.interval > 1
            || !d.by_day.is_empty()
            || !d.by_set_pos.is_empty()
        {
            return None;
        }
        match (d.by_month.as_slice(), d.by_month_day.is_empty()) {
            ([], true) => Some(Self::new()),
            ([month], false) => d
                .by_month_day
                .iter()
                .map(|&day| MonthDay::new(*month, day))
                .collect::<Result<Vec<_>>>()
                .ok()
                .map(Self),
            _ => None,
        }
    }

    /// Add the day if absent, remove it if present. Returns whether it is now
    /// selected. Within one month, 31 and -1 exclude each other.
    pub fn toggle(&mut self, day: impl Into<MonthDay>) -> bool {
        let day = day.into();
        if let Some(i) = self.0.iter().position(|d| *d == day) {
            self.0.remove(i);
            return false;
        }
        let clashing = match day.day {
            31 => Some(LAST_DAY),
            LAST_DAY => Some(31),
            _ => None,
        };
        if let Some(other) = clashing {
            self.0.retain(|d| !(d.month == day.month && d.day == other));
        }
        self.0.push(day);
        true
    }

    pub fn contains(&self, day: impl Into<MonthDay>) -> bool {
        self.0.contains(&day.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[MonthDay] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<MonthDay> for YearlyDateSet {
    fn from_iter<I: IntoIterator<Item = MonthDay>>(iter: I) -> Self {
        let mut set = Self::new();
        for day in iter {
            if !set.contains(day) {
                set.toggle(day);
            }
        }
        set
    }
}

/// How the custom configurator picks days inside a month or year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Calendar day numbers ("on the 15th"). Monthly and yearly only.
    Day,
    /// Nth weekday ("on the 2nd Tuesday").
    #[default]
    Weekday,
}

/// State of the custom interval configurator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalConfig {
    frequency: Frequency,
    interval: u32,
    pattern_type: PatternType,
    weekdays: WeekdaySet,
    occurrences: Vec<i8>,
    months: Vec<u8>,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::Weekly,
            interval: 1,
            pattern_type: PatternType::Weekday,
            weekdays: WeekdaySet::new(),
            occurrences: Vec::new(),
            months: Vec::new(),
        }
    }
}

impl IntervalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the configurator from an existing rule.
    pub fn from_descriptor(d: &RecurrenceDescriptor) -> Self {
        let (pattern_type, occurrences) = if !d.by_month_day.is_empty() && d.frequency != Frequency::Weekly {
            (PatternType::Day, MonthDaySet::from_days(&d.by_month_day).as_slice().to_vec())
        } else {
            (PatternType::Weekday, d.by_set_pos.clone())
        };
        Self {
            frequency: d.frequency,
            interval: d.interval.max(1),
            pattern_type,
            weekdays: d.by_day.iter().copied().collect(),
            occurrences,
            months: d.by_month.clone(),
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    pub fn weekdays(&self) -> &WeekdaySet {
        &self.weekdays
    }

    pub fn occurrences(&self) -> &[i8] {
        &self.occurrences
    }

    pub fn months(&self) -> &[u8] {
        &self.months
    }

    /// Change the frequency. WEEKLY has no calendar-day mode, so it
    /// force-switches the pattern type to `Weekday`.
    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
        if frequency == Frequency::Weekly && self.pattern_type == PatternType::Day {
            self.set_pattern_type(PatternType::Weekday);
        }
    }

    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval;
    }

    /// Switch between day-number and Nth-weekday mode. Occurrences are reset
    /// because their meaning changes. Returns `false` (and changes nothing)
    /// when `Day` is requested for a weekly rule.
    pub fn set_pattern_type(&mut self, pattern_type: PatternType) -> bool {
        if pattern_type == PatternType::Day && self.frequency == Frequency::Weekly {
            return false;
        }
        if self.pattern_type != pattern_type {
            self.pattern_type = pattern_type;
            self.occurrences.clear();
        }
        true
    }

    pub fn toggle_weekday(&mut self, day: Weekday) -> bool {
        self.weekdays.toggle(day)
    }

    /// Toggle an occurrence: an Nth position (-1, 1..=5) in weekday mode, or
    /// a day of month (-1, 1..=31) in day mode, where 31 and -1 exclude each other.
    ///
    /// # Errors
    /// Returns `RecurrenceError::InvalidRule` when the value is out of range for the mode.
    pub fn toggle_occurrence(&mut self, value: i8) -> Result<bool> {
        match self.pattern_type {
            PatternType::Day => {
                let mut days = MonthDaySet(std::mem::take(&mut self.occurrences));
                let selected = days.toggle(value);
                self.occurrences = days.0;
                selected
            }
            PatternType::Weekday => {
                if value != LAST_OCCURRENCE && !(1..=5).contains(&value) {
                    return Err(RecurrenceError::InvalidRule(format!(
                        "occurrence {} out of range",
                        value
                    )));
                }
                if let Some(i) = self.occurrences.iter().position(|o| *o == value) {
                    self.occurrences.remove(i);
                    return Ok(false);
                }
                self.occurrences.push(value);
                normalize_signed(&mut self.occurrences);
                Ok(true)
            }
        }
    }

    /// # Errors
    /// Returns `RecurrenceError::InvalidRule` for a month outside 1..=12.
    pub fn toggle_month(&mut self, month: u8) -> Result<bool> {
        if !(1..=12).contains(&month) {
            return Err(RecurrenceError::InvalidRule(format!(
                "month {} out of range",
                month
            )));
        }
        if let Some(i) = self.months.iter().position(|m| *m == month) {
            self.months.remove(i);
            return Ok(false);
        }
        self.months.push(month);
        self.months.sort_unstable();
        Ok(true)
    }
}
