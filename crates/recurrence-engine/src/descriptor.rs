//! Normalized recurrence descriptor and its RRULE text encoding.
//!
//! A [`RecurrenceDescriptor`] is the structured form of an RFC 5545 RRULE as far
//! as task scheduling needs it: frequency, interval, and the `BYDAY`,
//! `BYMONTHDAY`, `BYMONTH` and `BYSETPOS` sets, plus the `COUNT`/`UNTIL` bounds
//! which are carried through untouched. Absent sets are empty vectors.
//!
//! `FromStr` parses RRULE text, `Display` renders it back in canonical order.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// `BYMONTHDAY` value meaning "last day of the month".
pub const LAST_DAY: i8 = -1;

/// `BYSETPOS` value meaning "last occurrence in the period".
pub const LAST_OCCURRENCE: i8 = -1;

/// Recurrence frequency (`FREQ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(RecurrenceError::InvalidRule(format!(
                "unsupported FREQ '{}'",
                other
            ))),
        }
    }
}

/// Two-letter RRULE code for a weekday (`SU`..`SA`).
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

/// Parse a two-letter RRULE weekday code (case-insensitive).
pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code.trim().to_ascii_uppercase().as_str() {
        "SU" => Some(Weekday::Sun),
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Map a weekday number (0 = Sunday .. 6 = Saturday) to a weekday.
pub fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Sort weekdays Sunday-first and drop duplicates.
pub(crate) fn normalize_weekdays(days: &mut Vec<Weekday>) {
    days.sort_by_key(|d| d.num_days_from_sunday());
    days.dedup();
}

/// Sort positive values ascending, negative ("from the end") values after them.
pub(crate) fn normalize_signed(values: &mut Vec<i8>) {
    values.sort_by_key(|&v| (v < 0, i16::from(v).abs()));
    values.dedup();
}

fn default_interval() -> u32 {
    1
}

/// Structured recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceDescriptor {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_day: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month_day: Vec<i8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_set_pos: Vec<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
}

impl RecurrenceDescriptor {
    /// A bare rule of the given frequency with interval 1.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            count: None,
            until: None,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_by_day(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.by_day = days.into_iter().collect();
        normalize_weekdays(&mut self.by_day);
        self
    }

    pub fn with_by_month_day(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_month_day = days.into_iter().collect();
        normalize_signed(&mut self.by_month_day);
        self
    }

    pub fn with_by_month(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.by_month = months.into_iter().collect();
        self.by_month.sort_unstable();
        self.by_month.dedup();
        self
    }

    pub fn with_by_set_pos(mut self, positions: impl IntoIterator<Item = i8>) -> Self {
        self.by_set_pos = positions.into_iter().collect();
        normalize_signed(&mut self.by_set_pos);
        self
    }

    /// The same pattern with `COUNT` and `UNTIL` dropped.
    pub fn without_bounds(mut self) -> Self {
        self.count = None;
        self.until = None;
        self
    }

    /// True for a yearly rule that names several months *and* several days,
    /// i.e. one occurrence per (month, day) pair.
    pub fn is_cartesian(&self) -> bool {
        self.frequency == Frequency::Yearly
            && self.by_month.len() > 1
            && self.by_month_day.len() > 1
    }

    /// Check value ranges and the 31 / last-day exclusion.
    ///
    /// # Errors
    /// Returns `RecurrenceError::InvalidInterval` for a zero interval and
    /// `RecurrenceError::InvalidRule` for any out-of-range set member.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(RecurrenceError::InvalidInterval(0));
        }
        if let Some(day) = self
            .by_month_day
            .iter()
            .find(|&&d| d != LAST_DAY && !(1..=31).contains(&d))
        {
            return Err(RecurrenceError::InvalidRule(format!(
                "BYMONTHDAY value {} out of range",
                day
            )));
        }
        if self.by_month_day.contains(&31) && self.by_month_day.contains(&LAST_DAY) {
            return Err(RecurrenceError::InvalidRule(
                "BYMONTHDAY cannot contain both 31 and -1".to_string(),
            ));
        }
        if let Some(month) = self.by_month.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(RecurrenceError::InvalidRule(format!(
                "BYMONTH value {} out of range",
                month
            )));
        }
        if let Some(pos) = self
            .by_set_pos
            .iter()
            .find(|&&p| p != LAST_OCCURRENCE && !(1..=5).contains(&p))
        {
            return Err(RecurrenceError::InvalidRule(format!(
                "BYSETPOS value {} out of range",
                pos
            )));
        }
        Ok(())
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for RecurrenceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;
        if self.interval > 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if !self.by_day.is_empty() {
            let codes: Vec<&str> = self.by_day.iter().map(|d| weekday_code(*d)).collect();
            write!(f, ";BYDAY={}", codes.join(","))?;
        }
        if !self.by_month_day.is_empty() {
            write!(f, ";BYMONTHDAY={}", join(&self.by_month_day))?;
        }
        if !self.by_month.is_empty() {
            write!(f, ";BYMONTH={}", join(&self.by_month))?;
        }
        if !self.by_set_pos.is_empty() {
            write!(f, ";BYSETPOS={}", join(&self.by_set_pos))?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={}", count)?;
        }
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.format("%Y%m%dT235959Z"))?;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> RecurrenceError {
    RecurrenceError::InvalidRule(message.into())
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{} value '{}' is not a valid number", key, value)))
}

fn parse_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_number(key, v))
        .collect()
}

/// Parse one `BYDAY` token, e.g. `MO`, `1MO`, `-1FR`, into an optional
/// ordinal and the weekday.
fn parse_by_day(token: &str) -> Result<(Option<i8>, Weekday)> {
    let token = token.trim();
    let split = token
        .len()
        .checked_sub(2)
        .filter(|&i| token.is_char_boundary(i))
        .ok_or_else(|| invalid(format!("invalid BYDAY value '{}'", token)))?;
    let (ordinal, code) = token.split_at(split);
    let day = weekday_from_code(code)
        .ok_or_else(|| invalid(format!("invalid BYDAY value '{}'", token)))?;
    if ordinal.is_empty() {
        return Ok((None, day));
    }
    let ordinal = ordinal.trim_start_matches('+');
    Ok((Some(parse_number("BYDAY", ordinal)?), day))
}

fn parse_until(value: &str) -> Result<NaiveDate> {
    let date = value
        .trim()
        .get(..8)
        .ok_or_else(|| invalid(format!("invalid UNTIL value '{}'", value)))?;
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .map_err(|_| invalid(format!("invalid UNTIL value '{}'", value)))
}

impl FromStr for RecurrenceDescriptor {
    type Err = RecurrenceError;

    /// Parse RRULE text such as `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE`.
    ///
    /// An `RRULE:` prefix is accepted, keys are case-insensitive and unknown
    /// keys are ignored. Ordinal weekdays (`BYDAY=2TU`) are folded into
    /// `by_day` + `by_set_pos`.
    fn from_str(s: &str) -> Result<Self> {
        let mut body = s.trim();
        if body
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("RRULE:"))
        {
            body = &body[6..];
        }
        if body.is_empty() {
            return Err(invalid("empty RRULE string"));
        }

        let mut frequency = None;
        let mut descriptor = RecurrenceDescriptor::new(Frequency::Daily);

        for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("missing '=' in '{}'", part)))?;
            let key = key.trim().to_ascii_uppercase();
            match key.as_str() {
                "FREQ" => frequency = Some(value.parse::<Frequency>()?),
                "INTERVAL" => descriptor.interval = parse_number(&key, value)?,
                "BYDAY" => {
                    for token in value.split(',').filter(|t| !t.trim().is_empty()) {
                        let (ordinal, day) = parse_by_day(token)?;
                        descriptor.by_day.push(day);
                        if let Some(ordinal) = ordinal {
                            descriptor.by_set_pos.push(ordinal);
                        }
                    }
                }
                "BYMONTHDAY" => descriptor.by_month_day = parse_list(&key, value)?,
                "BYMONTH" => descriptor.by_month = parse_list(&key, value)?,
                "BYSETPOS" => descriptor.by_set_pos.extend(parse_list::<i8>(&key, value)?),
                "COUNT" => descriptor.count = Some(parse_number(&key, value)?),
                "UNTIL" => descriptor.until = Some(parse_until(value)?),
                _ => {}
            }
        }

        descriptor.frequency = frequency.ok_or_else(|| invalid("missing FREQ"))?;
        normalize_weekdays(&mut descriptor.by_day);
        normalize_signed(&mut descriptor.by_month_day);
        normalize_signed(&mut descriptor.by_set_pos);
        descriptor.by_month.sort_unstable();
        descriptor.by_month.dedup();

        descriptor.validate()?;
        Ok(descriptor)
    }
}
