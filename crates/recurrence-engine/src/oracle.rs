//! Next-occurrence math -- projects due dates from recurrence rules.
//!
//! Wraps the `rrule` crate (v0.13). Rules are anchored with a `DTSTART` at
//! midnight UTC of the reference date; due dates are whole days, so the time
//! component never leaks into results.

use chrono::{NaiveDate, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::descriptor::RecurrenceDescriptor;
use crate::error::{RecurrenceError, Result};

/// Which date anchors the next-occurrence computation for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurringMode {
    /// Next occurrence follows the previous due date.
    #[default]
    DueDate,
    /// Next occurrence follows the date the task was actually completed or acted on.
    CompletedAt,
}

/// Pick the anchor date for the next occurrence.
pub fn recurring_reference_date(
    due_date: NaiveDate,
    mode: RecurringMode,
    action_date: NaiveDate,
) -> NaiveDate {
    match mode {
        RecurringMode::DueDate => due_date,
        RecurringMode::CompletedAt => action_date,
    }
}

/// Source of next due dates. The editor only ever talks to this trait.
pub trait NextOccurrence {
    /// First occurrence of `rule` after `reference`, or on it when `initial`
    /// is set (a rule being attached for the first time may land today).
    ///
    /// Returns `Ok(None)` when the rule has no further occurrences.
    fn next_due_date(
        &self,
        rule: &str,
        reference: NaiveDate,
        initial: bool,
    ) -> Result<Option<NaiveDate>>;
}

impl<T: NextOccurrence + ?Sized> NextOccurrence for &T {
    fn next_due_date(
        &self,
        rule: &str,
        reference: NaiveDate,
        initial: bool,
    ) -> Result<Option<NaiveDate>> {
        (**self).next_due_date(rule, reference, initial)
    }
}

/// [`NextOccurrence`] backed by the `rrule` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleOracle;

impl NextOccurrence for RRuleOracle {
    fn next_due_date(
        &self,
        rule: &str,
        reference: NaiveDate,
        initial: bool,
    ) -> Result<Option<NaiveDate>> {
        // At most one instance can equal the reference date, so two suffice.
        let dates = expand_dates(rule, reference, 2)?;
        Ok(dates
            .into_iter()
            .find(|d| if initial { *d >= reference } else { *d > reference }))
    }
}

/// Preview the next `count` occurrence dates of `rule` on or after `from`.
///
/// # Errors
/// Returns `RecurrenceError::InvalidRule` if the rule is empty or unparseable.
pub fn upcoming(rule: &str, from: NaiveDate, count: u16) -> Result<Vec<NaiveDate>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut dates = expand_dates(rule, from, count)?;
    dates.retain(|d| *d >= from);
    Ok(dates)
}

/// Resolve "today" in an IANA timezone.
///
/// # Errors
/// Returns `RecurrenceError::InvalidTimezone` for an unknown zone.
pub fn today_in(timezone: &str) -> Result<NaiveDate> {
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| RecurrenceError::InvalidTimezone(timezone.to_string()))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

fn expand_dates(rule: &str, dtstart: NaiveDate, limit: u16) -> Result<Vec<NaiveDate>> {
    // Round-trip through the descriptor so only the canonical grammar reaches
    // the rrule parser (UNTIL must be a UTC datetime to match DTSTART).
    let descriptor: RecurrenceDescriptor = rule.parse()?;
    if descriptor.until.is_some_and(|until| until < dtstart) {
        return Ok(Vec::new());
    }

    let rrule_text = format!(
        "DTSTART:{}T000000Z\nRRULE:{}",
        dtstart.format("%Y%m%d"),
        descriptor
    );
    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| RecurrenceError::InvalidRule(format!("{}", e)))?;

    let instances = rrule_set.all(limit);
    Ok(instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .collect())
}
