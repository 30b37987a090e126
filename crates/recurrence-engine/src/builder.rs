//! Pattern builders -- picker selections into recurrence descriptors.
//!
//! Every builder is pure. An empty selection yields the kind's default rule,
//! which leaves the day to be inferred from the task's due date.

use std::collections::BTreeSet;

use tracing::warn;

use crate::classify::SimplePattern;
use crate::descriptor::{Frequency, RecurrenceDescriptor};
use crate::error::{RecurrenceError, Result};
use crate::selection::{IntervalConfig, MonthDay, MonthDaySet, PatternType, WeekdaySet};

/// Default rule for a simple kind: no day selection, interval 1.
pub fn build_default(pattern: SimplePattern) -> RecurrenceDescriptor {
    RecurrenceDescriptor::new(pattern.frequency())
}

/// Every `interval_days` days. An interval of 0 is treated as 1.
pub fn build_daily(interval_days: u32) -> RecurrenceDescriptor {
    RecurrenceDescriptor::new(Frequency::Daily).with_interval(interval_days.max(1))
}

pub fn build_weekly(selected: &WeekdaySet) -> RecurrenceDescriptor {
    RecurrenceDescriptor::new(Frequency::Weekly).with_by_day(selected.as_slice().iter().copied())
}

pub fn build_monthly(selected: &MonthDaySet) -> RecurrenceDescriptor {
    RecurrenceDescriptor::new(Frequency::Monthly)
        .with_by_month_day(selected.as_slice().iter().copied())
}

/// A multi-month yearly selection that was cut down to its first date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyReduction {
    /// The day that was kept.
    pub kept: MonthDay,
    /// How many selected dates were dropped.
    pub discarded: usize,
    /// Number of distinct months in the original selection.
    pub months: usize,
}

/// Output of [`build_yearly`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyBuild {
    pub descriptor: RecurrenceDescriptor,
    /// Set when the selection spanned several months and was reduced.
    pub reduction: Option<YearlyReduction>,
}

/// Build a yearly rule from selected calendar days. Calendar dates are
/// accepted too; their year is ignored.
///
/// Days within one month become `BYMONTH=m;BYMONTHDAY=d1,d2,..`. Days spread
/// over several months cannot be expressed in one rule without turning into a
/// months × days Cartesian product, so only the first selected day is kept
/// and a reduction is reported.
pub fn build_yearly<D: Copy + Into<MonthDay>>(selected: &[D]) -> YearlyBuild {
    let selected: Vec<MonthDay> = selected.iter().map(|&d| d.into()).collect();
    let Some(&first) = selected.first() else {
        return YearlyBuild {
            descriptor: RecurrenceDescriptor::new(Frequency::Yearly),
            reduction: None,
        };
    };

    let months: BTreeSet<u8> = selected.iter().map(|d| d.month()).collect();

    if months.len() == 1 {
        let descriptor = RecurrenceDescriptor::new(Frequency::Yearly)
            .with_by_month([first.month()])
            .with_by_month_day(selected.iter().map(|d| d.day()));
        return YearlyBuild {
            descriptor,
            reduction: None,
        };
    }

    let reduction = YearlyReduction {
        kept: first,
        discarded: selected.len() - 1,
        months: months.len(),
    };
    warn!(
        kept = %first,
        discarded = reduction.discarded,
        months = reduction.months,
        "yearly selection spans several months; keeping only the first date to avoid a months x days Cartesian product"
    );

    YearlyBuild {
        descriptor: RecurrenceDescriptor::new(Frequency::Yearly)
            .with_by_month([first.month()])
            .with_by_month_day([first.day()]),
        reduction: Some(reduction),
    }
}

/// Build a rule from the custom interval configurator.
///
/// # Errors
/// Returns `RecurrenceError::InvalidInterval` for a zero interval, and
/// `RecurrenceError::InvalidRule` if the resulting rule fails validation.
pub fn build_interval(config: &IntervalConfig) -> Result<RecurrenceDescriptor> {
    if config.interval() == 0 {
        return Err(RecurrenceError::InvalidInterval(0));
    }
    let mut descriptor =
        RecurrenceDescriptor::new(config.frequency()).with_interval(config.interval());

    match config.frequency() {
        Frequency::Daily | Frequency::Weekly => {
            descriptor = descriptor.with_by_day(config.weekdays().as_slice().iter().copied());
        }
        Frequency::Monthly | Frequency::Yearly => {
            match config.pattern_type() {
                PatternType::Weekday => {
                    if !config.weekdays().is_empty() {
                        descriptor = descriptor
                            .with_by_day(config.weekdays().as_slice().iter().copied())
                            .with_by_set_pos(config.occurrences().iter().copied());
                    }
                }
                PatternType::Day => {
                    descriptor =
                        descriptor.with_by_month_day(config.occurrences().iter().copied());
                }
            }
            if config.frequency() == Frequency::Yearly {
                descriptor = descriptor.with_by_month(config.months().iter().copied());
            }
        }
    }

    descriptor.validate()?;
    Ok(descriptor)
}
