//! Pattern classification -- decides which editor picker a rule belongs to.
//!
//! Simple rules map onto the daily, weekly, monthly and yearly pickers. Anything
//! the simple pickers cannot express (Nth-weekday rules, multi-dimension
//! intervals, Cartesian yearly rules) falls into the `Interval` bucket, which is
//! edited through the custom interval configurator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::{Frequency, RecurrenceDescriptor};

/// User-facing pattern bucket for a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Complex or custom rule, edited through the interval configurator.
    Interval,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Daily => "daily",
            PatternKind::Weekly => "weekly",
            PatternKind::Monthly => "monthly",
            PatternKind::Yearly => "yearly",
            PatternKind::Interval => "interval",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four kinds that have a one-press picker of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl SimplePattern {
    pub fn kind(self) -> PatternKind {
        match self {
            SimplePattern::Daily => PatternKind::Daily,
            SimplePattern::Weekly => PatternKind::Weekly,
            SimplePattern::Monthly => PatternKind::Monthly,
            SimplePattern::Yearly => PatternKind::Yearly,
        }
    }

    pub fn frequency(self) -> Frequency {
        match self {
            SimplePattern::Daily => Frequency::Daily,
            SimplePattern::Weekly => Frequency::Weekly,
            SimplePattern::Monthly => Frequency::Monthly,
            SimplePattern::Yearly => Frequency::Yearly,
        }
    }
}

/// Classify a rule into exactly one [`PatternKind`]. Total: never fails.
pub fn classify(d: &RecurrenceDescriptor) -> PatternKind {
    if d.by_set_pos.len() > 1 {
        return PatternKind::Interval;
    }
    let multi_dimension = d.by_day.len() > 1 || d.by_month.len() > 1 || d.by_month_day.len() > 1;
    if d.interval > 1 && multi_dimension {
        return PatternKind::Interval;
    }

    // "first Monday" style rules have no simple picker at any frequency
    if !d.by_day.is_empty() && !d.by_set_pos.is_empty() {
        return PatternKind::Interval;
    }

    match d.frequency {
        Frequency::Daily => {
            if d.by_day.is_empty() {
                PatternKind::Daily
            } else if d.interval == 1 && matches!(d.by_day.len(), 2 | 5) {
                // "every weekday" / "every weekend" shortcuts
                PatternKind::Daily
            } else {
                PatternKind::Interval
            }
        }
        Frequency::Weekly => {
            if d.by_set_pos.is_empty() {
                PatternKind::Weekly
            } else {
                PatternKind::Interval
            }
        }
        Frequency::Monthly => {
            if d.interval > 1 {
                PatternKind::Interval
            } else {
                PatternKind::Monthly
            }
        }
        Frequency::Yearly => {
            if d.interval > 1 || d.is_cartesian() {
                PatternKind::Interval
            } else {
                PatternKind::Yearly
            }
        }
    }
}
