//! Human-readable rule descriptions for display.
//!
//! The text is never parsed back. A rule that encodes several dates is always
//! described as several dates; yearly months × days rules state their exact
//! total.

use std::collections::BTreeSet;

use chrono::{Month, Months, NaiveDate, Weekday};

use crate::descriptor::{Frequency, RecurrenceDescriptor, LAST_DAY};

/// Describe a rule, e.g. "Every 2 weeks on Mon, Wed".
pub fn describe(d: &RecurrenceDescriptor) -> String {
    let mut text = match d.frequency {
        Frequency::Daily => describe_daily(d),
        Frequency::Weekly => describe_weekly(d),
        Frequency::Monthly => describe_monthly(d),
        Frequency::Yearly => describe_yearly(d),
    };
    if let Some(count) = d.count {
        text.push_str(&format!(", {} times", count));
    }
    if let Some(until) = d.until {
        text.push_str(&format!(", until {}", until.format("%Y-%m-%d")));
    }
    text
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn every(interval: u32, adverb: &str, unit: &str) -> String {
    if interval <= 1 {
        adverb.to_string()
    } else {
        format!("Every {} {}s", interval, unit)
    }
}

fn short_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn long_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u8) -> String {
    Month::try_from(month)
        .map(|m| m.name().to_string())
        .unwrap_or_else(|_| format!("month {}", month))
}

fn set_pos_name(pos: i8) -> String {
    match pos {
        -1 => "last".to_string(),
        1 => "first".to_string(),
        2 => "second".to_string(),
        3 => "third".to_string(),
        4 => "fourth".to_string(),
        5 => "fifth".to_string(),
        n => ordinal(n.unsigned_abs().into()),
    }
}

fn short_weekdays(days: &[Weekday]) -> String {
    days.iter().map(|d| short_weekday(*d)).collect::<Vec<_>>().join(", ")
}

/// "the first, third Monday, Friday"
fn nth_weekdays(d: &RecurrenceDescriptor) -> String {
    let positions: Vec<String> = d.by_set_pos.iter().map(|p| set_pos_name(*p)).collect();
    let days: Vec<&str> = d.by_day.iter().map(|w| long_weekday(*w)).collect();
    format!("the {} {}", positions.join(", "), days.join(", "))
}

fn day_number(day: i8) -> String {
    if day == LAST_DAY {
        "last day".to_string()
    } else {
        day.to_string()
    }
}

fn day_ordinal(day: i8) -> String {
    if day == LAST_DAY {
        "last day".to_string()
    } else {
        ordinal(day.unsigned_abs().into())
    }
}

fn is_weekdays(days: &[Weekday]) -> bool {
    days.len() == 5 && !days.contains(&Weekday::Sat) && !days.contains(&Weekday::Sun)
}

fn is_weekend(days: &[Weekday]) -> bool {
    days.len() == 2 && days.contains(&Weekday::Sat) && days.contains(&Weekday::Sun)
}

fn describe_daily(d: &RecurrenceDescriptor) -> String {
    if d.interval <= 1 && is_weekdays(&d.by_day) {
        return "Every weekday".to_string();
    }
    if d.interval <= 1 && is_weekend(&d.by_day) {
        return "Every weekend".to_string();
    }
    let base = every(d.interval, "Daily", "day");
    if d.by_day.is_empty() {
        base
    } else {
        format!("{} on {}", base, short_weekdays(&d.by_day))
    }
}

fn describe_weekly(d: &RecurrenceDescriptor) -> String {
    let base = every(d.interval, "Weekly", "week");
    if d.by_day.is_empty() {
        base
    } else {
        format!("{} on {}", base, short_weekdays(&d.by_day))
    }
}

fn describe_monthly(d: &RecurrenceDescriptor) -> String {
    let base = every(d.interval, "Monthly", "month");
    if !d.by_day.is_empty() && !d.by_set_pos.is_empty() {
        return format!("{} on {}", base, nth_weekdays(d));
    }
    if !d.by_month_day.is_empty() {
        if d.by_month_day == [LAST_DAY] {
            return format!("{} on the last day", base);
        }
        let label = if d.by_month_day.len() == 1 { "day" } else { "days" };
        let days: Vec<String> = d.by_month_day.iter().map(|v| day_number(*v)).collect();
        return format!("{} on {} {}", base, label, days.join(", "));
    }
    if !d.by_day.is_empty() {
        return format!("{} on every {}", base, short_weekdays(&d.by_day));
    }
    base
}

fn describe_yearly(d: &RecurrenceDescriptor) -> String {
    let base = every(d.interval, "Yearly", "year");
    let months: Vec<String> = d.by_month.iter().map(|m| month_name(*m)).collect();

    if !d.by_day.is_empty() && !d.by_set_pos.is_empty() {
        return if months.is_empty() {
            format!("{} on {}", base, nth_weekdays(d))
        } else {
            format!("{} on {} of {}", base, nth_weekdays(d), months.join(", "))
        };
    }

    let days: Vec<String> = d.by_month_day.iter().map(|v| day_ordinal(*v)).collect();

    match (d.by_month.len(), d.by_month_day.len()) {
        (0, 0) => {
            if d.by_day.is_empty() {
                base
            } else {
                format!("{} on every {}", base, short_weekdays(&d.by_day))
            }
        }
        (0, _) => {
            // no BYMONTH: the day(s) repeat in every month of the year
            format!(
                "{} on the {} of every month ({})",
                base,
                days.join(", "),
                yearly_total(d)
            )
        }
        (_, 0) => format!("{} in {}", base, months.join(", ")),
        (1, 1) if d.by_month_day[0] == LAST_DAY => {
            format!("{} on the last day of {}", base, months[0])
        }
        (1, 1) => format!("{} on {} {}", base, months[0], days[0]),
        (1, _) => format!("{} on dates {} {}", base, months[0], days.join(", ")),
        (_, 1) => {
            let dates: Vec<String> = months.iter().map(|m| format!("{} {}", m, days[0])).collect();
            format!("{} on dates {}", base, dates.join(", "))
        }
        (m, n) => {
            let every_pair_exists =
                dates_in_year(d, COMMON_YEAR) == m * n && dates_in_year(d, LEAP_YEAR) == m * n;
            let total = if every_pair_exists {
                format!("{} months × {} days = {} dates total", m, n, m * n)
            } else {
                format!("{} months × {} days, {}", m, n, yearly_total(d))
            };
            format!(
                "{} on dates {} on the {} ({})",
                base,
                months.join(", "),
                days.join(", "),
                total
            )
        }
    }
}

const COMMON_YEAR: i32 = 2023;
const LEAP_YEAR: i32 = 2024;

/// Distinct dates a yearly month-day rule produces in `year`. No `BYMONTH`
/// means every month; days a month lacks produce nothing.
fn dates_in_year(d: &RecurrenceDescriptor, year: i32) -> usize {
    let months: Vec<u32> = if d.by_month.is_empty() {
        (1..=12).collect()
    } else {
        d.by_month.iter().map(|&m| u32::from(m)).collect()
    };
    let mut dates = BTreeSet::new();
    for month in months {
        for &day in &d.by_month_day {
            let date = if day == LAST_DAY {
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|first| first.checked_add_months(Months::new(1)))
                    .and_then(|next| next.pred_opt())
            } else {
                NaiveDate::from_ymd_opt(year, month, u32::from(day.unsigned_abs()))
            };
            dates.extend(date);
        }
    }
    dates.len()
}

/// "7 dates total", or "11 dates total, 12 in leap years" when February 29
/// changes the count.
fn yearly_total(d: &RecurrenceDescriptor) -> String {
    let common = dates_in_year(d, COMMON_YEAR);
    let leap = dates_in_year(d, LEAP_YEAR);
    let noun = if common == 1 { "date" } else { "dates" };
    if common == leap {
        format!("{} {} total", common, noun)
    } else {
        format!("{} {} total, {} in leap years", common, noun, leap)
    }
}
