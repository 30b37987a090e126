//! Quick-entry schedule text: "tomorrow at 5pm", "every other week", ...
//!
//! Parsing is best-effort. Words that are not understood are skipped, and the
//! result only says what could be extracted. A result with nothing in it is
//! not applicable, and applying it is a no-op.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::descriptor::{Frequency, RecurrenceDescriptor};

/// What was extracted from a quick-entry string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSchedule {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub recurring: Option<RecurrenceDescriptor>,
}

impl ParsedSchedule {
    /// False when nothing at all was extracted.
    pub fn is_applicable(&self) -> bool {
        self.date.is_some() || self.time.is_some() || self.recurring.is_some()
    }
}

fn weekday_from_name(word: &str) -> Option<Weekday> {
    match word {
        "mon" | "monday" | "mondays" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" | "tuesdays" => Some(Weekday::Tue),
        "wed" | "wednesday" | "wednesdays" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" | "thursdays" => Some(Weekday::Thu),
        "fri" | "friday" | "fridays" => Some(Weekday::Fri),
        "sat" | "saturday" | "saturdays" => Some(Weekday::Sat),
        "sun" | "sunday" | "sundays" => Some(Weekday::Sun),
        _ => None,
    }
}

fn frequency_from_unit(word: &str) -> Option<Frequency> {
    match word {
        "day" | "days" => Some(Frequency::Daily),
        "week" | "weeks" => Some(Frequency::Weekly),
        "month" | "months" => Some(Frequency::Monthly),
        "year" | "years" => Some(Frequency::Yearly),
        _ => None,
    }
}

/// The next `day` strictly after `today`.
fn next_weekday(today: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today.checked_add_days(Days::new(ahead.into()))
}

/// Parse "5pm", "5:30pm", "17:30", "12am". A bare number is only accepted
/// when `meridiem` supplies the am/pm from the following word.
fn parse_time(word: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let (digits, suffix) = if let Some(d) = word.strip_suffix("am") {
        (d, Some("am"))
    } else if let Some(d) = word.strip_suffix("pm") {
        (d, Some("pm"))
    } else {
        (word, meridiem)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None if suffix.is_some() => (digits.parse::<u32>().ok()?, 0),
        None => return None,
    };

    let hour = match suffix {
        Some(s) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, s) {
                (12, "am") => 0,
                (12, _) => 12,
                (h, "pm") => h + 12,
                (h, _) => h,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse the words following "every". Returns the rule and how many words it used.
fn parse_every(words: &[&str]) -> Option<(RecurrenceDescriptor, usize)> {
    let first = *words.first()?;

    match first {
        "weekday" | "weekdays" => {
            return Some((
                RecurrenceDescriptor::new(Frequency::Daily).with_by_day([
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                ]),
                1,
            ));
        }
        "weekend" | "weekends" => {
            return Some((
                RecurrenceDescriptor::new(Frequency::Daily).with_by_day([Weekday::Sat, Weekday::Sun]),
                1,
            ));
        }
        "other" => {
            let frequency = frequency_from_unit(words.get(1)?)?;
            return Some((RecurrenceDescriptor::new(frequency).with_interval(2), 2));
        }
        _ => {}
    }

    if let Some(frequency) = frequency_from_unit(first) {
        return Some((RecurrenceDescriptor::new(frequency), 1));
    }

    if let Ok(n) = first.parse::<u32>() {
        let frequency = frequency_from_unit(words.get(1)?)?;
        return Some((RecurrenceDescriptor::new(frequency).with_interval(n.max(1)), 2));
    }

    let mut days = Vec::new();
    let mut used = 0;
    for word in words {
        if let Some(day) = weekday_from_name(word) {
            days.push(day);
            used += 1;
        } else if *word == "and" && !days.is_empty() {
            used += 1;
        } else {
            break;
        }
    }
    if days.is_empty() {
        return None;
    }
    if words.get(used - 1) == Some(&"and") {
        used -= 1;
    }
    Some((RecurrenceDescriptor::new(Frequency::Weekly).with_by_day(days), used))
}

/// Extract a date, a time and a recurrence from free text, relative to `today`.
pub fn parse_schedule(text: &str, today: NaiveDate) -> ParsedSchedule {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();

    let mut parsed = ParsedSchedule::default();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        let next = words.get(i + 1).copied();
        let meridiem = next.filter(|w| *w == "am" || *w == "pm");

        match word {
            "today" => parsed.date = Some(today),
            "tomorrow" => parsed.date = today.checked_add_days(Days::new(1)),
            "every" => {
                if let Some((rule, used)) = parse_every(&words[i + 1..]) {
                    parsed.recurring = Some(rule);
                    i += used;
                }
            }
            "at" => {
                if let Some(time) = next.and_then(|w| {
                    parse_time(w, words.get(i + 2).copied().filter(|m| *m == "am" || *m == "pm"))
                        .or_else(|| w.parse::<u32>().ok().and_then(|h| NaiveTime::from_hms_opt(h, 0, 0)))
                }) {
                    parsed.time = Some(time);
                    i += 1;
                    if words.get(i + 1).is_some_and(|m| *m == "am" || *m == "pm") {
                        i += 1;
                    }
                }
            }
            _ => {
                if let Some(day) = weekday_from_name(word) {
                    parsed.date = next_weekday(today, day);
                } else if let Ok(date) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
                    parsed.date = Some(date);
                } else if let Some(time) = parse_time(word, meridiem) {
                    parsed.time = Some(time);
                    if meridiem.is_some() && !word.ends_with('m') {
                        i += 1;
                    }
                }
            }
        }
        i += 1;
    }

    parsed
}
