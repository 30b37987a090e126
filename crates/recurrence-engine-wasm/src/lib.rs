//! WASM bindings for recurrence-engine.
//!
//! Exposes rule classification, display text, the picker builders, next
//! occurrence math and quick-entry parsing to JavaScript via `wasm-bindgen`.
//! All complex types are passed as JSON strings; dates are `YYYY-MM-DD`.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p recurrence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/recurrence_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use recurrence_engine::descriptor::weekday_from_number;
use recurrence_engine::{
    build_daily, build_interval, build_monthly, build_weekly, build_yearly, classify, describe,
    parse_schedule, Frequency, IntervalConfig, MonthDaySet, NextOccurrence, PatternType,
    RRuleOracle, RecurrenceDescriptor, RecurrenceError, WeekdaySet,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReductionDto {
    kept: String,
    discarded: usize,
    months: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YearlyBuildDto {
    rule: String,
    /// Present when a multi-month selection was reduced to its first date.
    reduction: Option<ReductionDto>,
}

/// Interval configurator state as sent by the UI.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntervalInput {
    frequency: Frequency,
    #[serde(default = "default_interval")]
    interval: u32,
    #[serde(default)]
    pattern_type: PatternType,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    weekdays: Vec<u8>,
    #[serde(default)]
    occurrences: Vec<i8>,
    #[serde(default)]
    months: Vec<u8>,
}

fn default_interval() -> u32 {
    1
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedScheduleDto {
    applicable: bool,
    date: Option<String>,
    time: Option<String>,
    recurring: Option<String>,
    description: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_error(e: RecurrenceError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_rule(rule: &str) -> Result<RecurrenceDescriptor, JsValue> {
    rule.parse().map_err(js_error)
}

fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", s, e)))
}

fn from_json<'a, T: Deserialize<'a>>(json: &'a str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Classify an RRULE into the picker that edits it: "daily", "weekly",
/// "monthly", "yearly" or "interval".
#[wasm_bindgen(js_name = "classifyRRule")]
pub fn classify_rrule(rule: &str) -> Result<String, JsValue> {
    Ok(classify(&parse_rule(rule)?).to_string())
}

/// Human-readable description of an RRULE, e.g. "Every 2 weeks on Mon, Wed".
#[wasm_bindgen(js_name = "describeRRule")]
pub fn describe_rrule(rule: &str) -> Result<String, JsValue> {
    Ok(describe(&parse_rule(rule)?))
}

/// Every N days.
#[wasm_bindgen(js_name = "buildDaily")]
pub fn build_daily_rule(interval: u32) -> String {
    build_daily(interval).to_string()
}

/// Weekly rule from a JSON array of weekday numbers (0 = Sunday).
#[wasm_bindgen(js_name = "buildWeekly")]
pub fn build_weekly_rule(weekdays_json: &str) -> Result<String, JsValue> {
    let numbers: Vec<u8> = from_json(weekdays_json, "weekdays")?;
    let set = numbers
        .iter()
        .map(|n| {
            weekday_from_number(*n)
                .ok_or_else(|| JsValue::from_str(&format!("Invalid weekday number: {}", n)))
        })
        .collect::<Result<WeekdaySet, JsValue>>()?;
    Ok(build_weekly(&set).to_string())
}

/// Monthly rule from a JSON array of day numbers (-1 = last day). A later
/// 31 or -1 replaces an earlier one.
#[wasm_bindgen(js_name = "buildMonthly")]
pub fn build_monthly_rule(days_json: &str) -> Result<String, JsValue> {
    let days: Vec<i8> = from_json(days_json, "days")?;
    let mut set = MonthDaySet::new();
    for day in days {
        set.toggle(day).map_err(js_error)?;
    }
    Ok(build_monthly(&set).to_string())
}

/// Yearly rule from a JSON array of `YYYY-MM-DD` dates in selection order.
///
/// Returns `{rule, reduction}`; `reduction` is non-null when the dates
/// spanned several months and only the first was kept.
#[wasm_bindgen(js_name = "buildYearly")]
pub fn build_yearly_rule(dates_json: &str) -> Result<String, JsValue> {
    let raw: Vec<String> = from_json(dates_json, "dates")?;
    let dates = raw
        .iter()
        .map(|s| parse_date(s))
        .collect::<Result<Vec<_>, _>>()?;
    let built = build_yearly(&dates);
    to_json(&YearlyBuildDto {
        rule: built.descriptor.to_string(),
        reduction: built.reduction.map(|r| ReductionDto {
            kept: r.kept.to_string(),
            discarded: r.discarded,
            months: r.months,
        }),
    })
}

/// Custom interval rule from the configurator state
/// (`{frequency, interval, patternType, weekdays, occurrences, months}`).
#[wasm_bindgen(js_name = "buildInterval")]
pub fn build_interval_rule(config_json: &str) -> Result<String, JsValue> {
    let input: IntervalInput = from_json(config_json, "interval config")?;

    let mut config = IntervalConfig::new();
    config.set_frequency(input.frequency);
    config.set_interval(input.interval);
    if !config.set_pattern_type(input.pattern_type) {
        return Err(JsValue::from_str("The day pattern is not available for weekly rules"));
    }
    for n in input.weekdays {
        let day = weekday_from_number(n)
            .ok_or_else(|| JsValue::from_str(&format!("Invalid weekday number: {}", n)))?;
        config.toggle_weekday(day);
    }
    for value in input.occurrences {
        config.toggle_occurrence(value).map_err(js_error)?;
    }
    for month in input.months {
        config.toggle_month(month).map_err(js_error)?;
    }

    build_interval(&config)
        .map(|d| d.to_string())
        .map_err(js_error)
}

/// Next due date of `rule` after `reference` (on it when `initial`), or
/// `undefined` when the rule is exhausted.
#[wasm_bindgen(js_name = "nextDueDate")]
pub fn next_due_date(rule: &str, reference: &str, initial: bool) -> Result<Option<String>, JsValue> {
    let reference = parse_date(reference)?;
    let next = RRuleOracle
        .next_due_date(rule, reference, initial)
        .map_err(js_error)?;
    Ok(next.map(|d| d.to_string()))
}

/// Extract date, time and recurrence from quick-entry text relative to `today`.
#[wasm_bindgen(js_name = "parseSchedule")]
pub fn parse_schedule_text(text: &str, today: &str) -> Result<String, JsValue> {
    let parsed = parse_schedule(text, parse_date(today)?);
    to_json(&ParsedScheduleDto {
        applicable: parsed.is_applicable(),
        date: parsed.date.map(|d| d.to_string()),
        time: parsed.time.map(|t| t.format("%H:%M").to_string()),
        recurring: parsed.recurring.as_ref().map(|d| d.to_string()),
        description: parsed.recurring.as_ref().map(describe),
    })
}
