//! # recurrence-engine
//!
//! Recurrence pattern editor core for task scheduling.
//!
//! Translates between RRULE-style recurrence rules and the small set of
//! pickers a task app offers (daily, weekly, monthly, yearly, custom
//! interval), keeps that mapping consistent, and drives the editor gestures
//! (pick, apply, clear, skip) against an injected task store.
//!
//! ## Modules
//!
//! - [`descriptor`] — `RecurrenceDescriptor` and its RRULE text encoding
//! - [`classify`] — rule → pattern kind
//! - [`builder`] — picker selections → rule
//! - [`describe`] — rule → display text
//! - [`selection`] — picker selection buffers
//! - [`editor`] — the editor state machine
//! - [`oracle`] — next-occurrence math via the `rrule` crate
//! - [`task`] — task records, patches, update targets and the store seam
//! - [`time`] — 12-hour time entry with clamping
//! - [`quick`] — quick-entry schedule text
//! - [`error`] — Error types

pub mod builder;
pub mod classify;
pub mod describe;
pub mod descriptor;
pub mod editor;
pub mod error;
pub mod oracle;
pub mod quick;
pub mod selection;
pub mod task;
pub mod time;

pub use builder::{
    build_daily, build_default, build_interval, build_monthly, build_weekly, build_yearly,
    YearlyBuild, YearlyReduction,
};
pub use classify::{classify, PatternKind, SimplePattern};
pub use describe::{describe, ordinal};
pub use descriptor::{Frequency, RecurrenceDescriptor};
pub use editor::{EditorMode, EditorState, ScheduleEditor, Update};
pub use error::RecurrenceError;
pub use oracle::{NextOccurrence, RRuleOracle, RecurringMode};
pub use quick::{parse_schedule, ParsedSchedule};
pub use selection::{
    IntervalConfig, MonthDay, MonthDaySet, PatternType, WeekdaySet, YearlyDateSet,
};
pub use task::{InMemoryStore, PatchField, TaskId, TaskPatch, TaskRecord, TaskStore, UpdateTarget};
pub use time::{Meridiem, TimeInput};
