//! Schedule editor -- the state machine behind the recurrence picker.
//!
//! The editor holds the picker state for one [`UpdateTarget`] and turns user
//! gestures into [`TaskPatch`]es written through a [`TaskStore`]:
//!
//! - picking a simple kind applies that kind's default rule at once and opens
//!   its picker; later picks only touch the selection buffer until `apply`
//! - opening the interval configurator writes nothing until `apply_interval`
//! - `clear` empties due date, due time and rule in one patch and resets every
//!   buffer
//! - `skip` moves the due date to the next occurrence (or the next day for a
//!   non-recurring task)
//!
//! Attaching a rule never moves an existing due date. Only a task without one
//! gets a due date, projected from today through the [`NextOccurrence`] oracle.
//!
//! Every write returns the [`Update`]s it issued; an empty vector means
//! nothing was written.

use chrono::{Days, NaiveDate, Weekday};
use tracing::{debug, warn};

use crate::builder::{
    build_daily, build_default, build_interval, build_monthly, build_weekly, build_yearly,
};
use crate::classify::{classify, PatternKind, SimplePattern};
use crate::descriptor::RecurrenceDescriptor;
use crate::error::{RecurrenceError, Result};
use crate::oracle::{recurring_reference_date, NextOccurrence};
use crate::quick::ParsedSchedule;
use crate::selection::{IntervalConfig, MonthDay, MonthDaySet, WeekdaySet, YearlyDateSet};
use crate::task::{TaskId, TaskPatch, TaskRecord, TaskStore, UpdateTarget};
use crate::time::TimeInput;

/// Coarse state, as a UI would switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    PatternSelected(SimplePattern),
    IntervalConfigOpen,
}

/// Picker state: which picker is open, with its selection buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Daily { interval: u32 },
    Weekly { weekdays: WeekdaySet },
    Monthly { days: MonthDaySet },
    /// Selected month/day pairs in selection order.
    Yearly { dates: YearlyDateSet },
    Interval(IntervalConfig),
}

impl EditorState {
    /// Default (empty) selection for a simple kind.
    pub fn for_pattern(pattern: SimplePattern) -> Self {
        match pattern {
            SimplePattern::Daily => EditorState::Daily { interval: 1 },
            SimplePattern::Weekly => EditorState::Weekly {
                weekdays: WeekdaySet::new(),
            },
            SimplePattern::Monthly => EditorState::Monthly {
                days: MonthDaySet::new(),
            },
            SimplePattern::Yearly => EditorState::Yearly {
                dates: YearlyDateSet::new(),
            },
        }
    }

    /// Rebuild picker state from an existing rule.
    ///
    /// A simple picker is chosen only when applying it unchanged writes the
    /// same rule back (`COUNT`/`UNTIL` aside); anything else opens the
    /// interval configurator.
    pub fn from_descriptor(d: &RecurrenceDescriptor) -> Self {
        let seeded = match classify(d) {
            PatternKind::Daily => EditorState::Daily {
                interval: d.interval,
            },
            PatternKind::Weekly => EditorState::Weekly {
                weekdays: d.by_day.iter().copied().collect(),
            },
            PatternKind::Monthly => EditorState::Monthly {
                days: MonthDaySet::from_days(&d.by_month_day),
            },
            PatternKind::Yearly => match YearlyDateSet::from_descriptor(d) {
                Some(dates) => EditorState::Yearly { dates },
                None => EditorState::Idle,
            },
            PatternKind::Interval => EditorState::Idle,
        };
        let pattern = d.clone().without_bounds();
        match seeded.build() {
            Ok(Some(rebuilt)) if rebuilt == pattern => seeded,
            _ => EditorState::Interval(IntervalConfig::from_descriptor(d)),
        }
    }

    pub fn mode(&self) -> EditorMode {
        match self {
            EditorState::Idle => EditorMode::Idle,
            EditorState::Daily { .. } => EditorMode::PatternSelected(SimplePattern::Daily),
            EditorState::Weekly { .. } => EditorMode::PatternSelected(SimplePattern::Weekly),
            EditorState::Monthly { .. } => EditorMode::PatternSelected(SimplePattern::Monthly),
            EditorState::Yearly { .. } => EditorMode::PatternSelected(SimplePattern::Yearly),
            EditorState::Interval(_) => EditorMode::IntervalConfigOpen,
        }
    }

    /// The rule the open picker's buffer describes, `None` while idle.
    ///
    /// # Errors
    /// Returns the interval builder's error for an invalid configuration.
    pub fn build(&self) -> Result<Option<RecurrenceDescriptor>> {
        let descriptor = match self {
            EditorState::Idle => return Ok(None),
            EditorState::Daily { interval } => build_daily(*interval),
            EditorState::Weekly { weekdays } => build_weekly(weekdays),
            EditorState::Monthly { days } => build_monthly(days),
            EditorState::Yearly { dates } => build_yearly(dates.as_slice()).descriptor,
            EditorState::Interval(config) => build_interval(config)?,
        };
        Ok(Some(descriptor))
    }
}

/// One write: a patch and the tasks it was applied to (empty for drafts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub ids: Vec<TaskId>,
    pub patch: TaskPatch,
}

/// Recurrence editor session for one target.
pub struct ScheduleEditor<S, O> {
    store: S,
    oracle: O,
    target: UpdateTarget,
    today: NaiveDate,
    state: EditorState,
    time: TimeInput,
    current: Option<RecurrenceDescriptor>,
    draft: TaskRecord,
}

impl<S: TaskStore, O: NextOccurrence> ScheduleEditor<S, O> {
    /// Open the editor and seed the picker from the target's current rule.
    ///
    /// Bulk targets are seeded only when every task carries the same rule.
    ///
    /// # Errors
    /// Returns `RecurrenceError::TaskNotFound` if a targeted task is missing.
    pub fn open(store: S, oracle: O, target: UpdateTarget, today: NaiveDate) -> Result<Self> {
        let mut editor = Self {
            store,
            oracle,
            target,
            today,
            state: EditorState::Idle,
            time: TimeInput::default(),
            current: None,
            draft: TaskRecord::default(),
        };
        editor.reseed()?;
        Ok(editor)
    }

    /// Replace the draft record being edited (draft targets only).
    pub fn with_draft(mut self, draft: TaskRecord) -> Result<Self> {
        self.draft = draft;
        self.reseed()?;
        Ok(self)
    }

    fn reseed(&mut self) -> Result<()> {
        let records = self.records()?;
        let Some(first) = records.first() else {
            return Ok(());
        };
        if let Some(time) = first.due_time {
            self.time = TimeInput::from_naive_time(time);
        }
        let shared = records.iter().all(|r| r.recurring == first.recurring);
        self.current = match (&first.recurring, shared) {
            (Some(rule), true) => match rule.parse::<RecurrenceDescriptor>() {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(task = %first.id, rule = %rule, error = %e, "ignoring unparseable stored rule");
                    None
                }
            },
            _ => None,
        };
        self.state = self
            .current
            .as_ref()
            .map(EditorState::from_descriptor)
            .unwrap_or_default();
        Ok(())
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn mode(&self) -> EditorMode {
        self.state.mode()
    }

    pub fn target(&self) -> &UpdateTarget {
        &self.target
    }

    /// The rule last read from or written to the target.
    pub fn current(&self) -> Option<&RecurrenceDescriptor> {
        self.current.as_ref()
    }

    pub fn time_input(&self) -> &TimeInput {
        &self.time
    }

    pub fn time_input_mut(&mut self) -> &mut TimeInput {
        &mut self.time
    }

    /// The draft record, with every patch so far applied.
    pub fn draft(&self) -> &TaskRecord {
        &self.draft
    }

    /// End the session, discarding picker state, and hand back the store.
    pub fn close(self) -> S {
        debug!(mode = ?self.state.mode(), "schedule editor closed");
        self.store
    }

    // ---------------------------------------------------------------------
    // Picker selection
    // ---------------------------------------------------------------------

    /// Open a simple picker and apply its default rule straight away.
    pub fn select_pattern(&mut self, pattern: SimplePattern) -> Result<Vec<Update>> {
        self.state = EditorState::for_pattern(pattern);
        self.commit_rule(&build_default(pattern))
    }

    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the daily picker is open.
    pub fn set_daily_interval(&mut self, days: u32) -> Result<()> {
        match &mut self.state {
            EditorState::Daily { interval } => {
                *interval = days.max(1);
                Ok(())
            }
            _ => Err(RecurrenceError::NoActivePicker { expected: "daily" }),
        }
    }

    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the weekly picker is open.
    pub fn toggle_weekday(&mut self, day: Weekday) -> Result<bool> {
        match &mut self.state {
            EditorState::Weekly { weekdays } => Ok(weekdays.toggle(day)),
            _ => Err(RecurrenceError::NoActivePicker { expected: "weekly" }),
        }
    }

    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the monthly picker is
    /// open, or `RecurrenceError::InvalidRule` for an out-of-range day.
    pub fn toggle_month_day(&mut self, day: i8) -> Result<bool> {
        match &mut self.state {
            EditorState::Monthly { days } => days.toggle(day),
            _ => Err(RecurrenceError::NoActivePicker { expected: "monthly" }),
        }
    }

    /// Toggle a day in the yearly picker. A calendar date is matched by month
    /// and day; its year is ignored.
    ///
    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the yearly picker is open.
    pub fn toggle_yearly_date(&mut self, day: impl Into<MonthDay>) -> Result<bool> {
        match &mut self.state {
            EditorState::Yearly { dates } => Ok(dates.toggle(day)),
            _ => Err(RecurrenceError::NoActivePicker { expected: "yearly" }),
        }
    }

    /// Build the open picker's rule from its buffer and write it.
    /// Does nothing while idle.
    pub fn apply(&mut self) -> Result<Vec<Update>> {
        match self.state.build()? {
            Some(descriptor) => self.commit_rule(&descriptor),
            None => Ok(Vec::new()),
        }
    }

    // ---------------------------------------------------------------------
    // Interval configurator
    // ---------------------------------------------------------------------

    /// Open the interval configurator. Writes nothing.
    pub fn open_interval(&mut self) {
        if matches!(self.state, EditorState::Interval(_)) {
            return;
        }
        let config = self
            .current
            .as_ref()
            .map(IntervalConfig::from_descriptor)
            .unwrap_or_default();
        self.state = EditorState::Interval(config);
    }

    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the configurator is open.
    pub fn interval_config_mut(&mut self) -> Result<&mut IntervalConfig> {
        match &mut self.state {
            EditorState::Interval(config) => Ok(config),
            _ => Err(RecurrenceError::NoActivePicker { expected: "interval" }),
        }
    }

    /// Build the configured rule and write it.
    ///
    /// # Errors
    /// Returns `RecurrenceError::NoActivePicker` unless the configurator is
    /// open, or a build error for an invalid configuration.
    pub fn apply_interval(&mut self) -> Result<Vec<Update>> {
        let descriptor = match &self.state {
            EditorState::Interval(config) => build_interval(config)?,
            _ => return Err(RecurrenceError::NoActivePicker { expected: "interval" }),
        };
        self.commit_rule(&descriptor)
    }

    // ---------------------------------------------------------------------
    // Clear, skip, time, quick entry
    // ---------------------------------------------------------------------

    /// Remove due date, due time and rule in one patch, and reset every buffer.
    pub fn clear(&mut self) -> Result<Vec<Update>> {
        let absence = self.target.absence();
        let patch = TaskPatch {
            due_date: absence.field(),
            due_time: absence.field(),
            recurring: absence.field(),
            ..TaskPatch::default()
        };
        let ids = self.target.ids().to_vec();
        self.write(&ids, &patch)?;

        self.state = EditorState::Idle;
        self.time = TimeInput::default();
        self.current = None;
        Ok(vec![Update { ids, patch }])
    }

    /// Move each task's due date to its next occurrence.
    ///
    /// Recurring tasks ask the oracle, anchored per the task's recurring
    /// mode; an exhausted rule leaves the task untouched. Non-recurring tasks
    /// move forward one day. Tasks without a due date are left alone.
    pub fn skip(&mut self) -> Result<Vec<Update>> {
        let mut planned = Vec::new();
        for record in self.records()? {
            let Some(due) = record.due_date else {
                continue;
            };
            let next = match &record.recurring {
                Some(rule) => {
                    let reference = recurring_reference_date(due, record.recurring_mode, self.today);
                    self.oracle.next_due_date(rule, reference, false)?
                }
                None => due.checked_add_days(Days::new(1)),
            };
            let Some(next) = next else {
                debug!(task = %record.id, "no further occurrence; skip ignored");
                continue;
            };
            let patch = TaskPatch {
                due_date: next.into(),
                ..TaskPatch::default()
            };
            planned.push((record.id, patch));
        }
        self.write_batched(planned)
    }

    /// Write the time picker's value as the due time. A task without a due
    /// date is scheduled for today.
    pub fn apply_time(&mut self) -> Result<Vec<Update>> {
        let time = self.time.to_naive_time();
        let mut planned = Vec::new();
        for record in self.records()? {
            let mut patch = TaskPatch {
                due_time: time.into(),
                ..TaskPatch::default()
            };
            if record.due_date.is_none() {
                patch.due_date = self.today.into();
            }
            planned.push((record.id, patch));
        }
        self.write_batched(planned)
    }

    /// Apply a quick-entry result. Writes nothing when nothing was extracted.
    pub fn apply_parsed(&mut self, parsed: &ParsedSchedule) -> Result<Vec<Update>> {
        if !parsed.is_applicable() {
            return Ok(Vec::new());
        }
        let rule = parsed.recurring.as_ref().map(|d| d.to_string());
        let mut planned = Vec::new();
        for record in self.records()? {
            let mut patch = TaskPatch::default();
            if let Some(time) = parsed.time {
                patch.due_time = time.into();
            }
            if let Some(date) = parsed.date {
                patch.due_date = date.into();
            } else if record.due_date.is_none() {
                let projected = match &rule {
                    Some(rule) => self.oracle.next_due_date(rule, self.today, true)?,
                    None => Some(self.today),
                };
                if let Some(date) = projected {
                    patch.due_date = date.into();
                }
            }
            if let Some(rule) = &rule {
                patch.recurring = rule.clone().into();
            }
            planned.push((record.id, patch));
        }
        let updates = self.write_batched(planned)?;
        if let Some(d) = &parsed.recurring {
            self.current = Some(d.clone());
        }
        Ok(updates)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn records(&self) -> Result<Vec<TaskRecord>> {
        match &self.target {
            UpdateTarget::Draft => Ok(vec![self.draft.clone()]),
            target => target
                .ids()
                .iter()
                .map(|id| {
                    self.store
                        .get(id)
                        .ok_or_else(|| RecurrenceError::TaskNotFound(id.clone()))
                })
                .collect(),
        }
    }

    /// Attach `descriptor` to every targeted task, keeping existing due dates.
    /// The current rule's `COUNT`/`UNTIL` carry over to the new one.
    fn commit_rule(&mut self, descriptor: &RecurrenceDescriptor) -> Result<Vec<Update>> {
        let mut descriptor = descriptor.clone();
        if let Some(current) = &self.current {
            descriptor.count = current.count;
            descriptor.until = current.until;
        }
        let rule = descriptor.to_string();
        let mut projected: Option<Option<NaiveDate>> = None;
        let mut planned = Vec::new();

        for record in self.records()? {
            let mut patch = TaskPatch {
                recurring: rule.clone().into(),
                ..TaskPatch::default()
            };
            if record.due_date.is_none() {
                let next = match projected {
                    Some(next) => next,
                    None => {
                        let next = self.oracle.next_due_date(&rule, self.today, true)?;
                        projected = Some(next);
                        next
                    }
                };
                if let Some(next) = next {
                    patch.due_date = next.into();
                }
            }
            planned.push((record.id, patch));
        }

        let updates = self.write_batched(planned)?;
        self.current = Some(descriptor);
        Ok(updates)
    }

    /// Group identical patches and write each group in one store call.
    fn write_batched(&mut self, planned: Vec<(TaskId, TaskPatch)>) -> Result<Vec<Update>> {
        let mut batches: Vec<Update> = Vec::new();
        for (id, patch) in planned {
            match batches.iter_mut().find(|u| u.patch == patch) {
                Some(batch) => batch.ids.push(id),
                None => batches.push(Update {
                    ids: vec![id],
                    patch,
                }),
            }
        }
        for batch in &mut batches {
            if self.target == UpdateTarget::Draft {
                batch.ids.clear();
            }
            self.write(&batch.ids, &batch.patch)?;
        }
        Ok(batches)
    }

    fn write(&mut self, ids: &[TaskId], patch: &TaskPatch) -> Result<()> {
        debug!(?ids, ?patch, "writing schedule patch");
        match self.target {
            UpdateTarget::Draft => {
                patch.apply_to(&mut self.draft);
                Ok(())
            }
            _ => self.store.patch(ids, patch),
        }
    }
}
