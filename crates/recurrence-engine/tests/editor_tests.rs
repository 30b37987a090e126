//! Tests for the schedule editor state machine.
//!
//! The store and the next-occurrence oracle are replaced by recording doubles
//! so every write and every oracle question can be inspected.

use std::cell::RefCell;

use chrono::{NaiveDate, NaiveTime, Weekday};
use recurrence_engine::error::Result;
use recurrence_engine::{
    parse_schedule, EditorMode, EditorState, Frequency, InMemoryStore, Meridiem, NextOccurrence,
    MonthDay, PatchField, RecurrenceError, RecurringMode, ScheduleEditor, SimplePattern, TaskId,
    TaskPatch, TaskRecord, TaskStore, TimeInput, UpdateTarget, YearlyDateSet,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 1, 10)
}

/// Oracle that answers every question with the same date and remembers the questions.
#[derive(Default)]
struct ScriptedOracle {
    answer: Option<NaiveDate>,
    calls: RefCell<Vec<(String, NaiveDate, bool)>>,
}

impl ScriptedOracle {
    fn answering(answer: Option<NaiveDate>) -> Self {
        Self {
            answer,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, NaiveDate, bool)> {
        self.calls.borrow().clone()
    }
}

impl NextOccurrence for ScriptedOracle {
    fn next_due_date(
        &self,
        rule: &str,
        reference: NaiveDate,
        initial: bool,
    ) -> Result<Option<NaiveDate>> {
        self.calls
            .borrow_mut()
            .push((rule.to_string(), reference, initial));
        Ok(self.answer)
    }
}

/// Store that records every patch call before delegating.
#[derive(Default)]
struct RecordingStore {
    tasks: InMemoryStore,
    calls: Vec<(Vec<TaskId>, TaskPatch)>,
}

impl RecordingStore {
    fn with(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        Self {
            tasks: records.into_iter().collect(),
            calls: Vec::new(),
        }
    }
}

impl TaskStore for RecordingStore {
    fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.get(id)
    }

    fn patch(&mut self, ids: &[TaskId], patch: &TaskPatch) -> Result<()> {
        self.calls.push((ids.to_vec(), patch.clone()));
        self.tasks.patch(ids, patch)
    }
}

fn single(id: &str) -> UpdateTarget {
    UpdateTarget::Single(TaskId::from(id))
}

fn open<'o>(
    store: RecordingStore,
    oracle: &'o ScriptedOracle,
    target: UpdateTarget,
) -> ScheduleEditor<RecordingStore, &'o ScriptedOracle> {
    ScheduleEditor::open(store, oracle, target, today()).expect("should open")
}

fn json(patch: &TaskPatch) -> serde_json::Value {
    serde_json::to_value(patch).expect("should serialize")
}

// ---------------------------------------------------------------------------
// Due-date interaction rule
// ---------------------------------------------------------------------------

#[test]
fn attaching_rule_keeps_existing_due_date() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 3, 1)));
    let store = RecordingStore::with([TaskRecord::new("a", "Water plants").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    for pattern in [
        SimplePattern::Daily,
        SimplePattern::Weekly,
        SimplePattern::Monthly,
        SimplePattern::Yearly,
    ] {
        let updates = editor.select_pattern(pattern).expect("should apply default");
        assert_eq!(updates.len(), 1);
        let patch = &updates[0].patch;
        assert_eq!(patch.due_date, PatchField::Keep);
        let value = json(patch);
        assert!(value.get("dueDate").is_none(), "{}", value);
        assert!(value.get("recurring").is_some());
    }

    assert!(oracle.calls().is_empty());
    let store = editor.close();
    let task = store.get(&TaskId::from("a")).unwrap();
    assert_eq!(task.due_date, Some(date(2024, 1, 15)));
    assert_eq!(task.recurring.as_deref(), Some("FREQ=YEARLY"));
}

#[test]
fn attaching_rule_without_due_date_uses_oracle_answer() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 15)));
    let store = RecordingStore::with([TaskRecord::new("a", "Pay rent")]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.select_pattern(SimplePattern::Weekly).unwrap();
    assert_eq!(updates[0].patch.due_date, PatchField::Set(date(2024, 1, 15)));
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=WEEKLY".to_string())
    );
    assert_eq!(
        oracle.calls(),
        vec![("FREQ=WEEKLY".to_string(), today(), true)]
    );
}

#[test]
fn exhausted_projection_still_attaches_rule() {
    let oracle = ScriptedOracle::answering(None);
    let store = RecordingStore::with([TaskRecord::new("a", "Once")]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.select_pattern(SimplePattern::Daily).unwrap();
    assert_eq!(updates[0].patch.due_date, PatchField::Keep);
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=DAILY".to_string())
    );
}

// ---------------------------------------------------------------------------
// Pickers
// ---------------------------------------------------------------------------

#[test]
fn selecting_pattern_opens_its_picker() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));
    assert_eq!(editor.mode(), EditorMode::Idle);

    editor.select_pattern(SimplePattern::Monthly).unwrap();
    assert_eq!(editor.mode(), EditorMode::PatternSelected(SimplePattern::Monthly));
    assert_eq!(editor.current().map(|d| d.frequency), Some(Frequency::Monthly));
}

#[test]
fn weekly_apply_uses_selected_days() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Gym").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Weekly).unwrap();
    assert!(editor.toggle_weekday(Weekday::Fri).unwrap());
    assert!(editor.toggle_weekday(Weekday::Mon).unwrap());
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=WEEKLY;BYDAY=MO,FR".to_string())
    );

    let store = editor.close();
    // default pick plus the apply
    assert_eq!(store.calls.len(), 2);
}

#[test]
fn monthly_apply_respects_last_day_exclusion() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Invoice").with_due_date(date(2024, 1, 31))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Monthly).unwrap();
    editor.toggle_month_day(31).unwrap();
    editor.toggle_month_day(-1).unwrap();
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=MONTHLY;BYMONTHDAY=-1".to_string())
    );
}

#[test]
fn yearly_apply_with_several_months_keeps_first_date() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Taxes").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Yearly).unwrap();
    editor.toggle_yearly_date(date(2024, 1, 15)).unwrap();
    editor.toggle_yearly_date(date(2024, 3, 20)).unwrap();
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=YEARLY;BYMONTHDAY=15;BYMONTH=1".to_string())
    );
}

#[test]
fn yearly_toggle_matches_month_and_day_across_years() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Birthday")]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Yearly).unwrap();
    assert!(editor.toggle_yearly_date(date(2024, 6, 1)).unwrap());
    assert!(!editor.toggle_yearly_date(date(2025, 6, 1)).unwrap());
    assert_eq!(
        editor.state(),
        &EditorState::Yearly {
            dates: YearlyDateSet::new()
        }
    );
}

#[test]
fn picker_gestures_need_matching_picker() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")]);
    let mut editor = open(store, &oracle, single("a"));

    assert_eq!(
        editor.toggle_weekday(Weekday::Mon).unwrap_err(),
        RecurrenceError::NoActivePicker { expected: "weekly" }
    );
    assert!(editor.toggle_month_day(3).is_err());
    assert!(editor.set_daily_interval(2).is_err());
    assert!(editor.interval_config_mut().is_err());
    assert!(editor.apply_interval().is_err());
    assert!(editor.apply().unwrap().is_empty());
}

#[test]
fn daily_interval_apply() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Stretch").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Daily).unwrap();
    editor.set_daily_interval(3).unwrap();
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=DAILY;INTERVAL=3".to_string())
    );
}

// ---------------------------------------------------------------------------
// Interval configurator
// ---------------------------------------------------------------------------

#[test]
fn exploring_interval_config_writes_nothing() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.open_interval();
    assert_eq!(editor.mode(), EditorMode::IntervalConfigOpen);
    {
        let config = editor.interval_config_mut().unwrap();
        config.set_frequency(Frequency::Monthly);
        config.set_interval(2);
        config.toggle_weekday(Weekday::Tue);
        config.toggle_occurrence(2).unwrap();
    }

    let store = editor.close();
    assert!(store.calls.is_empty());
    assert!(oracle.calls().is_empty());
    let task = store.get(&TaskId::from("a")).unwrap();
    assert_eq!(task.recurring, None);
}

#[test]
fn interval_apply_writes_configured_rule() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 2, 13)));
    let store = RecordingStore::with([TaskRecord::new("a", "Book club")]);
    let mut editor = open(store, &oracle, single("a"));

    editor.open_interval();
    {
        let config = editor.interval_config_mut().unwrap();
        config.set_frequency(Frequency::Monthly);
        config.set_interval(2);
        config.toggle_weekday(Weekday::Tue);
        config.toggle_occurrence(2).unwrap();
    }
    let updates = editor.apply_interval().unwrap();
    let patch = &updates[0].patch;
    assert_eq!(
        patch.recurring,
        PatchField::Set("FREQ=MONTHLY;INTERVAL=2;BYDAY=TU;BYSETPOS=2".to_string())
    );
    assert_eq!(patch.due_date, PatchField::Set(date(2024, 2, 13)));
}

#[test]
fn interval_config_seeds_from_current_rule() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=WEEKLY;BYDAY=MO")]);
    let mut editor = open(store, &oracle, single("a"));

    editor.open_interval();
    let config = editor.interval_config_mut().unwrap();
    assert_eq!(config.frequency(), Frequency::Weekly);
    assert_eq!(config.weekdays().as_slice(), &[Weekday::Mon]);
}

// ---------------------------------------------------------------------------
// Clear
// ---------------------------------------------------------------------------

#[test]
fn clear_persisted_task_writes_nulls() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_due_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap())
        .with_recurring("FREQ=DAILY")]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.clear().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        json(&updates[0].patch),
        serde_json::json!({ "dueDate": null, "dueTime": null, "recurring": null })
    );

    let store = editor.close();
    assert_eq!(store.calls.len(), 1);
    let task = store.get(&TaskId::from("a")).unwrap();
    assert_eq!(task.due_date, None);
    assert_eq!(task.due_time, None);
    assert_eq!(task.recurring, None);
}

#[test]
fn clear_draft_unsets_fields() {
    let oracle = ScriptedOracle::default();
    let draft = TaskRecord::new("", "New task")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=WEEKLY");
    let mut editor = ScheduleEditor::open(RecordingStore::default(), &oracle, UpdateTarget::Draft, today())
        .and_then(|e| e.with_draft(draft))
        .expect("should open");

    let updates = editor.clear().unwrap();
    let patch = &updates[0].patch;
    assert_eq!(patch.due_date, PatchField::Unset);
    assert_eq!(patch.due_time, PatchField::Unset);
    assert_eq!(patch.recurring, PatchField::Unset);
    assert_eq!(json(patch), serde_json::json!({}));
    assert!(updates[0].ids.is_empty());

    assert_eq!(editor.draft().due_date, None);
    assert_eq!(editor.draft().recurring, None);
    assert!(editor.close().calls.is_empty());
}

#[test]
fn clear_resets_every_buffer() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    editor.select_pattern(SimplePattern::Weekly).unwrap();
    editor.toggle_weekday(Weekday::Mon).unwrap();
    editor.time_input_mut().blur(5, 30);
    editor.time_input_mut().set_meridiem(Meridiem::Pm);

    editor.clear().unwrap();
    assert_eq!(editor.state(), &EditorState::Idle);
    assert_eq!(editor.time_input(), &TimeInput::default());
    assert!(editor.current().is_none());

    // a fresh weekly pick must not inherit the old selection
    editor.select_pattern(SimplePattern::Weekly).unwrap();
    match editor.state() {
        EditorState::Weekly { weekdays } => assert!(weekdays.is_empty()),
        other => panic!("expected weekly picker, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Skip
// ---------------------------------------------------------------------------

#[test]
fn skip_recurring_task_asks_oracle_from_due_date() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 16)));
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=DAILY")]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.skip().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].patch,
        TaskPatch {
            due_date: PatchField::Set(date(2024, 1, 16)),
            ..TaskPatch::default()
        }
    );
    assert_eq!(json(&updates[0].patch), serde_json::json!({ "dueDate": "2024-01-16" }));
    assert_eq!(
        oracle.calls(),
        vec![("FREQ=DAILY".to_string(), date(2024, 1, 15), false)]
    );
}

#[test]
fn skip_completion_anchored_task_uses_today() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 17)));
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 3))
        .with_recurring("FREQ=WEEKLY")
        .with_recurring_mode(RecurringMode::CompletedAt)]);
    let mut editor = open(store, &oracle, single("a"));

    editor.skip().unwrap();
    assert_eq!(oracle.calls()[0].1, today());
}

#[test]
fn skip_plain_task_moves_one_day() {
    let oracle = ScriptedOracle::answering(Some(date(2030, 1, 1)));
    let store = RecordingStore::with([TaskRecord::new("a", "Task").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.skip().unwrap();
    assert_eq!(updates[0].patch.due_date, PatchField::Set(date(2024, 1, 16)));
    assert!(oracle.calls().is_empty());
}

#[test]
fn skip_exhausted_rule_is_a_no_op() {
    let oracle = ScriptedOracle::answering(None);
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=DAILY;COUNT=1")]);
    let mut editor = open(store, &oracle, single("a"));

    assert!(editor.skip().unwrap().is_empty());
    let store = editor.close();
    assert!(store.calls.is_empty());
    assert_eq!(
        store.get(&TaskId::from("a")).unwrap().due_date,
        Some(date(2024, 1, 15))
    );
}

#[test]
fn skip_ignores_task_without_due_date() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Someday")]);
    let mut editor = open(store, &oracle, single("a"));
    assert!(editor.skip().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Bulk and draft targets
// ---------------------------------------------------------------------------

#[test]
fn bulk_batches_identical_patches() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 12)));
    let store = RecordingStore::with([
        TaskRecord::new("a", "A").with_due_date(date(2024, 1, 15)),
        TaskRecord::new("b", "B").with_due_date(date(2024, 2, 1)),
        TaskRecord::new("c", "C"),
    ]);
    let target = UpdateTarget::Bulk(vec!["a".into(), "c".into(), "b".into()]);
    let mut editor = open(store, &oracle, target);

    let updates = editor.select_pattern(SimplePattern::Daily).unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].ids, vec![TaskId::from("a"), TaskId::from("b")]);
    assert_eq!(updates[0].patch.due_date, PatchField::Keep);
    assert_eq!(updates[1].ids, vec![TaskId::from("c")]);
    assert_eq!(updates[1].patch.due_date, PatchField::Set(date(2024, 1, 12)));

    // one projection shared by every task lacking a due date
    assert_eq!(oracle.calls().len(), 1);

    let store = editor.close();
    assert_eq!(store.calls.len(), 2);
    assert_eq!(
        store.get(&TaskId::from("b")).unwrap().due_date,
        Some(date(2024, 2, 1))
    );
    assert_eq!(
        store.get(&TaskId::from("c")).unwrap().due_date,
        Some(date(2024, 1, 12))
    );
}

#[test]
fn bulk_skip_moves_each_task_independently() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([
        TaskRecord::new("a", "A").with_due_date(date(2024, 1, 15)),
        TaskRecord::new("b", "B").with_due_date(date(2024, 1, 20)),
    ]);
    let target = UpdateTarget::Bulk(vec!["a".into(), "b".into()]);
    let mut editor = open(store, &oracle, target);

    let updates = editor.skip().unwrap();
    assert_eq!(updates.len(), 2);
    let store = editor.close();
    assert_eq!(
        store.get(&TaskId::from("a")).unwrap().due_date,
        Some(date(2024, 1, 16))
    );
    assert_eq!(
        store.get(&TaskId::from("b")).unwrap().due_date,
        Some(date(2024, 1, 21))
    );
}

#[test]
fn missing_task_fails_to_open() {
    let oracle = ScriptedOracle::default();
    let result = ScheduleEditor::open(RecordingStore::default(), &oracle, single("ghost"), today());
    assert!(matches!(
        result.err(),
        Some(RecurrenceError::TaskNotFound(id)) if id == TaskId::from("ghost")
    ));
}

#[test]
fn draft_patches_stay_with_editor() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 11)));
    let mut editor = ScheduleEditor::open(RecordingStore::default(), &oracle, UpdateTarget::Draft, today())
        .expect("should open");

    let updates = editor.select_pattern(SimplePattern::Daily).unwrap();
    assert!(updates[0].ids.is_empty());
    assert_eq!(editor.draft().recurring.as_deref(), Some("FREQ=DAILY"));
    assert_eq!(editor.draft().due_date, Some(date(2024, 1, 11)));
    assert!(editor.close().calls.is_empty());
}

// ---------------------------------------------------------------------------
// Seeding from the stored rule
// ---------------------------------------------------------------------------

#[test]
fn opens_on_existing_weekly_rule() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_due_time(NaiveTime::from_hms_opt(17, 30, 0).unwrap())
        .with_recurring("FREQ=WEEKLY;BYDAY=MO,WE")]);
    let editor = open(store, &oracle, single("a"));

    match editor.state() {
        EditorState::Weekly { weekdays } => {
            assert_eq!(weekdays.as_slice(), &[Weekday::Mon, Weekday::Wed])
        }
        other => panic!("expected weekly picker, got {:?}", other),
    }
    let time = editor.time_input();
    assert_eq!((time.hour(), time.minute(), time.meridiem()), (5, 30, Meridiem::Pm));
}

#[test]
fn opens_nth_weekday_rule_in_interval_config() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1")]);
    let editor = open(store, &oracle, single("a"));
    assert_eq!(editor.mode(), EditorMode::IntervalConfigOpen);
}

#[test]
fn opens_yearly_rule_as_month_days() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")
        .with_due_date(date(2024, 3, 15))
        .with_recurring("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=14,-1")]);
    let editor = open(store, &oracle, single("a"));
    let expected: YearlyDateSet = [MonthDay::new(2, 14).unwrap(), MonthDay::last_of(2).unwrap()]
        .into_iter()
        .collect();
    assert_eq!(editor.state(), &EditorState::Yearly { dates: expected });
}

#[test]
fn reapplying_last_day_of_february_keeps_last_day() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Close books")
        .with_due_date(date(2024, 3, 1))
        .with_recurring("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1")]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=YEARLY;BYMONTHDAY=-1;BYMONTH=2".to_string())
    );
}

#[test]
fn leap_day_rule_survives_opening_in_common_year() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Leap party")
        .with_due_date(date(2025, 3, 1))
        .with_recurring("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29")]);
    let mut editor = open(store, &oracle, single("a"));

    let leap_day: YearlyDateSet = [MonthDay::new(2, 29).unwrap()].into_iter().collect();
    assert_eq!(editor.state(), &EditorState::Yearly { dates: leap_day });
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=YEARLY;BYMONTHDAY=29;BYMONTH=2".to_string())
    );
}

#[test]
fn applying_a_freshly_opened_rule_writes_it_back_unchanged() {
    let cases = [
        ("FREQ=DAILY", EditorMode::PatternSelected(SimplePattern::Daily)),
        ("FREQ=DAILY;INTERVAL=3", EditorMode::PatternSelected(SimplePattern::Daily)),
        ("FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR", EditorMode::IntervalConfigOpen),
        ("FREQ=WEEKLY", EditorMode::PatternSelected(SimplePattern::Weekly)),
        ("FREQ=WEEKLY;BYDAY=MO,WE", EditorMode::PatternSelected(SimplePattern::Weekly)),
        ("FREQ=WEEKLY;INTERVAL=2;BYDAY=FR", EditorMode::IntervalConfigOpen),
        ("FREQ=WEEKLY;BYDAY=MO;COUNT=5", EditorMode::PatternSelected(SimplePattern::Weekly)),
        ("FREQ=MONTHLY", EditorMode::PatternSelected(SimplePattern::Monthly)),
        ("FREQ=MONTHLY;BYMONTHDAY=1,15,-1", EditorMode::PatternSelected(SimplePattern::Monthly)),
        ("FREQ=MONTHLY;BYDAY=TU;BYSETPOS=2", EditorMode::IntervalConfigOpen),
        ("FREQ=YEARLY", EditorMode::PatternSelected(SimplePattern::Yearly)),
        ("FREQ=YEARLY;BYMONTHDAY=-1;BYMONTH=2", EditorMode::PatternSelected(SimplePattern::Yearly)),
        ("FREQ=YEARLY;BYMONTHDAY=29;BYMONTH=2", EditorMode::PatternSelected(SimplePattern::Yearly)),
        ("FREQ=YEARLY;BYMONTHDAY=15,20;BYMONTH=3", EditorMode::PatternSelected(SimplePattern::Yearly)),
        ("FREQ=YEARLY;BYMONTH=2", EditorMode::IntervalConfigOpen),
        ("FREQ=YEARLY;BYMONTHDAY=15", EditorMode::IntervalConfigOpen),
        ("FREQ=YEARLY;BYMONTHDAY=15;BYMONTH=1,3", EditorMode::IntervalConfigOpen),
        ("FREQ=YEARLY;BYMONTHDAY=31;BYMONTH=4", EditorMode::IntervalConfigOpen),
    ];
    for (rule, mode) in cases {
        let oracle = ScriptedOracle::default();
        let store = RecordingStore::with([TaskRecord::new("a", "Task")
            .with_due_date(date(2025, 3, 1))
            .with_recurring(rule)]);
        let mut editor = open(store, &oracle, single("a"));
        assert_eq!(editor.mode(), mode, "{}", rule);

        let updates = editor.apply().unwrap();
        assert_eq!(updates.len(), 1, "{}", rule);
        assert_eq!(
            updates[0].patch.recurring,
            PatchField::Set(rule.to_string()),
            "{}",
            rule
        );
        assert_eq!(updates[0].patch.due_date, PatchField::Keep, "{}", rule);
    }
}

#[test]
fn new_pick_keeps_count_and_until_of_current_rule() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Course")
        .with_due_date(date(2024, 1, 15))
        .with_recurring("FREQ=WEEKLY;BYDAY=MO;UNTIL=20240630T235959Z")]);
    let mut editor = open(store, &oracle, single("a"));

    editor.toggle_weekday(Weekday::Thu).unwrap();
    let updates = editor.apply().unwrap();
    assert_eq!(
        updates[0].patch.recurring,
        PatchField::Set("FREQ=WEEKLY;BYDAY=MO,TH;UNTIL=20240630T235959Z".to_string())
    );
}

#[test]
fn bulk_with_mixed_rules_opens_idle() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([
        TaskRecord::new("a", "A").with_recurring("FREQ=DAILY"),
        TaskRecord::new("b", "B").with_recurring("FREQ=WEEKLY"),
    ]);
    let editor = open(store, &oracle, UpdateTarget::Bulk(vec!["a".into(), "b".into()]));
    assert_eq!(editor.mode(), EditorMode::Idle);
    assert!(editor.current().is_none());
}

#[test]
fn unparseable_stored_rule_is_ignored() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "A").with_recurring("FREQ=SOMETIMES")]);
    let editor = open(store, &oracle, single("a"));
    assert_eq!(editor.mode(), EditorMode::Idle);
}

// ---------------------------------------------------------------------------
// Time and quick entry
// ---------------------------------------------------------------------------

#[test]
fn apply_time_clamps_and_schedules_today_when_undated() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Call")]);
    let mut editor = open(store, &oracle, single("a"));

    editor.time_input_mut().blur(25, 75);
    editor.time_input_mut().set_meridiem(Meridiem::Pm);
    let updates = editor.apply_time().unwrap();
    let patch = &updates[0].patch;
    assert_eq!(patch.due_time, PatchField::Set(NaiveTime::from_hms_opt(12, 59, 0).unwrap()));
    assert_eq!(patch.due_date, PatchField::Set(today()));
}

#[test]
fn apply_time_keeps_existing_due_date() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Call").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    let updates = editor.apply_time().unwrap();
    assert_eq!(updates[0].patch.due_date, PatchField::Keep);
    assert_eq!(
        updates[0].patch.due_time,
        PatchField::Set(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    );
}

#[test]
fn unrecognised_quick_entry_writes_nothing() {
    let oracle = ScriptedOracle::default();
    let store = RecordingStore::with([TaskRecord::new("a", "Task")]);
    let mut editor = open(store, &oracle, single("a"));

    let parsed = parse_schedule("whenever I feel like it", today());
    assert!(!parsed.is_applicable());
    assert!(editor.apply_parsed(&parsed).unwrap().is_empty());
    assert!(editor.close().calls.is_empty());
}

#[test]
fn quick_entry_rule_projects_due_date() {
    let oracle = ScriptedOracle::answering(Some(date(2024, 1, 15)));
    let store = RecordingStore::with([TaskRecord::new("a", "Standup")]);
    let mut editor = open(store, &oracle, single("a"));

    let parsed = parse_schedule("every monday at 9am", today());
    let updates = editor.apply_parsed(&parsed).unwrap();
    let patch = &updates[0].patch;
    assert_eq!(patch.recurring, PatchField::Set("FREQ=WEEKLY;BYDAY=MO".to_string()));
    assert_eq!(patch.due_date, PatchField::Set(date(2024, 1, 15)));
    assert_eq!(patch.due_time, PatchField::Set(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    assert_eq!(
        oracle.calls(),
        vec![("FREQ=WEEKLY;BYDAY=MO".to_string(), today(), true)]
    );
    assert_eq!(editor.current().map(|d| d.frequency), Some(Frequency::Weekly));
}

#[test]
fn quick_entry_date_wins_over_projection() {
    let oracle = ScriptedOracle::answering(Some(date(2099, 1, 1)));
    let store = RecordingStore::with([TaskRecord::new("a", "Report").with_due_date(date(2024, 1, 15))]);
    let mut editor = open(store, &oracle, single("a"));

    let parsed = parse_schedule("tomorrow", today());
    let updates = editor.apply_parsed(&parsed).unwrap();
    assert_eq!(updates[0].patch.due_date, PatchField::Set(date(2024, 1, 11)));
    assert_eq!(updates[0].patch.recurring, PatchField::Keep);
    assert!(oracle.calls().is_empty());
}
