//! Task records, partial patches, update targets and the store seam.
//!
//! The editor reads a task through [`TaskStore::get`] and writes through
//! [`TaskStore::patch`]; it never assumes anything else about how tasks are
//! kept or persisted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{RecurrenceError, Result};
use crate::oracle::RecurringMode;

/// Opaque task identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId(id)
    }
}

/// The scheduling-relevant part of a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<NaiveTime>,
    /// Serialized RRULE text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<String>,
    #[serde(default)]
    pub recurring_mode: RecurringMode,
}

impl TaskRecord {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }

    pub fn with_recurring(mut self, rule: impl Into<String>) -> Self {
        self.recurring = Some(rule.into());
        self
    }

    pub fn with_recurring_mode(mut self, mode: RecurringMode) -> Self {
        self.recurring_mode = mode;
        self
    }
}

/// One field of a [`TaskPatch`].
///
/// `Clear` and `Unset` both empty the field; they differ on the wire. A
/// persisted task is cleared with an explicit `null`, a draft that has never
/// been saved simply drops the key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PatchField<T> {
    /// Leave the field alone (key omitted).
    #[default]
    Keep,
    Set(T),
    /// Empty the field with an explicit `null`.
    Clear,
    /// Empty the field by leaving it undefined.
    Unset,
}

impl<T> PatchField<T> {
    /// True when the key is left out of the serialized patch.
    pub fn is_omitted(&self) -> bool {
        matches!(self, PatchField::Keep | PatchField::Unset)
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, PatchField::Keep)
    }

    fn apply(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            PatchField::Keep => {}
            PatchField::Set(value) => *slot = Some(value.clone()),
            PatchField::Clear | PatchField::Unset => *slot = None,
        }
    }
}

impl<T> From<T> for PatchField<T> {
    fn from(value: T) -> Self {
        PatchField::Set(value)
    }
}

impl<T: Serialize> Serialize for PatchField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PatchField::Set(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

/// How "no value" is written for a given target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// Persisted tasks: explicit `null`.
    Clear,
    /// Unsaved drafts: `undefined`.
    Unset,
}

impl Absence {
    pub fn field<T>(self) -> PatchField<T> {
        match self {
            Absence::Clear => PatchField::Clear,
            Absence::Unset => PatchField::Unset,
        }
    }
}

/// Partial update of a task's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "PatchField::is_omitted")]
    pub due_date: PatchField<NaiveDate>,
    #[serde(skip_serializing_if = "PatchField::is_omitted")]
    pub due_time: PatchField<NaiveTime>,
    #[serde(skip_serializing_if = "PatchField::is_omitted")]
    pub recurring: PatchField<String>,
    #[serde(skip_serializing_if = "PatchField::is_omitted")]
    pub recurring_mode: PatchField<RecurringMode>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.due_date.is_keep()
            && self.due_time.is_keep()
            && self.recurring.is_keep()
            && self.recurring_mode.is_keep()
    }

    pub fn apply_to(&self, record: &mut TaskRecord) {
        self.due_date.apply(&mut record.due_date);
        self.due_time.apply(&mut record.due_time);
        self.recurring.apply(&mut record.recurring);
        match &self.recurring_mode {
            PatchField::Keep => {}
            PatchField::Set(mode) => record.recurring_mode = *mode,
            PatchField::Clear | PatchField::Unset => record.recurring_mode = RecurringMode::default(),
        }
    }
}

/// What an editor session writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// One persisted task.
    Single(TaskId),
    /// Several persisted tasks edited together.
    Bulk(Vec<TaskId>),
    /// A task that has not been created yet; patches stay with the editor.
    Draft,
}

impl UpdateTarget {
    pub fn absence(&self) -> Absence {
        match self {
            UpdateTarget::Single(_) | UpdateTarget::Bulk(_) => Absence::Clear,
            UpdateTarget::Draft => Absence::Unset,
        }
    }

    pub fn ids(&self) -> &[TaskId] {
        match self {
            UpdateTarget::Single(id) => std::slice::from_ref(id),
            UpdateTarget::Bulk(ids) => ids,
            UpdateTarget::Draft => &[],
        }
    }
}

/// Synchronous read plus imperative write over a keyed set of tasks.
pub trait TaskStore {
    fn get(&self, id: &TaskId) -> Option<TaskRecord>;

    /// Apply `patch` to every task in `ids`, or to none of them.
    ///
    /// # Errors
    /// Returns `RecurrenceError::TaskNotFound` if any id is unknown.
    fn patch(&mut self, ids: &[TaskId], patch: &TaskPatch) -> Result<()>;
}

impl<T: TaskStore + ?Sized> TaskStore for &mut T {
    fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        (**self).get(id)
    }

    fn patch(&mut self, ids: &[TaskId], patch: &TaskPatch) -> Result<()> {
        (**self).patch(ids, patch)
    }
}

/// [`TaskStore`] over an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tasks: BTreeMap<TaskId, TaskRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: TaskRecord) {
        self.tasks.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl FromIterator<TaskRecord> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = TaskRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl TaskStore for InMemoryStore {
    fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.get(id).cloned()
    }

    fn patch(&mut self, ids: &[TaskId], patch: &TaskPatch) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| !self.tasks.contains_key(*id)) {
            return Err(RecurrenceError::TaskNotFound(missing.clone()));
        }
        for id in ids {
            if let Some(record) = self.tasks.get_mut(id) {
                patch.apply_to(record);
            }
        }
        Ok(())
    }
}
