//! The board aggregate: ordered columns, the tasks across all of them,
//! the tag vocabulary, and the single edit session. Collaborators are
//! passed into each operation; the board holds no ambient state.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{BoardError, BoardResult};
use crate::notify::{NotificationSink, Notifier};
use crate::ordering;
use crate::reminder::{self, ReminderAction};
use crate::repository::{ColumnRepository, TaskRepository};
use crate::session::{EditSession, Slot};
use crate::task::{ReminderOffset, Task};

pub const NOTICE_DURATION_MS: u32 = 3000;

/// A named, ordered bucket of tasks. `max_task_limit` is advisory; the
/// board warns past it but never refuses a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub id: u64,
    pub board_id: u64,
    pub name: String,
    pub position: u32,
    pub max_task_limit: u32,
}

/// Derived per-task date information, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSummary {
    pub past_due: bool,
    pub days_worked_on: Option<String>,
    pub days_since_creation: Option<String>,
}

#[derive(Debug)]
pub struct Board {
    pub id: u64,
    columns: Vec<Column>,
    tasks: Vec<Task>,
    session: EditSession,
}

impl Board {
    pub fn new(id: u64, mut columns: Vec<Column>, mut tasks: Vec<Task>) -> Self {
        columns.sort_by_key(|column| column.position);
        tasks.sort_by_key(|task| task.column_index);
        Self {
            id,
            columns,
            tasks,
            session: EditSession::default(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    fn require_column(&self, name: &str) -> BoardResult<()> {
        if self.column(name).is_some() {
            Ok(())
        } else {
            Err(BoardError::ColumnNotFound {
                name: name.to_string(),
            })
        }
    }

    /// Union of every task's tags, sorted and unique.
    pub fn tag_vocabulary(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for task in &self.tasks {
            for tag in &task.tags {
                set.insert(tag.clone());
            }
        }
        set
    }

    /// Vocabulary minus the current task's own tags.
    pub fn suggested_tags(&self) -> Vec<String> {
        let mut vocabulary = self.tag_vocabulary();
        if let Some(task) = self.current_task() {
            for tag in &task.tags {
                vocabulary.remove(tag);
            }
        }
        vocabulary.into_iter().collect()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_editing()
    }

    pub fn current_task(&self) -> Option<&Task> {
        match self.session.slot() {
            Slot::Empty => None,
            Slot::New(draft) => Some(draft),
            Slot::Existing(id) => self.tasks.iter().find(|task| task.id == *id),
        }
    }

    pub fn current_task_mut(&mut self) -> Option<&mut Task> {
        if let Some(id) = self.session.current_id() {
            return self.tasks.iter_mut().find(|task| task.id == id);
        }
        self.session.draft_mut()
    }

    /// Opens an edit session on a fresh zero-id task in the given column.
    #[instrument(skip(self))]
    pub fn new_task(&mut self, category: &str) -> BoardResult<()> {
        self.require_column(category)?;
        info!(category, "starting new task");
        self.session.begin_new(Task::new(category));
        Ok(())
    }

    /// Opens an edit session on a live task, snapshotting it for cancel.
    #[instrument(skip(self))]
    pub fn begin_edit(&mut self, id: u64) -> BoardResult<()> {
        let task = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or(BoardError::TaskNotFound { id })?;
        self.session.begin_edit(task);
        Ok(())
    }

    /// Persists the current task: a zero-id draft is appended to its
    /// column and handed to the repository for an id; an existing task is
    /// updated in place. Ends the session and runs the reminder
    /// scheduling decision.
    #[instrument(skip(self, repo, notifier, sink, now))]
    pub fn save_task(
        &mut self,
        repo: &mut dyn TaskRepository,
        notifier: &mut dyn Notifier,
        sink: &mut dyn NotificationSink,
        now: DateTime<FixedOffset>,
    ) -> BoardResult<u64> {
        let slot = self.session.slot().clone();
        let id = match slot {
            Slot::Empty => {
                return Err(BoardError::validation("session", "no task is being edited"));
            }
            Slot::New(mut draft) => {
                draft.column_index = ordering::append_index(&self.tasks, &draft.category);
                draft.date_created = Some(now);

                let saved = repo
                    .save_task(&draft)
                    .map_err(|err| BoardError::persistence("save_task", 0, err))?;
                if !saved.success {
                    return Err(BoardError::persistence(
                        "save_task",
                        0,
                        "repository reported failure",
                    ));
                }

                draft.id = saved.id;
                let category = draft.category.clone();
                ordering::insert(&mut self.tasks, draft);
                self.notice_if_over_limit(&category, sink);
                saved.id
            }
            Slot::Existing(id) => {
                let task = self
                    .tasks
                    .iter()
                    .find(|task| task.id == id)
                    .ok_or(BoardError::TaskNotFound { id })?;
                let saved = repo
                    .save_task(task)
                    .map_err(|err| BoardError::persistence("save_task", id, err))?;
                if !saved.success {
                    return Err(BoardError::persistence(
                        "save_task",
                        id,
                        "repository reported failure",
                    ));
                }
                id
            }
        };

        if let Some(task) = self.tasks.iter().find(|task| task.id == id) {
            let action = reminder::plan(task);
            if let Err(err) = reminder::dispatch(task, &action, notifier) {
                warn!(id, error = %err, "reminder dispatch failed after save");
            }
        }

        self.session.end();
        sink.display("Task was saved successfully", NOTICE_DURATION_MS);
        debug!(id, "task saved");
        Ok(id)
    }

    /// Abandons the current edit. With a snapshot, the live task is
    /// replaced by a fresh copy of it, the list re-sorts by column index,
    /// and a snapshot with a reminder re-runs the scheduling decision in
    /// case a partial edit clobbered the notification. Idle afterwards
    /// either way.
    #[instrument(skip(self, notifier))]
    pub fn cancel_edit(&mut self, notifier: &mut dyn Notifier) {
        let Some(snapshot) = self.session.end() else {
            debug!("cancelled edit with no snapshot");
            return;
        };

        let Some(position) = self.tasks.iter().position(|task| task.id == snapshot.id) else {
            warn!(id = snapshot.id, "snapshot task no longer on the board");
            return;
        };

        let restore_reminder = snapshot.reminder_offset != ReminderOffset::None;
        self.tasks[position] = snapshot.clone();
        self.tasks.sort_by_key(|task| task.column_index);

        if restore_reminder
            && let Some(task) = self.tasks.iter().find(|task| task.id == snapshot.id)
        {
            let action = reminder::plan(task);
            if let Err(err) = reminder::dispatch(task, &action, notifier) {
                warn!(id = task.id, error = %err, "failed to restore reminder after cancel");
            }
        }

        debug!(id = snapshot.id, "edit cancelled and task restored");
    }

    /// Deletes a task: repository first (a failed delete leaves the board
    /// untouched), then the scheduled notification, then the in-memory
    /// removal with its column re-pack.
    #[instrument(skip(self, repo, notifier, sink))]
    pub fn delete_task(
        &mut self,
        id: u64,
        repo: &mut dyn TaskRepository,
        notifier: &mut dyn Notifier,
        sink: &mut dyn NotificationSink,
    ) -> BoardResult<()> {
        {
            let task = self
                .tasks
                .iter()
                .find(|task| task.id == id)
                .ok_or(BoardError::TaskNotFound { id })?;

            let deleted = repo
                .delete_task(id)
                .map_err(|err| BoardError::persistence("delete_task", id, err))?;
            if !deleted {
                return Err(BoardError::persistence(
                    "delete_task",
                    id,
                    "repository reported failure",
                ));
            }

            let action = ReminderAction::CancelExisting { task_id: id };
            if let Err(err) = reminder::dispatch(task, &action, notifier) {
                warn!(id, error = %err, "failed to cancel reminder for deleted task");
            }
        }

        ordering::remove_and_repack(&mut self.tasks, id, repo)?;

        if self.session.current_id() == Some(id) {
            self.session.end();
        }

        sink.display("Task deleted from board successfully", NOTICE_DURATION_MS);
        Ok(())
    }

    /// Adds a tag to the current task. Returns whether it was added;
    /// a duplicate is reported through the sink, not as an error.
    #[instrument(skip(self, sink))]
    pub fn add_tag(&mut self, tag: &str, sink: &mut dyn NotificationSink) -> BoardResult<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(BoardError::validation("tag", "tag cannot be empty"));
        }

        let Some(task) = self.current_task_mut() else {
            return Err(BoardError::validation("tag", "no task is being edited"));
        };

        if !task.add_tag(tag) {
            sink.display("Tag already exists", NOTICE_DURATION_MS);
            return Ok(false);
        }

        sink.display(&format!("Tag {tag} added successfully"), NOTICE_DURATION_MS);
        Ok(true)
    }

    #[instrument(skip(self, sink))]
    pub fn delete_tag(&mut self, tag: &str, sink: &mut dyn NotificationSink) -> BoardResult<()> {
        let Some(task) = self.current_task_mut() else {
            return Err(BoardError::validation("tag", "no task is being edited"));
        };

        task.remove_tag(tag);
        sink.display("Tag deleted successfully", NOTICE_DURATION_MS);
        Ok(())
    }

    /// Renames a column (and optionally its advisory limit), rewrites the
    /// category of every task under the old name, and re-sorts the task
    /// list by column index. Indices themselves do not change.
    #[instrument(skip(self, repo))]
    pub fn edit_column<R>(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_max: u32,
        repo: &mut R,
    ) -> BoardResult<()>
    where
        R: TaskRepository + ColumnRepository,
    {
        if old_name != new_name && self.columns.iter().any(|column| column.name == new_name) {
            return Err(BoardError::validation(
                "column",
                format!("column '{new_name}' already exists"),
            ));
        }

        let position = self
            .columns
            .iter()
            .position(|column| column.name == old_name)
            .ok_or_else(|| BoardError::ColumnNotFound {
                name: old_name.to_string(),
            })?;

        let previous = self.columns[position].clone();
        self.columns[position].name = new_name.to_string();
        self.columns[position].max_task_limit = new_max;

        if let Err(err) = repo.save_column(&self.columns[position]) {
            self.columns[position] = previous.clone();
            return Err(BoardError::persistence("save_column", previous.id, err));
        }

        let renamed = ordering::rename_category(&mut self.tasks, old_name, new_name, repo)?;
        info!(old_name, new_name, renamed, "column edited");
        Ok(())
    }

    /// Moves a task to a target column slot after a drag. Only the moved
    /// task's placement changes; the host's follow-up render re-sorts.
    #[instrument(skip(self, repo))]
    pub fn move_task(
        &mut self,
        id: u64,
        target_category: &str,
        target_index: u32,
        repo: &mut dyn TaskRepository,
    ) -> BoardResult<()> {
        self.require_column(target_category)?;

        let previous = ordering::relocate(&mut self.tasks, id, target_category, target_index)?;

        let Some(task) = self.tasks.iter().find(|task| task.id == id) else {
            return Err(BoardError::TaskNotFound { id });
        };
        if let Err(err) = repo.update_column_data(task) {
            let (category, index) = previous;
            if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
                task.category = category;
                task.column_index = index;
            }
            return Err(BoardError::persistence("update_column_data", id, err));
        }

        Ok(())
    }

    /// Cancels the current task's scheduled notification and resets its
    /// offset to no-reminder.
    #[instrument(skip(self, notifier))]
    pub fn remove_reminder(&mut self, notifier: &mut dyn Notifier) -> BoardResult<()> {
        let Some(id) = self.current_task().map(|task| task.id) else {
            return Err(BoardError::validation("reminder", "no task is being edited"));
        };

        if let Err(err) = notifier.cancel(&reminder::key_for(id)) {
            warn!(id, error = %err, "failed to cancel scheduled reminder");
        }
        if let Some(task) = self.current_task_mut() {
            task.reminder_offset = ReminderOffset::None;
        }
        Ok(())
    }

    /// Minute-tick refresh of the current task's derived date fields.
    /// Pure recomputation, so invoking it repeatedly is harmless; `None`
    /// while no task is open.
    pub fn tick(&self, now: DateTime<FixedOffset>) -> Option<DateSummary> {
        self.current_task().map(|task| Self::date_summary(task, now))
    }

    pub fn date_summary(task: &Task, now: DateTime<FixedOffset>) -> DateSummary {
        DateSummary {
            past_due: task.is_past_due(now),
            days_worked_on: task.days_worked_on(now),
            days_since_creation: task.days_since_creation(now),
        }
    }

    fn notice_if_over_limit(&self, category: &str, sink: &mut dyn NotificationSink) {
        let Some(column) = self.column(category) else {
            return;
        };
        let count = self
            .tasks
            .iter()
            .filter(|task| task.category == category)
            .count() as u32;
        if count > column.max_task_limit {
            sink.display(
                &format!(
                    "Column '{category}' is over its task limit of {}",
                    column.max_task_limit
                ),
                NOTICE_DURATION_MS,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{FixedOffset, TimeZone};

    use super::{Board, Column};
    use crate::error::BoardError;
    use crate::notify::{NotificationSink, Notifier};
    use crate::reminder::ReminderPayload;
    use crate::repository::{ColumnRepository, SavedTask, TaskRepository};
    use crate::task::{ReminderOffset, Task};

    #[derive(Default)]
    struct FakeRepo {
        next_id: u64,
        saved: Vec<Task>,
        saved_columns: Vec<Column>,
        index_updates: Vec<(u64, u32)>,
        fail_delete: bool,
    }

    impl TaskRepository for FakeRepo {
        fn save_task(&mut self, task: &Task) -> anyhow::Result<SavedTask> {
            let id = if task.id == 0 {
                self.next_id += 1;
                self.next_id
            } else {
                task.id
            };
            self.saved.push(task.clone());
            Ok(SavedTask { id, success: true })
        }

        fn delete_task(&mut self, _id: u64) -> anyhow::Result<bool> {
            if self.fail_delete {
                return Err(anyhow!("store unavailable"));
            }
            Ok(true)
        }

        fn update_column_index(&mut self, id: u64, index: u32) -> anyhow::Result<()> {
            self.index_updates.push((id, index));
            Ok(())
        }

        fn update_category(&mut self, _id: u64, _category: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn update_column_data(&mut self, _task: &Task) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl ColumnRepository for FakeRepo {
        fn columns(&mut self, _board_id: u64) -> anyhow::Result<Vec<Column>> {
            Ok(self.saved_columns.clone())
        }

        fn save_column(&mut self, column: &Column) -> anyhow::Result<()> {
            self.saved_columns.push(column.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        scheduled: Vec<(String, chrono::DateTime<FixedOffset>)>,
        cancelled: Vec<String>,
    }

    impl Notifier for FakeNotifier {
        fn schedule_at(
            &mut self,
            key: &str,
            at: chrono::DateTime<FixedOffset>,
            _payload: &ReminderPayload,
        ) -> anyhow::Result<()> {
            self.scheduled.push((key.to_string(), at));
            Ok(())
        }

        fn cancel(&mut self, key: &str) -> anyhow::Result<()> {
            self.cancelled.push(key.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        messages: Vec<String>,
    }

    impl NotificationSink for FakeSink {
        fn display(&mut self, message: &str, _duration_ms: u32) {
            self.messages.push(message.to_string());
        }
    }

    fn at(day: u32, h: u32, mi: u32) -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("valid offset")
            .with_ymd_and_hms(2024, 3, day, h, mi, 0)
            .single()
            .expect("valid datetime")
    }

    fn column(id: u64, name: &str, position: u32) -> Column {
        Column {
            id,
            board_id: 1,
            name: name.to_string(),
            position,
            max_task_limit: 10,
        }
    }

    fn seeded_task(id: u64, category: &str, index: u32, title: &str) -> Task {
        let mut task = Task::new(category);
        task.id = id;
        task.column_index = index;
        task.title = title.to_string();
        task
    }

    fn board_with_tasks(tasks: Vec<Task>) -> Board {
        Board::new(
            1,
            vec![
                column(1, "Backlog", 0),
                column(2, "To Do", 1),
                column(3, "Done", 2),
            ],
            tasks,
        )
    }

    #[test]
    fn saving_a_new_task_appends_to_its_column_and_takes_the_repo_id() {
        let mut board = board_with_tasks(vec![
            seeded_task(1, "To Do", 0, "first"),
            seeded_task(2, "To Do", 1, "second"),
        ]);
        let mut repo = FakeRepo {
            next_id: 2,
            ..FakeRepo::default()
        };
        let mut notifier = FakeNotifier::default();
        let mut sink = FakeSink::default();

        board.new_task("To Do").expect("column exists");
        board
            .current_task_mut()
            .expect("draft open")
            .title = "third".to_string();
        let id = board
            .save_task(&mut repo, &mut notifier, &mut sink, at(1, 12, 0))
            .expect("save succeeds");

        assert_eq!(id, 3);
        let saved = board.task(3).expect("task on board");
        assert_eq!(saved.column_index, 2);
        assert!(saved.date_created.is_some());
        assert!(!board.is_editing());
        // offset defaults to none: any stale notification is cleared
        assert_eq!(notifier.cancelled, vec!["3".to_string()]);
        assert!(sink.messages.iter().any(|m| m.contains("saved")));
    }

    #[test]
    fn saving_with_due_information_schedules_the_reminder() {
        let mut board = board_with_tasks(vec![seeded_task(1, "To Do", 0, "ship it")]);
        let mut repo = FakeRepo::default();
        let mut notifier = FakeNotifier::default();
        let mut sink = FakeSink::default();

        board.begin_edit(1).expect("task exists");
        {
            let task = board.current_task_mut().expect("editing");
            task.due_date = Some(at(10, 0, 0));
            task.time_due = Some(at(10, 9, 0));
            task.reminder_offset = ReminderOffset::OneDayBefore;
        }
        board
            .save_task(&mut repo, &mut notifier, &mut sink, at(1, 12, 0))
            .expect("save succeeds");

        assert_eq!(notifier.scheduled, vec![("1".to_string(), at(9, 9, 0))]);
        assert!(notifier.cancelled.is_empty());
    }

    #[test]
    fn cancel_restores_the_exact_pre_edit_state() {
        let tasks = vec![
            seeded_task(1, "To Do", 0, "first"),
            seeded_task(2, "To Do", 1, "second"),
            seeded_task(3, "Done", 0, "third"),
        ];
        let mut board = board_with_tasks(tasks);
        let before: Vec<Task> = board.tasks().to_vec();
        let mut notifier = FakeNotifier::default();

        board.begin_edit(2).expect("task exists");
        {
            let task = board.current_task_mut().expect("editing");
            task.title = "rewritten".to_string();
            task.tags.push("urgent".to_string());
            task.color_key = crate::task::ColorKey::High;
            task.column_index = 9;
        }
        board.cancel_edit(&mut notifier);

        assert_eq!(board.tasks(), before.as_slice());
        assert!(!board.is_editing());
        // snapshot had no reminder, so nothing was rescheduled
        assert!(notifier.scheduled.is_empty());
    }

    #[test]
    fn cancel_reschedules_a_reminder_the_edit_removed() {
        let mut task = seeded_task(4, "To Do", 0, "pay rent");
        task.due_date = Some(at(20, 0, 0));
        task.time_due = Some(at(20, 8, 0));
        task.reminder_offset = ReminderOffset::TwoHoursBefore;
        let mut board = board_with_tasks(vec![task]);
        let mut notifier = FakeNotifier::default();

        board.begin_edit(4).expect("task exists");
        board
            .current_task_mut()
            .expect("editing")
            .reminder_offset = ReminderOffset::None;
        board.cancel_edit(&mut notifier);

        assert_eq!(
            board.task(4).expect("restored").reminder_offset,
            ReminderOffset::TwoHoursBefore
        );
        assert_eq!(notifier.scheduled, vec![("4".to_string(), at(20, 6, 0))]);
    }

    #[test]
    fn delete_reindexes_siblings_and_cancels_the_notification() {
        let mut board = board_with_tasks(vec![
            seeded_task(1, "To Do", 0, "a"),
            seeded_task(2, "To Do", 1, "b"),
            seeded_task(3, "To Do", 2, "c"),
        ]);
        let mut repo = FakeRepo::default();
        let mut notifier = FakeNotifier::default();
        let mut sink = FakeSink::default();

        board
            .delete_task(1, &mut repo, &mut notifier, &mut sink)
            .expect("delete succeeds");

        assert!(board.task(1).is_none());
        assert_eq!(repo.index_updates, vec![(2, 0), (3, 1)]);
        assert_eq!(notifier.cancelled, vec!["1".to_string()]);
    }

    #[test]
    fn failed_repository_delete_leaves_the_board_untouched() {
        let mut board = board_with_tasks(vec![
            seeded_task(1, "To Do", 0, "a"),
            seeded_task(2, "To Do", 1, "b"),
        ]);
        let before: Vec<Task> = board.tasks().to_vec();
        let mut repo = FakeRepo {
            fail_delete: true,
            ..FakeRepo::default()
        };
        let mut notifier = FakeNotifier::default();
        let mut sink = FakeSink::default();

        let err = board
            .delete_task(1, &mut repo, &mut notifier, &mut sink)
            .expect_err("delete fails");
        assert!(matches!(err, BoardError::Persistence { id: 1, .. }));
        assert_eq!(board.tasks(), before.as_slice());
        assert!(notifier.cancelled.is_empty());
    }

    #[test]
    fn deleting_an_unknown_id_fails_loudly() {
        let mut board = board_with_tasks(vec![seeded_task(1, "To Do", 0, "a")]);
        let mut repo = FakeRepo::default();
        let mut notifier = FakeNotifier::default();
        let mut sink = FakeSink::default();

        let err = board
            .delete_task(42, &mut repo, &mut notifier, &mut sink)
            .expect_err("missing id");
        assert!(matches!(err, BoardError::TaskNotFound { id: 42 }));
    }

    #[test]
    fn renaming_a_column_relabels_tasks_and_keeps_indices() {
        let mut board = board_with_tasks(vec![
            seeded_task(1, "Backlog", 0, "a"),
            seeded_task(2, "Backlog", 1, "b"),
            seeded_task(3, "To Do", 0, "c"),
        ]);
        let mut repo = FakeRepo::default();

        board
            .edit_column("Backlog", "Started", 5, &mut repo)
            .expect("rename succeeds");

        assert!(board.column("Backlog").is_none());
        let renamed = board.column("Started").expect("column renamed");
        assert_eq!(renamed.max_task_limit, 5);
        for id in [1, 2] {
            assert_eq!(board.task(id).expect("task kept").category, "Started");
        }
        assert_eq!(board.task(1).expect("task kept").column_index, 0);
        assert_eq!(board.task(2).expect("task kept").column_index, 1);
        assert_eq!(board.task(3).expect("task kept").category, "To Do");
    }

    #[test]
    fn renaming_onto_an_existing_column_is_rejected() {
        let mut board = board_with_tasks(vec![]);
        let mut repo = FakeRepo::default();

        let err = board
            .edit_column("Backlog", "Done", 10, &mut repo)
            .expect_err("duplicate name");
        assert!(matches!(err, BoardError::Validation { .. }));
    }

    #[test]
    fn moving_to_an_unknown_column_is_rejected() {
        let mut board = board_with_tasks(vec![seeded_task(1, "To Do", 0, "a")]);
        let mut repo = FakeRepo::default();

        let err = board
            .move_task(1, "Nowhere", 0, &mut repo)
            .expect_err("unknown column");
        assert!(matches!(err, BoardError::ColumnNotFound { .. }));
        assert_eq!(board.task(1).expect("unchanged").category, "To Do");
    }

    #[test]
    fn suggested_tags_exclude_the_current_tasks_tags() {
        let mut first = seeded_task(1, "To Do", 0, "a");
        first.tags = vec!["rust".to_string(), "urgent".to_string()];
        let mut second = seeded_task(2, "To Do", 1, "b");
        second.tags = vec!["home".to_string()];
        let mut board = board_with_tasks(vec![first, second]);

        board.begin_edit(1).expect("task exists");
        assert_eq!(board.suggested_tags(), vec!["home".to_string()]);
    }

    #[test]
    fn tag_operations_require_an_open_session() {
        let mut board = board_with_tasks(vec![seeded_task(1, "To Do", 0, "a")]);
        let mut sink = FakeSink::default();

        let err = board.add_tag("urgent", &mut sink).expect_err("idle board");
        assert!(matches!(err, BoardError::Validation { .. }));
    }

    #[test]
    fn duplicate_tag_is_reported_not_added() {
        let mut board = board_with_tasks(vec![seeded_task(1, "To Do", 0, "a")]);
        let mut sink = FakeSink::default();

        board.begin_edit(1).expect("task exists");
        assert!(board.add_tag("urgent", &mut sink).expect("first add"));
        assert!(!board.add_tag("urgent", &mut sink).expect("second add"));
        assert_eq!(board.current_task().expect("editing").tags.len(), 1);
        assert!(sink.messages.iter().any(|m| m.contains("already exists")));
    }

    #[test]
    fn tick_is_idempotent_and_idle_safe() {
        let mut task = seeded_task(1, "To Do", 0, "a");
        task.start_date = Some(at(1, 0, 0));
        task.date_created = Some(at(1, 0, 0));
        let mut board = board_with_tasks(vec![task]);
        let now = at(4, 12, 0);

        assert_eq!(board.tick(now), None);

        board.begin_edit(1).expect("task exists");
        let first = board.tick(now).expect("summary while editing");
        let second = board.tick(now).expect("summary while editing");
        assert_eq!(first, second);
        assert_eq!(first.days_worked_on.as_deref(), Some("3 day(s)"));
    }

    #[test]
    fn remove_reminder_cancels_and_resets_the_offset() {
        let mut task = seeded_task(1, "To Do", 0, "a");
        task.reminder_offset = ReminderOffset::OneHourBefore;
        let mut board = board_with_tasks(vec![task]);
        let mut notifier = FakeNotifier::default();

        board.begin_edit(1).expect("task exists");
        board.remove_reminder(&mut notifier).expect("editing");

        assert_eq!(notifier.cancelled, vec!["1".to_string()]);
        assert_eq!(
            board.current_task().expect("editing").reminder_offset,
            ReminderOffset::None
        );
    }
}
