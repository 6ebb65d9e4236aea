//! Decides what should happen to a task's scheduled notification. The
//! decision is pure; the board dispatches it to the notifier collaborator.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::datetime::{combine_due_instant, resolve_reminder_instant};
use crate::notify::Notifier;
use crate::task::{ReminderOffset, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderAction {
    /// Clear whatever is scheduled under the task's key.
    CancelExisting { task_id: u64 },
    /// (Re)schedule: fire at `scheduled`, announcing the `due` instant.
    ScheduleAt {
        task_id: u64,
        scheduled: DateTime<FixedOffset>,
        due: DateTime<FixedOffset>,
    },
    /// A reminder was requested but cannot be computed yet (missing due
    /// date or time); leave everything as-is.
    NoAction,
}

/// What the notifier is asked to deliver when the reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub task_id: u64,
    pub title: String,
    pub category: String,
    pub due: DateTime<FixedOffset>,
}

impl ReminderPayload {
    pub fn for_task(task: &Task, due: DateTime<FixedOffset>) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            category: task.category.clone(),
            due,
        }
    }
}

/// Scheduling decision for the task's current state. An explicit "no
/// reminder" always cancels, even when due date/time are present; a
/// requested reminder with incomplete due information degrades to
/// `NoAction`.
pub fn plan(task: &Task) -> ReminderAction {
    if task.reminder_offset == ReminderOffset::None {
        return ReminderAction::CancelExisting { task_id: task.id };
    }

    let due = combine_due_instant(task.due_date.as_ref(), task.time_due.as_ref());
    let scheduled = resolve_reminder_instant(
        task.due_date.as_ref(),
        task.time_due.as_ref(),
        task.reminder_offset,
    );

    match (due, scheduled) {
        (Some(due), Some(scheduled)) => ReminderAction::ScheduleAt {
            task_id: task.id,
            scheduled,
            due,
        },
        _ => ReminderAction::NoAction,
    }
}

/// Stable notifier key for a task.
pub fn key_for(task_id: u64) -> String {
    task_id.to_string()
}

/// Carries a decision to the notifier collaborator.
#[instrument(skip(task, notifier))]
pub fn dispatch(
    task: &Task,
    action: &ReminderAction,
    notifier: &mut dyn Notifier,
) -> anyhow::Result<()> {
    match action {
        ReminderAction::CancelExisting { task_id } => {
            debug!(task_id, "cancelling scheduled reminder");
            notifier.cancel(&key_for(*task_id))
        }
        ReminderAction::ScheduleAt {
            task_id,
            scheduled,
            due,
        } => {
            debug!(task_id, scheduled = %scheduled, "scheduling reminder");
            let payload = ReminderPayload::for_task(task, *due);
            notifier.schedule_at(&key_for(*task_id), *scheduled, &payload)
        }
        ReminderAction::NoAction => Ok(()),
    }
}
