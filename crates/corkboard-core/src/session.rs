//! Edit lifecycle for the board's single current-task slot. A session is
//! either idle or editing exactly one task; an edit of a persisted task
//! carries a snapshot taken at edit-start so cancel can restore it.

use tracing::debug;

use crate::task::Task;

/// What the current-task slot points at while editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Nothing being edited.
    Empty,
    /// A zero-id draft that is not on the board yet.
    New(Task),
    /// A live board task, addressed by id.
    Existing(u64),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    slot: Slot,
    snapshot: Option<Task>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self {
            slot: Slot::Empty,
            snapshot: None,
        }
    }
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        !matches!(self.slot, Slot::Empty)
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Starts a session on a fresh zero-id draft. Any prior snapshot is
    /// discarded; there is no previous state to restore for a new task.
    pub fn begin_new(&mut self, draft: Task) {
        debug!(category = %draft.category, "begin new-task session");
        self.snapshot = None;
        self.slot = Slot::New(draft);
    }

    /// Starts a session on a live task, capturing a deep copy as the
    /// rollback snapshot.
    pub fn begin_edit(&mut self, live: &Task) {
        debug!(id = live.id, "begin edit session");
        self.snapshot = Some(live.clone());
        self.slot = Slot::Existing(live.id);
    }

    pub fn snapshot(&self) -> Option<&Task> {
        self.snapshot.as_ref()
    }

    /// Ends the session, yielding the snapshot (if any) for the caller to
    /// restore. The slot returns to idle either way.
    pub fn end(&mut self) -> Option<Task> {
        self.slot = Slot::Empty;
        self.snapshot.take()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Task> {
        match &mut self.slot {
            Slot::New(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn current_id(&self) -> Option<u64> {
        match &self.slot {
            Slot::Existing(id) => Some(*id),
            _ => None,
        }
    }
}
