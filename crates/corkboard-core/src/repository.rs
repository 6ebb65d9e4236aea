//! Collaborator contracts for persistence. The engine calls these
//! synchronously and treats any `Err` as a persistence failure; it never
//! inspects how the rows are stored.

use serde::{Deserialize, Serialize};

use crate::board::Column;
use crate::task::Task;

/// Outcome of a task save: the repository-assigned id plus a success flag
/// for stores that can report row-level failure without erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTask {
    pub id: u64,
    pub success: bool,
}

pub trait TaskRepository {
    /// Inserts (id 0) or updates a task row. Returns the assigned id.
    fn save_task(&mut self, task: &Task) -> anyhow::Result<SavedTask>;

    /// Removes a task row. `Ok(false)` means the row was not there.
    fn delete_task(&mut self, id: u64) -> anyhow::Result<bool>;

    /// Updates a single task's position within its column. Issued once per
    /// affected task during a re-pack; the store has no other way to learn
    /// the new order.
    fn update_column_index(&mut self, id: u64, index: u32) -> anyhow::Result<()>;

    /// Updates a single task's column name after a rename.
    fn update_category(&mut self, id: u64, category: &str) -> anyhow::Result<()>;

    /// Updates a task's column placement (category and index together)
    /// after a drag-style move.
    fn update_column_data(&mut self, task: &Task) -> anyhow::Result<()>;
}

pub trait ColumnRepository {
    /// Columns of a board, ordered by position.
    fn columns(&mut self, board_id: u64) -> anyhow::Result<Vec<Column>>;

    /// Inserts (id 0) or updates a column row.
    fn save_column(&mut self, column: &Column) -> anyhow::Result<()>;
}
