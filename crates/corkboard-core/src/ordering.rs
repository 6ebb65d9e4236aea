//! Keeps the per-category column indices contiguous: within one category
//! the indices are exactly `0..n` after every completed mutation.

use tracing::{debug, instrument};

use crate::error::{BoardError, BoardResult};
use crate::repository::TaskRepository;
use crate::task::Task;

/// Index for appending to the end of a category: the count of tasks
/// already there.
pub fn append_index(tasks: &[Task], category: &str) -> u32 {
    tasks.iter().filter(|task| task.category == category).count() as u32
}

/// Appends a task to the end of its category and returns the assigned
/// index. The caller must not pre-assign a conflicting index.
pub fn insert(tasks: &mut Vec<Task>, mut task: Task) -> u32 {
    let index = append_index(tasks, &task.category);
    task.column_index = index;
    tasks.push(task);
    index
}

/// Removes a task and closes the gap it leaves: every sibling in the same
/// category with a higher index is decremented by one, in ascending order
/// of original index, with one `update_column_index` repository call per
/// sibling. If a repository call fails mid-repack, the in-memory indices
/// are rolled back to their pre-repack values and the error surfaces as a
/// persistence failure.
#[instrument(skip(tasks, repo))]
pub fn remove_and_repack(
    tasks: &mut Vec<Task>,
    id: u64,
    repo: &mut dyn TaskRepository,
) -> BoardResult<Task> {
    let position = tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(BoardError::TaskNotFound { id })?;
    let removed = tasks.remove(position);

    let mut affected: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| {
            task.category == removed.category && task.column_index > removed.column_index
        })
        .map(|(slot, _)| slot)
        .collect();
    affected.sort_by_key(|&slot| tasks[slot].column_index);

    let mut next = removed.column_index;
    let mut applied: Vec<(usize, u32)> = Vec::new();
    for slot in affected {
        let previous = tasks[slot].column_index;
        tasks[slot].column_index = next;
        if let Err(err) = repo.update_column_index(tasks[slot].id, next) {
            let failed_id = tasks[slot].id;
            tasks[slot].column_index = previous;
            for &(done, old) in &applied {
                tasks[done].column_index = old;
            }
            return Err(BoardError::persistence("update_column_index", failed_id, err));
        }
        applied.push((slot, previous));
        next += 1;
    }

    debug!(
        id,
        category = %removed.category,
        repacked = applied.len(),
        "removed task and repacked column"
    );
    Ok(removed)
}

/// Reassigns a task's category and index without touching its old or new
/// siblings; a follow-up full re-sort (not a re-pack) restores display
/// order.
#[instrument(skip(tasks))]
pub fn relocate(
    tasks: &mut [Task],
    id: u64,
    target_category: &str,
    target_index: u32,
) -> BoardResult<(String, u32)> {
    let task = tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or(BoardError::TaskNotFound { id })?;

    let previous = (task.category.clone(), task.column_index);
    task.category = target_category.to_string();
    task.column_index = target_index;
    Ok(previous)
}

/// Renames the category label of every task in `old` to `new` (one
/// `update_category` repository call each) and re-sorts the whole
/// collection by column index. Numeric indices are untouched. A failed
/// repository call rolls the affected task's label back before surfacing.
#[instrument(skip(tasks, repo))]
pub fn rename_category(
    tasks: &mut Vec<Task>,
    old: &str,
    new: &str,
    repo: &mut dyn TaskRepository,
) -> BoardResult<u64> {
    let mut renamed = 0_u64;
    for task in tasks.iter_mut() {
        if task.category != old {
            continue;
        }
        task.category = new.to_string();
        if let Err(err) = repo.update_category(task.id, new) {
            task.category = old.to_string();
            return Err(BoardError::persistence("update_category", task.id, err));
        }
        renamed += 1;
    }

    tasks.sort_by_key(|task| task.column_index);
    debug!(old, new, renamed, "renamed category");
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{append_index, insert, relocate, remove_and_repack, rename_category};
    use crate::error::BoardError;
    use crate::repository::{SavedTask, TaskRepository};
    use crate::task::Task;

    #[derive(Default)]
    struct RecordingRepo {
        index_updates: Vec<(u64, u32)>,
        category_updates: Vec<(u64, String)>,
        fail_on_index_update_for: Option<u64>,
    }

    impl TaskRepository for RecordingRepo {
        fn save_task(&mut self, task: &Task) -> anyhow::Result<SavedTask> {
            Ok(SavedTask {
                id: task.id,
                success: true,
            })
        }

        fn delete_task(&mut self, _id: u64) -> anyhow::Result<bool> {
            Ok(true)
        }

        fn update_column_index(&mut self, id: u64, index: u32) -> anyhow::Result<()> {
            if self.fail_on_index_update_for == Some(id) {
                return Err(anyhow!("store unavailable"));
            }
            self.index_updates.push((id, index));
            Ok(())
        }

        fn update_category(&mut self, id: u64, category: &str) -> anyhow::Result<()> {
            self.category_updates.push((id, category.to_string()));
            Ok(())
        }

        fn update_column_data(&mut self, _task: &Task) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn task(id: u64, category: &str, index: u32) -> Task {
        let mut task = Task::new(category);
        task.id = id;
        task.title = format!("task {id}");
        task.column_index = index;
        task
    }

    fn indices_of(tasks: &[Task], category: &str) -> Vec<u32> {
        let mut indices: Vec<u32> = tasks
            .iter()
            .filter(|task| task.category == category)
            .map(|task| task.column_index)
            .collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn insert_appends_at_category_count() {
        let mut tasks = vec![task(1, "To Do", 0), task(2, "To Do", 1), task(3, "Done", 0)];
        assert_eq!(append_index(&tasks, "To Do"), 2);

        let assigned = insert(&mut tasks, task(4, "To Do", 0));
        assert_eq!(assigned, 2);
        assert_eq!(indices_of(&tasks, "To Do"), vec![0, 1, 2]);
        assert_eq!(indices_of(&tasks, "Done"), vec![0]);
    }

    #[test]
    fn remove_decrements_higher_siblings_and_reports_each() {
        let mut tasks = vec![
            task(1, "To Do", 0),
            task(2, "To Do", 1),
            task(3, "To Do", 2),
            task(4, "To Do", 3),
            task(5, "Done", 0),
        ];
        let mut repo = RecordingRepo::default();

        let removed = remove_and_repack(&mut tasks, 2, &mut repo).expect("remove succeeds");
        assert_eq!(removed.id, 2);
        assert_eq!(indices_of(&tasks, "To Do"), vec![0, 1, 2]);
        assert_eq!(indices_of(&tasks, "Done"), vec![0]);
        // one call per affected sibling, in ascending original-index order
        assert_eq!(repo.index_updates, vec![(3, 1), (4, 2)]);
    }

    #[test]
    fn contiguity_holds_over_insert_remove_sequences() {
        let mut tasks: Vec<Task> = Vec::new();
        let mut repo = RecordingRepo::default();

        for id in 1..=6 {
            insert(&mut tasks, task(id, "Backlog", 0));
        }
        remove_and_repack(&mut tasks, 3, &mut repo).expect("remove 3");
        remove_and_repack(&mut tasks, 1, &mut repo).expect("remove 1");
        insert(&mut tasks, task(7, "Backlog", 0));
        remove_and_repack(&mut tasks, 6, &mut repo).expect("remove 6");

        let count = tasks.len() as u32;
        assert_eq!(indices_of(&tasks, "Backlog"), (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn remove_rolls_back_indices_when_a_repack_call_fails() {
        let mut tasks = vec![
            task(1, "To Do", 0),
            task(2, "To Do", 1),
            task(3, "To Do", 2),
            task(4, "To Do", 3),
        ];
        let mut repo = RecordingRepo {
            fail_on_index_update_for: Some(4),
            ..RecordingRepo::default()
        };

        let err = remove_and_repack(&mut tasks, 1, &mut repo).expect_err("repack fails");
        assert!(matches!(err, BoardError::Persistence { id: 4, .. }));
        // sibling 3 had already been decremented and must be restored
        let survivor = tasks.iter().find(|t| t.id == 3).expect("task 3 kept");
        assert_eq!(survivor.column_index, 2);
        let survivor = tasks.iter().find(|t| t.id == 4).expect("task 4 kept");
        assert_eq!(survivor.column_index, 3);
    }

    #[test]
    fn remove_unknown_id_is_not_found() {
        let mut tasks = vec![task(1, "To Do", 0)];
        let mut repo = RecordingRepo::default();
        let err = remove_and_repack(&mut tasks, 99, &mut repo).expect_err("missing id");
        assert!(matches!(err, BoardError::TaskNotFound { id: 99 }));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn relocate_changes_only_the_moved_task() {
        let mut tasks = vec![task(1, "To Do", 0), task(2, "To Do", 1), task(3, "Done", 0)];
        let previous = relocate(&mut tasks, 2, "Done", 1).expect("relocate succeeds");
        assert_eq!(previous, ("To Do".to_string(), 1));

        let moved = tasks.iter().find(|t| t.id == 2).expect("task 2 kept");
        assert_eq!(moved.category, "Done");
        assert_eq!(moved.column_index, 1);
        // source column is intentionally left with a gap
        assert_eq!(indices_of(&tasks, "To Do"), vec![0]);
    }

    #[test]
    fn rename_keeps_indices_and_resorts() {
        let mut tasks = vec![
            task(1, "Backlog", 2),
            task(2, "Backlog", 0),
            task(3, "Started", 0),
            task(4, "Backlog", 1),
        ];
        let mut repo = RecordingRepo::default();

        let renamed =
            rename_category(&mut tasks, "Backlog", "Started", &mut repo).expect("rename succeeds");
        assert_eq!(renamed, 3);
        assert!(tasks.iter().all(|task| task.category == "Started"));
        assert_eq!(
            repo.category_updates,
            vec![
                (1, "Started".to_string()),
                (2, "Started".to_string()),
                (4, "Started".to_string()),
            ]
        );
        // re-sorted by column index, indices untouched
        let order: Vec<u32> = tasks.iter().map(|task| task.column_index).collect();
        assert_eq!(order, vec![0, 0, 1, 2]);
    }
}
