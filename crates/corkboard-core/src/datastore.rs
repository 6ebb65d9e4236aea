use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::board::Column;
use crate::repository::{ColumnRepository, SavedTask, TaskRepository};
use crate::task::Task;

/// JSONL file store for tasks and columns. Each save rewrites the file
/// atomically through a temp file in the same directory.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub columns_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.data");
        let columns_path = data_dir.join("columns.data");

        if !tasks_path.exists() {
            fs::write(&tasks_path, "")?;
        }
        if !columns_path.exists() {
            fs::write(&columns_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            columns = %columns_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            columns_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> anyhow::Result<Vec<Task>> {
        load_jsonl(&self.tasks_path).context("failed to load tasks.data")
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.tasks_path, tasks).context("failed to save tasks.data")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_columns(&self) -> anyhow::Result<Vec<Column>> {
        load_jsonl(&self.columns_path).context("failed to load columns.data")
    }

    #[tracing::instrument(skip(self, columns))]
    pub fn save_columns(&self, columns: &[Column]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.columns_path, columns).context("failed to save columns.data")
    }

    pub fn next_task_id(tasks: &[Task]) -> u64 {
        tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1
    }

    pub fn next_column_id(columns: &[Column]) -> u64 {
        columns.iter().map(|column| column.id).max().unwrap_or(0) + 1
    }

    /// Returns the board's columns, seeding the given defaults on first
    /// use so a fresh data directory comes up with a working board.
    #[tracing::instrument(skip(self, names))]
    pub fn ensure_columns(
        &mut self,
        board_id: u64,
        names: &[String],
        max_task_limit: u32,
    ) -> anyhow::Result<Vec<Column>> {
        let existing = self.columns(board_id)?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        info!(board_id, count = names.len(), "seeding default columns");
        let mut columns = self.load_columns()?;
        for (position, name) in names.iter().enumerate() {
            let column = Column {
                id: Self::next_column_id(&columns),
                board_id,
                name: name.clone(),
                position: position as u32,
                max_task_limit,
            };
            columns.push(column);
        }
        self.save_columns(&columns)?;
        self.columns(board_id)
    }
}

impl TaskRepository for DataStore {
    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    fn save_task(&mut self, task: &Task) -> anyhow::Result<SavedTask> {
        let mut tasks = self.load_tasks()?;

        let id = if task.id == 0 {
            Self::next_task_id(&tasks)
        } else {
            task.id
        };
        let mut stored = task.clone();
        stored.id = id;

        if let Some(slot) = tasks.iter_mut().find(|existing| existing.id == id) {
            *slot = stored;
        } else {
            tasks.push(stored);
        }
        tasks.sort_by_key(|task| task.id);
        self.save_tasks(&tasks)?;

        debug!(id, "saved task");
        Ok(SavedTask { id, success: true })
    }

    #[tracing::instrument(skip(self))]
    fn delete_task(&mut self, id: u64) -> anyhow::Result<bool> {
        let mut tasks = self.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Ok(false);
        }
        self.save_tasks(&tasks)?;
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    fn update_column_index(&mut self, id: u64, index: u32) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task not found in store: {id}"))?;
        task.column_index = index;
        self.save_tasks(&tasks)
    }

    #[tracing::instrument(skip(self))]
    fn update_category(&mut self, id: u64, category: &str) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task not found in store: {id}"))?;
        task.category = category.to_string();
        self.save_tasks(&tasks)
    }

    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    fn update_column_data(&mut self, task: &Task) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        let slot = tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| anyhow!("task not found in store: {}", task.id))?;
        *slot = task.clone();
        self.save_tasks(&tasks)
    }
}

impl ColumnRepository for DataStore {
    #[tracing::instrument(skip(self))]
    fn columns(&mut self, board_id: u64) -> anyhow::Result<Vec<Column>> {
        let mut columns: Vec<Column> = self
            .load_columns()?
            .into_iter()
            .filter(|column| column.board_id == board_id)
            .collect();
        columns.sort_by_key(|column| column.position);
        Ok(columns)
    }

    #[tracing::instrument(skip(self, column), fields(id = column.id, name = %column.name))]
    fn save_column(&mut self, column: &Column) -> anyhow::Result<()> {
        let mut columns = self.load_columns()?;

        let mut stored = column.clone();
        if stored.id == 0 {
            stored.id = Self::next_column_id(&columns);
        }

        if let Some(slot) = columns.iter_mut().find(|existing| existing.id == stored.id) {
            *slot = stored;
        } else {
            columns.push(stored);
        }
        columns.sort_by_key(|column| (column.board_id, column.position));
        self.save_columns(&columns)
    }
}

#[tracing::instrument(skip(path))]
pub(crate) fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(row);
    }

    debug!(count = out.len(), "loaded rows from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, rows))]
pub(crate) fn save_jsonl_atomic<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = rows.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for row in rows {
        let serialized = serde_json::to_string(row)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
