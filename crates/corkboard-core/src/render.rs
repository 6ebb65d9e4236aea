use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use unicode_width::UnicodeWidthStr;

use crate::board::{Board, DateSummary};
use crate::config::Config;
use crate::notify::ScheduledReminder;
use crate::task::{ReminderOffset, Task};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, board, now))]
    pub fn print_board(&mut self, board: &Board, now: DateTime<FixedOffset>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Column".to_string(),
            "Pos".to_string(),
            "ID".to_string(),
            "Title".to_string(),
            "Color".to_string(),
            "Due".to_string(),
            "Remind".to_string(),
            "Tags".to_string(),
        ];

        let mut rows = Vec::new();
        for column in board.columns() {
            let mut in_column: Vec<&Task> = board
                .tasks()
                .iter()
                .filter(|task| task.category == column.name)
                .collect();
            in_column.sort_by_key(|task| task.column_index);

            for task in in_column {
                let due = task
                    .due_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let due = if task.is_past_due(now) {
                    self.paint(&due, "31")
                } else {
                    due
                };

                let remind = match task.reminder_offset {
                    ReminderOffset::None => String::new(),
                    offset => offset.label().to_string(),
                };

                let tags = task
                    .tags
                    .iter()
                    .map(|tag| format!("+{tag}"))
                    .collect::<Vec<_>>()
                    .join(" ");

                rows.push(vec![
                    column.name.clone(),
                    task.column_index.to_string(),
                    self.paint(&task.id.to_string(), "33"),
                    task.title.clone(),
                    task.color_key.label().to_string(),
                    due,
                    remind,
                    tags,
                ]);
            }
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task, summary))]
    pub fn print_task_info(&mut self, task: &Task, summary: &DateSummary) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "column    {}", task.category)?;
        writeln!(out, "position  {}", task.column_index)?;
        writeln!(out, "color     {}", task.color_key.label())?;
        writeln!(out, "tags      {}", task.tags.join(", "))?;
        writeln!(out, "reminder  {}", task.reminder_offset.label())?;

        if let Some(due) = task.due_date {
            writeln!(out, "due       {}", due.format("%Y-%m-%d"))?;
        }
        if let Some(time) = task.time_due {
            writeln!(out, "time due  {}", time.format("%H:%M %:z"))?;
        }
        if let Some(start) = task.start_date {
            writeln!(out, "started   {}", start.format("%Y-%m-%d"))?;
        }
        if let Some(finish) = task.finish_date {
            writeln!(out, "finished  {}", finish.format("%Y-%m-%d"))?;
        }
        if let Some(created) = task.date_created {
            writeln!(out, "created   {}", created.format("%Y-%m-%d %H:%M"))?;
        }

        if summary.past_due {
            writeln!(out, "status    {}", self.paint("PAST DUE", "31"))?;
        }
        if let Some(worked) = &summary.days_worked_on {
            writeln!(out, "worked    {worked}")?;
        }
        if let Some(age) = &summary.days_since_creation {
            writeln!(out, "age       {age}")?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, board))]
    pub fn print_columns(&mut self, board: &Board) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Pos".to_string(),
            "Column".to_string(),
            "Tasks".to_string(),
            "Max".to_string(),
        ];

        let rows = board
            .columns()
            .iter()
            .map(|column| {
                let count = board
                    .tasks()
                    .iter()
                    .filter(|task| task.category == column.name)
                    .count();
                vec![
                    column.position.to_string(),
                    column.name.clone(),
                    count.to_string(),
                    column.max_task_limit.to_string(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, entries))]
    pub fn print_reminders(&mut self, entries: &[ScheduledReminder]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Task".to_string(),
            "Fires".to_string(),
            "Due".to_string(),
            "Title".to_string(),
        ];

        let rows = entries
            .iter()
            .map(|entry| {
                vec![
                    self.paint(&entry.key, "33"),
                    entry.scheduled.format("%Y-%m-%d %H:%M %:z").to_string(),
                    entry.payload.due.format("%Y-%m-%d %H:%M").to_string(),
                    entry.payload.title.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
