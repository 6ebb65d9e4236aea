//! Notification collaborators: the scheduling notifier contract, the
//! in-app notice sink, and the file-backed implementations the CLI wires
//! in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::datastore::{load_jsonl, save_jsonl_atomic};
use crate::reminder::ReminderPayload;

/// Delivers (or forgets) one scheduled notification per key. The engine
/// trusts an accepted schedule to fire once at the given instant.
pub trait Notifier {
    fn schedule_at(
        &mut self,
        key: &str,
        at: DateTime<FixedOffset>,
        payload: &ReminderPayload,
    ) -> anyhow::Result<()>;

    fn cancel(&mut self, key: &str) -> anyhow::Result<()>;
}

/// In-app banner sink. Fire-and-forget; the engine never waits on it.
pub trait NotificationSink {
    fn display(&mut self, message: &str, duration_ms: u32);
}

/// Sink for the CLI: prints the notice and logs the requested duration,
/// which has no meaning for a one-shot terminal process.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn display(&mut self, message: &str, duration_ms: u32) {
        debug!(duration_ms, "displaying notice");
        println!("{message}");
    }
}

/// One row of the reminder ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub key: String,
    pub scheduled: DateTime<FixedOffset>,
    pub payload: ReminderPayload,
}

/// File-backed notifier: a JSONL ledger of pending reminders, one entry
/// per key. Scheduling upserts the key's entry; cancelling removes it.
#[derive(Debug)]
pub struct ReminderLedger {
    path: PathBuf,
}

impl ReminderLedger {
    #[instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join("reminders.data");
        if !path.exists() {
            fs::write(&path, "")
                .with_context(|| format!("failed to create {}", path.display()))?;
        }
        info!(ledger = %path.display(), "opened reminder ledger");
        Ok(Self { path })
    }

    /// Pending reminders ordered by fire time.
    pub fn entries(&self) -> anyhow::Result<Vec<ScheduledReminder>> {
        let mut entries: Vec<ScheduledReminder> =
            load_jsonl(&self.path).context("failed to load reminders.data")?;
        entries.sort_by_key(|entry| entry.scheduled);
        Ok(entries)
    }
}

impl Notifier for ReminderLedger {
    #[instrument(skip(self, payload), fields(key = key, at = %at))]
    fn schedule_at(
        &mut self,
        key: &str,
        at: DateTime<FixedOffset>,
        payload: &ReminderPayload,
    ) -> anyhow::Result<()> {
        let mut entries: Vec<ScheduledReminder> =
            load_jsonl(&self.path).context("failed to load reminders.data")?;
        entries.retain(|entry| entry.key != key);
        entries.push(ScheduledReminder {
            key: key.to_string(),
            scheduled: at,
            payload: payload.clone(),
        });
        save_jsonl_atomic(&self.path, &entries).context("failed to save reminders.data")
    }

    #[instrument(skip(self), fields(key = key))]
    fn cancel(&mut self, key: &str) -> anyhow::Result<()> {
        let mut entries: Vec<ScheduledReminder> =
            load_jsonl(&self.path).context("failed to load reminders.data")?;
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        if entries.len() != before {
            debug!(key, "removed scheduled reminder");
        }
        save_jsonl_atomic(&self.path, &entries).context("failed to save reminders.data")
    }
}
