use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::datetime::combine_due_instant;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    #[default]
    Low,
    Medium,
    High,
}

impl ColorKey {
    pub fn label(self) -> &'static str {
        match self {
            ColorKey::Low => "Low",
            ColorKey::Medium => "Medium",
            ColorKey::High => "High",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(ColorKey::Low),
            "medium" | "med" => Some(ColorKey::Medium),
            "high" => Some(ColorKey::High),
            _ => None,
        }
    }
}

/// Relative lead time between the reminder firing and the due instant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderOffset {
    #[default]
    None,
    AtDueInstant,
    FiveMinutesBefore,
    TenMinutesBefore,
    FifteenMinutesBefore,
    OneHourBefore,
    TwoHoursBefore,
    OneDayBefore,
    TwoDaysBefore,
}

impl ReminderOffset {
    pub const ALL: [ReminderOffset; 9] = [
        ReminderOffset::None,
        ReminderOffset::AtDueInstant,
        ReminderOffset::FiveMinutesBefore,
        ReminderOffset::TenMinutesBefore,
        ReminderOffset::FifteenMinutesBefore,
        ReminderOffset::OneHourBefore,
        ReminderOffset::TwoHoursBefore,
        ReminderOffset::OneDayBefore,
        ReminderOffset::TwoDaysBefore,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReminderOffset::None => "None",
            ReminderOffset::AtDueInstant => "At Time of Due Date",
            ReminderOffset::FiveMinutesBefore => "5 Minutes Before",
            ReminderOffset::TenMinutesBefore => "10 Minutes Before",
            ReminderOffset::FifteenMinutesBefore => "15 Minutes Before",
            ReminderOffset::OneHourBefore => "1 Hour Before",
            ReminderOffset::TwoHoursBefore => "2 Hours Before",
            ReminderOffset::OneDayBefore => "1 Day Before",
            ReminderOffset::TwoDaysBefore => "2 Days Before",
        }
    }

    /// Lead duration to subtract from the due instant. `None` for the
    /// no-reminder variant, which has no instant to compute.
    pub fn lead(self) -> Option<chrono::Duration> {
        match self {
            ReminderOffset::None => None,
            ReminderOffset::AtDueInstant => Some(chrono::Duration::zero()),
            ReminderOffset::FiveMinutesBefore => Some(chrono::Duration::minutes(5)),
            ReminderOffset::TenMinutesBefore => Some(chrono::Duration::minutes(10)),
            ReminderOffset::FifteenMinutesBefore => Some(chrono::Duration::minutes(15)),
            ReminderOffset::OneHourBefore => Some(chrono::Duration::hours(1)),
            ReminderOffset::TwoHoursBefore => Some(chrono::Duration::hours(2)),
            ReminderOffset::OneDayBefore => Some(chrono::Duration::days(1)),
            ReminderOffset::TwoDaysBefore => Some(chrono::Duration::days(2)),
        }
    }

    /// Accepts the display label ("1 Day Before") or a compact token
    /// ("1d", "at-due", "none"), case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().to_ascii_lowercase();
        let compact = match token.as_str() {
            "none" | "off" => Some(ReminderOffset::None),
            "at-due" | "at-due-instant" | "due" => Some(ReminderOffset::AtDueInstant),
            "5m" => Some(ReminderOffset::FiveMinutesBefore),
            "10m" => Some(ReminderOffset::TenMinutesBefore),
            "15m" => Some(ReminderOffset::FifteenMinutesBefore),
            "1h" => Some(ReminderOffset::OneHourBefore),
            "2h" => Some(ReminderOffset::TwoHoursBefore),
            "1d" => Some(ReminderOffset::OneDayBefore),
            "2d" => Some(ReminderOffset::TwoDaysBefore),
            _ => None,
        };
        if compact.is_some() {
            return compact;
        }

        Self::ALL
            .into_iter()
            .find(|offset| offset.label().eq_ignore_ascii_case(token.as_str()))
    }
}

/// A card on the board. `id` 0 means the task has not been persisted yet;
/// the repository assigns the real id on first save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub title: String,

    /// Column name this task lives in.
    pub category: String,

    /// 0-based position within the category. Contiguous per category after
    /// every completed mutation.
    #[serde(default)]
    pub column_index: u32,

    #[serde(default)]
    pub color_key: ColorKey,

    /// Unique, insertion-ordered.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub due_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub time_due: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub start_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub finish_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub date_created: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub reminder_offset: ReminderOffset,
}

impl Task {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: String::new(),
            category: category.into(),
            column_index: 0,
            color_key: ColorKey::default(),
            tags: Vec::new(),
            due_date: None,
            time_due: None,
            start_date: None,
            finish_date: None,
            date_created: None,
            reminder_offset: ReminderOffset::default(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// True when both due date and time are set and the combined due
    /// instant is already behind `now`.
    pub fn is_past_due(&self, now: DateTime<FixedOffset>) -> bool {
        combine_due_instant(self.due_date.as_ref(), self.time_due.as_ref())
            .map(|due| due < now)
            .unwrap_or(false)
    }

    /// Whole days since the start date, e.g. "3 day(s)".
    pub fn days_worked_on(&self, now: DateTime<FixedOffset>) -> Option<String> {
        let start = self.start_date?;
        let span = now.signed_duration_since(start);
        Some(format!("{} day(s)", span.num_days()))
    }

    /// Age since creation, e.g. "3d, 4hrs, 12min".
    pub fn days_since_creation(&self, now: DateTime<FixedOffset>) -> Option<String> {
        let created = self.date_created?;
        let span = now.signed_duration_since(created);
        let days = span.num_days();
        let hours = span.num_hours() - days * 24;
        let minutes = span.num_minutes() - span.num_hours() * 60;
        Some(format!("{days}d, {hours}hrs, {minutes}min"))
    }

    /// Adds a tag if not already present; returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|existing| existing == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|existing| existing != tag);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::{ColorKey, ReminderOffset, Task};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("valid offset")
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn defaults_are_low_and_no_reminder() {
        let task = Task::new("Backlog");
        assert_eq!(task.id, 0);
        assert!(!task.is_persisted());
        assert_eq!(task.color_key, ColorKey::Low);
        assert_eq!(task.reminder_offset, ReminderOffset::None);
    }

    #[test]
    fn parses_offset_labels_and_compact_tokens() {
        assert_eq!(
            ReminderOffset::parse("1 Day Before"),
            Some(ReminderOffset::OneDayBefore)
        );
        assert_eq!(
            ReminderOffset::parse("1d"),
            Some(ReminderOffset::OneDayBefore)
        );
        assert_eq!(
            ReminderOffset::parse("at time of due date"),
            Some(ReminderOffset::AtDueInstant)
        );
        assert_eq!(ReminderOffset::parse("fortnight"), None);
    }

    #[test]
    fn past_due_needs_both_date_and_time() {
        let now = at(2024, 3, 10, 12, 0);
        let mut task = Task::new("To Do");
        assert!(!task.is_past_due(now));

        task.due_date = Some(at(2024, 3, 10, 0, 0));
        assert!(!task.is_past_due(now));

        task.time_due = Some(at(2024, 3, 10, 9, 0));
        assert!(task.is_past_due(now));

        task.time_due = Some(at(2024, 3, 10, 15, 0));
        assert!(!task.is_past_due(now));
    }

    #[test]
    fn tags_stay_unique() {
        let mut task = Task::new("To Do");
        assert!(task.add_tag("core"));
        assert!(!task.add_tag("core"));
        assert_eq!(task.tags, vec!["core".to_string()]);

        task.remove_tag("core");
        assert!(task.tags.is_empty());
    }

    #[test]
    fn creation_age_formats_days_hours_minutes() {
        let mut task = Task::new("To Do");
        task.date_created = Some(at(2024, 3, 7, 8, 30));
        let now = at(2024, 3, 10, 12, 42);
        assert_eq!(
            task.days_since_creation(now).expect("created is set"),
            "3d, 4hrs, 12min"
        );
    }
}
