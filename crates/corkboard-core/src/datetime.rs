use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  FixedOffset,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  TimeZone,
  Timelike,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

use crate::task::ReminderOffset;

const TIMEZONE_CONFIG_FILE: &str =
  "corkboard-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "CORKBOARD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "CORKBOARD_TIME_CONFIG";
const DEFAULT_BOARD_TIMEZONE: &str =
  "UTC";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Timezone used to interpret dates
/// and clock times typed by the user.
pub fn board_timezone() -> &'static Tz
{
  static BOARD_TZ: OnceLock<Tz> =
    OnceLock::new();
  BOARD_TZ
    .get_or_init(resolve_board_timezone)
}

#[must_use]
pub fn now_on_board()
-> DateTime<FixedOffset> {
  Utc::now()
    .with_timezone(board_timezone())
    .fixed_offset()
}

/// Composes the absolute due instant
/// from the due date's calendar date
/// and the due time's time-of-day.
/// The UTC offset comes from the time
/// value. `None` when either half is
/// missing.
#[must_use]
pub fn combine_due_instant(
  due_date: Option<
    &DateTime<FixedOffset>
  >,
  time_due: Option<
    &DateTime<FixedOffset>
  >
) -> Option<DateTime<FixedOffset>> {
  let date = due_date?;
  let time = time_due?;

  time
    .offset()
    .with_ymd_and_hms(
      date.year(),
      date.month(),
      date.day(),
      time.hour(),
      time.minute(),
      time.second()
    )
    .single()
}

/// Maps (due date, due time, offset)
/// to the absolute instant the
/// reminder should fire. `None` when
/// the offset is the no-reminder
/// variant or when the due instant
/// cannot be composed. Pure; no clock
/// access.
#[must_use]
pub fn resolve_reminder_instant(
  due_date: Option<
    &DateTime<FixedOffset>
  >,
  time_due: Option<
    &DateTime<FixedOffset>
  >,
  offset: ReminderOffset
) -> Option<DateTime<FixedOffset>> {
  let lead = offset.lead()?;
  let due = combine_due_instant(
    due_date, time_due
  )?;
  due.checked_sub_signed(lead)
}

fn resolve_board_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
  {
    if let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    ) {
      return tz;
    }
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_BOARD_TIMEZONE,
    "DEFAULT_BOARD_TIMEZONE"
  )
  .unwrap_or_else(|| {
    tracing::error!(
      "failed to parse fallback \
       timezone; using UTC"
    );
    chrono_tz::UTC
  })
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured board timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn fixed_from_board_local(
  local_naive: NaiveDateTime,
  context: &str
) -> anyhow::Result<DateTime<FixedOffset>>
{
  match board_timezone()
    .from_local_datetime(&local_naive)
  {
    | LocalResult::Single(local_dt) => {
      Ok(local_dt.fixed_offset())
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        context,
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      let chosen = if first <= second {
        first
      } else {
        second
      };
      Ok(chosen.fixed_offset())
    }
    | LocalResult::None => {
      Err(anyhow!(
        "local datetime does not \
         exist in configured \
         timezone: {context}"
      ))
    }
  }
}

/// Parses a user-typed
/// due/start/finish date (`today`,
/// `tomorrow`, or `YYYY-MM-DD`) as
/// midnight in the board timezone.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_due_date(
  input: &str,
  now: DateTime<FixedOffset>
) -> anyhow::Result<DateTime<FixedOffset>>
{
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  let local_now =
    now.with_timezone(board_timezone());
  let date = match lower.as_str() {
    | "today" => local_now.date_naive(),
    | "tomorrow" => {
      local_now.date_naive()
        + Duration::days(1)
    }
    | _ => {
      NaiveDate::parse_from_str(
        token, "%Y-%m-%d"
      )
      .with_context(|| {
        format!(
          "unrecognized date: {input} \
           (expected YYYY-MM-DD)"
        )
      })?
    }
  };

  let midnight = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| {
      anyhow!(
        "failed to construct \
         midnight for {input}"
      )
    })?;
  fixed_from_board_local(
    midnight, "due-date"
  )
}

/// Parses a user-typed clock time
/// (`9:00`, `15:23`, `3:23pm`)
/// anchored to today's date in the
/// board timezone. Only the
/// time-of-day and offset are
/// significant downstream.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_due_time(
  input: &str,
  now: DateTime<FixedOffset>
) -> anyhow::Result<DateTime<FixedOffset>>
{
  let (hour, minute) =
    parse_clock_time(input)
      .ok_or_else(|| {
        anyhow!(
          "unrecognized time: {input} \
           (expected HH:MM or \
           H:MMam/pm)"
        )
      })?;

  let local_now =
    now.with_timezone(board_timezone());
  let candidate = local_now
    .date_naive()
    .and_hms_opt(hour, minute, 0)
    .ok_or_else(|| {
      anyhow!(
        "failed to construct clock \
         time for {input}"
      )
    })?;
  fixed_from_board_local(
    candidate, "due-time"
  )
}

fn parse_clock_time(
  token: &str
) -> Option<(u32, u32)> {
  let clock_re = Regex::new(
    r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$",
  )
  .ok()?;
  let captures =
    clock_re.captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  if minute > 59 {
    return None;
  }

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    let ampm = ampm_match
      .as_str()
      .to_ascii_lowercase();
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    match ampm.as_str() {
      | "am" => {
        if raw_hour == 12 {
          0
        } else {
          raw_hour
        }
      }
      | "pm" => {
        if raw_hour == 12 {
          12
        } else {
          raw_hour + 12
        }
      }
      | _ => return None
    }
  } else {
    if raw_hour > 23 {
      return None;
    }
    raw_hour
  };

  Some((hour, minute))
}
