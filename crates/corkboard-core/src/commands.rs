use std::collections::BTreeSet;

use anyhow::{Context, anyhow};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, instrument, warn};

use crate::board::Board;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datetime::{parse_due_date, parse_due_time};
use crate::notify::{ReminderLedger, TerminalSink};
use crate::render::Renderer;
use crate::task::{ColorKey, ReminderOffset};

pub const DEFAULT_BOARD_ID: u64 = 1;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "board",
        "list",
        "add",
        "show",
        "modify",
        "move",
        "delete",
        "tag",
        "tags",
        "columns",
        "rename-column",
        "reminders",
        "remove-reminder",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, ledger, cfg, renderer, inv))]
pub fn dispatch(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = crate::datetime::now_on_board();
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "board" | "list" => cmd_board(store, cfg, renderer, now),
        "add" => cmd_add(store, ledger, cfg, &inv.command_args, now),
        "show" => cmd_show(store, cfg, renderer, &inv.command_args, now),
        "modify" => cmd_modify(store, ledger, cfg, &inv.command_args, now),
        "move" => cmd_move(store, cfg, &inv.command_args),
        "delete" => cmd_delete(store, ledger, cfg, &inv.command_args),
        "tag" => cmd_tag(store, ledger, cfg, &inv.command_args, now),
        "tags" => cmd_tags(store, cfg),
        "columns" => cmd_columns(store, cfg, renderer),
        "rename-column" => cmd_rename_column(store, cfg, &inv.command_args),
        "reminders" => cmd_reminders(ledger, renderer),
        "remove-reminder" => cmd_remove_reminder(store, ledger, cfg, &inv.command_args, now),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn load_board(store: &mut DataStore, cfg: &Config) -> anyhow::Result<Board> {
    let columns = store.ensure_columns(
        DEFAULT_BOARD_ID,
        &cfg.default_columns(),
        cfg.default_column_max(),
    )?;
    let tasks = store.load_tasks()?;
    Ok(Board::new(DEFAULT_BOARD_ID, columns, tasks))
}

fn parse_task_id(args: &[String], usage: &str) -> anyhow::Result<u64> {
    let raw = args.first().ok_or_else(|| anyhow!("usage: {usage}"))?;
    raw.parse::<u64>()
        .with_context(|| format!("invalid task id: {raw}"))
}

#[instrument(skip(store, cfg, renderer, now))]
fn cmd_board(
    store: &mut DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command board");
    let board = load_board(store, cfg)?;
    renderer.print_board(&board, now)
}

#[instrument(skip(store, ledger, cfg, args, now))]
fn cmd_add(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command add");

    let column = args
        .first()
        .ok_or_else(|| anyhow!("usage: add <column> <title> [due:DATE time:HH:MM remind:WHEN color:KEY +tag]"))?
        .clone();
    let (title, mods) = parse_title_and_mods(&args[1..], now)?;

    let mut board = load_board(store, cfg)?;
    let mut sink = TerminalSink;

    board.new_task(&column)?;
    if let Some(task) = board.current_task_mut() {
        task.title = title;
    }
    if let Err(err) = apply_mods(&mut board, &mods, &mut sink) {
        board.cancel_edit(ledger);
        return Err(err.into());
    }

    let id = board.save_task(store, ledger, &mut sink, now)?;
    println!("Created task {id}.");
    Ok(())
}

#[instrument(skip(store, cfg, renderer, args, now))]
fn cmd_show(
    store: &mut DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command show");

    let id = parse_task_id(args, "show <id>")?;
    let board = load_board(store, cfg)?;
    let task = board
        .task(id)
        .ok_or_else(|| anyhow!("no such task: {id}"))?;
    renderer.print_task_info(task, &Board::date_summary(task, now))
}

#[instrument(skip(store, ledger, cfg, args, now))]
fn cmd_modify(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command modify");

    let id = parse_task_id(args, "modify <id> [new title] [due:DATE time:HH:MM remind:WHEN color:KEY +tag -tag]")?;
    let (title, mods) = parse_optional_title_and_mods(&args[1..], now)?;
    if title.is_none() && mods.is_empty() {
        return Err(anyhow!("modify: nothing to change"));
    }

    let mut board = load_board(store, cfg)?;
    let mut sink = TerminalSink;

    board.begin_edit(id)?;
    if let (Some(title), Some(task)) = (title, board.current_task_mut()) {
        task.title = title;
    }
    if let Err(err) = apply_mods(&mut board, &mods, &mut sink) {
        board.cancel_edit(ledger);
        return Err(err.into());
    }

    board.save_task(store, ledger, &mut sink, now)?;
    println!("Modified task {id}.");
    Ok(())
}

#[instrument(skip(store, cfg, args))]
fn cmd_move(store: &mut DataStore, cfg: &Config, args: &[String]) -> anyhow::Result<()> {
    info!("command move");

    if args.len() != 3 {
        return Err(anyhow!("usage: move <id> <column> <index>"));
    }
    let id = parse_task_id(args, "move <id> <column> <index>")?;
    let column = args[1].clone();
    let index: u32 = args[2]
        .parse()
        .with_context(|| format!("invalid column index: {}", args[2]))?;

    let mut board = load_board(store, cfg)?;
    board.move_task(id, &column, index, store)?;
    println!("Moved task {id} to {column}[{index}].");
    Ok(())
}

#[instrument(skip(store, ledger, cfg, args))]
fn cmd_delete(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command delete");

    let id = parse_task_id(args, "delete <id>")?;
    let mut board = load_board(store, cfg)?;
    let mut sink = TerminalSink;
    board.delete_task(id, store, ledger, &mut sink)?;
    Ok(())
}

#[instrument(skip(store, ledger, cfg, args, now))]
fn cmd_tag(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command tag");

    let id = parse_task_id(args, "tag <id> +tag [-tag ...]")?;
    if args.len() < 2 {
        return Err(anyhow!("usage: tag <id> +tag [-tag ...]"));
    }

    let mut board = load_board(store, cfg)?;
    let mut sink = TerminalSink;
    board.begin_edit(id)?;

    for token in &args[1..] {
        let result = if let Some(tag) = token.strip_prefix('+') {
            board.add_tag(tag, &mut sink).map(|_| ())
        } else if let Some(tag) = token.strip_prefix('-') {
            board.delete_tag(tag, &mut sink)
        } else {
            board.cancel_edit(ledger);
            return Err(anyhow!("tag tokens must start with + or -: {token}"));
        };
        if let Err(err) = result {
            board.cancel_edit(ledger);
            return Err(err.into());
        }
    }

    board.save_task(store, ledger, &mut sink, now)?;
    Ok(())
}

#[instrument(skip(store, cfg))]
fn cmd_tags(store: &mut DataStore, cfg: &Config) -> anyhow::Result<()> {
    let board = load_board(store, cfg)?;
    let vocabulary: BTreeSet<String> = board.tag_vocabulary();
    for tag in vocabulary {
        println!("{tag}");
    }
    Ok(())
}

#[instrument(skip(store, cfg, renderer))]
fn cmd_columns(
    store: &mut DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    let board = load_board(store, cfg)?;
    renderer.print_columns(&board)
}

#[instrument(skip(store, cfg, args))]
fn cmd_rename_column(store: &mut DataStore, cfg: &Config, args: &[String]) -> anyhow::Result<()> {
    info!("command rename-column");

    if args.len() < 2 || args.len() > 3 {
        return Err(anyhow!("usage: rename-column <old> <new> [max-tasks]"));
    }
    let old_name = args[0].clone();
    let new_name = args[1].clone();

    let mut board = load_board(store, cfg)?;
    let new_max = match args.get(2) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid max-tasks: {raw}"))?,
        None => board
            .column(&old_name)
            .map(|column| column.max_task_limit)
            .unwrap_or_else(|| cfg.default_column_max()),
    };

    board.edit_column(&old_name, &new_name, new_max, store)?;
    println!("Renamed column {old_name} to {new_name}.");
    Ok(())
}

#[instrument(skip(ledger, renderer))]
fn cmd_reminders(ledger: &mut ReminderLedger, renderer: &mut Renderer) -> anyhow::Result<()> {
    let entries = ledger.entries()?;
    renderer.print_reminders(&entries)
}

#[instrument(skip(store, ledger, cfg, args, now))]
fn cmd_remove_reminder(
    store: &mut DataStore,
    ledger: &mut ReminderLedger,
    cfg: &Config,
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    info!("command remove-reminder");

    let id = parse_task_id(args, "remove-reminder <id>")?;
    let mut board = load_board(store, cfg)?;
    let mut sink = TerminalSink;

    board.begin_edit(id)?;
    board.remove_reminder(ledger)?;
    board.save_task(store, ledger, &mut sink, now)?;
    println!("Removed reminder for task {id}.");
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: cork [global options] <command> [args]");
    println!();
    println!("commands:");
    println!("  board                         show the board (default)");
    println!("  add <column> <title> [mods]   create a task in a column");
    println!("  show <id>                     show one task");
    println!("  modify <id> [title] [mods]    edit a task");
    println!("  move <id> <column> <index>    move a task to a column slot");
    println!("  delete <id>                   delete a task");
    println!("  tag <id> +tag [-tag ...]      add or remove tags");
    println!("  tags                          list the tag vocabulary");
    println!("  columns                       list columns");
    println!("  rename-column <old> <new> [max-tasks]");
    println!("  reminders                     list scheduled reminders");
    println!("  remove-reminder <id>          cancel a task's reminder");
    println!();
    println!("mods: due:DATE time:HH:MM start:DATE finish:DATE remind:WHEN color:KEY +tag -tag");
    println!("  WHEN: none, at-due, 5m, 10m, 15m, 1h, 2h, 1d, 2d  KEY: low, medium, high");
    Ok(())
}

#[derive(Debug, Clone)]
enum Mod {
    TagAdd(String),
    TagRemove(String),
    Due(DateTime<FixedOffset>),
    TimeDue(DateTime<FixedOffset>),
    Start(DateTime<FixedOffset>),
    Finish(DateTime<FixedOffset>),
    Remind(ReminderOffset),
    Color(ColorKey),
}

#[instrument(skip(args, now))]
fn parse_title_and_mods(
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<(String, Vec<Mod>)> {
    let (title, mods) = parse_optional_title_and_mods(args, now)?;
    let title = title.ok_or_else(|| anyhow!("add: title is required"))?;
    Ok((title, mods))
}

#[instrument(skip(args, now))]
fn parse_optional_title_and_mods(
    args: &[String],
    now: DateTime<FixedOffset>,
) -> anyhow::Result<(Option<String>, Vec<Mod>)> {
    let mut title_parts = Vec::new();
    let mut mods = Vec::new();

    let mut literal = false;
    for arg in args {
        if arg == "--" {
            literal = true;
            continue;
        }

        if !literal
            && let Some(one_mod) = parse_one_mod(arg, now)?
        {
            mods.push(one_mod);
            continue;
        }

        title_parts.push(arg.clone());
    }

    let title = if title_parts.is_empty() {
        None
    } else {
        Some(title_parts.join(" "))
    };
    Ok((title, mods))
}

fn parse_one_mod(tok: &str, now: DateTime<FixedOffset>) -> anyhow::Result<Option<Mod>> {
    if let Some(tag) = tok.strip_prefix('+') {
        return Ok(Some(Mod::TagAdd(tag.to_string())));
    }
    if let Some(tag) = tok.strip_prefix('-') {
        return Ok(Some(Mod::TagRemove(tag.to_string())));
    }

    let Some((key, value)) = tok.split_once(':').or_else(|| tok.split_once('=')) else {
        return Ok(None);
    };

    match key.to_ascii_lowercase().as_str() {
        "due" => Ok(Some(Mod::Due(parse_due_date(value, now)?))),
        "time" => Ok(Some(Mod::TimeDue(parse_due_time(value, now)?))),
        "start" => Ok(Some(Mod::Start(parse_due_date(value, now)?))),
        "finish" => Ok(Some(Mod::Finish(parse_due_date(value, now)?))),
        "remind" | "reminder" => {
            let offset = ReminderOffset::parse(value)
                .ok_or_else(|| anyhow!("unknown reminder offset: {value}"))?;
            Ok(Some(Mod::Remind(offset)))
        }
        "color" | "colour" => {
            let color = ColorKey::parse(value)
                .ok_or_else(|| anyhow!("unknown color key: {value} (low, medium, high)"))?;
            Ok(Some(Mod::Color(color)))
        }
        _ => Ok(None),
    }
}

fn apply_mods(
    board: &mut Board,
    mods: &[Mod],
    sink: &mut TerminalSink,
) -> crate::error::BoardResult<()> {
    for one_mod in mods {
        match one_mod {
            Mod::TagAdd(tag) => {
                board.add_tag(tag, sink)?;
            }
            Mod::TagRemove(tag) => {
                board.delete_tag(tag, sink)?;
            }
            other => {
                let Some(task) = board.current_task_mut() else {
                    warn!("modifier ignored: no task is being edited");
                    continue;
                };
                match other {
                    Mod::Due(dt) => task.due_date = Some(*dt),
                    Mod::TimeDue(dt) => task.time_due = Some(*dt),
                    Mod::Start(dt) => task.start_date = Some(*dt),
                    Mod::Finish(dt) => task.finish_date = Some(*dt),
                    Mod::Remind(offset) => task.reminder_offset = *offset,
                    Mod::Color(color) => task.color_key = *color,
                    Mod::TagAdd(_) | Mod::TagRemove(_) => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names};

    #[test]
    fn abbreviations_expand_when_unambiguous() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("del", &known), Some("delete"));
        assert_eq!(expand_command_abbrev("board", &known), Some("board"));
        assert_eq!(expand_command_abbrev("mod", &known), Some("modify"));
        // "re" matches rename-column, reminders and remove-reminder
        assert_eq!(expand_command_abbrev("re", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }
}
