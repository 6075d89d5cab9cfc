use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::config::AppConfig;
use crate::db::{HabitStore, RecordStore, SqliteStore};
use crate::models::{
    CompletionRecord, DateRange, Habit, HabitDraft, HabitUpdate, RequiredType,
    WeekdaySet,
};
use crate::stats;
use crate::utils::format::{format_value, progress_bar, progress_text};
use crate::utils::time;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const TEAL: &str = "\x1b[38;2;64;170;160m";

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Find a habit by exact id, then unique id prefix, then name (any case).
pub fn resolve_habit(habits: &[Habit], query: &str) -> Result<Option<Habit>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }
    if let Some(h) = habits.iter().find(|h| h.id == query) {
        return Ok(Some(h.clone()));
    }

    let by_prefix: Vec<&Habit> = habits.iter().filter(|h| h.id.starts_with(query)).collect();
    match by_prefix.len() {
        0 => {}
        1 => return Ok(Some(by_prefix[0].clone())),
        n => bail!("'{}' matches {} habits, use a longer id prefix", query, n),
    }

    let lowered = query.to_lowercase();
    let by_name: Vec<&Habit> = habits
        .iter()
        .filter(|h| h.name.to_lowercase() == lowered)
        .collect();
    match by_name.len() {
        0 => Ok(None),
        1 => Ok(Some(by_name[0].clone())),
        n => bail!("{} habits are named '{}', use the id instead", n, query),
    }
}

fn require_habit<S: HabitStore>(store: &S, query: &str) -> Result<Habit> {
    let habits = store.list_habits()?;
    resolve_habit(&habits, query)?.ok_or_else(|| anyhow!("Habit '{}' not found", query))
}

/// Parse an optional YYYY-MM-DD argument, defaulting to today. Future days
/// are refused.
pub fn parse_day_arg(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let date = match arg {
        None => return Ok(today),
        Some(s) => time::parse_date(s)
            .ok_or_else(|| anyhow!("Bad date '{}', expected YYYY-MM-DD", s))?,
    };
    if date > today {
        bail!("{} is in the future", date);
    }
    Ok(date)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

// ─── Habit management ────────────────────────────────────────────────────────

pub fn handle_add<S: HabitStore>(
    store: &S,
    name: &str,
    value: f64,
    unit: &str,
    days: &str,
) -> Result<()> {
    let unit = RequiredType::from_str(unit)?;
    let days = WeekdaySet::from_str(days)?;
    let habit = store.create_habit(HabitDraft::new(name).goal(value, unit).on_days(days))?;

    println_colored!(
        GREEN,
        "  ✓ Added {} — {} {} on {}  [{}]",
        habit.name,
        format_value(habit.required_value),
        habit.required_type,
        habit.frequency,
        short_id(&habit.id)
    );
    Ok(())
}

pub fn handle_list<S: HabitStore>(store: &S) -> Result<()> {
    let habits = store.list_habits()?;
    println!();
    if habits.is_empty() {
        println_colored!(DIM, "  No habits yet. Add one with `habitlog add <name>`");
        println!();
        return Ok(());
    }

    println_colored!(TEAL, "  Habits");
    println!();
    for habit in &habits {
        println!(
            "  {}  {:<24}  {:>6} {:<8}  {}",
            short_id(&habit.id),
            habit.name,
            format_value(habit.required_value),
            habit.required_type.as_str(),
            habit.frequency
        );
    }
    println!();
    Ok(())
}

pub fn handle_edit<S: HabitStore>(
    store: &S,
    query: &str,
    name: Option<String>,
    value: Option<f64>,
    unit: Option<&str>,
) -> Result<()> {
    let habit = require_habit(store, query)?;
    let update = HabitUpdate {
        name,
        required_value: value,
        required_type: unit.map(RequiredType::from_str).transpose()?,
    };
    if update.is_empty() {
        println_colored!(DIM, "  Nothing to change (use --name, --value or --unit)");
        return Ok(());
    }

    let updated = store.update_habit(&habit.id, &update)?;
    println_colored!(
        GREEN,
        "  ✓ {} — goal {} {}",
        updated.name,
        format_value(updated.required_value),
        updated.required_type
    );
    Ok(())
}

pub fn handle_delete<S: HabitStore>(store: &S, query: &str, yes: bool) -> Result<()> {
    let habit = require_habit(store, query)?;
    if !yes {
        let answer = prompt(&format!(
            "  Delete '{}' and all of its records? [y/N] ",
            habit.name
        ))?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println_colored!(DIM, "  Cancelled");
            return Ok(());
        }
    }

    let removed = store.delete_habit(&habit.id)?;
    println_colored!(RED, "  ✗ Deleted {}", removed.name);
    Ok(())
}

// ─── Logging progress ────────────────────────────────────────────────────────

pub fn handle_done<S: HabitStore + RecordStore>(
    store: &S,
    config: &AppConfig,
    query: &str,
    amount: Option<f64>,
    date: Option<&str>,
) -> Result<()> {
    let habit = require_habit(store, query)?;
    let today = time::today();
    let day = parse_day_arg(date, today)?;
    let completed_at = if day == today {
        time::now()
    } else {
        time::timestamp_on(day)
    };

    if day < habit.created_at.date() {
        println_colored!(
            AMBER,
            "  Note: {} is before {} was created, it will not count toward statistics",
            day,
            habit.name
        );
    }

    let amount = amount.unwrap_or(config.dashboard.log_amount);
    store.create_record(CompletionRecord::for_habit(&habit, amount, completed_at))?;

    let records = store.list_by_habit_ids(&[habit.id.as_str()], DateRange::day(day))?;
    let progress = stats::day_progress(&habit, &records, day);
    let text = progress_text(progress.total, progress.goal, progress.unit);
    if progress.completed {
        println_colored!(GREEN, "  ✓ {} — {} (complete!)", habit.name, text);
    } else {
        println_colored!(AMBER, "  ◑ {} — {}", habit.name, text);
    }
    Ok(())
}

pub fn handle_undo<S: HabitStore + RecordStore>(
    store: &S,
    query: &str,
    date: Option<&str>,
) -> Result<()> {
    let habit = require_habit(store, query)?;
    let day = parse_day_arg(date, time::today())?;

    match store.undo_last(&habit.id, day)? {
        Some(record) => println_colored!(
            AMBER,
            "  ↶ Removed {} {} from {} on {}",
            format_value(record.actual_value),
            record.required_type.short_label(),
            habit.name,
            day
        ),
        None => println_colored!(DIM, "  Nothing logged for {} on {}", habit.name, day),
    }
    Ok(())
}

// ─── Views ───────────────────────────────────────────────────────────────────

pub fn handle_today<S: HabitStore + RecordStore>(store: &S, date: Option<&str>) -> Result<()> {
    let day = parse_day_arg(date, time::today())?;
    let habits = store.list_habits()?;
    let scheduled = stats::scheduled_habits(&habits, day);

    println!();
    println_colored!(TEAL, "  {}", day.format("%A, %b %d, %Y"));
    println!();

    if scheduled.is_empty() {
        println_colored!(DIM, "  Nothing scheduled");
        println!();
        return Ok(());
    }

    let ids: Vec<&str> = scheduled.iter().map(|h| h.id.as_str()).collect();
    let records = store.list_by_habit_ids(&ids, DateRange::day(day))?;

    let mut done = 0;
    for habit in &scheduled {
        let progress = stats::day_progress(habit, &records, day);
        let text = progress_text(progress.total, progress.goal, progress.unit);
        if progress.completed {
            done += 1;
            println_colored!(GREEN, "  ● {:<24}  {}", habit.name, text);
        } else if progress.records > 0 {
            println_colored!(
                AMBER,
                "  ◑ {:<24}  {}  ({} to go)",
                habit.name,
                text,
                format_value(progress.remaining())
            );
        } else {
            println!("  ○ {:<24}  {}", habit.name, text);
        }
    }
    println!();
    println_colored!(DIM, "  {}/{} done", done, scheduled.len());
    println!();
    Ok(())
}

pub fn handle_stats<S: HabitStore + RecordStore>(
    store: &S,
    config: &AppConfig,
    query: &str,
    days: Option<u32>,
) -> Result<()> {
    let habits = store.list_habits()?;
    let Some(habit) = resolve_habit(&habits, query)? else {
        println_colored!(DIM, "  Habit '{}' not found — no data", query);
        return Ok(());
    };

    let today = time::today();
    let lookback = days.unwrap_or(config.stats.lookback_days).max(1);
    let window = DateRange::trailing(today, lookback.max(stats::WEEK_DAYS));
    let records = store.list_by_habit_ids(&[habit.id.as_str()], window)?;

    let summary = stats::compute_stats(&habit, &records, today, lookback);
    let week = stats::weekly_grid(&habit, &records, today);

    println!();
    println_colored!(TEAL, "  {}", habit.name);
    println_colored!(
        DIM,
        "  {} {} · {}",
        format_value(habit.required_value),
        habit.required_type,
        habit.frequency
    );
    println!();
    println_colored!(
        BOLD,
        "  Streak:  {}  {} days",
        progress_bar(summary.streak as f64, lookback as f64, 12),
        summary.streak
    );
    println!();

    print!("  ");
    for day in &week {
        print!("{:<5}", day.label);
    }
    println!();
    print!("  ");
    for day in &week {
        if day.completed {
            print!("{}●\x1b[0m    ", GREEN);
        } else {
            print!("{}○\x1b[0m    ", DIM);
        }
    }
    println!();
    println!();

    println_colored!(DIM, "  Last {} days", lookback);
    println_colored!(GREEN, "  Success:        {} days", summary.success_days);
    println_colored!(RED, "  Not completed:  {} days", summary.not_completed_days);
    println_colored!(AMBER, "  Skipped:        {} days", summary.skipped_days);
    println!(
        "  Total:          {} {}",
        format_value(summary.total_value),
        habit.required_type
    );
    println!();
    Ok(())
}

pub fn handle_records<S: HabitStore + RecordStore>(store: &S, query: &str) -> Result<()> {
    let habits = store.list_habits()?;
    let Some(habit) = resolve_habit(&habits, query)? else {
        println_colored!(DIM, "  Habit '{}' not found — no data", query);
        return Ok(());
    };

    let records = store.list_by_habit_id(&habit.id)?;
    println!();
    println_colored!(TEAL, "  {} — {} records", habit.name, records.len());
    println!();
    for record in &records {
        println!(
            "  {}  {:>6} / {} {}",
            record.completed_at.format("%Y-%m-%d %H:%M"),
            format_value(record.actual_value),
            format_value(record.required_value),
            record.required_type.short_label()
        );
    }
    if !records.is_empty() {
        println!();
    }
    Ok(())
}

// ─── Export & config ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ExportDump<'a> {
    habits: &'a [Habit],
    records: &'a [CompletionRecord],
}

pub fn handle_export(store: &SqliteStore, config: &AppConfig, json: bool) -> Result<()> {
    let habits = store.list_habits()?;

    if json {
        let records = store.list_all_records()?;
        let dump = ExportDump {
            habits: &habits,
            records: &records,
        };
        println!("{}", serde_json::to_string_pretty(&dump).context("Serializing export")?);
        return Ok(());
    }

    let today = time::today();
    let lookback = config.stats.lookback_days;
    let ids: Vec<&str> = habits.iter().map(|h| h.id.as_str()).collect();
    let window = DateRange::trailing(today, lookback.max(stats::WEEK_DAYS));
    let records = store.list_by_habit_ids(&ids, window)?;

    println!("# habitlog — Weekly Summary");
    println!("# {}", today);
    println!();
    for habit in &habits {
        let summary = stats::compute_stats(habit, &records, today, lookback);
        let week = stats::weekly_grid(habit, &records, today);

        println!(
            "## {} ({} {}, {})",
            habit.name,
            format_value(habit.required_value),
            habit.required_type,
            habit.frequency
        );
        let dots: Vec<&str> = week
            .iter()
            .map(|d| if d.completed { "█" } else { "░" })
            .collect();
        println!("  Last 7 days:  {}", dots.join(""));
        println!("  Streak:       {} days", summary.streak);
        println!(
            "  Last {} days: {} done, {} short, {} skipped",
            lookback, summary.success_days, summary.not_completed_days, summary.skipped_days
        );
        println!();
    }
    Ok(())
}

pub fn handle_config(config: &AppConfig, init: bool) -> Result<()> {
    let path = AppConfig::config_path()?;
    if init {
        if path.exists() {
            println_colored!(AMBER, "  Config already exists at {}", path.display());
        } else {
            config.save_to(&path)?;
            println_colored!(GREEN, "  ✓ Wrote {}", path.display());
        }
        return Ok(());
    }

    println_colored!(DIM, "  # {}", path.display());
    print!("{}", toml::to_string_pretty(config).context("Serializing config")?);
    println_colored!(DIM, "  # database: {}", AppConfig::db_path()?.display());
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    Ok(buf.trim_end_matches('\n').trim_end_matches('\r').to_string())
}
