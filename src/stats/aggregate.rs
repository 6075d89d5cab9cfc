use chrono::{Days, NaiveDate};

use crate::models::{
    CompletionRecord, DayProgress, DayReport, DayStatus, Habit, HabitStats, RequiredType,
    WeekDay,
};
use crate::stats::frequency::is_scheduled;
use crate::utils::time::days_before;

/// Length of the weekly completion grid
pub const WEEK_DAYS: u32 = 7;

/// Longest window statistics are computed over (about ten years)
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

fn records_on<'a>(
    habit: &'a Habit,
    records: &'a [CompletionRecord],
    date: NaiveDate,
) -> impl Iterator<Item = &'a CompletionRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.habit_id == habit.id && r.date() == date)
}

/// Sum of everything logged for the habit on `date`.
pub fn day_total(habit: &Habit, records: &[CompletionRecord], date: NaiveDate) -> f64 {
    records_on(habit, records, date).map(|r| r.actual_value).sum()
}

/// The goal in effect on `date`: whatever the latest record of that day
/// carried, or the habit's current goal when nothing was logged.
pub fn day_goal(habit: &Habit, records: &[CompletionRecord], date: NaiveDate) -> (f64, RequiredType) {
    records_on(habit, records, date)
        .max_by_key(|r| r.completed_at)
        .map(|r| (r.required_value, r.required_type))
        .unwrap_or((habit.required_value, habit.required_type))
}

fn met_goal(habit: &Habit, records: &[CompletionRecord], date: NaiveDate) -> (bool, usize, f64) {
    let count = records_on(habit, records, date).count();
    let total = day_total(habit, records, date);
    let (goal, _) = day_goal(habit, records, date);
    (count > 0 && total >= goal, count, total)
}

pub fn classify_day(
    habit: &Habit,
    records: &[CompletionRecord],
    date: NaiveDate,
    today: NaiveDate,
) -> DayStatus {
    if date > today || !is_scheduled(habit, date) {
        return DayStatus::NotApplicable;
    }
    match met_goal(habit, records, date) {
        (true, _, _) => DayStatus::Completed,
        (false, 0, _) => DayStatus::Skipped,
        (false, _, _) => DayStatus::Missed,
    }
}

/// Reduce the trailing `lookback_days` (today included) into counters and a
/// streak.
///
/// The streak counts completed scheduled days walking back from today.
/// Days outside the weekday schedule neither break nor extend it; the first
/// scheduled day that was not completed ends it, as does the creation date.
pub fn compute_stats(
    habit: &Habit,
    records: &[CompletionRecord],
    today: NaiveDate,
    lookback_days: u32,
) -> HabitStats {
    let created = habit.created_at.date();
    let mut stats = HabitStats::default();
    let mut streak_open = true;

    for offset in 0..u64::from(lookback_days.min(MAX_LOOKBACK_DAYS)) {
        let Some(date) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        let status = classify_day(habit, records, date, today);
        let total = day_total(habit, records, date);
        let (goal, _) = day_goal(habit, records, date);

        match status {
            DayStatus::Completed => {
                stats.success_days += 1;
                stats.total_value += total;
                if streak_open {
                    stats.streak += 1;
                }
            }
            DayStatus::Missed => {
                stats.not_completed_days += 1;
                streak_open = false;
            }
            DayStatus::Skipped => {
                stats.skipped_days += 1;
                streak_open = false;
            }
            DayStatus::NotApplicable => {
                if date < created {
                    streak_open = false;
                }
            }
        }

        stats.days.push(DayReport {
            date,
            status,
            total,
            goal,
        });
    }

    stats
}

/// Raw completion for today and the six days before it, oldest first. The
/// schedule is ignored here: a logged day shows as done either way.
pub fn weekly_grid(habit: &Habit, records: &[CompletionRecord], today: NaiveDate) -> Vec<WeekDay> {
    (0..u64::from(WEEK_DAYS))
        .rev()
        .map(|offset| {
            let date = days_before(today, offset);
            let (completed, _, _) = met_goal(habit, records, date);
            WeekDay {
                date,
                label: date.format("%a").to_string().to_uppercase(),
                completed,
            }
        })
        .collect()
}

pub fn day_progress(habit: &Habit, records: &[CompletionRecord], date: NaiveDate) -> DayProgress {
    let (completed, count, total) = met_goal(habit, records, date);
    let (goal, unit) = day_goal(habit, records, date);
    DayProgress {
        date,
        total,
        goal,
        unit,
        records: count,
        completed,
    }
}
