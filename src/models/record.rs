use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Habit, RequiredType};
use crate::utils::time::{days_before, end_of_day, start_of_day};

/// One logged unit of progress against a habit.
///
/// The goal is copied from the habit when the record is written, so editing
/// a habit later never changes how past days are judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub habit_id: String,
    pub required_value: f64,
    pub required_type: RequiredType,
    pub actual_value: f64,
    pub completed_at: NaiveDateTime,
}

impl CompletionRecord {
    pub fn for_habit(habit: &Habit, actual_value: f64, completed_at: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            habit_id: habit.id.clone(),
            required_value: habit.required_value,
            required_type: habit.required_type,
            actual_value,
            completed_at,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.completed_at.date()
    }
}

/// Inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// `today` and the `days - 1` days before it. Zero days is treated as one.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        Self {
            start: days_before(today, u64::from(days.max(1)) - 1),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn first_instant(&self) -> NaiveDateTime {
        start_of_day(self.start)
    }

    pub fn last_instant(&self) -> NaiveDateTime {
        end_of_day(self.end)
    }
}
