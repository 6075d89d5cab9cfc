use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::RequiredType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Future, before the habit existed, or not one of its weekdays
    NotApplicable,
    Completed,
    /// Logged something, but less than the goal
    Missed,
    /// Nothing logged on a scheduled day
    Skipped,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::NotApplicable => "n/a",
            DayStatus::Completed => "completed",
            DayStatus::Missed => "missed",
            DayStatus::Skipped => "skipped",
        }
    }

    pub fn is_scheduled(&self) -> bool {
        !matches!(self, DayStatus::NotApplicable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub total: f64,
    pub goal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    /// Upper-case short weekday name ("MON")
    pub label: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    pub streak: u32,
    pub success_days: u32,
    pub not_completed_days: u32,
    pub skipped_days: u32,
    /// Sum of logged values over completed days only
    pub total_value: f64,
    /// Most recent first
    pub days: Vec<DayReport>,
}

impl HabitStats {
    pub fn scheduled_days(&self) -> u32 {
        self.success_days + self.not_completed_days + self.skipped_days
    }

    pub fn completion_ratio(&self) -> f64 {
        let scheduled = self.scheduled_days();
        if scheduled == 0 {
            0.0
        } else {
            self.success_days as f64 / scheduled as f64
        }
    }
}

/// One habit's progress on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub total: f64,
    pub goal: f64,
    pub unit: RequiredType,
    pub records: usize,
    pub completed: bool,
}

impl DayProgress {
    pub fn remaining(&self) -> f64 {
        (self.goal - self.total).max(0.0)
    }
}
