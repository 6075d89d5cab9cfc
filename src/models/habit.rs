use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::db::{StoreError, StoreResult};
use crate::models::{Frequency, WeekdaySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredType {
    Minutes,
    Hours,
    #[default]
    Times,
    Liters,
}

impl RequiredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredType::Minutes => "minutes",
            RequiredType::Hours => "hours",
            RequiredType::Times => "times",
            RequiredType::Liters => "liters",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            RequiredType::Minutes => "min",
            RequiredType::Hours => "h",
            RequiredType::Times => "times",
            RequiredType::Liters => "l",
        }
    }
}

impl std::fmt::Display for RequiredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequiredType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minutes" | "minute" | "min" | "m" => Ok(RequiredType::Minutes),
            "hours" | "hour" | "h" => Ok(RequiredType::Hours),
            "times" | "time" | "x" => Ok(RequiredType::Times),
            "liters" | "liter" | "litres" | "litre" | "l" => Ok(RequiredType::Liters),
            _ => Err(anyhow::anyhow!("Unknown unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub required_value: f64,
    pub required_type: RequiredType,
    pub created_at: NaiveDateTime,
    /// A missing `frequency` deserializes as all seven days
    #[serde(default)]
    pub frequency: Frequency,
}

impl Habit {
    pub fn days(&self) -> WeekdaySet {
        self.frequency.days()
    }
}

fn check_goal(value: f64) -> StoreResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(StoreError::Invalid(format!(
            "required value must be a positive number, got {}",
            value
        )));
    }
    Ok(())
}

fn check_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Invalid("habit name cannot be empty".to_string()));
    }
    Ok(())
}

/// Everything needed to create a habit; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitDraft {
    pub name: String,
    pub required_value: f64,
    pub required_type: RequiredType,
    pub frequency: Frequency,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_value: 1.0,
            required_type: RequiredType::Times,
            frequency: Frequency::default(),
        }
    }

    pub fn goal(mut self, value: f64, unit: RequiredType) -> Self {
        self.required_value = value;
        self.required_type = unit;
        self
    }

    pub fn on_days(mut self, days: WeekdaySet) -> Self {
        self.frequency = Frequency::on_days(days);
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        check_name(&self.name)?;
        check_goal(self.required_value)?;
        if self.frequency.days().is_empty() {
            return Err(StoreError::Invalid(
                "a habit needs at least one active weekday".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_habit(self, id: String, created_at: NaiveDateTime) -> Habit {
        Habit {
            id,
            name: self.name.trim().to_string(),
            required_value: self.required_value,
            required_type: self.required_type,
            created_at,
            frequency: self.frequency,
        }
    }
}

/// Editable fields. The schedule is fixed once a habit exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub required_value: Option<f64>,
    pub required_type: Option<RequiredType>,
}

impl HabitUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.required_value.is_none() && self.required_type.is_none()
    }

    pub fn validate(&self) -> StoreResult<()> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(value) = self.required_value {
            check_goal(value)?;
        }
        Ok(())
    }

    pub fn apply(&self, habit: &mut Habit) {
        if let Some(name) = &self.name {
            habit.name = name.trim().to_string();
        }
        if let Some(value) = self.required_value {
            habit.required_value = value;
        }
        if let Some(unit) = self.required_type {
            habit.required_type = unit;
        }
    }
}
