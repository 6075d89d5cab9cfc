use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lowercase storage key for a weekday ("monday" … "sunday").
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// A set of active weekdays, one bit per day (Monday = bit 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    pub fn weekdays() -> Self {
        Self::from_days(&ALL_DAYS[..5])
    }

    pub fn weekends() -> Self {
        Self::from_days(&ALL_DAYS[5..])
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        days.iter().fold(Self::EMPTY, |set, d| set.with(*d))
    }

    pub fn with(self, day: Weekday) -> Self {
        WeekdaySet(self.0 | (1 << day.num_days_from_monday()))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL.0
    }

    /// Days in calendar order, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_DAYS.iter().copied().filter(|d| self.contains(*d))
    }

    /// "Mon Wed Fri", or "every day" for the full set
    pub fn summary(&self) -> String {
        if self.is_all() {
            return "every day".to_string();
        }
        if self.is_empty() {
            return "never".to_string();
        }
        self.iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<WeekdaySet> for Vec<String> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().map(|d| weekday_key(d).to_string()).collect()
    }
}

impl TryFrom<Vec<String>> for WeekdaySet {
    type Error = String;

    fn try_from(keys: Vec<String>) -> Result<Self, Self::Error> {
        keys.iter().try_fold(WeekdaySet::EMPTY, |set, key| {
            parse_weekday(key)
                .map(|d| set.with(d))
                .ok_or_else(|| format!("unknown weekday '{}'", key))
        })
    }
}

impl FromStr for WeekdaySet {
    type Err = anyhow::Error;

    /// Accepts "daily", "weekdays", "weekends" or a comma/space separated
    /// list of day names ("mon,wed,fri").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "all" | "every day" => return Ok(WeekdaySet::ALL),
            "weekdays" => return Ok(WeekdaySet::weekdays()),
            "weekends" => return Ok(WeekdaySet::weekends()),
            "weekly" | "monthly" => {
                return Err(anyhow::anyhow!(
                    "'{}' repeat is not supported, pick weekdays instead",
                    s.trim()
                ));
            }
            _ => {}
        }
        let mut set = WeekdaySet::EMPTY;
        for part in s.split(|c: char| c == ',' || c.is_whitespace()) {
            if part.is_empty() {
                continue;
            }
            let day = parse_weekday(part)
                .ok_or_else(|| anyhow::anyhow!("Unknown weekday: {}", part))?;
            set = set.with(day);
        }
        if set.is_empty() {
            return Err(anyhow::anyhow!("No weekdays given"));
        }
        Ok(set)
    }
}

/// How often a habit repeats. Only the weekday-set schedule exists today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frequency {
    Daily {
        #[serde(rename = "selectedDays")]
        selected_days: WeekdaySet,
    },
}

impl Frequency {
    pub fn on_days(days: WeekdaySet) -> Self {
        Frequency::Daily {
            selected_days: days,
        }
    }

    pub fn days(&self) -> WeekdaySet {
        match self {
            Frequency::Daily { selected_days } => *selected_days,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::on_days(WeekdaySet::ALL)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.days().summary())
    }
}
