use clap::{Parser, Subcommand};

use crate::stats::MAX_LOOKBACK_DAYS;

#[derive(Parser, Debug)]
#[command(name = "habitlog", version, about = "Track daily habits, streaks and weekly progress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Daily goal
        #[arg(long, default_value = "1")]
        value: f64,
        /// Goal unit: minutes, hours, times, liters
        #[arg(long, default_value = "times")]
        unit: String,
        /// Active days: daily, weekdays, weekends or a list like mon,wed,fri
        #[arg(long, default_value = "daily")]
        days: String,
    },
    /// List all habits
    List,
    /// Change a habit's name or goal
    Edit {
        /// Habit id, id prefix or name
        habit: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        value: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Delete a habit and all of its records
    Delete {
        /// Habit id, id prefix or name
        habit: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Log progress toward a habit
    Done {
        /// Habit id, id prefix or name
        habit: String,
        /// Amount to log (defaults to the dashboard log amount)
        #[arg(long)]
        amount: Option<f64>,
        /// Log against another day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove the last record logged for a habit on a day
    Undo {
        /// Habit id, id prefix or name
        habit: String,
        /// Day to undo on (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show habits scheduled for a day and their progress
    Today {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show streak, weekly grid and counters for a habit
    Stats {
        /// Habit id, id prefix or name
        habit: String,
        /// Days to look back over, at most 3650 (default from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_DAYS)))]
        days: Option<u32>,
    },
    /// List every record logged for a habit
    Records {
        /// Habit id, id prefix or name
        habit: String,
    },
    /// Print a summary of every habit over the last week
    Export {
        /// Dump all habits and records as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Show the config file location and values
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}
