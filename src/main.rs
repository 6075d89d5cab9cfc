mod cli;
mod config;
mod db;
mod models;
mod stats;
mod tui;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::SqliteStore;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let store = SqliteStore::open(&db_path, config.store.options())
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    match cli.command {
        Some(Commands::Add {
            name,
            value,
            unit,
            days,
        }) => handlers::handle_add(&store, &name, value, &unit, &days)?,
        Some(Commands::List) => handlers::handle_list(&store)?,
        Some(Commands::Edit {
            habit,
            name,
            value,
            unit,
        }) => handlers::handle_edit(&store, &habit, name, value, unit.as_deref())?,
        Some(Commands::Delete { habit, yes }) => handlers::handle_delete(&store, &habit, yes)?,
        Some(Commands::Done {
            habit,
            amount,
            date,
        }) => handlers::handle_done(&store, &config, &habit, amount, date.as_deref())?,
        Some(Commands::Undo { habit, date }) => {
            handlers::handle_undo(&store, &habit, date.as_deref())?
        }
        Some(Commands::Today { date }) => handlers::handle_today(&store, date.as_deref())?,
        Some(Commands::Stats { habit, days }) => {
            handlers::handle_stats(&store, &config, &habit, days)?
        }
        Some(Commands::Records { habit }) => handlers::handle_records(&store, &habit)?,
        Some(Commands::Export { json }) => handlers::handle_export(&store, &config, json)?,
        Some(Commands::Config { init }) => handlers::handle_config(&config, init)?,

        // No subcommand → dashboard
        None => tui::app::run(store, config)?,
    }

    Ok(())
}
