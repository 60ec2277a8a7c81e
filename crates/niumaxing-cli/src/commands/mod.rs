pub mod config;
pub mod countdown;
pub mod feed;
pub mod heatmap;
pub mod status;
pub mod story;
pub mod watch;
pub mod whoami;

use chrono::Local;
use niumaxing_core::error::Result;
use niumaxing_core::{Config, Persistence, Session, SessionSettings, SqliteStore};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config and open a session over the on-disk stores.
pub fn open_session() -> Result<(Config, Session<SqliteStore>)> {
    let config = Config::load()?;
    let persistence = Persistence::open(&config)?;
    let session = Session::open(persistence, SessionSettings::from(&config), Local::now());
    Ok((config, session))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
