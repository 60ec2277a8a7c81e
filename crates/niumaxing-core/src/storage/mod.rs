mod config;
pub mod identity;
pub mod local;
pub mod persistence;
pub mod shared;

pub use config::{
    Config, EventConfig, HeatmapConfig, RulesConfig, SharedStoreConfig, TimingConfig,
    MAX_EVOLUTION_DISPLAY_SECS,
};
pub use identity::generate_user_id;
pub use local::{LocalStore, MemoryStore, SqliteStore};
pub use persistence::{Keys, Persistence};
pub use shared::{HttpSharedStore, SharedStore};

use std::path::PathBuf;

/// Returns the data directory holding `config.toml` and `niumaxing.db`.
///
/// `NIUMAXING_DATA_DIR` overrides the location outright. Otherwise
/// `~/.config/niumaxing[-dev]/` is used, with `NIUMAXING_ENV=dev` selecting
/// the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("NIUMAXING_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("NIUMAXING_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("niumaxing-dev")
            } else {
                base_dir.join("niumaxing")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
