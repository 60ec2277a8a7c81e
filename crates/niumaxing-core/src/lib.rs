//! # Niumaxing Core Library
//!
//! Core logic for the Niumaxing daily check-in game: everyone feeds grass to
//! a shared warrior who evolves as the global total grows, while each user
//! keeps a personal history capped by a daily quota.
//!
//! ## Architecture
//!
//! - **Progression**: pure mapping from the global total to one of five stages
//! - **Check-in**: quota-enforcing feed state machine with a critical roll
//! - **Storage**: SQLite-backed local store, optional HTTP shared store, and a
//!   best-effort persistence adapter over both; TOML configuration
//! - **Session**: the single owned state cell a front end drives
//!
//! ## Key Components
//!
//! - [`Stage`]: Evolution tiers and thresholds
//! - [`apply_feed`]: One feed action against both records
//! - [`Persistence`]: Global/user record read-write contract
//! - [`Session`]: In-memory state with poll and feed operations
//! - [`Config`]: Application configuration management

pub mod checkin;
pub mod countdown;
pub mod error;
pub mod heatmap;
pub mod model;
pub mod progression;
pub mod session;
pub mod storage;

pub use checkin::{apply_feed, CheckinState, FeedOutcome, FeedReceipt, FeedRules};
pub use countdown::Countdown;
pub use error::{ConfigError, CoreError, StoreError};
pub use heatmap::{heatmap, HeatLevel, HeatmapCell, HeatmapSummary, HeatmapWeek};
pub use model::{GlobalState, UserStats, BOSS_MAX_HP};
pub use progression::{progress_percent, Evolution, Stage};
pub use session::{EvolutionNotice, Session, SessionSettings, StatusView};
pub use storage::{
    Config, HttpSharedStore, Keys, LocalStore, MemoryStore, Persistence, SharedStore, SqliteStore,
};
