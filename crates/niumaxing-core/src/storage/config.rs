//! TOML-based application configuration.
//!
//! Stores:
//! - Feed rules (daily quota, critical chance and increments)
//! - Poll and tick intervals
//! - The boss-fight instant the countdown targets
//! - The optional shared store endpoint
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::checkin::FeedRules;
use crate::error::ConfigError;
use crate::heatmap::MAX_WEEKS;

/// Longest an evolution notice may stay up (one hour).
pub const MAX_EVOLUTION_DISPLAY_SECS: u64 = 3_600;

/// Feed rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f64,
    #[serde(default = "default_crit_increment")]
    pub crit_increment: u64,
    #[serde(default = "default_base_increment")]
    pub base_increment: u64,
}

/// Timer configuration for the live view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How often the global record is re-read.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Countdown redraw interval.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// How long an evolution notice stays up.
    #[serde(default = "default_evolution_display")]
    pub evolution_display_secs: u64,
}

/// The event the countdown runs towards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Local wall-clock time of the boss fight.
    #[serde(default = "default_boss_fight_at")]
    pub boss_fight_at: NaiveDateTime,
}

/// Shared store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedStoreConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Heatmap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_heatmap_weeks")]
    pub weeks: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for storage keys.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub shared_store: SharedStoreConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
}

// Default functions
fn default_namespace() -> String {
    "niumaxing".into()
}
fn default_daily_limit() -> u32 {
    100
}
fn default_crit_chance() -> f64 {
    0.05
}
fn default_crit_increment() -> u64 {
    3
}
fn default_base_increment() -> u64 {
    1
}
fn default_poll_interval() -> u64 {
    5
}
fn default_tick_interval() -> u64 {
    1
}
fn default_evolution_display() -> u64 {
    3
}
fn default_boss_fight_at() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or_default()
}
fn default_timeout() -> u64 {
    5
}
fn default_heatmap_weeks() -> u32 {
    24
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            crit_chance: default_crit_chance(),
            crit_increment: default_crit_increment(),
            base_increment: default_base_increment(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            tick_interval_secs: default_tick_interval(),
            evolution_display_secs: default_evolution_display(),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            boss_fight_at: default_boss_fight_at(),
        }
    }
}

impl Default for SharedStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            weeks: default_heatmap_weeks(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            rules: RulesConfig::default(),
            timing: TimingConfig::default(),
            event: EventConfig::default(),
            shared_store: SharedStoreConfig::default(),
            heatmap: HeatmapConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. `self` is left unchanged
    /// on error.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the config cannot be
    /// saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.namespace.trim().is_empty() {
            return invalid("namespace", "must not be empty");
        }
        if self.rules.daily_limit == 0 {
            return invalid("rules.daily_limit", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.rules.crit_chance) {
            return invalid("rules.crit_chance", "must be between 0 and 1");
        }
        if self.rules.base_increment == 0 {
            return invalid("rules.base_increment", "must be at least 1");
        }
        if self.rules.crit_increment == 0 {
            return invalid("rules.crit_increment", "must be at least 1");
        }
        if self.timing.poll_interval_secs == 0 {
            return invalid("timing.poll_interval_secs", "must be at least 1");
        }
        if self.timing.tick_interval_secs == 0 {
            return invalid("timing.tick_interval_secs", "must be at least 1");
        }
        if self.timing.evolution_display_secs > MAX_EVOLUTION_DISPLAY_SECS {
            return invalid(
                "timing.evolution_display_secs",
                &format!("must be at most {MAX_EVOLUTION_DISPLAY_SECS}"),
            );
        }
        if !(1..=MAX_WEEKS).contains(&self.heatmap.weeks) {
            return invalid(
                "heatmap.weeks",
                &format!("must be between 1 and {MAX_WEEKS}"),
            );
        }
        if self.shared_store.enabled && url::Url::parse(&self.shared_store.url).is_err() {
            return invalid("shared_store.url", "must be a valid URL when enabled");
        }
        Ok(())
    }

    pub fn feed_rules(&self) -> FeedRules {
        FeedRules {
            daily_limit: self.rules.daily_limit,
            crit_chance: self.rules.crit_chance,
            crit_increment: self.rules.crit_increment,
            base_increment: self.rules.base_increment,
        }
    }

    /// Evolution notice lifetime, capped at [`MAX_EVOLUTION_DISPLAY_SECS`]
    /// for configs built without `validate`.
    pub fn evolution_display(&self) -> chrono::Duration {
        let secs = self.timing.evolution_display_secs.min(MAX_EVOLUTION_DISPLAY_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn shared_timeout(&self) -> Duration {
        Duration::from_secs(self.shared_store.timeout_secs)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.rules.daily_limit, 100);
        assert_eq!(parsed.event.boss_fight_at, cfg.event.boss_fight_at);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.namespace, "niumaxing");
        assert_eq!(parsed.rules.crit_chance, 0.05);
        assert_eq!(parsed.timing.poll_interval_secs, 5);
        assert!(!parsed.shared_store.enabled);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let parsed: Config = toml::from_str("[rules]\ndaily_limit = 10\n").unwrap();
        assert_eq!(parsed.rules.daily_limit, 10);
        assert_eq!(parsed.rules.crit_increment, 3);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("rules.daily_limit").as_deref(), Some("100"));
        assert_eq!(cfg.get("shared_store.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("namespace").as_deref(), Some("niumaxing"));
        assert_eq!(
            cfg.get("event.boss_fight_at").as_deref(),
            Some("2025-12-31T23:59:59")
        );
        assert!(cfg.get("rules.missing_key").is_none());
    }

    #[test]
    fn update_changes_nested_number() {
        let mut cfg = Config::default();
        cfg.update("rules.daily_limit", "20").unwrap();
        assert_eq!(cfg.rules.daily_limit, 20);
    }

    #[test]
    fn update_changes_float() {
        let mut cfg = Config::default();
        cfg.update("rules.crit_chance", "0.5").unwrap();
        assert_eq!(cfg.rules.crit_chance, 0.5);
    }

    #[test]
    fn update_changes_datetime_string() {
        let mut cfg = Config::default();
        cfg.update("event.boss_fight_at", "2026-12-31T23:59:59").unwrap();
        assert_eq!(cfg.event.boss_fight_at.to_string(), "2026-12-31 23:59:59");
    }

    #[test]
    fn update_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.update("rules.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn update_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.update("shared_store.enabled", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn update_rejects_out_of_range_and_leaves_config_untouched() {
        let mut cfg = Config::default();
        let result = cfg.update("rules.crit_chance", "1.5");
        assert!(result.is_err());
        assert_eq!(cfg.rules.crit_chance, 0.05);
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let mut cfg = Config::default();
        cfg.rules.daily_limit = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_requires_url_when_shared_store_enabled() {
        let mut cfg = Config::default();
        cfg.shared_store.enabled = true;
        assert!(cfg.validate().is_err());
        cfg.shared_store.url = "http://localhost:8787".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn update_rejects_huge_evolution_display() {
        let mut cfg = Config::default();
        let result = cfg.update("timing.evolution_display_secs", "10000000000000000");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.timing.evolution_display_secs, 3);

        cfg.update("timing.evolution_display_secs", "3600").unwrap();
        assert_eq!(cfg.evolution_display(), chrono::Duration::seconds(3_600));
    }

    #[test]
    fn evolution_display_is_capped_without_validation() {
        let mut cfg = Config::default();
        cfg.timing.evolution_display_secs = u64::MAX;
        assert_eq!(
            cfg.evolution_display(),
            chrono::Duration::seconds(MAX_EVOLUTION_DISPLAY_SECS as i64)
        );
    }

    #[test]
    fn heatmap_weeks_bounds() {
        let mut cfg = Config::default();
        assert!(cfg.update("heatmap.weeks", "520").is_ok());
        assert!(matches!(
            cfg.update("heatmap.weeks", "521"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.update("heatmap.weeks", "0").is_err());
        assert_eq!(cfg.heatmap.weeks, 520);
    }

    #[test]
    fn feed_rules_mirror_rules_section() {
        let mut cfg = Config::default();
        cfg.rules.daily_limit = 7;
        let rules = cfg.feed_rules();
        assert_eq!(rules.daily_limit, 7);
        assert_eq!(rules.crit_increment, 3);
        assert_eq!(rules.base_increment, 1);
    }
}
