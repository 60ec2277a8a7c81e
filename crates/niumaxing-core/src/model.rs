//! Persisted records: the shared global counter and per-user stats.
//!
//! Field names are camelCase on the wire so records written by other
//! clients of the same shared store remain readable.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Starting hit points of the boss. Reserved; nothing consumes it yet.
pub const BOSS_MAX_HP: u64 = 50_000;

/// The single shared record every user contributes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    pub total_grass: u64,
    /// Incremented alongside `total_grass`; never reset.
    pub daily_total: u64,
    #[serde(rename = "bossHP")]
    pub boss_hp: u64,
    /// Epoch milliseconds of the last write.
    pub last_updated: i64,
}

impl GlobalState {
    /// Zeroed record used when nothing is stored yet.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            total_grass: 0,
            daily_total: 0,
            boss_hp: BOSS_MAX_HP,
            last_updated: now.timestamp_millis(),
        }
    }
}

/// Per-user contribution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub id: String,
    pub total_checkins: u64,
    pub today_count: u32,
    pub last_checkin_date: NaiveDate,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, u64>,
}

impl UserStats {
    pub fn new(id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            id: id.into(),
            total_checkins: 0,
            today_count: 0,
            last_checkin_date: today,
            history: BTreeMap::new(),
        }
    }

    /// Reset the daily counter if the record was last touched on another day.
    ///
    /// Returns `true` when a rollover happened. History and totals are left
    /// untouched.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_checkin_date == today {
            return false;
        }
        self.today_count = 0;
        self.last_checkin_date = today;
        true
    }

    /// Contribution recorded for a given day.
    pub fn contributed_on(&self, date: NaiveDate) -> u64 {
        self.history.get(&date).copied().unwrap_or(0)
    }

    /// Sum of all history entries. Equals `total_checkins` under correct operation.
    pub fn history_total(&self) -> u64 {
        self.history.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn global_state_uses_camel_case_wire_names() {
        let state = GlobalState {
            total_grass: 12,
            daily_total: 3,
            boss_hp: BOSS_MAX_HP,
            last_updated: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["totalGrass"], 12);
        assert_eq!(json["dailyTotal"], 3);
        assert_eq!(json["bossHP"], 50_000);
        assert_eq!(json["lastUpdated"], 1_700_000_000_000i64);
    }

    #[test]
    fn user_stats_reads_date_keyed_history() {
        let raw = r#"{
            "id": "user_abc123def",
            "totalCheckins": 7,
            "todayCount": 2,
            "lastCheckinDate": "2025-03-02",
            "history": { "2025-03-01": 5, "2025-03-02": 2 }
        }"#;
        let stats: UserStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.last_checkin_date, date("2025-03-02"));
        assert_eq!(stats.contributed_on(date("2025-03-01")), 5);
        assert_eq!(stats.history_total(), stats.total_checkins);
    }

    #[test]
    fn roll_over_resets_only_today_count() {
        let mut stats = UserStats::new("user_x", date("2025-03-01"));
        stats.today_count = 40;
        stats.total_checkins = 44;
        stats.history.insert(date("2025-03-01"), 44);

        assert!(stats.roll_over(date("2025-03-02")));
        assert_eq!(stats.today_count, 0);
        assert_eq!(stats.last_checkin_date, date("2025-03-02"));
        assert_eq!(stats.total_checkins, 44);
        assert_eq!(stats.contributed_on(date("2025-03-01")), 44);

        assert!(!stats.roll_over(date("2025-03-02")));
    }

    #[test]
    fn fresh_global_state_starts_at_zero() {
        let now = Utc::now();
        let state = GlobalState::fresh(now);
        assert_eq!(state.total_grass, 0);
        assert_eq!(state.daily_total, 0);
        assert_eq!(state.boss_hp, 50_000);
        assert_eq!(state.last_updated, now.timestamp_millis());
    }
}
