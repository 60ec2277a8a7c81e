//! Best-effort persistence of the global and per-user records.
//!
//! Every operation here swallows store failures: they are logged and the
//! caller sees "no data" on reads and a dropped write on writes. Corrupt
//! records are replaced by defaults the same way.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::identity::get_or_create_user_id;
use super::local::{LocalStore, SqliteStore};
use super::shared::{HttpSharedStore, SharedStore};
use super::Config;
use crate::error::StoreError;
use crate::model::{GlobalState, UserStats};

/// Storage keys, scoped by an application namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    namespace: String,
}

impl Keys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn global_state(&self) -> String {
        format!("global:{}_state", self.namespace)
    }

    pub fn user_stats(&self, user_id: &str) -> String {
        format!("user:{user_id}:stats")
    }

    pub fn user_id(&self) -> String {
        format!("{}_user_id", self.namespace)
    }

    pub fn story_seen(&self) -> String {
        format!("{}_story_seen", self.namespace)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new("niumaxing")
    }
}

/// Read/write contract over a local store and an optional shared store.
pub struct Persistence<L: LocalStore> {
    local: L,
    shared: Option<Box<dyn SharedStore>>,
    keys: Keys,
}

impl<L: LocalStore> Persistence<L> {
    pub fn new(local: L, keys: Keys) -> Self {
        Self {
            local,
            shared: None,
            keys,
        }
    }

    /// Attach the shared store used for the global record.
    pub fn with_shared(mut self, shared: Box<dyn SharedStore>) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Whether the global record goes through a shared store.
    pub fn has_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Read the global record: shared store first, then local, then a
    /// zeroed default stamped with `now`.
    pub fn read_global(&self, now: DateTime<Utc>) -> GlobalState {
        let key = self.keys.global_state();

        if let Some(shared) = &self.shared {
            match shared.get(&key, true) {
                Ok(Some(value)) => match serde_json::from_value::<GlobalState>(value) {
                    Ok(state) => return state,
                    Err(e) => warn!(key = %key, error = %e, "corrupt global record in shared store; using local copy"),
                },
                Ok(None) => debug!(key = %key, "no global record in shared store"),
                Err(e) => warn!(key = %key, error = %e, "shared store unavailable; using local copy"),
            }
        }

        self.read_local::<GlobalState>(&key)
            .unwrap_or_else(|| GlobalState::fresh(now))
    }

    /// Write the global record to the shared store (if any) and always to
    /// the local store.
    pub fn write_global(&self, state: &GlobalState) {
        let key = self.keys.global_state();

        if let Some(shared) = &self.shared {
            let result = serde_json::to_value(state)
                .map_err(Into::into)
                .and_then(|value| shared.set(&key, &value, true));
            if let Err(e) = result {
                warn!(key = %key, error = %e, "failed to write global record to shared store");
            }
        }

        self.write_local(&key, state);
    }

    /// Read a user's record, defaulting to a zero record, with the daily
    /// counter rolled over to `today`.
    pub fn read_user(&self, user_id: &str, today: NaiveDate) -> UserStats {
        let key = self.keys.user_stats(user_id);
        let mut stats = self
            .read_local::<UserStats>(&key)
            .unwrap_or_else(|| UserStats::new(user_id, today));
        if stats.roll_over(today) {
            debug!(user_id, %today, "daily count reset");
        }
        stats
    }

    /// Write a user's record to the local store.
    pub fn write_user(&self, user_id: &str, stats: &UserStats) {
        self.write_local(&self.keys.user_stats(user_id), stats);
    }

    /// Identifier of this device's user, created on first use.
    pub fn user_id<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let key = self.keys.user_id();
        let (id, err) = get_or_create_user_id(&self.local, &key, rng);
        if let Some(e) = err {
            warn!(key = %key, error = %e, "user id could not be persisted; it will change next run");
        }
        id
    }

    /// Whether the intro narrative has been shown.
    pub fn story_seen(&self) -> bool {
        let key = self.keys.story_seen();
        match self.local.get(&key) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read intro flag");
                false
            }
        }
    }

    pub fn mark_story_seen(&self) {
        self.set_story_flag(true);
    }

    /// Make the intro narrative show again.
    pub fn reset_story(&self) {
        self.set_story_flag(false);
    }

    fn set_story_flag(&self, seen: bool) {
        let key = self.keys.story_seen();
        if let Err(e) = self.local.set(&key, if seen { "true" } else { "false" }) {
            warn!(key = %key, error = %e, "failed to write intro flag");
        }
    }

    fn read_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.local.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "local store read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "corrupt record in local store; resetting to default");
                None
            }
        }
    }

    fn write_local<T: serde::Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(Into::into)
            .and_then(|raw| self.local.set(key, &raw));
        match result {
            Ok(()) => debug!(key, "record written"),
            Err(e) => warn!(key, error = %e, "local store write dropped"),
        }
    }
}

impl Persistence<SqliteStore> {
    /// Open the on-disk local store and, if enabled, the HTTP shared store.
    ///
    /// A shared store that cannot be set up is logged and skipped; only a
    /// local store failure is an error.
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let mut persistence = Self::new(SqliteStore::open()?, Keys::new(config.namespace.clone()));
        if config.shared_store.enabled {
            match HttpSharedStore::new(&config.shared_store.url, config.shared_timeout()) {
                Ok(shared) => persistence = persistence.with_shared(Box::new(shared)),
                Err(e) => warn!(url = %config.shared_store.url, error = %e, "shared store disabled"),
            }
        }
        Ok(persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local::MemoryStore;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// In-memory shared store; `broken` makes every call fail.
    #[derive(Default, Clone)]
    struct FakeShared {
        entries: Rc<RefCell<HashMap<String, serde_json::Value>>>,
        broken: bool,
    }

    impl SharedStore for FakeShared {
        fn get(&self, key: &str, _shared: bool) -> Result<Option<serde_json::Value>, StoreError> {
            if self.broken {
                return Err(StoreError::Unavailable("offline".into()));
            }
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &serde_json::Value, _shared: bool) -> Result<(), StoreError> {
            if self.broken {
                return Err(StoreError::Unavailable("offline".into()));
            }
            self.entries.borrow_mut().insert(key.to_string(), value.clone());
            Ok(())
        }
    }

    struct FailingStore;

    impl LocalStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Locked)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Locked)
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn persistence() -> Persistence<MemoryStore> {
        Persistence::new(MemoryStore::new(), Keys::default())
    }

    #[test]
    fn keys_follow_namespace() {
        let keys = Keys::new("demo");
        assert_eq!(keys.global_state(), "global:demo_state");
        assert_eq!(keys.user_stats("user_1"), "user:user_1:stats");
        assert_eq!(keys.user_id(), "demo_user_id");
        assert_eq!(keys.story_seen(), "demo_story_seen");
    }

    #[test]
    fn empty_store_yields_default_records() {
        let p = persistence();
        let now = Utc::now();

        let global = p.read_global(now);
        assert_eq!(global, GlobalState::fresh(now));

        let user = p.read_user("user_a", day(1));
        assert_eq!(user.id, "user_a");
        assert_eq!(user.total_checkins, 0);
        assert_eq!(user.today_count, 0);
        assert!(user.history.is_empty());
    }

    #[test]
    fn global_roundtrips_through_local_store() {
        let p = persistence();
        let mut state = GlobalState::fresh(Utc::now());
        state.total_grass = 1234;
        p.write_global(&state);

        assert_eq!(p.read_global(Utc::now()), state);
        let raw = p.local().get("global:niumaxing_state").unwrap().unwrap();
        assert!(raw.contains("\"totalGrass\":1234"));
    }

    #[test]
    fn shared_store_is_preferred_for_reads() {
        let shared = FakeShared::default();
        let p = persistence().with_shared(Box::new(shared.clone()));

        let mut local_copy = GlobalState::fresh(Utc::now());
        local_copy.total_grass = 5;
        p.local()
            .set("global:niumaxing_state", &serde_json::to_string(&local_copy).unwrap())
            .unwrap();
        let mut shared_copy = local_copy.clone();
        shared_copy.total_grass = 500;
        shared.entries.borrow_mut().insert(
            "global:niumaxing_state".into(),
            serde_json::to_value(&shared_copy).unwrap(),
        );

        assert_eq!(p.read_global(Utc::now()).total_grass, 500);
    }

    #[test]
    fn writes_reach_both_stores() {
        let shared = FakeShared::default();
        assert!(!persistence().has_shared());
        let p = persistence().with_shared(Box::new(shared.clone()));
        assert!(p.has_shared());
        let mut state = GlobalState::fresh(Utc::now());
        state.total_grass = 77;

        p.write_global(&state);

        assert_eq!(shared.entries.borrow()["global:niumaxing_state"]["totalGrass"], 77);
        assert!(p.local().get("global:niumaxing_state").unwrap().is_some());
    }

    #[test]
    fn broken_shared_store_falls_back_to_local() {
        let shared = FakeShared {
            broken: true,
            ..FakeShared::default()
        };
        let p = persistence().with_shared(Box::new(shared));
        let mut state = GlobalState::fresh(Utc::now());
        state.total_grass = 9;

        p.write_global(&state);

        assert_eq!(p.read_global(Utc::now()).total_grass, 9);
    }

    #[test]
    fn shared_store_without_record_uses_local() {
        let p = persistence().with_shared(Box::new(FakeShared::default()));
        let mut state = GlobalState::fresh(Utc::now());
        state.total_grass = 3;
        p.local()
            .set("global:niumaxing_state", &serde_json::to_string(&state).unwrap())
            .unwrap();

        assert_eq!(p.read_global(Utc::now()).total_grass, 3);
    }

    #[test]
    fn corrupt_global_record_resets_to_default() {
        let p = persistence();
        p.local().set("global:niumaxing_state", "{not json").unwrap();

        let state = p.read_global(Utc::now());
        assert_eq!(state.total_grass, 0);
        assert_eq!(state.boss_hp, 50_000);
    }

    #[test]
    fn corrupt_user_record_resets_to_default() {
        let p = persistence();
        p.local().set("user:user_a:stats", "[1,2,3]").unwrap();

        let user = p.read_user("user_a", day(2));
        assert_eq!(user, UserStats::new("user_a", day(2)));
    }

    #[test]
    fn stale_user_record_is_rolled_over_on_read() {
        let p = persistence();
        let mut stats = UserStats::new("user_a", day(1));
        stats.today_count = 12;
        stats.total_checkins = 14;
        stats.history.insert(day(1), 14);
        p.write_user("user_a", &stats);

        let read = p.read_user("user_a", day(2));
        assert_eq!(read.today_count, 0);
        assert_eq!(read.last_checkin_date, day(2));
        assert_eq!(read.total_checkins, 14);
        assert_eq!(read.history, stats.history);
    }

    #[test]
    fn same_day_user_record_keeps_today_count() {
        let p = persistence();
        let mut stats = UserStats::new("user_a", day(3));
        stats.today_count = 4;
        p.write_user("user_a", &stats);

        assert_eq!(p.read_user("user_a", day(3)).today_count, 4);
    }

    #[test]
    fn user_id_is_stable() {
        let p = persistence();
        let mut rng = Pcg64::seed_from_u64(11);
        let first = p.user_id(&mut rng);
        let second = p.user_id(&mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn story_flag_toggles() {
        let p = persistence();
        assert!(!p.story_seen());
        p.mark_story_seen();
        assert!(p.story_seen());
        p.reset_story();
        assert!(!p.story_seen());
    }

    #[test]
    fn failing_local_store_never_panics() {
        let p = Persistence::new(FailingStore, Keys::default());
        let mut rng = Pcg64::seed_from_u64(12);
        let now = Utc::now();

        assert_eq!(p.read_global(now), GlobalState::fresh(now));
        p.write_global(&GlobalState::fresh(now));
        assert_eq!(p.read_user("user_a", day(1)).total_checkins, 0);
        p.write_user("user_a", &UserStats::new("user_a", day(1)));
        assert!(p.user_id(&mut rng).starts_with("user_"));
        assert!(!p.story_seen());
        p.mark_story_seen();
    }
}
