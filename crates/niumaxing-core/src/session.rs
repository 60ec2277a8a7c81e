//! Owned state cell for one running client.
//!
//! `Session` keeps the in-memory copies of the global and user records and
//! is the only thing that mutates them. Each change is written back through
//! [`Persistence`] with last-write-wins semantics: a poll overwrites the
//! in-memory global record with whatever the store holds, and a feed writes
//! its result over whatever the store held.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkin::{apply_feed, CheckinState, FeedOutcome, FeedRules};
use crate::countdown::{local_instant, Countdown};
use crate::model::{GlobalState, UserStats};
use crate::progression::{progress_percent, Evolution, Stage};
use crate::storage::{Config, LocalStore, Persistence};

/// Transient marker shown after the shared total crosses a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNotice {
    pub from: Stage,
    pub to: Stage,
    pub expires_at: DateTime<Utc>,
}

impl EvolutionNotice {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Settings the session needs beyond storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub rules: FeedRules,
    pub evolution_display: Duration,
    /// Local wall-clock time of the boss fight.
    pub boss_fight_at: NaiveDateTime,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            rules: config.feed_rules(),
            evolution_display: config.evolution_display(),
            boss_fight_at: config.event.boss_fight_at,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Everything the presentation layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub user_id: String,
    pub stage: Stage,
    pub stage_label: String,
    pub next_stage: Option<Stage>,
    pub progress_percent: f64,
    pub total_grass: u64,
    pub daily_total: u64,
    pub my_total: u64,
    pub today_count: u32,
    pub daily_limit: u32,
    pub can_feed: bool,
    /// Global record is read from a shared store rather than this device only.
    pub shared_store: bool,
    pub evolution: Option<EvolutionNotice>,
    pub countdown: Countdown,
}

pub struct Session<L: LocalStore, R: Rng = Pcg64> {
    persistence: Persistence<L>,
    settings: SessionSettings,
    rng: R,
    user_id: String,
    global: GlobalState,
    user: UserStats,
    evolution: Option<EvolutionNotice>,
}

impl<L: LocalStore> Session<L, Pcg64> {
    /// Open a session with an entropy-seeded generator.
    pub fn open(persistence: Persistence<L>, settings: SessionSettings, now: DateTime<Local>) -> Self {
        Self::with_rng(persistence, settings, Pcg64::from_entropy(), now)
    }
}

impl<L: LocalStore, R: Rng> Session<L, R> {
    /// Resolve the user identity and load both records.
    pub fn with_rng(
        persistence: Persistence<L>,
        settings: SessionSettings,
        mut rng: R,
        now: DateTime<Local>,
    ) -> Self {
        let user_id = persistence.user_id(&mut rng);
        let global = persistence.read_global(now.with_timezone(&Utc));
        let user = persistence.read_user(&user_id, now.date_naive());
        Self {
            persistence,
            settings,
            rng,
            user_id,
            global,
            user,
            evolution: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn user(&self) -> &UserStats {
        &self.user
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn persistence(&self) -> &Persistence<L> {
        &self.persistence
    }

    pub fn stage(&self) -> Stage {
        Stage::for_total(self.global.total_grass)
    }

    pub fn checkin_state(&self) -> CheckinState {
        CheckinState::of(&self.user, &self.settings.rules)
    }

    /// Perform one feed action and write both records back.
    ///
    /// Persistence is best-effort: the in-memory records keep the change
    /// even if a write is dropped.
    pub fn feed(&mut self, now: DateTime<Local>) -> FeedOutcome {
        let critical = self.settings.rules.roll_critical(&mut self.rng);
        self.feed_with(critical, now)
    }

    /// Feed with a predetermined critical roll.
    pub fn feed_with(&mut self, critical: bool, now: DateTime<Local>) -> FeedOutcome {
        let now_utc = now.with_timezone(&Utc);
        let outcome = apply_feed(
            &mut self.global,
            &mut self.user,
            &self.settings.rules,
            critical,
            now.date_naive(),
            now_utc,
        );

        let FeedOutcome::Fed(receipt) = &outcome else {
            return outcome;
        };

        self.persistence.write_global(&self.global);
        self.persistence.write_user(&self.user_id, &self.user);

        if let Some(Evolution { from, to }) = receipt.evolution {
            info!(%from, %to, total = receipt.total_after, "warrior evolved");
            self.evolution = Some(EvolutionNotice {
                from,
                to,
                expires_at: now_utc + self.settings.evolution_display,
            });
        }
        outcome
    }

    /// Poll: replace the in-memory global record with the stored one and
    /// roll the user record over if the day changed.
    pub fn refresh_global(&mut self, now: DateTime<Local>) {
        self.global = self.persistence.read_global(now.with_timezone(&Utc));
        self.user.roll_over(now.date_naive());
    }

    /// The evolution notice if it is still showing; clears it once expired.
    pub fn evolution(&mut self, now: DateTime<Utc>) -> Option<EvolutionNotice> {
        if self.evolution.is_some_and(|n| !n.is_active(now)) {
            self.evolution = None;
        }
        self.evolution
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        Countdown::until(now, local_instant(self.settings.boss_fight_at))
    }

    pub fn status(&mut self, now: DateTime<Local>) -> StatusView {
        let now_utc = now.with_timezone(&Utc);
        let stage = self.stage();
        StatusView {
            user_id: self.user_id.clone(),
            stage,
            stage_label: stage.label().to_string(),
            next_stage: stage.next(),
            progress_percent: progress_percent(self.global.total_grass),
            total_grass: self.global.total_grass,
            daily_total: self.global.daily_total,
            my_total: self.user.total_checkins,
            today_count: self.user.today_count,
            daily_limit: self.settings.rules.daily_limit,
            can_feed: self.checkin_state() == CheckinState::Idle,
            shared_store: self.persistence.has_shared(),
            evolution: self.evolution(now_utc),
            countdown: self.countdown(now_utc),
        }
    }
}
