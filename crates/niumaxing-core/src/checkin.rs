//! Daily feed (check-in) state machine.
//!
//! A feed action adds grass to the shared counter and to the user's own
//! history, at most `daily_limit` times per local calendar day. Once the
//! quota is spent further actions are silent no-ops.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{GlobalState, UserStats};
use crate::progression::Evolution;

/// Quota and increment rules for feed actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedRules {
    /// Maximum feed actions per user per day.
    pub daily_limit: u32,
    /// Probability in `[0, 1]` that an action is critical.
    pub crit_chance: f64,
    /// Grass added by a critical action.
    pub crit_increment: u64,
    /// Grass added by a normal action.
    pub base_increment: u64,
}

impl Default for FeedRules {
    fn default() -> Self {
        Self {
            daily_limit: 100,
            crit_chance: 0.05,
            crit_increment: 3,
            base_increment: 1,
        }
    }
}

impl FeedRules {
    /// Draw the critical Bernoulli trial.
    pub fn roll_critical<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.crit_chance.clamp(0.0, 1.0))
    }

    pub fn increment(&self, critical: bool) -> u64 {
        if critical {
            self.crit_increment
        } else {
            self.base_increment
        }
    }
}

/// Whether the user may still feed today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinState {
    Idle,
    LimitReached,
}

impl CheckinState {
    pub fn of(user: &UserStats, rules: &FeedRules) -> Self {
        if user.today_count >= rules.daily_limit {
            CheckinState::LimitReached
        } else {
            CheckinState::Idle
        }
    }
}

/// What a successful feed action changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedReceipt {
    pub increment: u64,
    pub critical: bool,
    pub total_before: u64,
    pub total_after: u64,
    pub today_count: u32,
    pub evolution: Option<Evolution>,
}

/// Result of a feed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedOutcome {
    Fed(FeedReceipt),
    /// Quota spent; nothing changed.
    LimitReached,
}

impl FeedOutcome {
    pub fn receipt(&self) -> Option<&FeedReceipt> {
        match self {
            FeedOutcome::Fed(receipt) => Some(receipt),
            FeedOutcome::LimitReached => None,
        }
    }
}

/// Apply one feed action to both records.
///
/// The user record is rolled over to `today` first, so a record carried
/// across midnight gets a fresh quota. On `LimitReached` neither record is
/// modified beyond that rollover.
pub fn apply_feed(
    global: &mut GlobalState,
    user: &mut UserStats,
    rules: &FeedRules,
    critical: bool,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> FeedOutcome {
    user.roll_over(today);
    if CheckinState::of(user, rules) == CheckinState::LimitReached {
        return FeedOutcome::LimitReached;
    }

    let increment = rules.increment(critical);
    let total_before = global.total_grass;

    global.total_grass = global.total_grass.saturating_add(increment);
    global.daily_total = global.daily_total.saturating_add(increment);
    global.last_updated = now.timestamp_millis();

    user.total_checkins = user.total_checkins.saturating_add(increment);
    user.today_count += 1;
    *user.history.entry(today).or_insert(0) += increment;

    FeedOutcome::Fed(FeedReceipt {
        increment,
        critical,
        total_before,
        total_after: global.total_grass,
        today_count: user.today_count,
        evolution: Evolution::between(total_before, global.total_grass),
    })
}
