//! Countdown to the boss fight.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Remaining time split into display units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub mins: i64,
    pub secs: i64,
}

impl Countdown {
    /// Time left from `now` until `target`; zero once the target has passed.
    pub fn until(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let remaining = (target - now).num_seconds();
        if remaining <= 0 {
            return Self::default();
        }
        Self {
            days: remaining / 86_400,
            hours: remaining / 3_600 % 24,
            mins: remaining / 60 % 60,
            secs: remaining % 60,
        }
    }

    pub fn is_over(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.mins, self.secs
        )
    }
}

/// Interpret a configured wall-clock time in the local timezone.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times skipped by
/// a DST jump fall back to reading the value as UTC.
pub fn local_instant(at: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&at))
}
