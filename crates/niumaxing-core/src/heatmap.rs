//! Contribution heatmap.
//!
//! Lays a user's per-day history out as a calendar grid: one column per
//! week, seven cells per column, the last cell being today. Drawing the grid
//! is left to the caller.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default number of weeks shown.
pub const DEFAULT_WEEKS: u32 = 24;

/// Widest grid that will be built (ten years).
pub const MAX_WEEKS: u32 = 520;

/// Intensity bucket of a day's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatLevel {
    None,
    Low,
    Medium,
    High,
    Max,
}

impl HeatLevel {
    pub fn for_count(count: u64) -> Self {
        match count {
            0 => HeatLevel::None,
            1..=2 => HeatLevel::Low,
            3..=5 => HeatLevel::Medium,
            6..=10 => HeatLevel::High,
            _ => HeatLevel::Max,
        }
    }

    /// Numeric level (0-4)
    pub fn as_u8(self) -> u8 {
        match self {
            HeatLevel::None => 0,
            HeatLevel::Low => 1,
            HeatLevel::Medium => 2,
            HeatLevel::High => 3,
            HeatLevel::Max => 4,
        }
    }
}

/// Single day in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub count: u64,
    pub level: HeatLevel,
}

/// One column of seven consecutive days, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapWeek {
    pub days: Vec<HeatmapCell>,
}

/// Build `weeks` columns ending at `today`.
///
/// Cell `d` of column `w` is `today - ((weeks - 1 - w) * 7 + (6 - d))` days,
/// so the grid covers exactly `weeks * 7` consecutive days. `weeks` is
/// capped at [`MAX_WEEKS`].
pub fn heatmap(history: &BTreeMap<NaiveDate, u64>, today: NaiveDate, weeks: u32) -> Vec<HeatmapWeek> {
    let weeks = weeks.min(MAX_WEEKS);
    (0..weeks)
        .map(|w| {
            let days = (0..7u32)
                .map(|d| {
                    let back = u64::from((weeks - 1 - w) * 7 + (6 - d));
                    let date = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
                    let count = history.get(&date).copied().unwrap_or(0);
                    HeatmapCell {
                        date,
                        count,
                        level: HeatLevel::for_count(count),
                    }
                })
                .collect();
            HeatmapWeek { days }
        })
        .collect()
}

/// Totals over a heatmap window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapSummary {
    pub active_days: u32,
    pub total: u64,
    pub best_day: Option<NaiveDate>,
    /// Consecutive active days ending today (or yesterday if today is empty).
    pub current_streak: u32,
}

pub fn summarize(grid: &[HeatmapWeek]) -> HeatmapSummary {
    let cells: Vec<&HeatmapCell> = grid.iter().flat_map(|w| w.days.iter()).collect();

    let mut summary = HeatmapSummary::default();
    let mut best = 0;
    for cell in &cells {
        if cell.count > 0 {
            summary.active_days += 1;
            summary.total += cell.count;
        }
        if cell.count > best {
            best = cell.count;
            summary.best_day = Some(cell.date);
        }
    }

    let mut tail = cells.iter().rev().peekable();
    if tail.peek().is_some_and(|c| c.count == 0) {
        tail.next();
    }
    summary.current_streak = tail.take_while(|c| c.count > 0).count() as u32;

    summary
}
