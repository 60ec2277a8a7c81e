//! Evolution stages of the warrior.
//!
//! The shared `totalGrass` counter maps onto one of five ordered stages.
//! A total always resolves to the highest stage whose threshold it meets.

use serde::{Deserialize, Serialize};

/// One of the five progression tiers, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Cub,
    Teen,
    Youth,
    Warrior,
    Legend,
}

impl Stage {
    /// All stages, lowest first.
    pub const ALL: [Stage; 5] = [
        Stage::Cub,
        Stage::Teen,
        Stage::Youth,
        Stage::Warrior,
        Stage::Legend,
    ];

    /// Minimum cumulative total required to reach this stage.
    pub fn threshold(self) -> u64 {
        match self {
            Stage::Cub => 0,
            Stage::Teen => 1_000,
            Stage::Youth => 5_000,
            Stage::Warrior => 15_000,
            Stage::Legend => 40_000,
        }
    }

    /// Highest stage whose threshold is `<= total`.
    pub fn for_total(total: u64) -> Stage {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|stage| total >= stage.threshold())
            .unwrap_or(Stage::Cub)
    }

    /// The stage after this one, `None` for `Legend`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Cub => Some(Stage::Teen),
            Stage::Teen => Some(Stage::Youth),
            Stage::Youth => Some(Stage::Warrior),
            Stage::Warrior => Some(Stage::Legend),
            Stage::Legend => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Cub => "Niuma Cub",
            Stage::Teen => "Niuma Teen",
            Stage::Youth => "Hot-blooded Youth",
            Stage::Warrior => "Star Warrior",
            Stage::Legend => "Supreme Legend",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Cub => "A cute little niuma who just arrived among the stars",
            Stage::Teen => "Wearing a beloved little purple hat",
            Stage::Youth => "The horns are getting sharp",
            Stage::Warrior => "Fighting to protect planet Niuma",
            Stage::Legend => "The god of niuma has descended!",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress towards the next stage as a percentage in `[0, 100]`.
///
/// Measured against the absolute threshold of the next stage, so a total of
/// 500 reads as 50% of the way to `Teen`. The final stage is always 100.
pub fn progress_percent(total: u64) -> f64 {
    match Stage::for_total(total).next() {
        Some(next) => (total as f64 / next.threshold() as f64 * 100.0).min(100.0),
        None => 100.0,
    }
}

/// A stage transition caused by a single feed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evolution {
    pub from: Stage,
    pub to: Stage,
}

impl Evolution {
    /// Compare the stages of two totals, `None` if they are the same.
    pub fn between(before: u64, after: u64) -> Option<Evolution> {
        let from = Stage::for_total(before);
        let to = Stage::for_total(after);
        (from != to).then_some(Evolution { from, to })
    }
}
