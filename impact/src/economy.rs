//! Equipment value classification.
//!
//! The discrete tiers drive duel and economy lookups, the continuous ratios drive the eco kill
//! value and eco death penalty multipliers which use finer bands than the tiers.

/// Floor applied to every equipment value before it is classified or used in a ratio.
pub const MIN_EQUIPMENT_VALUE: u32 = 200;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum EconomyCategory {
    StarterPistol,
    UpgradedPistol,
    Smg,
    Rifle,
    FullBuy,
}

impl EconomyCategory {
    pub const ALL: [EconomyCategory; 5] = [
        Self::StarterPistol,
        Self::UpgradedPistol,
        Self::Smg,
        Self::Rifle,
        Self::FullBuy,
    ];

    pub fn classify(value: u32) -> Self {
        match value.max(MIN_EQUIPMENT_VALUE) {
            0..=999 => Self::StarterPistol,
            1000..=1999 => Self::UpgradedPistol,
            2000..=3499 => Self::Smg,
            3500..=4999 => Self::Rifle,
            _ => Self::FullBuy,
        }
    }

    /// Classifies a whole side by the mean equipment value of its players.
    pub fn classify_side<I>(values: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), v| (sum + v as u64, count + 1));
        if count == 0 {
            return Self::StarterPistol;
        }

        Self::classify((sum / count) as u32)
    }

    pub fn rank(self) -> i32 {
        self as i32
    }

    /// Signed tier difference, positive when `self` is the stronger buy.
    pub fn difference(self, other: Self) -> i32 {
        self.rank() - other.rank()
    }
}

pub fn floored(value: u32) -> f64 {
    value.max(MIN_EQUIPMENT_VALUE) as f64
}

pub fn equipment_ratio(numerator: u32, denominator: u32) -> f64 {
    floored(numerator) / floored(denominator)
}

const RATIO_BANDS: [f64; 6] = [4.0, 2.0, 1.3, 0.77, 0.5, 0.25];
const KILL_VALUE: [f64; 7] = [1.40, 1.25, 1.10, 1.00, 0.90, 0.80, 0.70];
const DEATH_PENALTY: [f64; 7] = [0.70, 0.80, 0.90, 1.00, 1.10, 1.25, 1.40];

fn band(ratio: f64) -> usize {
    RATIO_BANDS
        .iter()
        .position(|lower| ratio >= *lower)
        .unwrap_or(RATIO_BANDS.len())
}

/// Value of a kill, higher when the victim carried more equipment than the killer.
pub fn eco_kill_multiplier(killer_equipment: u32, victim_equipment: u32) -> f64 {
    KILL_VALUE[band(equipment_ratio(victim_equipment, killer_equipment))]
}

/// Weight of a death, higher when the killer carried less equipment than the victim.
pub fn eco_death_multiplier(victim_equipment: u32, killer_equipment: u32) -> f64 {
    DEATH_PENALTY[band(equipment_ratio(killer_equipment, victim_equipment))]
}
