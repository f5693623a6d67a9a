use common::Side;

use crate::economy::EconomyCategory;
use crate::round::RoundState;
use crate::tables::{ProbabilityTables, MAX_PROBABILITY, MIN_PROBABILITY, NEUTRAL_MAP_RATE};

// T tier minus CT tier.
static ECONOMY_ADJUSTMENT: phf::Map<i32, f64> = phf::phf_map! {
    -4_i32 => 0.80,
    -3_i32 => 0.85,
    -2_i32 => 0.90,
    -1_i32 => 0.95,
    0_i32 => 1.00,
    1_i32 => 1.05,
    2_i32 => 1.10,
    3_i32 => 1.15,
    4_i32 => 1.20,
};

/// Upper bounds on the seconds left on the bomb and the boost the planting side gets.
const BOMB_TIME_BANDS: [(f64, f64); 3] = [(5.0, 1.15), (10.0, 1.08), (20.0, 1.03)];

pub fn economy_multiplier(tier_difference: i32) -> f64 {
    ECONOMY_ADJUSTMENT
        .get(&tier_difference.clamp(-4, 4))
        .copied()
        .unwrap_or(1.0)
}

pub fn bomb_time_multiplier(time_remaining: f64) -> f64 {
    BOMB_TIME_BANDS
        .iter()
        .find(|(limit, _)| time_remaining <= *limit)
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

/// Win probability model over a [`RoundState`], backed by a set of [`ProbabilityTables`].
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityEngine<'t> {
    tables: &'t ProbabilityTables,
}

impl<'t> ProbabilityEngine<'t> {
    pub fn new(tables: &'t ProbabilityTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'t ProbabilityTables {
        self.tables
    }

    /// Probability that `side` wins the round from the given state.
    ///
    /// The T side probability is the table base times the economy, map and bomb timer factors,
    /// clamped only after the last factor is applied.
    pub fn win_probability(&self, state: &RoundState, side: Side) -> f64 {
        let t = match state.decided() {
            Some(Side::T) => MAX_PROBABILITY,
            Some(Side::CT) => MIN_PROBABILITY,
            None => self.t_probability(state),
        };

        match side {
            Side::T => t,
            Side::CT => 1.0 - t,
        }
    }

    fn t_probability(&self, state: &RoundState) -> f64 {
        let base = self.tables.base_win_probability(state.key());

        let economy = economy_multiplier(
            state
                .economy(Side::T)
                .difference(state.economy(Side::CT)),
        );
        let map = self.tables.map_side_rate(state.map()) / NEUTRAL_MAP_RATE;
        let time = if state.bomb_planted() {
            bomb_time_multiplier(state.time_remaining())
        } else {
            1.0
        };

        (base * economy * map * time).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    }

    pub fn duel_win_rate(&self, attacker_equipment: u32, victim_equipment: u32) -> f64 {
        self.tables.duel_win_rate(
            EconomyCategory::classify(attacker_equipment),
            EconomyCategory::classify(victim_equipment),
        )
    }

    /// Probability gained by `killer_side` when a player of `victim_side` dies.
    ///
    /// Never negative, an apparent loss is noise between table entries and the fallback.
    pub fn kill_delta(&self, state: &RoundState, killer_side: Side, victim_side: Side) -> f64 {
        let before = self.win_probability(state, killer_side);

        let mut after_state = state.clone();
        after_state.record_death(victim_side);
        let after = self.win_probability(&after_state, killer_side);

        (after - before).max(0.0)
    }

    /// Signed probability change for the T side when the bomb goes down at `time`.
    pub fn plant_delta(&self, state: &RoundState, time: f64) -> f64 {
        let before = self.win_probability(state, Side::T);

        let mut after_state = state.clone();
        after_state.plant(time);
        let after = self.win_probability(&after_state, Side::T);

        after - before
    }

    /// Signed probability change for the CT side when the bomb is defused.
    pub fn defuse_delta(&self, state: &RoundState) -> f64 {
        let before = self.win_probability(state, Side::CT);

        let mut after_state = state.clone();
        after_state.defuse();
        let after = self.win_probability(&after_state, Side::CT);

        after - before
    }
}
