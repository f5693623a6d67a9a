//! Lookup data for the probability engine.
//!
//! Every table maps a composite key to a probability in (0, 1). Missing keys never fail, they fall
//! back to an analytic estimate. Tables are either the shipped empirical defaults or rebuilt from
//! aggregated win/loss counts, in which case thinly sampled keys are dropped in favour of the
//! fallback.

use std::collections::HashMap;

use crate::economy::EconomyCategory;

pub const STATE_MIN_SAMPLES: u32 = 10;
pub const DUEL_MIN_SAMPLES: u32 = 10;
pub const MAP_MIN_SAMPLES: u32 = 20;

pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;

/// T side disadvantage in an even fight, used when no table entry exists.
const STEADY_STATE_SIDE_BIAS: f64 = 0.04;
/// Share of the remaining distance to certainty the planting side gains from a planted bomb.
const PLANT_PULL: f64 = 0.25;
const DUEL_TIER_STEP: f64 = 0.07;
const DUEL_MIN: f64 = 0.20;
const DUEL_MAX: f64 = 0.80;
pub const NEUTRAL_MAP_RATE: f64 = 0.50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct StateKey {
    pub alive_t: u8,
    pub alive_ct: u8,
    pub bomb_planted: bool,
}

impl StateKey {
    pub fn new(alive_t: u8, alive_ct: u8, bomb_planted: bool) -> Self {
        Self {
            alive_t,
            alive_ct,
            bomb_planted,
        }
    }

    fn packed(&self) -> u32 {
        self.alive_t as u32 * 100 + self.alive_ct as u32 * 10 + self.bomb_planted as u32
    }
}

// Keys are `alive_t * 100 + alive_ct * 10 + planted`, values are T side round win rates.
static DEFAULT_STATES: phf::Map<u32, f64> = phf::phf_map! {
    550_u32 => 0.494, 540_u32 => 0.680, 530_u32 => 0.830, 520_u32 => 0.930, 510_u32 => 0.980,
    450_u32 => 0.310, 440_u32 => 0.480, 430_u32 => 0.660, 420_u32 => 0.840, 410_u32 => 0.950,
    350_u32 => 0.150, 340_u32 => 0.290, 330_u32 => 0.460, 320_u32 => 0.650, 310_u32 => 0.870,
    250_u32 => 0.050, 240_u32 => 0.130, 230_u32 => 0.270, 220_u32 => 0.440, 210_u32 => 0.680,
    150_u32 => 0.010, 140_u32 => 0.030, 130_u32 => 0.090, 120_u32 => 0.210, 110_u32 => 0.420,

    551_u32 => 0.740, 541_u32 => 0.850, 531_u32 => 0.930, 521_u32 => 0.970, 511_u32 => 0.990,
    451_u32 => 0.600, 441_u32 => 0.720, 431_u32 => 0.840, 421_u32 => 0.930, 411_u32 => 0.980,
    351_u32 => 0.440, 341_u32 => 0.570, 331_u32 => 0.700, 321_u32 => 0.840, 311_u32 => 0.950,
    251_u32 => 0.270, 241_u32 => 0.390, 231_u32 => 0.530, 221_u32 => 0.680, 211_u32 => 0.870,
    151_u32 => 0.120, 141_u32 => 0.200, 131_u32 => 0.320, 121_u32 => 0.480, 111_u32 => 0.700,
    51_u32 => 0.050, 41_u32 => 0.070, 31_u32 => 0.100, 21_u32 => 0.140, 11_u32 => 0.220,
};

// Keys are `attacker_tier * 10 + defender_tier`. Mirror matchups are never looked up.
static DEFAULT_DUELS: phf::Map<u32, f64> = phf::phf_map! {
    10_u32 => 0.58, 1_u32 => 0.42,
    20_u32 => 0.66, 2_u32 => 0.34,
    30_u32 => 0.74, 3_u32 => 0.26,
    40_u32 => 0.78, 4_u32 => 0.22,
    21_u32 => 0.57, 12_u32 => 0.43,
    31_u32 => 0.66, 13_u32 => 0.34,
    41_u32 => 0.72, 14_u32 => 0.28,
    32_u32 => 0.60, 23_u32 => 0.40,
    42_u32 => 0.65, 24_u32 => 0.35,
    43_u32 => 0.54, 34_u32 => 0.46,
};

// T side round win rate per map.
static DEFAULT_MAP_SIDES: phf::Map<&'static str, f64> = phf::phf_map! {
    "de_ancient" => 0.46,
    "de_anubis" => 0.51,
    "de_dust2" => 0.50,
    "de_inferno" => 0.46,
    "de_mirage" => 0.47,
    "de_nuke" => 0.44,
    "de_overpass" => 0.47,
    "de_train" => 0.45,
    "de_vertigo" => 0.49,
};

/// Analytic estimate of the T side win probability for a state without a table entry.
pub fn fallback_base(key: StateKey) -> f64 {
    let total = key.alive_t as f64 + key.alive_ct as f64;
    let ratio = if total == 0.0 {
        0.5
    } else {
        key.alive_t as f64 / total
    };

    let mut p = ratio * (1.0 - STEADY_STATE_SIDE_BIAS);
    if key.bomb_planted {
        p += (1.0 - p) * PLANT_PULL;
    }
    p
}

pub fn fallback_duel(attacker: EconomyCategory, defender: EconomyCategory) -> f64 {
    (0.50 + DUEL_TIER_STEP * attacker.difference(defender) as f64).clamp(DUEL_MIN, DUEL_MAX)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTables {
    states: HashMap<StateKey, f64>,
    duels: HashMap<(EconomyCategory, EconomyCategory), f64>,
    maps: HashMap<String, f64>,
}

impl Default for ProbabilityTables {
    fn default() -> Self {
        let mut states = HashMap::with_capacity(DEFAULT_STATES.len());
        for alive_t in 0..=5u8 {
            for alive_ct in 0..=5u8 {
                for bomb_planted in [false, true] {
                    let key = StateKey::new(alive_t, alive_ct, bomb_planted);
                    if let Some(p) = DEFAULT_STATES.get(&key.packed()) {
                        states.insert(key, *p);
                    }
                }
            }
        }

        let mut duels = HashMap::with_capacity(DEFAULT_DUELS.len());
        for attacker in EconomyCategory::ALL {
            for defender in EconomyCategory::ALL {
                let packed = (attacker.rank() * 10 + defender.rank()) as u32;
                if let Some(p) = DEFAULT_DUELS.get(&packed) {
                    duels.insert((attacker, defender), *p);
                }
            }
        }

        let maps = DEFAULT_MAP_SIDES
            .entries()
            .map(|(name, rate)| (name.to_string(), *rate))
            .collect();

        Self {
            states,
            duels,
            maps,
        }
    }
}

impl ProbabilityTables {
    /// Tables without any entries, every lookup uses the analytic fallback.
    pub fn empty() -> Self {
        Self {
            states: HashMap::new(),
            duels: HashMap::new(),
            maps: HashMap::new(),
        }
    }

    pub fn from_observations(observations: &TableObservations) -> Self {
        let states = observations
            .states
            .iter()
            .filter(|(_, counts)| counts.samples() >= STATE_MIN_SAMPLES)
            .map(|(key, counts)| (*key, counts.rate()))
            .collect();

        let duels = observations
            .duels
            .iter()
            .filter(|((attacker, defender), _)| attacker != defender)
            .filter(|(_, counts)| counts.samples() >= DUEL_MIN_SAMPLES)
            .map(|(key, counts)| (*key, counts.rate()))
            .collect();

        let maps = observations
            .maps
            .iter()
            .filter(|(_, counts)| counts.samples() >= MAP_MIN_SAMPLES)
            .map(|(map, counts)| (map.clone(), counts.rate()))
            .collect();

        tracing::debug!(
            states = observations.states.len(),
            duels = observations.duels.len(),
            maps = observations.maps.len(),
            "Rebuilt probability tables from observations"
        );

        Self {
            states,
            duels,
            maps,
        }
    }

    /// Rebuilds the tables from serialized [`TableObservations`].
    pub fn from_json(content: &str) -> Result<Self, crate::Error> {
        let observations: TableObservations = serde_json::from_str(content)?;
        Ok(Self::from_observations(&observations))
    }

    pub fn with_state(mut self, key: StateKey, probability: f64) -> Self {
        self.states
            .insert(key, probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY));
        self
    }

    pub fn with_map(mut self, map: impl Into<String>, t_rate: f64) -> Self {
        self.maps
            .insert(map.into(), t_rate.clamp(MIN_PROBABILITY, MAX_PROBABILITY));
        self
    }

    /// T side win probability for the given alive counts and bomb state.
    pub fn base_win_probability(&self, key: StateKey) -> f64 {
        match self.states.get(&key) {
            Some(p) => *p,
            None => fallback_base(key),
        }
    }

    pub fn duel_win_rate(&self, attacker: EconomyCategory, defender: EconomyCategory) -> f64 {
        if attacker == defender {
            return 0.50;
        }

        match self.duels.get(&(attacker, defender)) {
            Some(p) => *p,
            None => fallback_duel(attacker, defender),
        }
    }

    pub fn map_side_rate(&self, map: &str) -> f64 {
        self.maps.get(map).copied().unwrap_or(NEUTRAL_MAP_RATE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
}

impl WinLoss {
    pub fn samples(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn rate(&self) -> f64 {
        match self.samples() {
            0 => 0.5,
            n => (self.wins as f64 / n as f64).clamp(MIN_PROBABILITY, MAX_PROBABILITY),
        }
    }

    fn add(&mut self, other: WinLoss) {
        self.wins += other.wins;
        self.losses += other.losses;
    }
}

/// Aggregated win/loss counts the tables can be rebuilt from.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "ObservationFile", into = "ObservationFile")]
pub struct TableObservations {
    states: HashMap<StateKey, WinLoss>,
    duels: HashMap<(EconomyCategory, EconomyCategory), WinLoss>,
    maps: HashMap<String, WinLoss>,
}

impl TableObservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_state(&mut self, key: StateKey, t_won: bool) {
        let entry = self.states.entry(key).or_default();
        if t_won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
    }

    /// Records a duel won by `winner`. The loser's side of the matchup is recorded as a loss, a
    /// mirror matchup only once.
    pub fn record_duel(&mut self, winner: EconomyCategory, loser: EconomyCategory) {
        self.duels.entry((winner, loser)).or_default().wins += 1;
        if winner != loser {
            self.duels.entry((loser, winner)).or_default().losses += 1;
        }
    }

    pub fn record_map_round(&mut self, map: &str, t_won: bool) {
        let entry = self.maps.entry(map.to_owned()).or_default();
        if t_won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
    }

    pub fn state(&self, key: StateKey) -> WinLoss {
        self.states.get(&key).copied().unwrap_or_default()
    }

    pub fn duel(&self, attacker: EconomyCategory, defender: EconomyCategory) -> WinLoss {
        self.duels
            .get(&(attacker, defender))
            .copied()
            .unwrap_or_default()
    }

    pub fn map(&self, map: &str) -> WinLoss {
        self.maps.get(map).copied().unwrap_or_default()
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ObservationFile {
    #[serde(default)]
    states: Vec<StateRecord>,
    #[serde(default)]
    duels: Vec<DuelRecord>,
    #[serde(default)]
    maps: Vec<MapRecord>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateRecord {
    #[serde(flatten)]
    key: StateKey,
    #[serde(flatten)]
    counts: WinLoss,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct DuelRecord {
    attacker: EconomyCategory,
    defender: EconomyCategory,
    #[serde(flatten)]
    counts: WinLoss,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct MapRecord {
    map: String,
    #[serde(flatten)]
    counts: WinLoss,
}

impl From<ObservationFile> for TableObservations {
    fn from(file: ObservationFile) -> Self {
        let mut observations = TableObservations::default();
        for record in file.states {
            observations
                .states
                .entry(record.key)
                .or_default()
                .add(record.counts);
        }
        for record in file.duels {
            observations
                .duels
                .entry((record.attacker, record.defender))
                .or_default()
                .add(record.counts);
        }
        for record in file.maps {
            observations
                .maps
                .entry(record.map)
                .or_default()
                .add(record.counts);
        }
        observations
    }
}

impl From<TableObservations> for ObservationFile {
    fn from(observations: TableObservations) -> Self {
        let mut states: Vec<_> = observations
            .states
            .into_iter()
            .map(|(key, counts)| StateRecord { key, counts })
            .collect();
        states.sort_unstable_by_key(|r| r.key);

        let mut duels: Vec<_> = observations
            .duels
            .into_iter()
            .map(|((attacker, defender), counts)| DuelRecord {
                attacker,
                defender,
                counts,
            })
            .collect();
        duels.sort_unstable_by_key(|r| (r.attacker, r.defender));

        let mut maps: Vec<_> = observations
            .maps
            .into_iter()
            .map(|(map, counts)| MapRecord { map, counts })
            .collect();
        maps.sort_unstable_by(|a, b| a.map.cmp(&b.map));

        Self {
            states,
            duels,
            maps,
        }
    }
}
