//! Composite per match rating.
//!
//! Six components are normalised against a baseline with their own nonlinear transform and summed
//! with fixed weights. A weighted sum of 1.0 is an average performance.

use common::{ComponentKind, PlayerId, RatingBreakdown, RatingComponent};

/// Per player match accumulator.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerMatchStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage: u32,
    pub rounds_played: u32,
    pub rounds_won: u32,
    pub clutch_attempts: u32,
    pub clutch_wins: u32,
    /// Rounds with 2, 3, 4 and 5 kills.
    pub multi_kills: [u32; 4],
    pub eco_kill_value: f64,
    pub eco_death_penalty: f64,
    /// Rounds with a kill, an assist, a survival or a traded death.
    pub kast_rounds: u32,
    pub swing: f64,
    pub save_penalty: f64,
}

impl PlayerMatchStats {
    pub fn record_multi_kill(&mut self, kills: u8) {
        if kills >= 2 {
            self.multi_kills[(kills.min(5) - 2) as usize] += 1;
        }
    }

    pub fn merge(&mut self, other: &PlayerMatchStats) {
        self.kills += other.kills;
        self.deaths += other.deaths;
        self.assists += other.assists;
        self.damage += other.damage;
        self.rounds_played += other.rounds_played;
        self.rounds_won += other.rounds_won;
        self.clutch_attempts += other.clutch_attempts;
        self.clutch_wins += other.clutch_wins;
        for (mine, theirs) in self.multi_kills.iter_mut().zip(other.multi_kills.iter()) {
            *mine += theirs;
        }
        self.eco_kill_value += other.eco_kill_value;
        self.eco_death_penalty += other.eco_death_penalty;
        self.kast_rounds += other.kast_rounds;
        self.swing += other.swing;
        self.save_penalty += other.save_penalty;
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub kill_rate: f64,
    pub death_rate: f64,
    pub damage: f64,
    pub swing: f64,
    pub multi_kill: f64,
    pub consistency: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            kill_rate: 0.24,
            death_rate: 0.16,
            damage: 0.18,
            swing: 0.22,
            multi_kill: 0.08,
            consistency: 0.12,
        }
    }
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.kill_rate
            + self.death_rate
            + self.damage
            + self.swing
            + self.multi_kill
            + self.consistency
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub min_rating: f64,
    pub max_rating: f64,
    pub kill_baseline: f64,
    pub death_baseline: f64,
    pub damage_baseline: f64,
    pub swing_baseline: f64,
    pub multi_kill_baseline: f64,
    pub kast_baseline: f64,
    pub clutch_fail_penalty: f64,
    pub weights: ComponentWeights,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            min_rating: 0.10,
            max_rating: 3.00,
            kill_baseline: 0.70,
            death_baseline: 0.68,
            damage_baseline: 78.0,
            swing_baseline: 0.06,
            multi_kill_baseline: 0.20,
            kast_baseline: 0.72,
            clutch_fail_penalty: 0.02,
            weights: ComponentWeights::default(),
        }
    }
}

pub fn kill_rate_multiplier(ratio: f64) -> f64 {
    if ratio < 1.0 {
        1.0 - (1.0 - ratio) * 0.8
    } else if ratio < 1.5 {
        ratio
    } else {
        1.5 + (ratio - 1.5) * 0.5
    }
}

pub fn death_rate_multiplier(ratio: f64) -> f64 {
    let m = if ratio < 1.0 {
        1.0 + (1.0 - ratio) * 1.2
    } else {
        1.0 - (ratio - 1.0) * 0.6
    };
    m.clamp(0.3, 1.9)
}

pub fn damage_multiplier(ratio: f64) -> f64 {
    if ratio < 0.5 {
        0.4 + ratio * 0.6
    } else if ratio < 1.0 {
        0.7 + (ratio - 0.5) * 0.6
    } else if ratio < 1.5 {
        1.0 + (ratio - 1.0) * 0.8
    } else {
        1.4 + (ratio - 1.5) * 0.4
    }
}

/// `difference` is swing per round minus the baseline.
pub fn swing_multiplier(difference: f64) -> f64 {
    let m = if difference >= 0.05 {
        1.25 + (difference - 0.05) * 1.5
    } else if difference >= 0.0 {
        1.0 + difference * 5.0
    } else {
        1.0 + difference * 4.0
    };
    m.clamp(0.6, 1.4)
}

/// Multi-kill multiplier, with anything above neutral scaled down by `performance` when that is
/// below one.
pub fn multi_kill_multiplier(per_round: f64, baseline: f64, performance: f64) -> f64 {
    let raw = 1.0 + (per_round - baseline) * 1.5;
    let deflated = if raw > 1.0 {
        1.0 + (raw - 1.0) * performance.clamp(0.0, 1.0)
    } else {
        raw
    };
    deflated.clamp(0.7, 1.6)
}

pub fn consistency_multiplier(kast: f64) -> f64 {
    if kast >= 0.8 {
        1.15 + (kast - 0.8)
    } else if kast >= 0.6 {
        0.9 + (kast - 0.6) * 1.25
    } else {
        0.6 + kast * 0.5
    }
}

/// Weighted rounds with 2 to 5 kills, each extra kill doubling the weight.
pub fn multi_kill_score(multi_kills: &[u32; 4]) -> f64 {
    multi_kills
        .iter()
        .enumerate()
        .map(|(i, count)| *count as f64 * f64::powi(2.0, i as i32))
        .sum()
}

#[derive(Debug, Clone, Copy)]
pub struct RatingComposer<'c> {
    config: &'c RatingConfig,
}

impl<'c> RatingComposer<'c> {
    pub fn new(config: &'c RatingConfig) -> Self {
        Self { config }
    }

    pub fn rating(&self, stats: &PlayerMatchStats) -> f64 {
        self.compose(PlayerId(0), stats).rating
    }

    pub fn clutch_penalty(&self, stats: &PlayerMatchStats) -> f64 {
        if stats.clutch_attempts > 0 && stats.clutch_wins == 0 {
            self.config.clutch_fail_penalty * stats.clutch_attempts as f64
        } else {
            0.0
        }
    }

    pub fn compose(&self, player: PlayerId, stats: &PlayerMatchStats) -> RatingBreakdown {
        let config = self.config;
        let weights = &config.weights;

        let components = if stats.rounds_played == 0 {
            vec![
                neutral(ComponentKind::KillRate, config.kill_baseline, weights.kill_rate),
                neutral(ComponentKind::DeathRate, config.death_baseline, weights.death_rate),
                neutral(ComponentKind::Damage, config.damage_baseline, weights.damage),
                neutral(ComponentKind::Swing, config.swing_baseline, weights.swing),
                neutral(ComponentKind::MultiKill, config.multi_kill_baseline, weights.multi_kill),
                neutral(ComponentKind::Consistency, config.kast_baseline, weights.consistency),
            ]
        } else {
            let rounds = stats.rounds_played as f64;

            let kpr = stats.eco_kill_value / rounds;
            let kill_mult = kill_rate_multiplier(kpr / config.kill_baseline);

            let dpr = stats.eco_death_penalty / rounds;
            let death_mult = death_rate_multiplier(dpr / config.death_baseline);

            let adr = stats.damage as f64 / rounds;
            let damage_mult = damage_multiplier(adr / config.damage_baseline);

            let spr = (stats.swing - stats.save_penalty) / rounds;
            let swing_mult = swing_multiplier(spr - config.swing_baseline);

            let mk = multi_kill_score(&stats.multi_kills) / rounds;
            let performance = (kill_mult + damage_mult) / 2.0;
            let mk_mult = multi_kill_multiplier(mk, config.multi_kill_baseline, performance);

            let kast = stats.kast_rounds as f64 / rounds;
            let kast_mult = consistency_multiplier(kast);

            vec![
                component(
                    ComponentKind::KillRate,
                    kpr,
                    config.kill_baseline,
                    kill_mult,
                    weights.kill_rate,
                ),
                component(
                    ComponentKind::DeathRate,
                    dpr,
                    config.death_baseline,
                    death_mult,
                    weights.death_rate,
                ),
                component(
                    ComponentKind::Damage,
                    adr,
                    config.damage_baseline,
                    damage_mult,
                    weights.damage,
                ),
                component(
                    ComponentKind::Swing,
                    spr,
                    config.swing_baseline,
                    swing_mult,
                    weights.swing,
                ),
                component(
                    ComponentKind::MultiKill,
                    mk,
                    config.multi_kill_baseline,
                    mk_mult,
                    weights.multi_kill,
                ),
                component(
                    ComponentKind::Consistency,
                    kast,
                    config.kast_baseline,
                    kast_mult,
                    weights.consistency,
                ),
            ]
        };

        let weighted: f64 = components.iter().map(|c| c.contribution).sum();
        let clutch_penalty = self.clutch_penalty(stats);
        let rating = (weighted - clutch_penalty).clamp(config.min_rating, config.max_rating);

        tracing::trace!(%player, weighted, clutch_penalty, rating, "Composed rating");

        RatingBreakdown {
            player,
            rounds_played: stats.rounds_played,
            components,
            clutch_penalty,
            rating,
        }
    }
}

fn component(
    kind: ComponentKind,
    raw: f64,
    baseline: f64,
    multiplier: f64,
    weight: f64,
) -> RatingComponent {
    RatingComponent {
        kind,
        raw,
        baseline,
        multiplier,
        weight,
        contribution: multiplier * weight,
    }
}

fn neutral(kind: ComponentKind, baseline: f64, weight: f64) -> RatingComponent {
    component(kind, 0.0, baseline, 1.0, weight)
}
