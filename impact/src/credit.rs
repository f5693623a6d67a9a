//! Splitting a probability delta between the players that caused it.

use common::PlayerId;

use crate::events::KillEvent;
use crate::tracker::MIN_FLASH_DURATION;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    pub killer_base_fraction: f64,
    /// Extra killer fraction at a 100% share of the damage on the victim.
    pub killer_damage_bonus: f64,
    /// Multiplier on the killer fraction (and on the reverted pool) for trade kills.
    pub trade_factor: f64,
    pub damage_credit_budget: f64,
    /// Flash duration that earns the full flash credit.
    pub flash_full_duration: f64,
    pub flash_max_fraction: f64,
    pub plant_fraction: f64,
    /// Largest plant credit in either direction.
    pub plant_cap: f64,
    pub defuse_fraction: f64,
    /// Flat bonus for a won clutch, indexed by clutch size 1 to 5.
    pub clutch_bonus: [f64; 5],
    pub hollow_save_penalty: f64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            killer_base_fraction: 0.60,
            killer_damage_bonus: 0.25,
            trade_factor: 0.75,
            damage_credit_budget: 0.35,
            flash_full_duration: 3.0,
            flash_max_fraction: 0.10,
            plant_fraction: 0.60,
            plant_cap: 0.15,
            defuse_fraction: 0.80,
            clutch_bonus: [0.05, 0.10, 0.15, 0.22, 0.30],
            hollow_save_penalty: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ContributionKind {
    Damage,
    Flash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub player: PlayerId,
    pub kind: ContributionKind,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KillAllocation {
    pub killer: PlayerId,
    pub killer_credit: f64,
    pub contributors: Vec<Share>,
    /// Part of a trade kill's pool that stays with the side rather than any player.
    pub unattributed: f64,
}

impl KillAllocation {
    pub fn total(&self) -> f64 {
        let shared: f64 = self.contributors.iter().map(|s| s.amount).sum();
        self.killer_credit + self.unattributed + shared
    }
}

/// Tracks what is left of the shareable part of a delta.
struct CreditPool {
    remaining: f64,
}

impl CreditPool {
    fn claim(&mut self, wanted: f64) -> f64 {
        let granted = wanted.max(0.0).min(self.remaining);
        self.remaining -= granted;
        granted
    }

    fn exhausted(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CreditAttributor<'c> {
    config: &'c CreditConfig,
}

impl<'c> CreditAttributor<'c> {
    pub fn new(config: &'c CreditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c CreditConfig {
        self.config
    }

    pub fn killer_fraction(&self, kill: &KillEvent) -> f64 {
        let mut fraction = self.config.killer_base_fraction
            + self.config.killer_damage_bonus * kill.killer_damage_share();
        if kill.is_trade {
            fraction *= self.config.trade_factor;
        }
        fraction.clamp(0.0, 1.0)
    }

    /// Splits `delta` between the killer, damage contributors and flash assisters.
    ///
    /// Damage contributors are paid in descending damage order and flash assisters in descending
    /// duration order, ties broken by ascending player id. The shares always add up to `delta`.
    pub fn attribute_kill(&self, kill: &KillEvent, delta: f64) -> KillAllocation {
        let delta = delta.max(0.0);
        let fraction = self.killer_fraction(kill);
        let mut pool = CreditPool {
            remaining: delta * (1.0 - fraction),
        };

        let mut contributors = Vec::new();

        let mut damage: Vec<(PlayerId, u32)> = kill
            .damage_contributors
            .iter()
            .copied()
            .filter(|(player, dmg)| *player != kill.killer && *dmg > 0)
            .collect();
        damage.sort_unstable_by(|(a_id, a_dmg), (b_id, b_dmg)| {
            b_dmg.cmp(a_dmg).then(a_id.cmp(b_id))
        });

        if kill.total_damage > 0 {
            for (player, dmg) in damage {
                if pool.exhausted() {
                    break;
                }
                let share = (dmg as f64 / kill.total_damage as f64).min(1.0);
                let amount = pool.claim(delta * self.config.damage_credit_budget * share);
                contributors.push(Share {
                    player,
                    kind: ContributionKind::Damage,
                    amount,
                });
            }
        }

        let mut flashes: Vec<(PlayerId, f64)> = kill
            .flash_contributors
            .iter()
            .copied()
            .filter(|(player, duration)| *player != kill.killer && *duration >= MIN_FLASH_DURATION)
            .collect();
        flashes.sort_unstable_by(|(a_id, a_dur), (b_id, b_dur)| {
            b_dur.total_cmp(a_dur).then(a_id.cmp(b_id))
        });

        for (player, duration) in flashes {
            if pool.exhausted() {
                break;
            }
            let strength = (duration / self.config.flash_full_duration).min(1.0);
            let amount = pool.claim(delta * strength * self.config.flash_max_fraction);
            contributors.push(Share {
                player,
                kind: ContributionKind::Flash,
                amount,
            });
        }

        let unattributed = if kill.is_trade {
            pool.remaining * (1.0 - self.config.trade_factor)
        } else {
            0.0
        };
        let claimed: f64 = contributors.iter().map(|s| s.amount).sum();
        let killer_credit = (delta - claimed - unattributed).max(0.0);

        tracing::trace!(
            killer = %kill.killer,
            delta,
            fraction,
            killer_credit,
            contributors = contributors.len(),
            "Attributed kill"
        );

        KillAllocation {
            killer: kill.killer,
            killer_credit,
            contributors,
            unattributed,
        }
    }

    pub fn plant_credit(&self, delta: f64) -> f64 {
        (delta * self.config.plant_fraction).clamp(-self.config.plant_cap, self.config.plant_cap)
    }

    pub fn defuse_credit(&self, delta: f64) -> f64 {
        delta * self.config.defuse_fraction
    }

    /// Flat bonus for winning a clutch against `size` opponents, saturating at five.
    pub fn clutch_bonus(&self, size: u8) -> f64 {
        match size {
            0 => 0.0,
            n => self.config.clutch_bonus[(n.min(5) - 1) as usize],
        }
    }
}
