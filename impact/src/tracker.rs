//! Per round record of who hurt and who blinded whom.

use std::collections::HashMap;

use common::PlayerId;

/// Gap between two hits from the same attacker after which a new engagement starts.
pub const ENGAGEMENT_TIMEOUT: f64 = 5.0;
/// Shortest flash that still counts towards assist credit.
pub const MIN_FLASH_DURATION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AttackerDamage {
    pub attacker: PlayerId,
    /// Damage over the whole round, never reset by a new engagement.
    pub total: u32,
    pub engagement_start: f64,
    pub last_hit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashExposure {
    pub attacker: PlayerId,
    pub duration: f64,
    pub time: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VictimRecord {
    damage: Vec<AttackerDamage>,
    flashes: Vec<FlashExposure>,
}

impl VictimRecord {
    /// Damage per attacker, in the order the attackers first dealt damage.
    pub fn damage(&self) -> &[AttackerDamage] {
        &self.damage
    }

    pub fn flashes(&self) -> &[FlashExposure] {
        &self.flashes
    }

    pub fn total_damage(&self) -> u32 {
        self.damage.iter().map(|d| d.total).sum()
    }

    pub fn damage_by(&self, attacker: PlayerId) -> u32 {
        self.damage
            .iter()
            .find(|d| d.attacker == attacker)
            .map(|d| d.total)
            .unwrap_or(0)
    }

    pub fn damage_contributors(&self, killer: PlayerId) -> Vec<(PlayerId, u32)> {
        self.damage
            .iter()
            .filter(|d| d.attacker != killer && d.total > 0)
            .map(|d| (d.attacker, d.total))
            .collect()
    }

    /// Flash assisters other than the killer, with their longest eligible flash on the victim.
    pub fn flash_contributors(&self, killer: PlayerId) -> Vec<(PlayerId, f64)> {
        let mut contributors: Vec<(PlayerId, f64)> = Vec::new();
        for flash in self
            .flashes
            .iter()
            .filter(|f| f.attacker != killer && f.duration >= MIN_FLASH_DURATION)
        {
            match contributors.iter_mut().find(|(p, _)| *p == flash.attacker) {
                Some((_, duration)) => *duration = duration.max(flash.duration),
                None => contributors.push((flash.attacker, flash.duration)),
            }
        }
        contributors
    }

    fn add_damage(&mut self, attacker: PlayerId, amount: u32, time: f64) {
        match self.damage.iter_mut().find(|d| d.attacker == attacker) {
            Some(entry) => {
                if time - entry.last_hit > ENGAGEMENT_TIMEOUT {
                    entry.engagement_start = time;
                }
                entry.total += amount;
                entry.last_hit = time;
            }
            None => self.damage.push(AttackerDamage {
                attacker,
                total: amount,
                engagement_start: time,
                last_hit: time,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct ContributionTracker {
    victims: HashMap<PlayerId, VictimRecord>,
}

impl ContributionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_damage(&mut self, attacker: PlayerId, victim: PlayerId, amount: u32, time: f64) {
        if amount == 0 {
            return;
        }
        self.victims
            .entry(victim)
            .or_default()
            .add_damage(attacker, amount, time);
    }

    pub fn record_flash(&mut self, attacker: PlayerId, victim: PlayerId, duration: f64, time: f64) {
        self.victims
            .entry(victim)
            .or_default()
            .flashes
            .push(FlashExposure {
                attacker,
                duration,
                time,
            });
    }

    pub fn record(&self, victim: PlayerId) -> Option<&VictimRecord> {
        self.victims.get(&victim)
    }

    /// Removes everything recorded against `victim`, used once a kill on them is processed.
    pub fn take(&mut self, victim: PlayerId) -> VictimRecord {
        self.victims.remove(&victim).unwrap_or_default()
    }

    /// Length of the engagement that ended with `attacker` downing `victim` at `kill_time`.
    ///
    /// `None` if the attacker never damaged the victim before, zero if their last hit is older
    /// than the engagement timeout.
    pub fn time_to_down(
        &self,
        attacker: PlayerId,
        victim: PlayerId,
        kill_time: f64,
    ) -> Option<f64> {
        let entry = self
            .victims
            .get(&victim)?
            .damage
            .iter()
            .find(|d| d.attacker == attacker)?;

        if kill_time - entry.last_hit > ENGAGEMENT_TIMEOUT {
            return Some(0.0);
        }
        Some((kill_time - entry.engagement_start).max(0.0))
    }

    pub fn clear(&mut self) {
        self.victims.clear();
    }
}
