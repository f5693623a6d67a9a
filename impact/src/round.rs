use std::sync::Arc;

use common::Side;

use crate::economy::EconomyCategory;
use crate::tables::StateKey;

/// Seconds between the plant and the explosion.
pub const BOMB_TIMER: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Live,
    Planted,
    Defused,
    Exploded,
    Ended,
}

/// Snapshot of a single round the probability engine reads and events mutate.
///
/// A fresh instance is created for every round. Alive counts only ever go down and a planted bomb
/// stays planted.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    map: Arc<str>,
    roster: [u8; 2],
    alive: [u8; 2],
    economy: [EconomyCategory; 2],
    plant_time: Option<f64>,
    time_remaining: f64,
    bomb_defused: bool,
    bomb_exploded: bool,
    ended: bool,
}

impl RoundState {
    pub fn new(
        map: Arc<str>,
        roster_t: u8,
        roster_ct: u8,
        economy_t: EconomyCategory,
        economy_ct: EconomyCategory,
    ) -> Self {
        Self {
            map,
            roster: [roster_t, roster_ct],
            alive: [roster_t, roster_ct],
            economy: [economy_t, economy_ct],
            plant_time: None,
            time_remaining: BOMB_TIMER,
            bomb_defused: false,
            bomb_exploded: false,
            ended: false,
        }
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn roster(&self, side: Side) -> u8 {
        self.roster[side.index()]
    }

    pub fn alive(&self, side: Side) -> u8 {
        self.alive[side.index()]
    }

    pub fn economy(&self, side: Side) -> EconomyCategory {
        self.economy[side.index()]
    }

    pub fn bomb_planted(&self) -> bool {
        self.plant_time.is_some()
    }

    pub fn bomb_defused(&self) -> bool {
        self.bomb_defused
    }

    pub fn bomb_exploded(&self) -> bool {
        self.bomb_exploded
    }

    /// Seconds left on the bomb, only meaningful once it is planted.
    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn phase(&self) -> RoundPhase {
        if self.ended {
            RoundPhase::Ended
        } else if self.bomb_exploded {
            RoundPhase::Exploded
        } else if self.bomb_defused {
            RoundPhase::Defused
        } else if self.bomb_planted() {
            RoundPhase::Planted
        } else {
            RoundPhase::Live
        }
    }

    pub fn key(&self) -> StateKey {
        StateKey::new(
            self.alive(Side::T),
            self.alive(Side::CT),
            self.bomb_planted(),
        )
    }

    /// The side that has already won, if the round is decided by its state alone.
    pub fn decided(&self) -> Option<Side> {
        if self.bomb_exploded {
            return Some(Side::T);
        }
        if self.bomb_defused {
            return Some(Side::CT);
        }
        if self.alive(Side::CT) == 0 {
            return Some(Side::T);
        }
        if self.alive(Side::T) == 0 && !self.bomb_planted() {
            return Some(Side::CT);
        }
        None
    }

    pub fn record_death(&mut self, side: Side) {
        let alive = &mut self.alive[side.index()];
        *alive = alive.saturating_sub(1);
    }

    /// Plants the bomb at `time`. Planting twice is ignored.
    pub fn plant(&mut self, time: f64) {
        if self.plant_time.is_some() {
            return;
        }
        self.plant_time = Some(time);
        self.time_remaining = BOMB_TIMER;
    }

    pub fn defuse(&mut self) {
        if self.bomb_planted() && !self.bomb_exploded {
            self.bomb_defused = true;
        }
    }

    pub fn explode(&mut self) {
        if self.bomb_planted() && !self.bomb_defused {
            self.bomb_exploded = true;
            self.time_remaining = 0.0;
        }
    }

    /// Moves the bomb clock forward to `now`.
    pub fn advance_clock(&mut self, now: f64) {
        if let Some(plant_time) = self.plant_time {
            if !self.bomb_exploded && !self.bomb_defused {
                self.time_remaining = (BOMB_TIMER - (now - plant_time)).clamp(0.0, BOMB_TIMER);
            }
        }
    }

    pub fn set_time_remaining(&mut self, seconds: f64) {
        self.time_remaining = seconds.clamp(0.0, BOMB_TIMER);
    }

    pub fn end(&mut self) {
        self.ended = true;
    }
}
