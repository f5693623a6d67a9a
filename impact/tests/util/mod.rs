#![allow(dead_code)]

use impact::batch::MatchInput;
use impact::driver::{GameEvent, RosterEntry};
use impact::{PlayerId, Side};

pub const MAP: &str = "de_testbed";

pub fn t(n: u64) -> PlayerId {
    assert!((1..=5).contains(&n));
    PlayerId(n)
}

pub fn ct(n: u64) -> PlayerId {
    assert!((1..=5).contains(&n));
    PlayerId(n + 5)
}

pub fn side_of(player: PlayerId) -> Side {
    if player.0 <= 5 {
        Side::T
    } else {
        Side::CT
    }
}

pub fn roster(equipment_t: u32, equipment_ct: u32) -> Vec<RosterEntry> {
    (1..=10)
        .map(|id| {
            let player = PlayerId(id);
            let side = side_of(player);
            let equipment_value = match side {
                Side::T => equipment_t,
                Side::CT => equipment_ct,
            };
            RosterEntry {
                player,
                side,
                money: 800,
                money_spent: equipment_value,
                equipment_value,
            }
        })
        .collect()
}

fn knife_roster() -> Vec<RosterEntry> {
    (1..=10)
        .map(|id| RosterEntry {
            player: PlayerId(id),
            side: side_of(PlayerId(id)),
            money: 0,
            money_spent: 0,
            equipment_value: 0,
        })
        .collect()
}

/// Builds an event stream, times passed to the event methods are relative to the round start.
pub struct MatchBuilder {
    events: Vec<GameEvent>,
    round_start: f64,
}

impl MatchBuilder {
    pub fn new() -> Self {
        Self {
            events: vec![GameEvent::MatchStart],
            round_start: 0.0,
        }
    }

    pub fn warmup() -> Self {
        Self {
            events: Vec::new(),
            round_start: 0.0,
        }
    }

    pub fn start(mut self) -> Self {
        self.events.push(GameEvent::MatchStart);
        self
    }

    pub fn round(mut self, equipment_t: u32, equipment_ct: u32) -> Self {
        self.round_start += 200.0;
        self.events.push(GameEvent::RoundStart {
            time: self.round_start,
            roster: roster(equipment_t, equipment_ct),
        });
        self.events.push(GameEvent::FreezeEnd {
            time: self.round_start,
            roster: roster(equipment_t, equipment_ct),
        });
        self
    }

    pub fn knife_round(mut self) -> Self {
        self.round_start += 200.0;
        self.events.push(GameEvent::RoundStart {
            time: self.round_start,
            roster: knife_roster(),
        });
        self.events.push(GameEvent::FreezeEnd {
            time: self.round_start,
            roster: knife_roster(),
        });
        self
    }

    pub fn kill(mut self, at: f64, killer: PlayerId, victim: PlayerId) -> Self {
        self.events.push(GameEvent::Kill {
            time: self.round_start + at,
            killer,
            victim: Some(victim),
            headshot: false,
            assister: None,
        });
        self
    }

    pub fn kill_assisted(
        mut self,
        at: f64,
        killer: PlayerId,
        victim: PlayerId,
        assister: PlayerId,
    ) -> Self {
        self.events.push(GameEvent::Kill {
            time: self.round_start + at,
            killer,
            victim: Some(victim),
            headshot: true,
            assister: Some(assister),
        });
        self
    }

    pub fn suicide(mut self, at: f64, player: PlayerId) -> Self {
        self.events.push(GameEvent::Kill {
            time: self.round_start + at,
            killer: player,
            victim: None,
            headshot: false,
            assister: None,
        });
        self.events.push(GameEvent::Kill {
            time: self.round_start + at,
            killer: player,
            victim: Some(player),
            headshot: false,
            assister: None,
        });
        self
    }

    pub fn damage(mut self, at: f64, attacker: PlayerId, victim: PlayerId, amount: u32) -> Self {
        self.events.push(GameEvent::Damage {
            time: self.round_start + at,
            attacker,
            victim,
            damage: amount,
            attacker_side: side_of(attacker),
            victim_side: side_of(victim),
        });
        self
    }

    pub fn flash(mut self, at: f64, attacker: PlayerId, victim: PlayerId, duration: f64) -> Self {
        self.events.push(GameEvent::Flashed {
            time: self.round_start + at,
            attacker,
            victim,
            duration,
            attacker_side: side_of(attacker),
            victim_side: side_of(victim),
        });
        self
    }

    pub fn plant(mut self, at: f64, player: PlayerId) -> Self {
        self.events.push(GameEvent::BombPlanted {
            time: self.round_start + at,
            player,
        });
        self
    }

    pub fn defuse(mut self, at: f64, player: PlayerId) -> Self {
        self.events.push(GameEvent::BombDefused {
            time: self.round_start + at,
            player,
        });
        self
    }

    pub fn explode(mut self, at: f64) -> Self {
        self.events.push(GameEvent::BombExploded {
            time: self.round_start + at,
        });
        self
    }

    pub fn end(mut self, at: f64, winner: Side) -> Self {
        self.events.push(GameEvent::RoundEnd {
            time: self.round_start + at,
            winner,
        });
        self
    }

    /// Round where T wins by eliminating every CT, T1 taking the first kills.
    pub fn t_sweep(self, equipment_t: u32, equipment_ct: u32) -> Self {
        self.round(equipment_t, equipment_ct)
            .damage(10.0, t(2), ct(1), 40)
            .kill(12.0, t(1), ct(1))
            .kill(14.0, t(1), ct(2))
            .kill(20.0, t(3), ct(3))
            .kill(25.0, t(4), ct(4))
            .kill(30.0, t(5), ct(5))
            .end(31.0, Side::T)
    }

    /// Round where CT retakes and defuses after a plant.
    pub fn ct_retake(self, equipment_t: u32, equipment_ct: u32) -> Self {
        self.round(equipment_t, equipment_ct)
            .kill(15.0, t(1), ct(1))
            .plant(30.0, t(2))
            .flash(40.0, ct(2), t(3), 2.5)
            .kill(41.0, ct(3), t(3))
            .kill(43.0, ct(3), t(4))
            .kill(45.0, ct(4), t(5))
            .kill(50.0, ct(5), t(2))
            .kill(52.0, ct(5), t(1))
            .defuse(58.0, ct(2))
            .end(58.0, Side::CT)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn build(self) -> MatchInput {
        MatchInput {
            map: MAP.to_owned(),
            events: self.events,
        }
    }
}

pub fn sample_match() -> MatchInput {
    MatchBuilder::new()
        .knife_round()
        .kill(5.0, t(1), ct(1))
        .end(20.0, Side::T)
        .t_sweep(700, 800)
        .ct_retake(1200, 3000)
        .ct_retake(4700, 5200)
        .t_sweep(5400, 4900)
        .round(4700, 5000)
        .kill(20.0, ct(1), t(1))
        .kill(22.0, t(2), ct(1))
        .kill(30.0, ct(2), t(2))
        .kill(31.0, ct(2), t(3))
        .kill(33.0, ct(2), t(4))
        .kill(40.0, t(5), ct(2))
        .kill(45.0, t(5), ct(3))
        .kill(50.0, ct(4), t(5))
        .end(51.0, Side::CT)
        .build()
}
