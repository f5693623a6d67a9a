use common::{PlayerId, Side};

/// A scoring event within a round.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Kill(KillEvent),
    BombPlant { time: f64, planter: PlayerId },
    BombDefuse { time: f64, defuser: PlayerId },
    BombExplode { time: f64 },
}

impl Event {
    pub fn time(&self) -> f64 {
        match self {
            Self::Kill(kill) => kill.time,
            Self::BombPlant { time, .. } => *time,
            Self::BombDefuse { time, .. } => *time,
            Self::BombExplode { time } => *time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub time: f64,
    pub killer: PlayerId,
    pub victim: PlayerId,
    pub killer_side: Side,
    pub victim_side: Side,
    pub killer_equipment: u32,
    pub victim_equipment: u32,
    pub is_trade: bool,
    pub is_headshot: bool,
    /// Damage the victim took from all attackers before this kill.
    pub total_damage: u32,
    /// Part of `total_damage` dealt by the killer.
    pub killer_damage: u32,
    pub damage_contributors: Vec<(PlayerId, u32)>,
    pub flash_contributors: Vec<(PlayerId, f64)>,
    pub time_to_down: Option<f64>,
}

impl KillEvent {
    /// A kill without any recorded damage or flashes on the victim.
    pub fn simple(
        time: f64,
        killer: PlayerId,
        killer_side: Side,
        victim: PlayerId,
        victim_side: Side,
    ) -> Self {
        Self {
            time,
            killer,
            victim,
            killer_side,
            victim_side,
            killer_equipment: 0,
            victim_equipment: 0,
            is_trade: false,
            is_headshot: false,
            total_damage: 0,
            killer_damage: 0,
            damage_contributors: Vec::new(),
            flash_contributors: Vec::new(),
            time_to_down: None,
        }
    }

    pub fn is_team_kill(&self) -> bool {
        self.killer_side == self.victim_side
    }

    pub fn killer_damage_share(&self) -> f64 {
        if self.total_damage == 0 {
            return 0.0;
        }
        (self.killer_damage as f64 / self.total_damage as f64).clamp(0.0, 1.0)
    }
}
