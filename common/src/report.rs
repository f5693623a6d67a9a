use crate::{PlayerId, RatingBreakdown, RoundBreakdown, Side};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchReport {
    pub map: String,
    pub players: Vec<PlayerReport>,
    pub rounds: Vec<RoundReport>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerReport {
    pub player: PlayerId,
    pub swing: f64,
    pub rating: RatingBreakdown,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundReport {
    pub number: u32,
    pub winner: Side,
    pub pistol_round: bool,
    /// Win probability of the T side after every processed event, starting with the freeze end.
    pub t_probability: Vec<f64>,
    pub fastest_down: Option<f64>,
    pub players: Vec<RoundBreakdown>,
}
