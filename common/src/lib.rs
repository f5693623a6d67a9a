pub mod report;

/// Identity of a player as handed to us by the event source (the steam id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PlayerId(pub u64);

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Side {
    /// The planting side. All base win probabilities are expressed for this side.
    T,
    CT,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::T, Side::CT];

    pub fn opponent(self) -> Self {
        match self {
            Self::T => Self::CT,
            Self::CT => Self::T,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::T => 0,
            Self::CT => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImpactTag {
    OpeningKill,
    OpeningDeath,
    TradeKill,
    EcoKill,
    MultiKill(u8),
    ClutchWin(u8),
    ClutchLoss(u8),
    BombPlant,
    BombDefuse,
    HollowSave,
}

impl core::fmt::Display for ImpactTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OpeningKill => write!(f, "opening kill"),
            Self::OpeningDeath => write!(f, "opening death"),
            Self::TradeKill => write!(f, "trade kill"),
            Self::EcoKill => write!(f, "eco kill"),
            Self::MultiKill(n) => write!(f, "{}k round", n),
            Self::ClutchWin(n) => write!(f, "clutch win (1v{})", n),
            Self::ClutchLoss(n) => write!(f, "clutch loss (1v{})", n),
            Self::BombPlant => write!(f, "bomb plant"),
            Self::BombDefuse => write!(f, "bomb defuse"),
            Self::HollowSave => write!(f, "hollow save"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ComponentKind {
    KillRate,
    DeathRate,
    Damage,
    Swing,
    MultiKill,
    Consistency,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RatingComponent {
    pub kind: ComponentKind,
    pub raw: f64,
    pub baseline: f64,
    pub multiplier: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RatingBreakdown {
    pub player: PlayerId,
    pub rounds_played: u32,
    pub components: Vec<RatingComponent>,
    pub clutch_penalty: f64,
    pub rating: f64,
}

impl RatingBreakdown {
    pub fn component(&self, kind: ComponentKind) -> Option<&RatingComponent> {
        self.components.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundBreakdown {
    pub player: PlayerId,
    pub swing: f64,
    pub save_penalty: f64,
    pub side: Side,
    pub pistol_round: bool,
    pub team_won: bool,
    pub tags: Vec<ImpactTag>,
}
