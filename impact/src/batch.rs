//! Scoring several independent matches.
//!
//! Matches share nothing, so every match runs on its own worker with its own driver. Cross match
//! totals are reduced afterwards on the calling thread.

use std::collections::BTreeMap;

use common::{PlayerId, RatingBreakdown};
use rayon::prelude::*;

use crate::driver::{DriverConfig, GameEvent, MatchDriver, MatchResult};
use crate::rating::{PlayerMatchStats, RatingComposer, RatingConfig};
use crate::tables::ProbabilityTables;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchInput {
    pub map: String,
    pub events: Vec<GameEvent>,
}

impl MatchInput {
    pub fn from_json(content: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(content)?)
    }
}

pub fn score_match(
    tables: &ProbabilityTables,
    config: &DriverConfig,
    input: &MatchInput,
) -> Result<MatchResult, crate::Error> {
    let _guard = tracing::info_span!("Match", map = %input.map).entered();

    let mut driver = MatchDriver::new(tables, config, &input.map);
    for event in input.events.iter().cloned() {
        driver.handle(event)?;
    }

    Ok(driver.finish())
}

/// Scores every match in parallel. Results keep the order of `inputs`.
pub fn score_matches(
    tables: &ProbabilityTables,
    config: &DriverConfig,
    inputs: &[MatchInput],
) -> Vec<Result<MatchResult, crate::Error>> {
    tracing::info!(matches = inputs.len(), "Scoring matches");

    inputs
        .par_iter()
        .map(|input| score_match(tables, config, input))
        .collect()
}

/// Sums the per match accumulators of every player.
pub fn aggregate<'r, I>(results: I) -> BTreeMap<PlayerId, PlayerMatchStats>
where
    I: IntoIterator<Item = &'r MatchResult>,
{
    let mut totals: BTreeMap<PlayerId, PlayerMatchStats> = BTreeMap::new();
    for result in results {
        for player in result.players.iter() {
            totals.entry(player.player).or_default().merge(&player.stats);
        }
    }
    totals
}

pub fn rate_totals(
    config: &RatingConfig,
    totals: &BTreeMap<PlayerId, PlayerMatchStats>,
) -> Vec<RatingBreakdown> {
    let composer = RatingComposer::new(config);
    totals
        .iter()
        .map(|(player, stats)| composer.compose(*player, stats))
        .collect()
}
