//! Round by round swing accounting.
//!
//! The orchestrator owns the [`RoundState`] of the running round, feeds every event through the
//! [`ProbabilityEngine`] and hands the resulting deltas to the [`CreditAttributor`].

use std::collections::BTreeMap;
use std::sync::Arc;

use common::report::RoundReport;
use common::{ImpactTag, PlayerId, RoundBreakdown, Side};

use crate::credit::{CreditAttributor, CreditConfig};
use crate::economy::EconomyCategory;
use crate::engine::ProbabilityEngine;
use crate::events::{Event, KillEvent};
use crate::round::RoundState;
use crate::tables::ProbabilityTables;

/// Tier gap from killer up to victim at which a kill counts as an eco kill.
const ECO_KILL_TIER_GAP: i32 = 2;

#[derive(Debug, Clone)]
pub struct RoundSetup {
    pub number: u32,
    pub map: Arc<str>,
    pub roster: Vec<(PlayerId, Side)>,
    pub economy_t: EconomyCategory,
    pub economy_ct: EconomyCategory,
    pub pistol_round: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRound {
    pub player: PlayerId,
    pub side: Side,
    pub alive: bool,
    pub kills: u8,
    /// Credit from kills, assists, bomb interactions and clutch bonuses.
    pub swing: f64,
    /// Kept apart from `swing`, the composer decides how to combine both.
    pub save_penalty: f64,
    /// Number of opponents alive when the player was left alone.
    pub clutch: Option<u8>,
    pub clutch_won: bool,
    pub tags: Vec<ImpactTag>,
}

impl PlayerRound {
    fn new(player: PlayerId, side: Side) -> Self {
        Self {
            player,
            side,
            alive: true,
            kills: 0,
            swing: 0.0,
            save_penalty: 0.0,
            clutch: None,
            clutch_won: false,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub number: u32,
    pub winner: Side,
    pub pistol_round: bool,
    pub t_probability: Vec<f64>,
    pub fastest_down: Option<f64>,
    /// Ordered by player id.
    pub players: Vec<PlayerRound>,
}

impl RoundOutcome {
    pub fn player(&self, player: PlayerId) -> Option<&PlayerRound> {
        self.players.iter().find(|p| p.player == player)
    }

    pub fn breakdown(&self) -> Vec<RoundBreakdown> {
        self.players
            .iter()
            .map(|p| RoundBreakdown {
                player: p.player,
                swing: p.swing,
                save_penalty: p.save_penalty,
                side: p.side,
                pistol_round: self.pistol_round,
                team_won: p.side == self.winner,
                tags: p.tags.clone(),
            })
            .collect()
    }

    pub fn report(&self) -> RoundReport {
        RoundReport {
            number: self.number,
            winner: self.winner,
            pistol_round: self.pistol_round,
            t_probability: self.t_probability.clone(),
            fastest_down: self.fastest_down,
            players: self.breakdown(),
        }
    }
}

/// What a single processed event changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSwing {
    pub t_before: f64,
    pub t_after: f64,
    pub credits: Vec<(PlayerId, f64)>,
}

struct ActiveRound {
    number: u32,
    pistol_round: bool,
    state: RoundState,
    players: BTreeMap<PlayerId, PlayerRound>,
    opening_done: bool,
    clutches: [Option<(PlayerId, u8)>; 2],
    t_probability: Vec<f64>,
    fastest_down: Option<f64>,
}

impl ActiveRound {
    fn detect_clutches(&mut self) {
        for side in Side::BOTH {
            if self.clutches[side.index()].is_some() {
                continue;
            }
            let opponents = self.state.alive(side.opponent());
            if self.state.alive(side) != 1 || opponents == 0 {
                continue;
            }

            let survivor = self
                .players
                .values_mut()
                .find(|p| p.side == side && p.alive);
            if let Some(survivor) = survivor {
                survivor.clutch = Some(opponents);
                self.clutches[side.index()] = Some((survivor.player, opponents));
                tracing::trace!(player = %survivor.player, opponents, "Clutch situation");
            }
        }
    }
}

pub struct SwingOrchestrator<'a> {
    engine: ProbabilityEngine<'a>,
    credit: CreditAttributor<'a>,
    round: Option<ActiveRound>,
    swing: BTreeMap<PlayerId, f64>,
    save_penalties: BTreeMap<PlayerId, f64>,
}

impl<'a> SwingOrchestrator<'a> {
    pub fn new(tables: &'a ProbabilityTables, config: &'a CreditConfig) -> Self {
        Self {
            engine: ProbabilityEngine::new(tables),
            credit: CreditAttributor::new(config),
            round: None,
            swing: BTreeMap::new(),
            save_penalties: BTreeMap::new(),
        }
    }

    pub fn engine(&self) -> ProbabilityEngine<'a> {
        self.engine
    }

    /// Starts a round from scratch, nothing of a previous round carries over.
    pub fn start_round(&mut self, setup: RoundSetup) {
        if let Some(previous) = self.round.take() {
            tracing::warn!(round = previous.number, "Discarding unfinished round");
        }

        let roster_t = setup.roster.iter().filter(|(_, s)| *s == Side::T).count() as u8;
        let roster_ct = setup.roster.iter().filter(|(_, s)| *s == Side::CT).count() as u8;
        let state = RoundState::new(
            setup.map,
            roster_t,
            roster_ct,
            setup.economy_t,
            setup.economy_ct,
        );

        let players = setup
            .roster
            .iter()
            .map(|(player, side)| (*player, PlayerRound::new(*player, *side)))
            .collect();

        let initial = self.engine.win_probability(&state, Side::T);
        tracing::debug!(
            round = setup.number,
            roster_t,
            roster_ct,
            t_probability = initial,
            "Round started"
        );

        let mut round = ActiveRound {
            number: setup.number,
            pistol_round: setup.pistol_round,
            state,
            players,
            opening_done: false,
            clutches: [None, None],
            t_probability: vec![initial],
            fastest_down: None,
        };
        // Short rosters can open the round as a clutch.
        round.detect_clutches();
        self.round = Some(round);
    }

    /// Drops the running round without scoring it.
    pub fn discard_round(&mut self) {
        self.round = None;
    }

    pub fn in_round(&self) -> bool {
        self.round.is_some()
    }

    pub fn state(&self) -> Option<&RoundState> {
        self.round.as_ref().map(|r| &r.state)
    }

    pub fn win_probability(&self, side: Side) -> Option<f64> {
        self.state()
            .map(|state| self.engine.win_probability(state, side))
    }

    pub fn process(&mut self, event: &Event) -> Option<EventSwing> {
        let engine = self.engine;
        let credit = self.credit;

        let round = match self.round.as_mut() {
            Some(r) => r,
            None => {
                tracing::warn!(?event, "Event outside of a round");
                return None;
            }
        };

        round.state.advance_clock(event.time());
        let t_before = engine.win_probability(&round.state, Side::T);

        let credits = match event {
            Event::Kill(kill) => process_kill(engine, credit, round, kill),
            Event::BombPlant { time, planter } => {
                if round.state.bomb_planted() {
                    tracing::warn!(player = %planter, "Bomb planted twice");
                    Vec::new()
                } else {
                    let delta = engine.plant_delta(&round.state, *time);
                    round.state.plant(*time);
                    if let Some(p) = round.players.get_mut(planter) {
                        p.tags.push(ImpactTag::BombPlant);
                    }
                    vec![(*planter, credit.plant_credit(delta))]
                }
            }
            Event::BombDefuse { defuser, .. } => {
                if !round.state.bomb_planted()
                    || round.state.bomb_defused()
                    || round.state.bomb_exploded()
                {
                    tracing::warn!(player = %defuser, "Defuse without a live bomb");
                    Vec::new()
                } else {
                    let delta = engine.defuse_delta(&round.state);
                    round.state.defuse();
                    if let Some(p) = round.players.get_mut(defuser) {
                        p.tags.push(ImpactTag::BombDefuse);
                    }
                    vec![(*defuser, credit.defuse_credit(delta))]
                }
            }
            Event::BombExplode { .. } => {
                round.state.explode();
                Vec::new()
            }
        };

        let t_after = engine.win_probability(&round.state, Side::T);
        round.t_probability.push(t_after);

        // Match totals only see the round once it ends.
        for (player, amount) in credits.iter() {
            if let Some(p) = round.players.get_mut(player) {
                p.swing += amount;
            }
        }

        Some(EventSwing {
            t_before,
            t_after,
            credits,
        })
    }

    pub fn end_round(&mut self, winner: Side) -> Option<RoundOutcome> {
        let mut round = self.round.take()?;
        round.state.end();

        let config = self.credit.config();
        for player in round.players.values_mut() {
            if player.kills >= 2 {
                player.tags.push(ImpactTag::MultiKill(player.kills));
            }
            if player.alive && player.side != winner {
                player.save_penalty = config.hollow_save_penalty;
                player.tags.push(ImpactTag::HollowSave);
                *self.save_penalties.entry(player.player).or_default() +=
                    config.hollow_save_penalty;
            }
        }

        for side in Side::BOTH {
            let (id, size) = match round.clutches[side.index()] {
                Some(c) => c,
                None => continue,
            };
            let player = match round.players.get_mut(&id) {
                Some(p) => p,
                None => continue,
            };

            if side == winner {
                let bonus = self.credit.clutch_bonus(size);
                player.swing += bonus;
                player.clutch_won = true;
                player.tags.push(ImpactTag::ClutchWin(size));
            } else {
                player.tags.push(ImpactTag::ClutchLoss(size));
            }
        }

        for player in round.players.values() {
            *self.swing.entry(player.player).or_default() += player.swing;
        }

        tracing::debug!(round = round.number, ?winner, "Round ended");

        Some(RoundOutcome {
            number: round.number,
            winner,
            pistol_round: round.pistol_round,
            t_probability: round.t_probability,
            fastest_down: round.fastest_down,
            players: round.players.into_values().collect(),
        })
    }

    /// Swing per player over every round ended so far, hollow save penalties not included.
    pub fn swing_totals(&self) -> &BTreeMap<PlayerId, f64> {
        &self.swing
    }

    pub fn save_penalties(&self) -> &BTreeMap<PlayerId, f64> {
        &self.save_penalties
    }
}

fn process_kill(
    engine: ProbabilityEngine<'_>,
    credit: CreditAttributor<'_>,
    round: &mut ActiveRound,
    kill: &KillEvent,
) -> Vec<(PlayerId, f64)> {
    match round.players.get_mut(&kill.victim) {
        Some(victim) if victim.alive => victim.alive = false,
        _ => {
            tracing::warn!(victim = %kill.victim, "Kill on a player that is not alive");
            return Vec::new();
        }
    };

    let delta = if kill.is_team_kill() {
        0.0
    } else {
        engine.kill_delta(&round.state, kill.killer_side, kill.victim_side)
    };
    round.state.record_death(kill.victim_side);

    let mut credits = Vec::new();
    if !kill.is_team_kill() {
        let allocation = credit.attribute_kill(kill, delta);
        credits.push((allocation.killer, allocation.killer_credit));
        credits.extend(allocation.contributors.iter().map(|s| (s.player, s.amount)));

        let opening = !round.opening_done;
        round.opening_done = true;

        if let Some(killer) = round.players.get_mut(&kill.killer) {
            killer.kills += 1;
            if opening {
                killer.tags.push(ImpactTag::OpeningKill);
            }
            if kill.is_trade {
                killer.tags.push(ImpactTag::TradeKill);
            }
            let gap = EconomyCategory::classify(kill.victim_equipment)
                .difference(EconomyCategory::classify(kill.killer_equipment));
            if gap >= ECO_KILL_TIER_GAP {
                killer.tags.push(ImpactTag::EcoKill);
            }
        }
        if opening {
            if let Some(victim) = round.players.get_mut(&kill.victim) {
                victim.tags.push(ImpactTag::OpeningDeath);
            }
        }

        if let Some(down) = kill.time_to_down {
            round.fastest_down = Some(round.fastest_down.map_or(down, |f| f.min(down)));
        }

        tracing::trace!(
            killer = %kill.killer,
            victim = %kill.victim,
            delta,
            headshot = kill.is_headshot,
            "Kill"
        );
    }

    round.detect_clutches();
    credits
}
