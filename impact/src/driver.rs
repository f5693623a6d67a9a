//! Turns the decoded game event stream of one match into scoring events and accumulators.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use common::report::{MatchReport, PlayerReport};
use common::{PlayerId, RatingBreakdown, Side};

use crate::credit::CreditConfig;
use crate::economy::{self, EconomyCategory};
use crate::events::{Event, KillEvent};
use crate::rating::{PlayerMatchStats, RatingComposer, RatingConfig};
use crate::swing::{RoundOutcome, RoundSetup, SwingOrchestrator};
use crate::tables::ProbabilityTables;
use crate::tracker::ContributionTracker;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RosterEntry {
    pub player: PlayerId,
    pub side: Side,
    pub money: u32,
    pub money_spent: u32,
    pub equipment_value: u32,
}

/// Events as produced by the replay decoder, in time order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum GameEvent {
    MatchStart,
    RoundStart {
        time: f64,
        roster: Vec<RosterEntry>,
    },
    FreezeEnd {
        time: f64,
        roster: Vec<RosterEntry>,
    },
    Kill {
        time: f64,
        killer: PlayerId,
        /// `None` for a suicide.
        victim: Option<PlayerId>,
        headshot: bool,
        assister: Option<PlayerId>,
    },
    Damage {
        time: f64,
        attacker: PlayerId,
        victim: PlayerId,
        /// Health the victim actually lost.
        damage: u32,
        attacker_side: Side,
        victim_side: Side,
    },
    Flashed {
        time: f64,
        attacker: PlayerId,
        victim: PlayerId,
        duration: f64,
        attacker_side: Side,
        victim_side: Side,
    },
    BombPlanted {
        time: f64,
        player: PlayerId,
    },
    BombDefused {
        time: f64,
        player: PlayerId,
    },
    BombExploded {
        time: f64,
    },
    RoundEnd {
        time: f64,
        winner: Side,
    },
}

impl GameEvent {
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::MatchStart => None,
            Self::RoundStart { time, .. }
            | Self::FreezeEnd { time, .. }
            | Self::Kill { time, .. }
            | Self::Damage { time, .. }
            | Self::Flashed { time, .. }
            | Self::BombPlanted { time, .. }
            | Self::BombDefused { time, .. }
            | Self::BombExploded { time }
            | Self::RoundEnd { time, .. } => Some(*time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Seconds after a death in which killing the killer counts as a trade.
    pub trade_window: f64,
    pub half_length: u32,
    pub credit: CreditConfig,
    pub rating: RatingConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            trade_window: 5.0,
            half_length: 12,
            credit: CreditConfig::default(),
            rating: RatingConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn from_json(content: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether the 1-based scored round `number` opens a half.
    pub fn is_pistol_round(&self, number: u32) -> bool {
        number == 1 || number == self.half_length + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerResult {
    pub player: PlayerId,
    pub stats: PlayerMatchStats,
    pub rating: RatingBreakdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub map: String,
    /// Ordered by player id.
    pub players: Vec<PlayerResult>,
    pub rounds: Vec<RoundOutcome>,
}

impl MatchResult {
    pub fn player(&self, player: PlayerId) -> Option<&PlayerResult> {
        self.players.iter().find(|p| p.player == player)
    }

    pub fn report(&self) -> MatchReport {
        MatchReport {
            map: self.map.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerReport {
                    player: p.player,
                    swing: p.stats.swing,
                    rating: p.rating.clone(),
                })
                .collect(),
            rounds: self.rounds.iter().map(|r| r.report()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Damage {
        attacker: PlayerId,
        victim: PlayerId,
        amount: u32,
        time: f64,
    },
    Flash {
        attacker: PlayerId,
        victim: PlayerId,
        duration: f64,
        time: f64,
    },
}

impl Pending {
    fn victim(&self) -> PlayerId {
        match self {
            Self::Damage { victim, .. } | Self::Flash { victim, .. } => *victim,
        }
    }
}

#[derive(Debug)]
struct Death {
    victim: PlayerId,
    victim_side: Side,
    killer: PlayerId,
    time: f64,
}

#[derive(Debug)]
struct LiveRound {
    number: u32,
    roster: BTreeMap<PlayerId, RosterEntry>,
    deaths: Vec<Death>,
    kast: BTreeSet<PlayerId>,
    scored_events: usize,
    // Merged into the match totals when the round ends.
    stats: BTreeMap<PlayerId, PlayerMatchStats>,
}

impl LiveRound {
    fn is_dead(&self, player: PlayerId) -> bool {
        self.deaths.iter().any(|d| d.victim == player)
    }
}

fn is_knife_round(roster: &[RosterEntry]) -> bool {
    match roster.first() {
        Some(first) => first.money + first.money_spent == 0,
        None => true,
    }
}

fn stats_of(
    stats: &mut BTreeMap<PlayerId, PlayerMatchStats>,
    player: PlayerId,
) -> &mut PlayerMatchStats {
    stats.entry(player).or_default()
}

/// Drives one match. Events must be handed over in time order.
pub struct MatchDriver<'a> {
    tables: &'a ProbabilityTables,
    config: &'a DriverConfig,
    map: Arc<str>,
    orchestrator: SwingOrchestrator<'a>,
    tracker: ContributionTracker,
    // Damage and flashes sharing the timestamp of the latest event, applied once time moves on.
    pending: Vec<Pending>,
    stats: BTreeMap<PlayerId, PlayerMatchStats>,
    rounds: Vec<RoundOutcome>,
    round: Option<LiveRound>,
    skipping_round: bool,
    scored_rounds: u32,
    last_time: Option<f64>,
    started: bool,
}

impl<'a> MatchDriver<'a> {
    pub fn new(tables: &'a ProbabilityTables, config: &'a DriverConfig, map: &str) -> Self {
        Self {
            tables,
            config,
            map: Arc::from(map),
            orchestrator: SwingOrchestrator::new(tables, &config.credit),
            tracker: ContributionTracker::new(),
            pending: Vec::new(),
            stats: BTreeMap::new(),
            rounds: Vec::new(),
            round: None,
            skipping_round: false,
            scored_rounds: 0,
            last_time: None,
            started: false,
        }
    }

    pub fn win_probability(&self, side: Side) -> Option<f64> {
        self.orchestrator.win_probability(side)
    }

    pub fn rounds(&self) -> &[RoundOutcome] {
        &self.rounds
    }

    pub fn handle(&mut self, event: GameEvent) -> Result<(), crate::Error> {
        if let Some(time) = event.time() {
            match self.last_time {
                Some(previous) if time < previous => {
                    return Err(crate::Error::OutOfOrder {
                        previous,
                        current: time,
                    });
                }
                Some(previous) if time > previous => self.flush_pending(),
                _ => {}
            }
            self.last_time = Some(time);
        }

        match event {
            GameEvent::MatchStart => self.start_match(),
            _ if !self.started => {
                tracing::trace!("Ignoring event before the match start");
            }
            GameEvent::RoundStart { roster, .. } => self.round_start(roster),
            GameEvent::FreezeEnd { roster, .. } => self.freeze_end(roster),
            GameEvent::Kill {
                time,
                killer,
                victim,
                headshot,
                assister,
            } => self.kill(time, killer, victim, headshot, assister),
            GameEvent::Damage {
                time,
                attacker,
                victim,
                damage,
                attacker_side,
                victim_side,
            } => {
                let round = self
                    .round
                    .as_mut()
                    .filter(|_| attacker != victim && attacker_side != victim_side);
                if let Some(round) = round {
                    stats_of(&mut round.stats, attacker).damage += damage;
                    self.pending.push(Pending::Damage {
                        attacker,
                        victim,
                        amount: damage,
                        time,
                    });
                }
            }
            GameEvent::Flashed {
                time,
                attacker,
                victim,
                duration,
                attacker_side,
                victim_side,
            } => {
                if self.round.is_some() && attacker_side != victim_side && duration > 0.0 {
                    self.pending.push(Pending::Flash {
                        attacker,
                        victim,
                        duration,
                        time,
                    });
                }
            }
            GameEvent::BombPlanted { time, player } => {
                self.bomb_event(Event::BombPlant {
                    time,
                    planter: player,
                });
            }
            GameEvent::BombDefused { time, player } => {
                self.bomb_event(Event::BombDefuse {
                    time,
                    defuser: player,
                });
            }
            GameEvent::BombExploded { time } => {
                self.bomb_event(Event::BombExplode { time });
            }
            GameEvent::RoundEnd { winner, .. } => self.round_end(winner),
        };

        Ok(())
    }

    fn start_match(&mut self) {
        tracing::debug!(map = %self.map, "Match started");

        self.started = true;
        self.stats.clear();
        self.rounds.clear();
        self.round = None;
        self.skipping_round = false;
        self.scored_rounds = 0;
        self.tracker.clear();
        self.pending.clear();
        self.orchestrator = SwingOrchestrator::new(self.tables, &self.config.credit);
    }

    fn flush_pending(&mut self) {
        for pending in self.pending.drain(..) {
            match pending {
                Pending::Damage {
                    attacker,
                    victim,
                    amount,
                    time,
                } => self.tracker.record_damage(attacker, victim, amount, time),
                Pending::Flash {
                    attacker,
                    victim,
                    duration,
                    time,
                } => self.tracker.record_flash(attacker, victim, duration, time),
            }
        }
    }

    fn round_start(&mut self, roster: Vec<RosterEntry>) {
        self.tracker.clear();
        self.pending.clear();

        if is_knife_round(&roster) {
            tracing::info!("Skipping knife or warm-up round");
            self.skip_round();
            return;
        }

        self.skipping_round = false;
        self.begin_round(self.scored_rounds + 1, roster);
    }

    fn freeze_end(&mut self, roster: Vec<RosterEntry>) {
        if self.skipping_round {
            return;
        }
        if is_knife_round(&roster) {
            tracing::info!("Skipping knife or warm-up round");
            self.skip_round();
            return;
        }

        match self.round.as_ref() {
            // Equipment is only final once the buy time is over.
            Some(round) if round.scored_events == 0 => {
                let number = round.number;
                self.orchestrator.discard_round();
                self.begin_round(number, roster);
            }
            Some(_) => {
                tracing::debug!("Freeze end after the round went live");
            }
            None => {
                self.tracker.clear();
                self.pending.clear();
                self.begin_round(self.scored_rounds + 1, roster);
            }
        }
    }

    fn skip_round(&mut self) {
        self.skipping_round = true;
        self.round = None;
        self.orchestrator.discard_round();
    }

    #[tracing::instrument(skip(self, roster))]
    fn begin_round(&mut self, number: u32, roster: Vec<RosterEntry>) {
        let economy_of = |side: Side| {
            EconomyCategory::classify_side(
                roster
                    .iter()
                    .filter(|p| p.side == side)
                    .map(|p| p.equipment_value),
            )
        };
        let economy_t = economy_of(Side::T);
        let economy_ct = economy_of(Side::CT);
        let pistol_round = self.config.is_pistol_round(number);

        tracing::debug!(?economy_t, ?economy_ct, pistol_round, "Round setup");

        self.orchestrator.start_round(RoundSetup {
            number,
            map: self.map.clone(),
            roster: roster.iter().map(|p| (p.player, p.side)).collect(),
            economy_t,
            economy_ct,
            pistol_round,
        });

        self.round = Some(LiveRound {
            number,
            roster: roster.into_iter().map(|p| (p.player, p)).collect(),
            deaths: Vec::new(),
            kast: BTreeSet::new(),
            scored_events: 0,
            stats: BTreeMap::new(),
        });
    }

    fn kill(
        &mut self,
        time: f64,
        killer: PlayerId,
        victim: Option<PlayerId>,
        headshot: bool,
        assister: Option<PlayerId>,
    ) {
        let victim = match victim {
            Some(v) if v != killer => v,
            _ => {
                tracing::trace!(player = %killer, "Discarding suicide");
                return;
            }
        };

        let round = match self.round.as_mut() {
            Some(r) => r,
            None => {
                tracing::warn!(%killer, %victim, "Kill outside of a scored round");
                return;
            }
        };

        let (killer_entry, victim_entry) =
            match (round.roster.get(&killer), round.roster.get(&victim)) {
                (Some(k), Some(v)) => (k.clone(), v.clone()),
                _ => {
                    tracing::warn!(%killer, %victim, "Kill involving a player outside the roster");
                    return;
                }
            };
        if round.is_dead(victim) {
            tracing::warn!(%killer, %victim, "Kill on a player that already died this round");
            return;
        }
        let enemy_kill = killer_entry.side != victim_entry.side;

        // Hits on the victim sharing the kill's timestamp belong to the killing blow.
        self.pending.retain(|p| p.victim() != victim);
        let time_to_down = self.tracker.time_to_down(killer, victim, time);
        let record = self.tracker.take(victim);

        let trade_window = self.config.trade_window;
        let mut is_trade = false;
        if enemy_kill {
            for death in round.deaths.iter().filter(|d| {
                d.killer == victim
                    && d.victim_side == killer_entry.side
                    && time - d.time <= trade_window
            }) {
                is_trade = true;
                round.kast.insert(death.victim);
            }
        }

        let kill = KillEvent {
            time,
            killer,
            victim,
            killer_side: killer_entry.side,
            victim_side: victim_entry.side,
            killer_equipment: killer_entry.equipment_value,
            victim_equipment: victim_entry.equipment_value,
            is_trade,
            is_headshot: headshot,
            total_damage: record.total_damage(),
            killer_damage: record.damage_by(killer),
            damage_contributors: record.damage_contributors(killer),
            flash_contributors: record.flash_contributors(killer),
            time_to_down,
        };

        tracing::trace!(%killer, %victim, is_trade, ?time_to_down, "Kill");

        round.deaths.push(Death {
            victim,
            victim_side: victim_entry.side,
            killer,
            time,
        });
        round.scored_events += 1;

        let victim_stats = stats_of(&mut round.stats, victim);
        victim_stats.deaths += 1;
        if enemy_kill {
            victim_stats.eco_death_penalty += economy::eco_death_multiplier(
                victim_entry.equipment_value,
                killer_entry.equipment_value,
            );

            let killer_stats = stats_of(&mut round.stats, killer);
            killer_stats.kills += 1;
            killer_stats.eco_kill_value += economy::eco_kill_multiplier(
                killer_entry.equipment_value,
                victim_entry.equipment_value,
            );
            round.kast.insert(killer);

            let assister = assister.filter(|a| {
                *a != killer
                    && round
                        .roster
                        .get(a)
                        .map(|entry| entry.side == killer_entry.side)
                        .unwrap_or(false)
            });
            if let Some(assister) = assister {
                stats_of(&mut round.stats, assister).assists += 1;
                round.kast.insert(assister);
            }
            for (flasher, _) in kill.flash_contributors.iter() {
                round.kast.insert(*flasher);
            }
        } else {
            victim_stats.eco_death_penalty += 1.0;
        }

        self.orchestrator.process(&Event::Kill(kill));
    }

    fn bomb_event(&mut self, event: Event) {
        let round = match self.round.as_mut() {
            Some(r) => r,
            None => {
                tracing::warn!(?event, "Bomb event outside of a scored round");
                return;
            }
        };
        round.scored_events += 1;
        self.orchestrator.process(&event);
    }

    fn round_end(&mut self, winner: Side) {
        let round = match self.round.take() {
            Some(r) => r,
            None => {
                self.skipping_round = false;
                return;
            }
        };
        let _guard = tracing::debug_span!("Round", number = round.number).entered();
        self.tracker.clear();
        self.pending.clear();

        let outcome = match self.orchestrator.end_round(winner) {
            Some(o) => o,
            None => return,
        };

        for (id, stats) in round.stats.iter() {
            stats_of(&mut self.stats, *id).merge(stats);
        }
        for (id, entry) in round.roster.iter() {
            let stats = stats_of(&mut self.stats, *id);
            stats.rounds_played += 1;
            if entry.side == winner {
                stats.rounds_won += 1;
            }

            let survived = match outcome.player(*id) {
                Some(p) => {
                    stats.record_multi_kill(p.kills);
                    if p.clutch.is_some() {
                        stats.clutch_attempts += 1;
                        if p.clutch_won {
                            stats.clutch_wins += 1;
                        }
                    }
                    p.alive
                }
                None => false,
            };
            if survived || round.kast.contains(id) {
                stats.kast_rounds += 1;
            }
        }

        self.scored_rounds += 1;
        self.rounds.push(outcome);
    }

    pub fn finish(mut self) -> MatchResult {
        if let Some(round) = self.round.take() {
            tracing::warn!(round = round.number, "Match ended during a round, discarding it");
            self.orchestrator.discard_round();
        }

        for (id, swing) in self.orchestrator.swing_totals() {
            stats_of(&mut self.stats, *id).swing = *swing;
        }
        for (id, penalty) in self.orchestrator.save_penalties() {
            stats_of(&mut self.stats, *id).save_penalty = *penalty;
        }

        let composer = RatingComposer::new(&self.config.rating);
        let players = self
            .stats
            .into_iter()
            .map(|(player, stats)| PlayerResult {
                player,
                rating: composer.compose(player, &stats),
                stats,
            })
            .collect();

        tracing::debug!(map = %self.map, rounds = self.rounds.len(), "Match finished");

        MatchResult {
            map: self.map.to_string(),
            players,
            rounds: self.rounds,
        }
    }
}
