use std::sync::Arc;

use common::ImpactTag;
use impact::credit::CreditConfig;
use impact::economy::EconomyCategory;
use impact::events::{Event, KillEvent};
use impact::swing::{RoundSetup, SwingOrchestrator};
use impact::tables::ProbabilityTables;
use impact::{PlayerId, Side};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn close(expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

fn setup(number: u32) -> RoundSetup {
    RoundSetup {
        number,
        map: Arc::from("de_testbed"),
        roster: (1..=10)
            .map(|id| (PlayerId(id), if id <= 5 { Side::T } else { Side::CT }))
            .collect(),
        economy_t: EconomyCategory::Rifle,
        economy_ct: EconomyCategory::Rifle,
        pistol_round: number == 1,
    }
}

fn kill(time: f64, killer: u64, victim: u64) -> Event {
    let side = |id: u64| if id <= 5 { Side::T } else { Side::CT };
    Event::Kill(KillEvent::simple(
        time,
        PlayerId(killer),
        side(killer),
        PlayerId(victim),
        side(victim),
    ))
}

#[test]
#[traced_test]
fn opening_kill() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(1));
    assert_eq!(Some(0.494), orchestrator.win_probability(Side::T));

    let swing = orchestrator.process(&kill(10.0, 1, 6)).unwrap();
    dbg!(&swing);

    assert_eq!(0.494, swing.t_before);
    assert_eq!(0.680, swing.t_after);
    assert_eq!(1, swing.credits.len());
    assert_eq!(PlayerId(1), swing.credits[0].0);
    close(0.680 - 0.494, swing.credits[0].1);

    let outcome = orchestrator.end_round(Side::T).unwrap();
    assert_eq!(vec![0.494, 0.680], outcome.t_probability);
    assert!(outcome.pistol_round);
    assert_eq!(
        vec![ImpactTag::OpeningKill],
        outcome.player(PlayerId(1)).unwrap().tags
    );
    assert_eq!(
        vec![ImpactTag::OpeningDeath],
        outcome.player(PlayerId(6)).unwrap().tags
    );
}

#[test]
fn kills_on_dead_players_are_ignored() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(1));
    orchestrator.process(&kill(10.0, 1, 6));
    let swing = orchestrator.process(&kill(11.0, 2, 6)).unwrap();

    assert!(swing.credits.is_empty());
    assert_eq!(4, orchestrator.state().unwrap().alive(Side::CT));
}

#[test]
fn team_kill_earns_nothing() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(1));
    let swing = orchestrator.process(&kill(10.0, 1, 2)).unwrap();

    assert!(swing.credits.is_empty());
    assert_eq!(4, orchestrator.state().unwrap().alive(Side::T));

    // Still the first enemy kill of the round.
    orchestrator.process(&kill(12.0, 6, 3));
    let outcome = orchestrator.end_round(Side::CT).unwrap();
    assert_eq!(
        vec![ImpactTag::OpeningKill],
        outcome.player(PlayerId(6)).unwrap().tags
    );
}

#[test]
fn every_round_starts_fresh() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(1));
    orchestrator.process(&kill(10.0, 1, 6));
    orchestrator.process(&Event::BombPlant {
        time: 20.0,
        planter: PlayerId(2),
    });
    orchestrator.end_round(Side::T);

    assert!(!orchestrator.in_round());
    assert_eq!(None, orchestrator.process(&kill(30.0, 1, 7)));

    orchestrator.start_round(setup(2));
    let state = orchestrator.state().unwrap();
    assert_eq!(5, state.alive(Side::T));
    assert_eq!(5, state.alive(Side::CT));
    assert!(!state.bomb_planted());
    assert_eq!(Some(0.494), orchestrator.win_probability(Side::T));
}

#[test]
#[traced_test]
fn unfinished_rounds_leave_no_swing() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(1));
    let swing = orchestrator.process(&kill(10.0, 1, 6)).unwrap();
    assert_eq!(1, swing.credits.len());
    assert!(orchestrator.swing_totals().is_empty());

    orchestrator.start_round(setup(1));
    assert!(logs_contain("Discarding unfinished round"));
    orchestrator.process(&Event::BombPlant {
        time: 20.0,
        planter: PlayerId(2),
    });
    orchestrator.discard_round();

    orchestrator.start_round(setup(1));
    let outcome = orchestrator.end_round(Side::CT).unwrap();

    assert!(outcome.players.iter().all(|p| p.swing == 0.0));
    assert!(orchestrator.swing_totals().values().all(|s| *s == 0.0));
}

#[test]
fn short_roster_opens_as_clutch() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    let mut setup = setup(1);
    setup.roster = vec![
        (PlayerId(1), Side::T),
        (PlayerId(6), Side::CT),
        (PlayerId(7), Side::CT),
    ];
    orchestrator.start_round(setup);

    let outcome = orchestrator.end_round(Side::CT).unwrap();
    let loner = outcome.player(PlayerId(1)).unwrap();
    assert_eq!(Some(2), loner.clutch);
    assert!(!loner.clutch_won);
    assert_eq!(
        vec![ImpactTag::HollowSave, ImpactTag::ClutchLoss(2)],
        loner.tags
    );
    assert_eq!(None, outcome.player(PlayerId(6)).unwrap().clutch);
}

#[test]
#[traced_test]
fn clutches_are_tagged_and_rewarded() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(3));

    let events = [
        kill(10.0, 1, 6),
        kill(11.0, 1, 7),
        kill(12.0, 1, 8),
        kill(20.0, 9, 2),
        kill(21.0, 9, 3),
        kill(22.0, 9, 4),
        kill(23.0, 9, 5),
        kill(30.0, 1, 9),
        kill(35.0, 1, 10),
    ];
    let mut earned = 0.0;
    for event in events.iter() {
        let swing = orchestrator.process(event).unwrap();
        earned += swing
            .credits
            .iter()
            .filter(|(player, _)| *player == PlayerId(1))
            .map(|(_, amount)| amount)
            .sum::<f64>();
    }

    let outcome = orchestrator.end_round(Side::T).unwrap();
    dbg!(&outcome);

    let clutcher = outcome.player(PlayerId(1)).unwrap();
    assert_eq!(Some(2), clutcher.clutch);
    assert!(clutcher.clutch_won);
    assert_eq!(
        vec![
            ImpactTag::OpeningKill,
            ImpactTag::MultiKill(5),
            ImpactTag::ClutchWin(2)
        ],
        clutcher.tags
    );
    close(earned + 0.10, clutcher.swing);
    close(clutcher.swing, orchestrator.swing_totals()[&PlayerId(1)]);

    let other = outcome.player(PlayerId(10)).unwrap();
    assert_eq!(Some(1), other.clutch);
    assert_eq!(vec![ImpactTag::ClutchLoss(1)], other.tags);

    assert_eq!(Some(&0.99), outcome.t_probability.last());
}

#[test]
fn losing_survivors_get_hollow_save() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(4));
    orchestrator.process(&kill(10.0, 6, 1));
    orchestrator.process(&Event::BombPlant {
        time: 30.0,
        planter: PlayerId(2),
    });
    let defuse = orchestrator
        .process(&Event::BombDefuse {
            time: 60.0,
            defuser: PlayerId(7),
        })
        .unwrap();
    assert_eq!(0.01, defuse.t_after);
    assert_eq!(PlayerId(7), defuse.credits[0].0);
    assert!(defuse.credits[0].1 > 0.0);

    let outcome = orchestrator.end_round(Side::CT).unwrap();

    let survivor = outcome.player(PlayerId(2)).unwrap();
    assert_eq!(0.02, survivor.save_penalty);
    assert_eq!(
        vec![ImpactTag::BombPlant, ImpactTag::HollowSave],
        survivor.tags
    );
    assert_eq!(
        Some(&survivor.swing),
        orchestrator.swing_totals().get(&PlayerId(2))
    );
    assert_eq!(0.02, orchestrator.save_penalties()[&PlayerId(2)]);

    assert_eq!(0.0, outcome.player(PlayerId(1)).unwrap().save_penalty);
    assert_eq!(0.0, outcome.player(PlayerId(7)).unwrap().save_penalty);
    assert!(outcome
        .player(PlayerId(7))
        .unwrap()
        .tags
        .contains(&ImpactTag::BombDefuse));
}

#[test]
fn plant_credit_follows_probability() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(5));
    let plant = orchestrator
        .process(&Event::BombPlant {
            time: 40.0,
            planter: PlayerId(3),
        })
        .unwrap();

    assert_eq!(0.740, plant.t_after);
    close((0.740 - 0.494) * 0.6, plant.credits[0].1);

    // A second plant changes nothing.
    let again = orchestrator
        .process(&Event::BombPlant {
            time: 41.0,
            planter: PlayerId(4),
        })
        .unwrap();
    assert!(again.credits.is_empty());
}

#[test]
fn explosion_ends_with_certainty() {
    let tables = ProbabilityTables::default();
    let config = CreditConfig::default();
    let mut orchestrator = SwingOrchestrator::new(&tables, &config);

    orchestrator.start_round(setup(6));
    orchestrator.process(&Event::BombPlant {
        time: 40.0,
        planter: PlayerId(3),
    });
    let boom = orchestrator
        .process(&Event::BombExplode { time: 80.0 })
        .unwrap();

    assert!(boom.credits.is_empty());
    assert_eq!(0.99, boom.t_after);
}
