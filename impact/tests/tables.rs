use impact::economy::EconomyCategory;
use impact::tables::{self, ProbabilityTables, StateKey, TableObservations, WinLoss};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn close(expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn default_even_state() {
    let tables = ProbabilityTables::default();
    assert_eq!(0.494, tables.base_win_probability(StateKey::new(5, 5, false)));
    assert_eq!(0.680, tables.base_win_probability(StateKey::new(5, 4, false)));
}

#[test]
fn fallback_for_missing_state() {
    let tables = ProbabilityTables::empty();

    close(0.48, tables.base_win_probability(StateKey::new(3, 3, false)));
    close(0.61, tables.base_win_probability(StateKey::new(3, 3, true)));
    close(0.48, tables.base_win_probability(StateKey::new(0, 0, false)));
    close(0.0, tables.base_win_probability(StateKey::new(0, 4, false)));
    close(0.25, tables.base_win_probability(StateKey::new(0, 4, true)));
}

#[test]
fn mirror_duels_are_even() {
    for tables in [ProbabilityTables::default(), ProbabilityTables::empty()] {
        for tier in EconomyCategory::ALL {
            assert_eq!(0.50, tables.duel_win_rate(tier, tier));
        }
    }
}

#[test]
fn duel_fallback_scales_with_tier_gap() {
    let tables = ProbabilityTables::empty();

    close(
        0.78,
        tables.duel_win_rate(EconomyCategory::FullBuy, EconomyCategory::StarterPistol),
    );
    close(
        0.22,
        tables.duel_win_rate(EconomyCategory::StarterPistol, EconomyCategory::FullBuy),
    );
    close(
        0.57,
        tables.duel_win_rate(EconomyCategory::Rifle, EconomyCategory::Smg),
    );
}

#[test]
fn unknown_map_is_neutral() {
    let tables = ProbabilityTables::default();
    assert_eq!(0.44, tables.map_side_rate("de_nuke"));
    assert_eq!(0.50, tables.map_side_rate("de_cache"));
}

#[test]
fn win_loss_rate() {
    assert_eq!(0.5, WinLoss::default().rate());
    assert_eq!(0.75, WinLoss { wins: 3, losses: 1 }.rate());
    assert_eq!(tables::MAX_PROBABILITY, WinLoss { wins: 40, losses: 0 }.rate());
    assert_eq!(tables::MIN_PROBABILITY, WinLoss { wins: 0, losses: 40 }.rate());
}

#[test]
fn mirror_duel_recorded_once() {
    let mut observations = TableObservations::new();
    observations.record_duel(EconomyCategory::Rifle, EconomyCategory::Rifle);

    assert_eq!(
        WinLoss { wins: 1, losses: 0 },
        observations.duel(EconomyCategory::Rifle, EconomyCategory::Rifle)
    );

    observations.record_duel(EconomyCategory::Rifle, EconomyCategory::Smg);
    assert_eq!(
        WinLoss { wins: 1, losses: 0 },
        observations.duel(EconomyCategory::Rifle, EconomyCategory::Smg)
    );
    assert_eq!(
        WinLoss { wins: 0, losses: 1 },
        observations.duel(EconomyCategory::Smg, EconomyCategory::Rifle)
    );
}

#[test]
#[traced_test]
fn thin_samples_fall_back() {
    let key = StateKey::new(3, 3, false);
    let mut observations = TableObservations::new();
    for _ in 0..9 {
        observations.record_state(key, true);
    }
    for _ in 0..19 {
        observations.record_map_round("de_nuke", true);
    }

    let tables = ProbabilityTables::from_observations(&observations);
    close(tables::fallback_base(key), tables.base_win_probability(key));
    assert_eq!(0.50, tables.map_side_rate("de_nuke"));

    observations.record_state(key, false);
    observations.record_map_round("de_nuke", false);

    let tables = ProbabilityTables::from_observations(&observations);
    assert_eq!(0.9, tables.base_win_probability(key));
    assert_eq!(0.95, tables.map_side_rate("de_nuke"));
}

#[test]
#[traced_test]
fn load_from_json() {
    let content = r#"{
        "states": [
            { "alive_t": 5, "alive_ct": 4, "bomb_planted": false, "wins": 7, "losses": 3 }
        ],
        "duels": [
            { "attacker": "Rifle", "defender": "Smg", "wins": 12, "losses": 8 }
        ],
        "maps": [
            { "map": "de_nuke", "wins": 9, "losses": 11 },
            { "map": "de_train", "wins": 9, "losses": 1 }
        ]
    }"#;

    let tables = ProbabilityTables::from_json(content).unwrap();
    dbg!(&tables);

    close(0.7, tables.base_win_probability(StateKey::new(5, 4, false)));
    close(
        0.6,
        tables.duel_win_rate(EconomyCategory::Rifle, EconomyCategory::Smg),
    );
    close(0.45, tables.map_side_rate("de_nuke"));
    assert_eq!(0.50, tables.map_side_rate("de_train"));

    // Nothing of the shipped defaults survives a rebuild.
    close(
        tables::fallback_base(StateKey::new(5, 5, false)),
        tables.base_win_probability(StateKey::new(5, 5, false)),
    );
}

#[test]
fn observations_survive_json() {
    let mut observations = TableObservations::new();
    observations.record_state(StateKey::new(2, 1, true), true);
    observations.record_state(StateKey::new(2, 1, true), false);
    observations.record_duel(EconomyCategory::FullBuy, EconomyCategory::Smg);
    observations.record_map_round("de_mirage", false);

    let content = serde_json::to_string(&observations).unwrap();
    dbg!(&content);
    let loaded: TableObservations = serde_json::from_str(&content).unwrap();

    assert_eq!(observations, loaded);
}

#[test]
fn invalid_json_is_an_error() {
    let result = ProbabilityTables::from_json("{ \"states\": 5 }");
    assert!(matches!(result, Err(impact::Error::Json(_))));
}
