//! Integration tests for the lichen engine.
//!
//! Drives whole episodes through the public entry points: bidding, factory
//! placement, and main-phase turns, both typed and from raw JSON. The last
//! test runs the rollout binary against a serialized state.

use std::process::{Command, Stdio};

use serde_json::json;

use lichen_engine::board::{Board, Faction, FactoryAction, Position, TurnActions, UnitAction, UnitType};
use lichen_engine::resolve::{team_on_turn, Bid, Placement};
use lichen_engine::{BufferConfig, EnvConfig, Phase, State};

/// 16x16 board with one factory per team and an ice tile south of team 0's
/// usual spawn.
fn board() -> Board {
    let mut board = Board::empty(16, 16, 1);
    let i = board.index(Position::new(3, 6));
    board.ice[i] = true;
    board
}

fn new_state() -> State {
    State::new(EnvConfig::default(), BufferConfig::default(), board()).unwrap()
}

/// Runs bidding and placement with team 0 at (3, 3) and team 1 at (12, 12).
fn placed() -> State {
    let s = new_state()
        .step(&json!({
            "player_0": {"bid": 0, "faction": "AlphaStrike"},
            "player_1": {"bid": 0, "faction": "TheBuilders"},
        }))
        .unwrap();
    let s = s
        .step(&json!({"player_0": {"spawn": [3, 3], "water": 150, "metal": 150}, "player_1": {}}))
        .unwrap();
    s.step(&json!({"player_0": {}, "player_1": {"spawn": [12, 12], "water": 150, "metal": 150}}))
        .unwrap()
}

fn total_lichen(s: &State) -> i64 {
    s.board.lichen.iter().map(|&l| i64::from(l)).sum()
}

#[test]
fn placement_reaches_main_phase() {
    let s = placed();
    assert_eq!(s.phase, Phase::Main);
    assert_eq!(s.turn, 3);
    assert_eq!(s.real_turn, 0);
    assert_eq!(s.teams[1].faction, Faction::TheBuilders);
    for team in 0..2 {
        assert_eq!(s.factories_of(team).count(), 1);
        assert_eq!(s.teams[team].factories_to_place, 0);
        assert_eq!(s.teams[team].init_water, 0);
    }
}

#[test]
fn heavy_mines_ice_and_delivers_it() {
    let mut s = placed().step(&json!({"player_0": {"factory_0": 1}})).unwrap();
    assert_eq!(s.units.len(), 1);
    assert_eq!(s.units[&0].unit_type, UnitType::Heavy);

    // Three steps south onto the ice, two digs, one step back, hand over.
    s = s
        .step(&json!({"player_0": {"unit_0": [
            [0, 3, 0, 0, 0, 3],
            [3, 0, 0, 0, 0, 2],
            [0, 1, 0, 0, 0, 1],
            [1, 1, 0, 40, 0, 1],
        ]}}))
        .unwrap();
    for _ in 0..6 {
        s = s.step(&json!({})).unwrap();
    }

    let unit = &s.units[&0];
    assert_eq!(unit.pos, Position::new(3, 5));
    assert_eq!(unit.cargo.ice, 0);
    assert!(unit.action_queue.is_empty());
    // 150 - 8 upkeep + 40 ice refined at 4:1.
    assert_eq!(s.factories[&0].cargo.water, 152);
    assert_eq!(s.factories[&1].cargo.water, 142);
    assert_eq!(s.real_turn, 8);
}

#[test]
fn every_team_places_its_quota() {
    let mut s = State::new(EnvConfig::default(), BufferConfig::default(), Board::empty(24, 24, 3)).unwrap();
    s = s.bid_step([Bid::new(-7, Faction::MotherMars), Bid::new(2, Faction::FirstMars)]);
    assert!(s.teams[1].place_first);

    let spawns = [(3, 3), (20, 20), (3, 12), (20, 12), (12, 3), (12, 20)];
    let mut next = spawns.iter();
    while s.phase == Phase::FactoryPlacement {
        let team = team_on_turn(&s).unwrap();
        let &(x, y) = next.next().unwrap();
        let mut placements = [Placement::default(); 2];
        placements[team] = Placement::new(Position::new(x, y), 150, 150);
        s = s.factory_placement_step(placements);
    }
    assert_eq!(s.factories_of(0).count(), 3);
    assert_eq!(s.factories_of(1).count(), 3);
    assert_eq!(s.teams[0].init_water + s.teams[0].init_metal, 0);
    // Team 0 won with |-7| and paid for it.
    let water: i32 = s.factories_of(0).map(|f| f.cargo.water).sum();
    assert_eq!(water, 450 - 7);
}

#[test]
fn resolution_is_deterministic() {
    let s = placed();
    let mut actions = TurnActions::empty();
    actions.set_factory(0, FactoryAction::BuildLight);
    actions.set_factory(1, FactoryAction::Water);
    let a = s.step_late_game(&actions);
    let b = s.step_late_game(&actions);
    assert_eq!(a, b);

    let mut follow = TurnActions::empty();
    follow.set_queue(a.units.keys().copied().next().unwrap(), [UnitAction::dig()]);
    assert_eq!(a.step_late_game(&follow), b.step_late_game(&follow));
}

#[test]
fn lichen_never_grows_without_water() {
    let mut s = placed();
    let mut water = TurnActions::empty();
    water.set_factory(0, FactoryAction::Water);
    water.set_factory(1, FactoryAction::Water);
    for _ in 0..25 {
        s = s.step_late_game(&water);
    }
    let mut last = total_lichen(&s);
    assert!(last > 0);

    for _ in 0..30 {
        s = s.step_late_game(&TurnActions::empty());
        let now = total_lichen(&s);
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 0);
    assert!(s.board.lichen_strains.iter().all(Option::is_none));
}

#[test]
fn lichen_score_follows_strains() {
    let mut s = placed();
    let mut actions = TurnActions::empty();
    actions.set_factory(0, FactoryAction::Water);
    s = s.step_late_game(&actions);
    assert_eq!(s.team_lichen_score(), [12, 0]);
    s = s.step_late_game(&actions);
    assert_eq!(s.team_lichen_score(), [24, 0]);
}

#[test]
fn state_survives_json_snapshot() {
    let mut s = placed().step(&json!({"player_0": {"factory_0": 0}, "player_1": {"factory_1": 2}})).unwrap();
    s = s.step(&json!({"player_0": {"unit_0": [[0, 2, 0, 0, 1, 1]]}})).unwrap();
    let text = serde_json::to_string(&s).unwrap();
    let back = State::from_json_str(&text).unwrap();
    assert_eq!(back, s);
    assert_eq!(back.step_late_game(&TurnActions::empty()), s.step_late_game(&TurnActions::empty()));
}

#[test]
fn rollout_binary_rejects_invalid_snapshot() {
    let mut snapshot = serde_json::to_value(placed()).unwrap();
    snapshot["env_cfg"]["CYCLE_LENGTH"] = json!(0);
    let path = std::env::temp_dir().join(format!("lichen-bad-state-{}.json", std::process::id()));
    std::fs::write(&path, snapshot.to_string()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rollout"))
        .arg(&path)
        .args(["--rollouts", "1", "--turns", "1", "--quiet"])
        .output()
        .expect("failed to start rollout");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle length 0"));
}

#[test]
fn rollout_binary_writes_one_line_per_rollout() {
    let path = std::env::temp_dir().join(format!("lichen-rollout-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&placed()).unwrap()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rollout"))
        .arg(&path)
        .args(["--rollouts", "3", "--turns", "5", "--seed", "11", "--quiet"])
        .stderr(Stdio::null())
        .output()
        .expect("failed to start rollout");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l["turns"] == 5));
}
