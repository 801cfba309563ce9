use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use lichen_engine::board::{Board, FactoryAction, Position, TurnActions, UnitAction};
use lichen_engine::resolve::lichen::grow_set;
use lichen_engine::selfplay::{run_rollouts, RolloutConfig};
use lichen_engine::{BufferConfig, EnvConfig, State};

/// A 48x48 main-phase state with three factories per team, a few turns of
/// watering behind it, and a light unit from every factory.
fn midgame() -> State {
    let mut board = Board::empty(48, 48, 3);
    for (x, y) in [(10, 14), (37, 14), (10, 33), (37, 33), (24, 5), (24, 42)] {
        let i = board.index(Position::new(x, y));
        board.ice[i] = true;
    }
    let mut s = State::new(EnvConfig::default(), BufferConfig::default(), board).unwrap();
    s = s
        .step(&json!({"player_0": {"bid": 0, "faction": "AlphaStrike"}, "player_1": {"bid": 0, "faction": "FirstMars"}}))
        .unwrap();
    let spawns = [(8, 8), (39, 39), (8, 24), (39, 24), (8, 39), (39, 8)];
    for (i, (x, y)) in spawns.into_iter().enumerate() {
        let player = format!("player_{}", i % 2);
        s = s.step(&json!({(player): {"spawn": [x, y], "water": 150, "metal": 150}})).unwrap();
    }

    let mut actions = TurnActions::empty();
    for &id in s.factories.keys() {
        actions.set_factory(id, FactoryAction::BuildLight);
    }
    s = s.step_late_game(&actions);

    let mut water = TurnActions::empty();
    for &id in s.factories.keys() {
        water.set_factory(id, FactoryAction::Water);
    }
    for &id in s.units.keys() {
        water.set_queue(id, [UnitAction::dig().with_repeat(1, 1)]);
    }
    for _ in 0..25 {
        s = s.step_late_game(&water);
    }
    s
}

fn bench_step_idle(c: &mut Criterion) {
    let state = midgame();
    let actions = TurnActions::empty();
    c.bench_function("step_late_game_idle", |b| {
        b.iter(|| black_box(&state).step_late_game(black_box(&actions)))
    });
}

fn bench_step_watering(c: &mut Criterion) {
    let state = midgame();
    let mut actions = TurnActions::empty();
    for &id in state.factories.keys() {
        actions.set_factory(id, FactoryAction::Water);
    }
    c.bench_function("step_late_game_all_water", |b| {
        b.iter(|| black_box(&state).step_late_game(black_box(&actions)))
    });
}

fn bench_grow_set(c: &mut Criterion) {
    let state = midgame();
    let factory = state.factories.values().next().unwrap().clone();
    c.bench_function("lichen_grow_set", |b| {
        b.iter(|| grow_set(black_box(&state.board), &state.factories, &factory, 20))
    });
}

fn bench_parse_actions(c: &mut Criterion) {
    let state = midgame();
    let mut players = serde_json::Map::new();
    for team in 0..2 {
        let mut entries = serde_json::Map::new();
        for unit in state.units_of(team) {
            entries.insert(
                format!("unit_{}", unit.unit_id),
                json!([[0, 1, 0, 0, 0, 2], [3, 0, 0, 0, 1, 3], [1, 0, 0, 20, 0, 1]]),
            );
        }
        for factory in state.factories_of(team) {
            entries.insert(format!("factory_{}", factory.factory_id), json!(2));
        }
        players.insert(format!("player_{team}"), serde_json::Value::Object(entries));
    }
    let submission = serde_json::Value::Object(players);
    c.bench_function("parse_actions_from_dict", |b| {
        b.iter(|| state.parse_actions_from_dict(black_box(&submission)))
    });
}

fn bench_state_clone(c: &mut Criterion) {
    let state = midgame();
    c.bench_function("state_clone", |b| b.iter(|| black_box(&state).clone()));
}

fn bench_rollouts(c: &mut Criterion) {
    let state = midgame();
    let config = RolloutConfig {
        num_rollouts: 8,
        max_turns: 50,
        seed: 1,
        ..Default::default()
    };
    let mut group = c.benchmark_group("rollouts");
    group.sample_size(10);
    group.bench_function("8x50_turns", |b| b.iter(|| run_rollouts(black_box(&state), &config)));
    group.finish();
}

criterion_group!(
    benches,
    bench_step_idle,
    bench_step_watering,
    bench_grow_set,
    bench_parse_actions,
    bench_state_clone,
    bench_rollouts,
);
criterion_main!(benches);
