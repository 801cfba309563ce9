//! Factory-placement resolution.
//!
//! Teams alternate placing factories in the order the bid decided. Only the
//! team on turn is heard; an illegal spawn wastes that team's turn.

use serde::{Deserialize, Serialize};

use crate::board::factory::footprint_of;
use crate::board::{Factory, Phase, Position, State, TeamId, TEAM_COUNT};

/// One team's placement submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub spawn: Position,
    pub water: i32,
    pub metal: i32,
}

impl Placement {
    pub const fn new(spawn: Position, water: i32, metal: i32) -> Self {
        Placement { spawn, water, metal }
    }
}

/// Why a spawn was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejection {
    OutOfBounds,
    OnResource,
    Overlaps,
    BufferFull,
}

/// The team whose placement is heard on the current turn, or `None` once
/// every team is done.
///
/// The first placer goes on even placement steps, the other on odd ones; a
/// team with nothing left to place yields its step to the other.
pub fn team_on_turn(state: &State) -> Option<TeamId> {
    let first = state.teams.iter().position(|t| t.place_first).unwrap_or(0);
    let step = (state.turn - 1).max(0);
    let scheduled = if step % 2 == 0 { first } else { 1 - first };
    [scheduled, 1 - scheduled]
        .into_iter()
        .find(|&t| state.teams[t].factories_to_place > 0)
}

/// Checks a spawn tile for `team_id`.
pub fn validate_spawn(state: &State, team_id: TeamId, spawn: Position) -> Result<(), SpawnRejection> {
    let board = &state.board;
    if spawn.x < 1 || spawn.y < 1 || spawn.x > board.width - 2 || spawn.y > board.height - 2 {
        return Err(SpawnRejection::OutOfBounds);
    }
    if footprint_of(spawn).any(|p| board.has_resource(p)) {
        return Err(SpawnRejection::OnResource);
    }
    if state.factories.values().any(|f| f.pos.chebyshev(spawn) <= 2) {
        return Err(SpawnRejection::Overlaps);
    }
    if state.factories_of(team_id).count() >= state.buf_cfg.max_n_factories {
        return Err(SpawnRejection::BufferFull);
    }
    Ok(())
}

/// Applies the on-turn team's placement and advances the turn.
pub fn resolve_placement(state: &mut State, placements: [Placement; TEAM_COUNT]) {
    if let Some(team_id) = team_on_turn(state) {
        let placement = placements[team_id];
        match validate_spawn(state, team_id, placement.spawn) {
            Ok(()) => place_factory(state, team_id, placement),
            Err(reason) => {
                tracing::debug!(
                    target: "resolve.placement",
                    team = team_id,
                    x = placement.spawn.x,
                    y = placement.spawn.y,
                    ?reason,
                    "spawn rejected"
                );
            }
        }
    }

    state.turn += 1;
    state.real_turn += 1;
    if state.teams.iter().all(|t| t.factories_to_place <= 0) {
        state.phase = Phase::Main;
        state.real_turn = 0;
    }
}

fn place_factory(state: &mut State, team_id: TeamId, placement: Placement) {
    let factory_id = state.next_factory_id;
    state.next_factory_id += 1;

    let team = &mut state.teams[team_id];
    let water = placement.water.clamp(0, team.init_water.max(0));
    let metal = placement.metal.clamp(0, team.init_metal.max(0));
    team.init_water -= water;
    team.init_metal -= metal;
    team.factories_to_place -= 1;
    team.record_factory(factory_id);

    for p in footprint_of(placement.spawn) {
        let i = state.board.index(p);
        state.board.rubble[i] = 0;
        state.board.lichen[i] = 0;
        state.board.lichen_strains[i] = None;
    }

    let power = state.env_cfg.init_power_per_factory;
    state
        .factories
        .insert(factory_id, Factory::new(team_id, factory_id, placement.spawn, water, metal, power));
    tracing::debug!(
        target: "resolve.placement",
        team = team_id,
        factory = factory_id,
        water,
        metal,
        "factory placed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Faction};
    use crate::config::{BufferConfig, EnvConfig};
    use crate::resolve::bid::{resolve_bid, Bid};

    fn after_bid(bids: [i32; 2]) -> State {
        let mut s = State::new(EnvConfig::default(), BufferConfig::default(), Board::empty(20, 20, 2)).unwrap();
        resolve_bid(
            &mut s,
            [Bid::new(bids[0], Faction::AlphaStrike), Bid::new(bids[1], Faction::FirstMars)],
        );
        s
    }

    #[test]
    fn first_placer_goes_first() {
        let s = after_bid([-5, 0]);
        assert!(s.teams[1].place_first);
        assert_eq!(team_on_turn(&s), Some(1));
    }

    #[test]
    fn alternates_between_teams() {
        let mut s = after_bid([3, 0]);
        let spawns = [Position::new(3, 3), Position::new(10, 3), Position::new(3, 10), Position::new(10, 10)];
        let mut order = Vec::new();
        for spawn in spawns {
            let team = team_on_turn(&s).unwrap();
            order.push(team);
            let mut placements = [Placement::default(); 2];
            placements[team] = Placement::new(spawn, 150, 150);
            resolve_placement(&mut s, placements);
        }
        assert_eq!(order, vec![0, 1, 0, 1]);
        assert_eq!(s.phase, Phase::Main);
        assert_eq!(s.real_turn, 0);
        assert_eq!(s.factories.len(), 4);
        assert!(s.teams.iter().all(|t| t.factories_to_place == 0));
    }

    #[test]
    fn water_and_metal_clamped_to_pool() {
        let mut s = after_bid([10, 0]);
        let mut placements = [Placement::default(); 2];
        placements[0] = Placement::new(Position::new(5, 5), 1000, -20);
        resolve_placement(&mut s, placements);
        let f = &s.factories[&0];
        assert_eq!(f.cargo.water, 290);
        assert_eq!(f.cargo.metal, 0);
        assert_eq!(f.power, 1000);
        assert_eq!(s.teams[0].init_water, 0);
        assert_eq!(s.teams[0].init_metal, 290);
    }

    #[test]
    fn illegal_spawn_wastes_the_turn() {
        let mut s = after_bid([0, 0]);
        let mut placements = [Placement::default(); 2];
        placements[0] = Placement::new(Position::new(0, 5), 100, 100);
        resolve_placement(&mut s, placements);
        assert!(s.factories.is_empty());
        assert_eq!(s.teams[0].factories_to_place, 2);
        assert_eq!(team_on_turn(&s), Some(1));
    }

    #[test]
    fn spawn_rules() {
        let mut s = after_bid([0, 0]);
        let i = s.board.index(Position::new(6, 6));
        s.board.ice[i] = true;
        assert_eq!(validate_spawn(&s, 0, Position::new(5, 5)), Err(SpawnRejection::OnResource));
        assert_eq!(validate_spawn(&s, 0, Position::new(19, 5)), Err(SpawnRejection::OutOfBounds));
        s.factories.insert(9, Factory::new(1, 9, Position::new(12, 12), 0, 0, 0));
        assert_eq!(validate_spawn(&s, 0, Position::new(14, 14)), Err(SpawnRejection::Overlaps));
        assert_eq!(validate_spawn(&s, 0, Position::new(15, 12)), Ok(()));
    }

    #[test]
    fn submissions_off_turn_are_ignored() {
        let mut s = after_bid([0, 0]);
        let mut placements = [Placement::default(); 2];
        placements[1] = Placement::new(Position::new(5, 5), 100, 100);
        resolve_placement(&mut s, placements);
        assert!(s.factories.is_empty());
    }
}
