//! Self-destruct, movement, and collision resolution.
//!
//! Every unit's destination is decided first; collisions are then resolved
//! per tile against those destinations all at once, so the outcome does not
//! depend on the order units are visited.

use std::collections::BTreeMap;

use crate::board::{Direction, Position, State, Unit, UnitActionKind, UnitId};

/// The outcome of several units ending the move on one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub pos: Position,
    pub winner: UnitId,
    pub destroyed: Vec<UnitId>,
    pub power_lost: i32,
}

/// Picks the survivor among units sharing a tile: heavy beats light, then
/// more power wins, then the lowest unit id.
pub fn collision_winner(units: &[&Unit]) -> Option<UnitId> {
    units
        .iter()
        .max_by(|a, b| {
            a.unit_type
                .cmp(&b.unit_type)
                .then(a.power.cmp(&b.power))
                .then(b.unit_id.cmp(&a.unit_id))
        })
        .map(|u| u.unit_id)
}

/// Power the survivor gives up: a share of the strongest loser's power.
pub fn collision_power_loss(strongest_loser: i32, factor: f64) -> i32 {
    (f64::from(strongest_loser.max(0)) * factor).ceil() as i32
}

/// Runs every affordable self-destruct at the head of a queue. A unit that
/// goes off on an opposing factory takes the factory with it.
pub fn resolve_self_destructs(state: &mut State) -> Vec<UnitId> {
    let mut detonating = Vec::new();
    for unit in state.units.values_mut() {
        let Some(action) = unit.next_action() else {
            continue;
        };
        if action.kind != UnitActionKind::SelfDestruct {
            continue;
        }
        let cost = state.env_cfg.unit(unit.unit_type).self_destruct_cost;
        if unit.power < cost {
            continue;
        }
        unit.power -= cost;
        detonating.push((unit.unit_id, unit.team_id, unit.pos));
    }

    let mut destroyed = Vec::with_capacity(detonating.len());
    for (unit_id, team_id, pos) in detonating {
        let target = state
            .factory_covering(pos)
            .filter(|f| f.team_id != team_id)
            .map(|f| f.factory_id);
        if let Some(factory_id) = target {
            state.destroy_factory(factory_id);
        }
        state.destroy_unit(unit_id);
        destroyed.push(unit_id);
    }
    destroyed
}

/// Where a unit ends up if its head action is a move, charging the move.
///
/// Returns `None` when the move is illegal or unaffordable; the unit then
/// stays put and keeps the action for next turn.
fn try_move(state: &State, unit: &Unit, direction: Direction) -> Option<(Position, i32)> {
    if direction == Direction::Center {
        return Some((unit.pos, 0));
    }
    let target = unit.pos.step(direction);
    if !state.board.contains(target) {
        return None;
    }
    if state
        .factory_covering(target)
        .is_some_and(|f| f.team_id != unit.team_id)
    {
        return None;
    }
    let cost = state
        .env_cfg
        .unit(unit.unit_type)
        .move_power(state.board.rubble_at(target));
    (unit.power >= cost).then_some((target, cost))
}

/// Moves every unit whose head action is a legal, affordable move, then
/// resolves collisions. Returns one entry per contested tile.
pub fn resolve_movement(state: &mut State) -> Vec<Collision> {
    let mut plans: Vec<(UnitId, Position, i32)> = Vec::new();
    for unit in state.units.values() {
        let Some(action) = unit.next_action() else {
            continue;
        };
        let UnitActionKind::Move { direction } = action.kind else {
            continue;
        };
        match try_move(state, unit, direction) {
            Some((target, cost)) => plans.push((unit.unit_id, target, cost)),
            None => tracing::trace!(
                target: "resolve.movement",
                unit = unit.unit_id,
                ?direction,
                "move blocked"
            ),
        }
    }

    for (unit_id, target, cost) in plans {
        if let Some(unit) = state.units.get_mut(&unit_id) {
            unit.power -= cost;
            unit.pos = target;
            unit.advance_queue();
        }
    }

    let mut by_tile: BTreeMap<Position, Vec<UnitId>> = BTreeMap::new();
    for unit in state.units.values() {
        by_tile.entry(unit.pos).or_default().push(unit.unit_id);
    }

    let mut collisions = Vec::new();
    for (pos, ids) in by_tile {
        if ids.len() < 2 {
            continue;
        }
        let units: Vec<&Unit> = ids.iter().filter_map(|id| state.units.get(id)).collect();
        let Some(winner) = collision_winner(&units) else {
            continue;
        };
        let strongest_loser = units
            .iter()
            .filter(|u| u.unit_id != winner)
            .map(|u| u.power)
            .max()
            .unwrap_or(0);
        let power_lost = collision_power_loss(strongest_loser, state.env_cfg.power_loss_factor);
        let destroyed: Vec<UnitId> = ids.iter().copied().filter(|&id| id != winner).collect();
        collisions.push(Collision {
            pos,
            winner,
            destroyed,
            power_lost,
        });
    }

    for collision in &collisions {
        tracing::debug!(
            target: "resolve.movement",
            x = collision.pos.x,
            y = collision.pos.y,
            winner = collision.winner,
            losers = collision.destroyed.len(),
            "collision"
        );
        if let Some(unit) = state.units.get_mut(&collision.winner) {
            unit.power = (unit.power - collision.power_lost).max(0);
        }
        for &id in &collision.destroyed {
            state.destroy_unit(id);
        }
    }
    collisions
}
