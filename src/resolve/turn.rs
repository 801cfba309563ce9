//! Main-phase turn resolution.
//!
//! Stages run in a fixed order; changing the order changes outcomes:
//!
//! 1. power accrual (solar for units, base charge plus lichen for factories)
//! 2. action intake (queue replacement)
//! 3. self-destruct, movement and collisions
//! 4. transfers, pickups, digs, recharges
//! 5. unit building
//! 6. refining, watering, lichen decay, water upkeep
//! 7. bookkeeping

use std::collections::BTreeMap;

use crate::board::{
    Factory, FactoryAction, FactoryId, Position, ResourceKind, State, TurnActions, Unit, UnitActionKind, UnitId,
    UnitType,
};

use super::lichen::{connected_lichen, water_and_decay};
use super::movement::{resolve_movement, resolve_self_destructs, Collision};

/// What happened during one resolved turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub collisions: Vec<Collision>,
    pub self_destructed: Vec<UnitId>,
    pub built: Vec<UnitId>,
    pub watered: Vec<FactoryId>,
    pub factories_lost: Vec<FactoryId>,
}

/// Resolves one main-phase turn in place.
pub fn resolve_turn(state: &mut State, actions: &TurnActions) -> TurnReport {
    let mut report = TurnReport::default();

    accrue_power(state);
    let factory_actions = take_actions(state, actions);

    report.self_destructed = resolve_self_destructs(state);
    report.collisions = resolve_movement(state);

    resolve_transfers(state);
    resolve_pickups(state);
    resolve_digs(state);
    resolve_recharges(state);

    report.built = resolve_builds(state, &factory_actions);

    for factory in state.factories.values_mut() {
        let cfg = &state.env_cfg;
        factory.refine(
            cfg.factory_processing_rate_water,
            cfg.ice_water_ratio,
            cfg.factory_processing_rate_metal,
            cfg.ore_metal_ratio,
        );
    }
    let waterers: Vec<FactoryId> = factory_actions
        .iter()
        .filter(|(_, &a)| a == FactoryAction::Water)
        .map(|(&id, _)| id)
        .collect();
    report.watered = water_and_decay(&mut state.board, &mut state.factories, &waterers, &state.env_cfg);
    report.factories_lost = pay_upkeep(state);

    for team in state.teams.iter_mut() {
        team.owned_factory_ids.retain(|id| state.factories.contains_key(id));
    }
    state.turn += 1;
    state.real_turn += 1;

    tracing::trace!(
        target: "resolve.turn",
        turn = state.turn,
        real_turn = state.real_turn,
        units = state.units.len(),
        factories = state.factories.len(),
        "turn resolved"
    );
    report
}

/// Stage 1: solar charge by day, and every factory's base charge plus one
/// unit per connected lichen tile.
fn accrue_power(state: &mut State) {
    if state.is_day() {
        for unit in state.units.values_mut() {
            let cfg = state.env_cfg.unit(unit.unit_type);
            unit.add_resource(ResourceKind::Power, cfg.charge, cfg);
        }
    }

    let gains: Vec<(FactoryId, i32)> = state
        .factories
        .values()
        .map(|f| {
            let tiles = connected_lichen(&state.board, f).len() as i32;
            let gain = state.env_cfg.factory_charge + state.env_cfg.power_per_connected_lichen_tile * tiles;
            (f.factory_id, gain)
        })
        .collect();
    for (id, gain) in gains {
        if let Some(factory) = state.factories.get_mut(&id) {
            factory.add_resource(ResourceKind::Power, gain);
        }
    }
}

/// Stage 2: installs submitted queues the units can pay for and returns the
/// factory actions addressed to live factories.
fn take_actions(state: &mut State, actions: &TurnActions) -> BTreeMap<FactoryId, FactoryAction> {
    let max_len = state.env_cfg.unit_action_queue_size;
    for (unit_id, queue) in &actions.unit_queues {
        let Some(unit) = state.units.get_mut(unit_id) else {
            continue;
        };
        if queue.is_empty() || queue.len() > max_len {
            continue;
        }
        let cost = state.env_cfg.unit(unit.unit_type).action_queue_power_cost;
        if unit.power < cost {
            tracing::trace!(target: "resolve.turn", unit = unit_id, cost, "cannot afford queue update");
            continue;
        }
        unit.power -= cost;
        unit.action_queue = queue.clone();
    }

    actions
        .factory_actions
        .iter()
        .filter(|(id, _)| state.factories.contains_key(id))
        .map(|(&id, &action)| (id, action))
        .collect()
}

/// Unit ids in ascending order whose head action matches `pred`.
fn heads_matching(state: &State, pred: impl Fn(&UnitActionKind) -> bool) -> Vec<UnitId> {
    state
        .units
        .values()
        .filter(|u| u.next_action().is_some_and(|a| pred(&a.kind)))
        .map(|u| u.unit_id)
        .collect()
}

fn advance(state: &mut State, unit_id: UnitId) {
    if let Some(unit) = state.units.get_mut(&unit_id) {
        unit.advance_queue();
    }
}

/// Who receives a transfer aimed at `target` from a unit of `team_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    Unit(UnitId),
    Factory(FactoryId),
}

/// An own factory covering `target` takes the transfer; otherwise an own
/// unit standing there does.
fn receiver_at(state: &State, sender: &Unit, target: Position) -> Option<Receiver> {
    if let Some(factory) = state
        .factory_covering(target)
        .filter(|f| f.team_id == sender.team_id)
    {
        return Some(Receiver::Factory(factory.factory_id));
    }
    state
        .units
        .values()
        .find(|u| u.pos == target && u.unit_id != sender.unit_id && u.team_id == sender.team_id)
        .map(|u| Receiver::Unit(u.unit_id))
}

/// Moves up to `amount` from a unit to a receiver. Whatever the receiver
/// cannot hold goes back to the sender, so the pair's total is unchanged.
fn transfer_from_unit(state: &mut State, unit_id: UnitId, to: Receiver, resource: ResourceKind, amount: i32) -> i32 {
    let Some(sender) = state.units.get_mut(&unit_id) else {
        return 0;
    };
    let removed = sender.sub_resource(resource, amount);
    let sender_type = sender.unit_type;

    let added = match to {
        Receiver::Unit(id) => match state.units.get_mut(&id) {
            Some(unit) => {
                let cfg = state.env_cfg.unit(unit.unit_type);
                unit.add_resource(resource, removed, cfg)
            }
            None => 0,
        },
        Receiver::Factory(id) => state
            .factories
            .get_mut(&id)
            .map_or(0, |f| f.add_resource(resource, removed)),
    };

    if added < removed {
        if let Some(sender) = state.units.get_mut(&unit_id) {
            sender.add_resource(resource, removed - added, state.env_cfg.unit(sender_type));
        }
    }
    added
}

/// Stage 4a. A transfer with nobody to receive it moves nothing but still
/// counts as executed.
fn resolve_transfers(state: &mut State) {
    for unit_id in heads_matching(state, |k| matches!(k, UnitActionKind::Transfer { .. })) {
        let Some(unit) = state.units.get(&unit_id) else {
            continue;
        };
        let Some(UnitActionKind::Transfer {
            direction,
            resource,
            amount,
        }) = unit.next_action().map(|a| a.kind)
        else {
            continue;
        };
        let target = unit.pos.step(direction);
        if let Some(to) = receiver_at(state, unit, target) {
            let moved = transfer_from_unit(state, unit_id, to, resource, amount);
            tracing::trace!(target: "resolve.turn", unit = unit_id, ?to, ?resource, moved, "transfer");
        }
        advance(state, unit_id);
    }
}

/// Stage 4b. Pickups only work from a friendly factory's footprint.
fn resolve_pickups(state: &mut State) {
    for unit_id in heads_matching(state, |k| matches!(k, UnitActionKind::Pickup { .. })) {
        let Some(unit) = state.units.get(&unit_id) else {
            continue;
        };
        let Some(UnitActionKind::Pickup { resource, amount }) = unit.next_action().map(|a| a.kind) else {
            continue;
        };
        let source = state
            .factory_covering(unit.pos)
            .filter(|f| f.team_id == unit.team_id)
            .map(|f| f.factory_id);
        if let Some(factory_id) = source {
            pickup(state, unit_id, factory_id, resource, amount);
        }
        advance(state, unit_id);
    }
}

fn pickup(state: &mut State, unit_id: UnitId, factory_id: FactoryId, resource: ResourceKind, amount: i32) {
    let Some(factory) = state.factories.get_mut(&factory_id) else {
        return;
    };
    let removed = factory.sub_resource(resource, amount);
    let added = match state.units.get_mut(&unit_id) {
        Some(unit) => {
            let cfg = state.env_cfg.unit(unit.unit_type);
            unit.add_resource(resource, removed, cfg)
        }
        None => 0,
    };
    if added < removed {
        if let Some(factory) = state.factories.get_mut(&factory_id) {
            factory.add_resource(resource, removed - added);
        }
    }
}

/// Stage 4c. Digging clears rubble first, then lichen, then mines ice or
/// ore. Unaffordable digs wait; digs on a factory tile do nothing.
fn resolve_digs(state: &mut State) {
    for unit_id in heads_matching(state, |k| *k == UnitActionKind::Dig) {
        let Some(unit) = state.units.get(&unit_id) else {
            continue;
        };
        let (pos, unit_type, power) = (unit.pos, unit.unit_type, unit.power);
        if state.factory_covering(pos).is_some() {
            advance(state, unit_id);
            continue;
        }
        let cfg = *state.env_cfg.unit(unit_type);
        if power < cfg.dig_cost {
            continue;
        }

        let i = state.board.index(pos);
        let mined = if state.board.rubble[i] > 0 {
            state.board.rubble[i] = (state.board.rubble[i] - cfg.dig_rubble_removed).max(0);
            None
        } else if state.board.lichen[i] > 0 {
            state.board.remove_lichen(pos, cfg.dig_lichen_removed);
            None
        } else if state.board.ice[i] {
            Some(ResourceKind::Ice)
        } else if state.board.ore[i] {
            Some(ResourceKind::Ore)
        } else {
            None
        };

        if let Some(unit) = state.units.get_mut(&unit_id) {
            unit.power -= cfg.dig_cost;
            if let Some(resource) = mined {
                unit.add_resource(resource, cfg.dig_resource_gain, &cfg);
            }
            unit.advance_queue();
        }
    }
}

/// Stage 4d. A recharge completes once the unit holds the target power.
fn resolve_recharges(state: &mut State) {
    for unit_id in heads_matching(state, |k| matches!(k, UnitActionKind::Recharge { .. })) {
        let Some(unit) = state.units.get_mut(&unit_id) else {
            continue;
        };
        if let Some(UnitActionKind::Recharge { amount }) = unit.next_action().map(|a| a.kind) {
            if unit.power >= amount {
                unit.advance_queue();
            }
        }
    }
}

/// Stage 5. Returns the ids of the units created.
fn resolve_builds(state: &mut State, factory_actions: &BTreeMap<FactoryId, FactoryAction>) -> Vec<UnitId> {
    let mut built = Vec::new();
    for (&factory_id, &action) in factory_actions {
        let unit_type = match action {
            FactoryAction::BuildLight => UnitType::Light,
            FactoryAction::BuildHeavy => UnitType::Heavy,
            FactoryAction::Water => continue,
        };
        let Some(factory) = state.factories.get(&factory_id) else {
            continue;
        };
        if !can_build(state, factory, unit_type) {
            continue;
        }
        let (team_id, pos) = (factory.team_id, factory.pos);
        let cfg = *state.env_cfg.unit(unit_type);
        if let Some(factory) = state.factories.get_mut(&factory_id) {
            factory.cargo.metal -= cfg.metal_cost;
            factory.power -= cfg.power_cost;
        }

        let unit_id = state.next_unit_id;
        state.next_unit_id += 1;
        state.units.insert(unit_id, Unit::new(team_id, unit_id, unit_type, pos, &cfg));
        tracing::debug!(target: "resolve.turn", factory = factory_id, unit = unit_id, ?unit_type, "unit built");
        built.push(unit_id);
    }
    built
}

/// A build needs the metal and power, a free slot in the team's unit
/// table, and an empty factory centre.
fn can_build(state: &State, factory: &Factory, unit_type: UnitType) -> bool {
    let cfg = state.env_cfg.unit(unit_type);
    if factory.cargo.metal < cfg.metal_cost || factory.power < cfg.power_cost {
        return false;
    }
    if state.units_of(factory.team_id).count() >= state.buf_cfg.max_n_units {
        tracing::trace!(target: "resolve.turn", factory = factory.factory_id, "unit table full");
        return false;
    }
    state.unit_at(factory.pos).is_none()
}

/// Stage 6 upkeep: every factory drinks its water; one that cannot is
/// destroyed. Returns the destroyed ids.
fn pay_upkeep(state: &mut State) -> Vec<FactoryId> {
    let consumption = state.env_cfg.factory_water_consumption;
    let mut dry = Vec::new();
    for factory in state.factories.values_mut() {
        if factory.cargo.water < consumption {
            dry.push(factory.factory_id);
        } else {
            factory.cargo.water -= consumption;
        }
    }
    for &id in &dry {
        state.destroy_factory(id);
    }
    dry
}
