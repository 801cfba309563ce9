//! Mobile units: their type, ledger, and action queue.

use serde::{Deserialize, Serialize};

use super::action::{ActionQueue, UnitAction};
use super::cargo::{Cargo, ResourceKind};
use super::position::Position;
use super::{TeamId, UnitId};
use crate::config::UnitConfig;

/// The weight class of a unit. Heavy outranks light in collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Light,
    Heavy,
}

/// A unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub team_id: TeamId,
    pub unit_id: UnitId,
    pub pos: Position,
    pub unit_type: UnitType,
    pub cargo: Cargo,
    pub power: i32,
    pub action_queue: ActionQueue,
}

impl Unit {
    /// A freshly built unit with its type's starting power and no orders.
    pub fn new(team_id: TeamId, unit_id: UnitId, unit_type: UnitType, pos: Position, cfg: &UnitConfig) -> Self {
        Unit {
            team_id,
            unit_id,
            pos,
            unit_type,
            cargo: Cargo::default(),
            power: cfg.init_power,
            action_queue: ActionQueue::new(),
        }
    }

    /// Adds a resource, capped by cargo space or battery capacity.
    /// Returns the amount actually added.
    pub fn add_resource(&mut self, resource: ResourceKind, amount: i32, cfg: &UnitConfig) -> i32 {
        let amount = amount.max(0);
        match resource {
            ResourceKind::Power => {
                let added = amount.min((cfg.battery_capacity - self.power).max(0));
                self.power += added;
                added
            }
            _ => self.cargo.add(resource, amount, cfg.cargo_space),
        }
    }

    /// Removes a resource, clamped to what is held. Returns the amount removed.
    pub fn sub_resource(&mut self, resource: ResourceKind, amount: i32) -> i32 {
        match resource {
            ResourceKind::Power => {
                let removed = amount.max(0).min(self.power);
                self.power -= removed;
                removed
            }
            _ => self.cargo.sub(resource, amount),
        }
    }

    /// The action the unit will attempt this turn, if any.
    pub fn next_action(&self) -> Option<UnitAction> {
        self.action_queue.front().copied()
    }

    /// Records one successful execution of the head action.
    ///
    /// Decrements `n`; once it reaches zero the action leaves the head and,
    /// if it has a `repeat`, goes to the back with `n = repeat`.
    pub fn advance_queue(&mut self) {
        let Some(head) = self.action_queue.front_mut() else {
            return;
        };
        head.n = head.n.saturating_sub(1);
        if head.n > 0 {
            return;
        }
        if let Some(mut done) = self.action_queue.pop_front() {
            if done.repeat > 0 {
                done.n = done.repeat;
                self.action_queue.push_back(done);
            }
        }
    }
}
