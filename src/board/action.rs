//! Validated, engine-internal action types.
//!
//! Units carry a queue of `UnitAction`s and execute the head each turn.
//! Factories receive at most one `FactoryAction` per turn, which is not
//! queued.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::cargo::ResourceKind;
use super::position::Direction;
use super::{FactoryId, UnitId};

/// What a unit does when an action reaches the head of its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitActionKind {
    Move { direction: Direction },
    Transfer {
        direction: Direction,
        resource: ResourceKind,
        amount: i32,
    },
    Pickup { resource: ResourceKind, amount: i32 },
    Dig,
    SelfDestruct,
    /// Wait until power reaches `amount`.
    Recharge { amount: i32 },
}

/// A queued unit action with its recycle and execution counters.
///
/// `n` is how many more times the action runs before it leaves the head;
/// `repeat` is the `n` it is re-queued with at the back (0 means drop it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitAction {
    pub kind: UnitActionKind,
    pub repeat: u16,
    pub n: u16,
}

impl UnitAction {
    /// A single execution with no recycling.
    pub const fn once(kind: UnitActionKind) -> Self {
        UnitAction {
            kind,
            repeat: 0,
            n: 1,
        }
    }

    pub const fn move_to(direction: Direction) -> Self {
        UnitAction::once(UnitActionKind::Move { direction })
    }

    pub const fn transfer(direction: Direction, resource: ResourceKind, amount: i32) -> Self {
        UnitAction::once(UnitActionKind::Transfer {
            direction,
            resource,
            amount,
        })
    }

    pub const fn pickup(resource: ResourceKind, amount: i32) -> Self {
        UnitAction::once(UnitActionKind::Pickup { resource, amount })
    }

    pub const fn dig() -> Self {
        UnitAction::once(UnitActionKind::Dig)
    }

    pub const fn self_destruct() -> Self {
        UnitAction::once(UnitActionKind::SelfDestruct)
    }

    pub const fn recharge(amount: i32) -> Self {
        UnitAction::once(UnitActionKind::Recharge { amount })
    }

    pub const fn with_repeat(mut self, repeat: u16, n: u16) -> Self {
        self.repeat = repeat;
        self.n = n;
        self
    }

    pub const fn is_move(&self) -> bool {
        matches!(self.kind, UnitActionKind::Move { .. })
    }
}

pub type ActionQueue = VecDeque<UnitAction>;

/// One-shot factory actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactoryAction {
    BuildLight,
    BuildHeavy,
    Water,
}

impl FactoryAction {
    /// Parses a factory action from its wire code (0 light, 1 heavy, 2 water).
    pub fn from_code(code: i64) -> Option<FactoryAction> {
        match code {
            0 => Some(FactoryAction::BuildLight),
            1 => Some(FactoryAction::BuildHeavy),
            2 => Some(FactoryAction::Water),
            _ => None,
        }
    }
}

/// Everything submitted for one turn of the main phase.
///
/// A unit absent from `unit_queues` keeps executing its existing queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnActions {
    pub unit_queues: BTreeMap<UnitId, ActionQueue>,
    pub factory_actions: BTreeMap<FactoryId, FactoryAction>,
}

impl TurnActions {
    pub fn empty() -> Self {
        TurnActions::default()
    }

    pub fn is_empty(&self) -> bool {
        self.unit_queues.is_empty() && self.factory_actions.is_empty()
    }

    /// Replaces `unit_id`'s queue with `actions` this turn.
    pub fn set_queue(&mut self, unit_id: UnitId, actions: impl IntoIterator<Item = UnitAction>) {
        self.unit_queues.insert(unit_id, actions.into_iter().collect());
    }

    pub fn set_factory(&mut self, factory_id: FactoryId, action: FactoryAction) {
        self.factory_actions.insert(factory_id, action);
    }
}
