//! Resource kinds and the shared-capacity cargo hold.
//!
//! Every quantity operation here saturates instead of failing: callers get
//! back the amount that actually moved and must use it, not the amount they
//! asked for.

use serde::{Deserialize, Serialize};

/// Transferable resources. Power is tracked outside `Cargo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Ice,
    Ore,
    Water,
    Metal,
    Power,
}

impl ResourceKind {
    /// Parses a resource from its wire code (0 = ice .. 4 = power).
    pub fn from_code(code: i64) -> Option<ResourceKind> {
        match code {
            0 => Some(ResourceKind::Ice),
            1 => Some(ResourceKind::Ore),
            2 => Some(ResourceKind::Water),
            3 => Some(ResourceKind::Metal),
            4 => Some(ResourceKind::Power),
            _ => None,
        }
    }
}

/// Capacity used for factory cargo and power; large but far from overflow.
pub const UNBOUNDED: i32 = i32::MAX / 2;

/// Ice, ore, water and metal held by a unit or factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cargo {
    pub ice: i32,
    pub ore: i32,
    pub water: i32,
    pub metal: i32,
}

impl Cargo {
    pub const fn new(ice: i32, ore: i32, water: i32, metal: i32) -> Self {
        Cargo {
            ice,
            ore,
            water,
            metal,
        }
    }

    /// Amount held of a cargo kind. Power is never in cargo and reads as 0.
    pub const fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Ice => self.ice,
            ResourceKind::Ore => self.ore,
            ResourceKind::Water => self.water,
            ResourceKind::Metal => self.metal,
            ResourceKind::Power => 0,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> Option<&mut i32> {
        match kind {
            ResourceKind::Ice => Some(&mut self.ice),
            ResourceKind::Ore => Some(&mut self.ore),
            ResourceKind::Water => Some(&mut self.water),
            ResourceKind::Metal => Some(&mut self.metal),
            ResourceKind::Power => None,
        }
    }

    /// Sum over all four slots.
    pub fn total(&self) -> i64 {
        i64::from(self.ice) + i64::from(self.ore) + i64::from(self.water) + i64::from(self.metal)
    }

    /// Adds up to `amount` of `kind`, limited by the space left under
    /// `cargo_space`. Returns the amount actually added.
    pub fn add(&mut self, kind: ResourceKind, amount: i32, cargo_space: i32) -> i32 {
        let free = (i64::from(cargo_space) - self.total()).max(0);
        let added = i64::from(amount.max(0)).min(free) as i32;
        match self.slot_mut(kind) {
            Some(slot) => {
                *slot += added;
                added
            }
            None => 0,
        }
    }

    /// Removes up to `amount` of `kind`. Returns the amount actually removed.
    pub fn sub(&mut self, kind: ResourceKind, amount: i32) -> i32 {
        match self.slot_mut(kind) {
            Some(slot) => {
                let removed = amount.max(0).min(*slot);
                *slot -= removed;
                removed
            }
            None => 0,
        }
    }
}
