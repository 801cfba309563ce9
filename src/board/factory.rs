//! Stationary factories and their 3x3 footprint.

use serde::{Deserialize, Serialize};

use super::cargo::{Cargo, ResourceKind, UNBOUNDED};
use super::position::Position;
use super::{FactoryId, TeamId};

/// A factory. It occupies every tile within Chebyshev distance 1 of `pos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    pub team_id: TeamId,
    pub factory_id: FactoryId,
    pub pos: Position,
    pub cargo: Cargo,
    pub power: i32,
}

impl Factory {
    pub fn new(team_id: TeamId, factory_id: FactoryId, pos: Position, water: i32, metal: i32, power: i32) -> Self {
        Factory {
            team_id,
            factory_id,
            pos,
            cargo: Cargo::new(0, 0, water, metal),
            power,
        }
    }

    /// Adds a resource. Factory storage is effectively unbounded.
    pub fn add_resource(&mut self, resource: ResourceKind, amount: i32) -> i32 {
        let amount = amount.max(0);
        match resource {
            ResourceKind::Power => {
                let added = amount.min((UNBOUNDED - self.power).max(0));
                self.power += added;
                added
            }
            _ => self.cargo.add(resource, amount, UNBOUNDED),
        }
    }

    /// Removes a resource, clamped to what is held.
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

    pub fn covers(&self, pos: Position) -> bool {
        self.pos.chebyshev(pos) <= 1
    }

    /// The nine footprint tiles, row by row.
    pub fn footprint(&self) -> impl Iterator<Item = Position> + '_ {
        footprint_of(self.pos)
    }

    /// Converts up to the per-turn processing rate of ice to water and ore
    /// to metal. Leftover ice/ore that does not make a whole unit is kept.
    pub fn refine(&mut self, rate_water: i32, ice_ratio: i32, rate_metal: i32, ore_ratio: i32) {
        let ice = self.cargo.ice.min(rate_water);
        let water = ice / ice_ratio;
        self.cargo.ice -= water * ice_ratio;
        self.cargo.water += water;

        let ore = self.cargo.ore.min(rate_metal);
        let metal = ore / ore_ratio;
        self.cargo.ore -= metal * ore_ratio;
        self.cargo.metal += metal;
    }
}

/// Footprint tiles of a factory centred on `center`.
pub fn footprint_of(center: Position) -> impl Iterator<Item = Position> {
    (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| Position::new(center.x + dx, center.y + dy)))
}
