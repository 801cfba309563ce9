//! Board representation and game-state types.
//!
//! Contains positions, the resource ledger, units, factories, teams, the
//! terrain/lichen grid, actions, and the overall game state.

pub mod action;
pub mod cargo;
pub mod factory;
pub mod grid;
pub mod position;
pub mod state;
pub mod team;
pub mod unit;

/// Stable unit identifier, unique for the whole episode.
pub type UnitId = u32;
/// Stable factory identifier; also the lichen strain id.
pub type FactoryId = u32;
/// Team index, 0 or 1.
pub type TeamId = usize;

pub const TEAM_COUNT: usize = 2;

pub use action::{ActionQueue, FactoryAction, TurnActions, UnitAction, UnitActionKind};
pub use cargo::{Cargo, ResourceKind};
pub use factory::Factory;
pub use grid::Board;
pub use position::{Direction, Position};
pub use state::{Phase, State};
pub use team::{Faction, Team};
pub use unit::{Unit, UnitType};
