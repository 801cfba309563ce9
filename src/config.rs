//! Game rules and buffer limits.
//!
//! `EnvConfig` holds every rule constant the resolver reads; `BufferConfig`
//! holds the per-team capacity limits. Both are fixed for the lifetime of a
//! `State` and deserialize from upper-case JSON keys, falling back to the
//! defaults for anything missing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::unit::UnitType;

/// Per-unit-type rule constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UnitConfig {
    pub metal_cost: i32,
    pub power_cost: i32,
    pub cargo_space: i32,
    pub battery_capacity: i32,
    pub charge: i32,
    pub init_power: i32,
    pub move_cost: i32,
    pub rubble_movement_cost: f64,
    pub dig_cost: i32,
    pub dig_rubble_removed: i32,
    pub dig_resource_gain: i32,
    pub dig_lichen_removed: i32,
    pub self_destruct_cost: i32,
    pub rubble_after_destruction: i32,
    pub action_queue_power_cost: i32,
}

impl UnitConfig {
    pub const fn light() -> Self {
        UnitConfig {
            metal_cost: 10,
            power_cost: 50,
            cargo_space: 100,
            battery_capacity: 150,
            charge: 1,
            init_power: 50,
            move_cost: 1,
            rubble_movement_cost: 0.05,
            dig_cost: 5,
            dig_rubble_removed: 2,
            dig_resource_gain: 2,
            dig_lichen_removed: 10,
            self_destruct_cost: 10,
            rubble_after_destruction: 1,
            action_queue_power_cost: 1,
        }
    }

    pub const fn heavy() -> Self {
        UnitConfig {
            metal_cost: 100,
            power_cost: 500,
            cargo_space: 1000,
            battery_capacity: 3000,
            charge: 10,
            init_power: 500,
            move_cost: 20,
            rubble_movement_cost: 1.0,
            dig_cost: 60,
            dig_rubble_removed: 20,
            dig_resource_gain: 20,
            dig_lichen_removed: 100,
            self_destruct_cost: 100,
            rubble_after_destruction: 10,
            action_queue_power_cost: 10,
        }
    }

    /// Power needed to step onto a tile with the given rubble.
    pub fn move_power(&self, rubble: i32) -> i32 {
        (f64::from(self.move_cost) + self.rubble_movement_cost * f64::from(rubble)).floor() as i32
    }
}

/// Light and heavy unit constants.
///
/// Deserializes key by key: a `ROBOTS` block naming only `{"LIGHT": {"CHARGE": 2}}`
/// keeps every other light and heavy constant at its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RobotsPatch", rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RobotsConfig {
    pub light: UnitConfig,
    pub heavy: UnitConfig,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        RobotsConfig {
            light: UnitConfig::light(),
            heavy: UnitConfig::heavy(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
struct UnitConfigPatch {
    metal_cost: Option<i32>,
    power_cost: Option<i32>,
    cargo_space: Option<i32>,
    battery_capacity: Option<i32>,
    charge: Option<i32>,
    init_power: Option<i32>,
    move_cost: Option<i32>,
    rubble_movement_cost: Option<f64>,
    dig_cost: Option<i32>,
    dig_rubble_removed: Option<i32>,
    dig_resource_gain: Option<i32>,
    dig_lichen_removed: Option<i32>,
    self_destruct_cost: Option<i32>,
    rubble_after_destruction: Option<i32>,
    action_queue_power_cost: Option<i32>,
}

impl UnitConfigPatch {
    fn apply(self, base: UnitConfig) -> UnitConfig {
        UnitConfig {
            metal_cost: self.metal_cost.unwrap_or(base.metal_cost),
            power_cost: self.power_cost.unwrap_or(base.power_cost),
            cargo_space: self.cargo_space.unwrap_or(base.cargo_space),
            battery_capacity: self.battery_capacity.unwrap_or(base.battery_capacity),
            charge: self.charge.unwrap_or(base.charge),
            init_power: self.init_power.unwrap_or(base.init_power),
            move_cost: self.move_cost.unwrap_or(base.move_cost),
            rubble_movement_cost: self.rubble_movement_cost.unwrap_or(base.rubble_movement_cost),
            dig_cost: self.dig_cost.unwrap_or(base.dig_cost),
            dig_rubble_removed: self.dig_rubble_removed.unwrap_or(base.dig_rubble_removed),
            dig_resource_gain: self.dig_resource_gain.unwrap_or(base.dig_resource_gain),
            dig_lichen_removed: self.dig_lichen_removed.unwrap_or(base.dig_lichen_removed),
            self_destruct_cost: self.self_destruct_cost.unwrap_or(base.self_destruct_cost),
            rubble_after_destruction: self.rubble_after_destruction.unwrap_or(base.rubble_after_destruction),
            action_queue_power_cost: self.action_queue_power_cost.unwrap_or(base.action_queue_power_cost),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
struct RobotsPatch {
    light: UnitConfigPatch,
    heavy: UnitConfigPatch,
}

impl From<RobotsPatch> for RobotsConfig {
    fn from(patch: RobotsPatch) -> Self {
        RobotsConfig {
            light: patch.light.apply(UnitConfig::light()),
            heavy: patch.heavy.apply(UnitConfig::heavy()),
        }
    }
}

/// Rule constants for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EnvConfig {
    pub max_episode_length: i32,
    pub map_size: i32,
    pub cycle_length: i32,
    pub day_length: i32,
    pub unit_action_queue_size: usize,
    pub max_rubble: i32,
    pub factory_rubble_after_destruction: i32,
    pub init_water_metal_per_factory: i32,
    pub init_power_per_factory: i32,
    pub min_lichen_to_spread: i32,
    pub lichen_lost_without_water: i32,
    pub lichen_gained_with_water: i32,
    pub max_lichen_per_tile: i32,
    pub power_per_connected_lichen_tile: i32,
    pub lichen_watering_cost_factor: i32,
    pub factory_processing_rate_water: i32,
    pub ice_water_ratio: i32,
    pub factory_processing_rate_metal: i32,
    pub ore_metal_ratio: i32,
    pub factory_charge: i32,
    pub factory_water_consumption: i32,
    pub power_loss_factor: f64,
    pub robots: RobotsConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            max_episode_length: 1000,
            map_size: 48,
            cycle_length: 50,
            day_length: 30,
            unit_action_queue_size: 20,
            max_rubble: 100,
            factory_rubble_after_destruction: 50,
            init_water_metal_per_factory: 150,
            init_power_per_factory: 1000,
            min_lichen_to_spread: 20,
            lichen_lost_without_water: 1,
            lichen_gained_with_water: 1,
            max_lichen_per_tile: 100,
            power_per_connected_lichen_tile: 1,
            lichen_watering_cost_factor: 10,
            factory_processing_rate_water: 100,
            ice_water_ratio: 4,
            factory_processing_rate_metal: 50,
            ore_metal_ratio: 5,
            factory_charge: 50,
            factory_water_consumption: 1,
            power_loss_factor: 0.5,
            robots: RobotsConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Parses a config from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Constants for the given unit type.
    pub fn unit(&self, unit_type: UnitType) -> &UnitConfig {
        match unit_type {
            UnitType::Light => &self.robots.light,
            UnitType::Heavy => &self.robots.heavy,
        }
    }

    /// Whether the given post-placement turn falls in daytime.
    pub fn is_day(&self, real_turn: i32) -> bool {
        real_turn.rem_euclid(self.cycle_length) < self.day_length
    }
}

/// Capacity limits for the unit and factory tables, per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BufferConfig {
    pub max_n_units: usize,
    pub max_n_factories: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            max_n_units: 1000,
            max_n_factories: 6,
        }
    }
}

/// Errors raised while building or loading a `State`; none can occur
/// mid-episode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("board layer '{layer}' has {actual} tiles, expected {expected}")]
    BoardShape {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("board must be at least 3x3, got {width}x{height}")]
    BoardTooSmall { width: i32, height: i32 },

    #[error("factory buffer holds {capacity} per team but {required} must be placed")]
    FactoryCapacity { capacity: usize, required: usize },

    #[error("unit buffer must hold at least one unit per team")]
    ZeroUnitCapacity,

    #[error("cycle length {cycle} must be positive and not shorter than day length {day}")]
    DayCycle { cycle: i32, day: i32 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i32 },

    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("{entity} {id} does not fit the loaded state")]
    Inconsistent { entity: &'static str, id: u32 },
}

impl EnvConfig {
    /// Checks the constants the resolver divides by, cycles over, or scales
    /// power with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_length <= 0 || self.day_length > self.cycle_length {
            return Err(ConfigError::DayCycle {
                cycle: self.cycle_length,
                day: self.day_length,
            });
        }
        for (name, value) in [
            ("ICE_WATER_RATIO", self.ice_water_ratio),
            ("ORE_METAL_RATIO", self.ore_metal_ratio),
            ("LICHEN_WATERING_COST_FACTOR", self.lichen_watering_cost_factor),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.power_loss_factor) {
            return Err(ConfigError::OutOfRange {
                name: "POWER_LOSS_FACTOR",
                value: self.power_loss_factor,
            });
        }
        for (name, cfg) in [
            ("LIGHT.RUBBLE_MOVEMENT_COST", &self.robots.light),
            ("HEAVY.RUBBLE_MOVEMENT_COST", &self.robots.heavy),
        ] {
            let value = cfg.rubble_movement_cost;
            // Keeps move_power inside i32 for any rubble up to MAX_RUBBLE.
            let worst = f64::from(cfg.move_cost) + value * f64::from(self.max_rubble.max(0));
            if !value.is_finite() || value < 0.0 || worst > f64::from(i32::MAX) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}
