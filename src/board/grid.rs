//! Terrain and lichen layers.
//!
//! Each layer is a row-major vector of `width * height` entries indexed by
//! `Board::index`. Factories and units are not stored here; the state keeps
//! them and looks tiles up by position.

use serde::{Deserialize, Serialize};

use super::position::Position;
use super::FactoryId;
use crate::config::ConfigError;

/// Per-tile terrain, lichen, and the number of factories each team places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub factories_per_team: i32,
    pub rubble: Vec<i32>,
    pub ice: Vec<bool>,
    pub ore: Vec<bool>,
    pub lichen: Vec<i32>,
    pub lichen_strains: Vec<Option<FactoryId>>,
}

impl Board {
    /// A flat board with no rubble, resources, or lichen.
    pub fn empty(width: i32, height: i32, factories_per_team: i32) -> Self {
        let n = (width.max(0) * height.max(0)) as usize;
        Board {
            width,
            height,
            factories_per_team,
            rubble: vec![0; n],
            ice: vec![false; n],
            ore: vec![false; n],
            lichen: vec![0; n],
            lichen_strains: vec![None; n],
        }
    }

    /// Builds a board from terrain layers, checking every layer's length.
    pub fn from_terrain(
        width: i32,
        height: i32,
        factories_per_team: i32,
        rubble: Vec<i32>,
        ice: Vec<bool>,
        ore: Vec<bool>,
    ) -> Result<Self, ConfigError> {
        let mut board = Board::empty(width, height, factories_per_team);
        let expected = board.rubble.len();
        check_layer("rubble", expected, rubble.len())?;
        check_layer("ice", expected, ice.len())?;
        check_layer("ore", expected, ore.len())?;
        board.rubble = rubble;
        board.ice = ice;
        board.ore = ore;
        Ok(board)
    }

    /// Checks that every layer matches the declared dimensions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 3 || self.height < 3 {
            return Err(ConfigError::BoardTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        let expected = (self.width * self.height) as usize;
        check_layer("rubble", expected, self.rubble.len())?;
        check_layer("ice", expected, self.ice.len())?;
        check_layer("ore", expected, self.ore.len())?;
        check_layer("lichen", expected, self.lichen.len())?;
        check_layer("lichen_strains", expected, self.lichen_strains.len())
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Row-major index of an in-bounds position.
    pub fn index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "{pos:?} is off the board");
        (pos.y * self.width + pos.x) as usize
    }

    pub fn rubble_at(&self, pos: Position) -> i32 {
        self.rubble[self.index(pos)]
    }

    pub fn lichen_at(&self, pos: Position) -> i32 {
        self.lichen[self.index(pos)]
    }

    pub fn strain_at(&self, pos: Position) -> Option<FactoryId> {
        self.lichen_strains[self.index(pos)]
    }

    pub fn has_resource(&self, pos: Position) -> bool {
        let i = self.index(pos);
        self.ice[i] || self.ore[i]
    }

    /// Adds rubble to a tile, capped at `max_rubble`.
    pub fn add_rubble(&mut self, pos: Position, amount: i32, max_rubble: i32) {
        let i = self.index(pos);
        self.rubble[i] = (self.rubble[i] + amount).min(max_rubble);
    }

    /// Removes lichen from a tile; the strain goes with the last of it.
    pub fn remove_lichen(&mut self, pos: Position, amount: i32) {
        let i = self.index(pos);
        self.lichen[i] = (self.lichen[i] - amount).max(0);
        if self.lichen[i] == 0 {
            self.lichen_strains[i] = None;
        }
    }

    pub fn clear_lichen(&mut self, pos: Position) {
        let i = self.index(pos);
        self.lichen[i] = 0;
        self.lichen_strains[i] = None;
    }

    /// Total lichen on tiles whose strain satisfies `owned`.
    pub fn lichen_score(&self, owned: impl Fn(FactoryId) -> bool) -> i64 {
        self.lichen
            .iter()
            .zip(&self.lichen_strains)
            .filter_map(|(&amount, strain)| strain.filter(|&s| owned(s)).map(|_| i64::from(amount)))
            .sum()
    }
}

fn check_layer(layer: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::BoardShape {
            layer,
            expected,
            actual,
        })
    }
}
