//! Complete game state.
//!
//! Holds the board, both teams, every live unit and factory, and the turn
//! counters. Transitions never mutate a `State` in place from the caller's
//! point of view: each entry point in `resolve` takes `&self` and returns
//! the next state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::factory::Factory;
use super::grid::Board;
use super::position::Position;
use super::team::Team;
use super::unit::Unit;
use super::{FactoryId, TeamId, UnitId, TEAM_COUNT};
use crate::config::{BufferConfig, ConfigError, EnvConfig};

/// Which transition the state expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Bidding,
    FactoryPlacement,
    Main,
}

/// Everything needed to resolve the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub env_cfg: EnvConfig,
    pub buf_cfg: BufferConfig,
    pub phase: Phase,
    pub board: Board,
    pub teams: [Team; TEAM_COUNT],
    pub units: BTreeMap<UnitId, Unit>,
    pub factories: BTreeMap<FactoryId, Factory>,
    /// Every transition, including bidding and placement.
    pub turn: i32,
    /// Turns since placement finished; negative before that.
    pub real_turn: i32,
    pub next_unit_id: UnitId,
    pub next_factory_id: FactoryId,
}

impl State {
    /// Starts an episode in the bidding phase.
    ///
    /// Fails if the configuration cannot support the board, since table
    /// limits cannot change once the episode is running.
    pub fn new(env_cfg: EnvConfig, buf_cfg: BufferConfig, board: Board) -> Result<Self, ConfigError> {
        check_setup(&env_cfg, &buf_cfg, &board)?;
        let real_turn = -(1 + 2 * board.factories_per_team);
        Ok(State {
            env_cfg,
            buf_cfg,
            phase: Phase::Bidding,
            board,
            teams: [Team::new(0), Team::new(1)],
            units: BTreeMap::new(),
            factories: BTreeMap::new(),
            turn: 0,
            real_turn,
            next_unit_id: 0,
            next_factory_id: 0,
        })
    }

    /// Loads a serialized state, running the checks `new` runs plus a
    /// consistency pass over the loaded teams, units and factories.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let state: State = serde_json::from_str(json)?;
        check_setup(&state.env_cfg, &state.buf_cfg, &state.board)?;
        for (i, team) in state.teams.iter().enumerate() {
            if team.team_id != i {
                return Err(ConfigError::Inconsistent {
                    entity: "team",
                    id: i as u32,
                });
            }
        }
        for (&id, unit) in &state.units {
            if unit.unit_id != id || unit.team_id >= TEAM_COUNT || !state.board.contains(unit.pos) {
                return Err(ConfigError::Inconsistent { entity: "unit", id });
            }
        }
        for (&id, factory) in &state.factories {
            let inside = factory.footprint().all(|p| state.board.contains(p));
            if factory.factory_id != id || factory.team_id >= TEAM_COUNT || !inside {
                return Err(ConfigError::Inconsistent { entity: "factory", id });
            }
        }
        Ok(state)
    }

    pub fn units_of(&self, team_id: TeamId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.team_id == team_id)
    }

    pub fn factories_of(&self, team_id: TeamId) -> impl Iterator<Item = &Factory> {
        self.factories.values().filter(move |f| f.team_id == team_id)
    }

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.units.values().find(|u| u.pos == pos)
    }

    /// The factory whose footprint covers `pos`, if any.
    pub fn factory_covering(&self, pos: Position) -> Option<&Factory> {
        self.factories.values().find(|f| f.covers(pos))
    }

    /// Lichen score per team, indexed by team id.
    pub fn team_lichen_score(&self) -> [i64; TEAM_COUNT] {
        [0, 1].map(|t: TeamId| {
            let team = &self.teams[t];
            self.board.lichen_score(|strain| team.owns_strain(strain))
        })
    }

    /// A team is out once placement is over and it has no factory left.
    pub fn is_team_eliminated(&self, team_id: TeamId) -> bool {
        self.phase == Phase::Main && self.teams[team_id].owned_factory_ids.is_empty()
    }

    /// True once a team is eliminated or the episode length is reached.
    /// Resolution never enforces this; callers decide when to stop.
    pub fn game_over(&self) -> bool {
        self.real_turn >= self.env_cfg.max_episode_length
            || (0..TEAM_COUNT).any(|t| self.is_team_eliminated(t))
    }

    pub fn is_day(&self) -> bool {
        self.env_cfg.is_day(self.real_turn)
    }

    /// Destroys a unit: it leaves rubble (unless it stood on a factory) and
    /// wipes the lichen on its tile.
    pub fn destroy_unit(&mut self, unit_id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&unit_id)?;
        if self.factory_covering(unit.pos).is_none() {
            let rubble = self.env_cfg.unit(unit.unit_type).rubble_after_destruction;
            self.board.add_rubble(unit.pos, rubble, self.env_cfg.max_rubble);
            self.board.clear_lichen(unit.pos);
        }
        tracing::debug!(target: "state.destroy", unit = unit_id, team = unit.team_id, "unit destroyed");
        Some(unit)
    }

    /// Destroys a factory, burying its footprint in rubble. The team keeps
    /// the strain for scoring but no longer owns the factory.
    pub fn destroy_factory(&mut self, factory_id: FactoryId) -> Option<Factory> {
        let factory = self.factories.remove(&factory_id)?;
        for p in factory.footprint() {
            self.board
                .add_rubble(p, self.env_cfg.factory_rubble_after_destruction, self.env_cfg.max_rubble);
        }
        self.teams[factory.team_id].forget_factory(factory_id);
        tracing::debug!(
            target: "state.destroy",
            factory = factory_id,
            team = factory.team_id,
            "factory destroyed"
        );
        Some(factory)
    }
}

/// Table limits and rule constants a state depends on for its whole life.
fn check_setup(env_cfg: &EnvConfig, buf_cfg: &BufferConfig, board: &Board) -> Result<(), ConfigError> {
    env_cfg.validate()?;
    board.validate()?;
    let required = board.factories_per_team.max(0) as usize;
    if buf_cfg.max_n_factories < required {
        return Err(ConfigError::FactoryCapacity {
            capacity: buf_cfg.max_n_factories,
            required,
        });
    }
    if buf_cfg.max_n_units == 0 {
        return Err(ConfigError::ZeroUnitCapacity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> State {
        State::new(EnvConfig::default(), BufferConfig::default(), Board::empty(16, 16, 2)).unwrap()
    }

    #[test]
    fn new_state_starts_bidding() {
        let s = state();
        assert_eq!(s.phase, Phase::Bidding);
        assert_eq!(s.turn, 0);
        assert_eq!(s.real_turn, -5);
        assert!(s.units.is_empty());
        assert!(s.factories.is_empty());
        assert_eq!(s.teams[1].team_id, 1);
    }

    #[test]
    fn factory_capacity_must_fit_quota() {
        let buf = BufferConfig {
            max_n_factories: 1,
            ..BufferConfig::default()
        };
        let err = State::new(EnvConfig::default(), buf, Board::empty(16, 16, 2)).unwrap_err();
        assert!(matches!(err, ConfigError::FactoryCapacity { capacity: 1, required: 2 }));
    }

    #[test]
    fn zero_unit_capacity_is_fatal() {
        let buf = BufferConfig {
            max_n_units: 0,
            ..BufferConfig::default()
        };
        assert!(matches!(
            State::new(EnvConfig::default(), buf, Board::empty(16, 16, 2)),
            Err(ConfigError::ZeroUnitCapacity)
        ));
    }

    #[test]
    fn snapshot_loads_with_validation() {
        let mut s = state();
        s.factories.insert(0, Factory::new(0, 0, Position::new(5, 5), 10, 10, 10));
        let text = serde_json::to_string(&s).unwrap();
        assert_eq!(State::from_json_str(&text).unwrap(), s);

        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["env_cfg"]["CYCLE_LENGTH"] = 0.into();
        assert!(matches!(
            State::from_json_str(&value.to_string()),
            Err(ConfigError::DayCycle { cycle: 0, .. })
        ));
    }

    #[test]
    fn snapshot_with_bad_board_or_entities_is_rejected() {
        let mut short = state();
        short.board.lichen.pop();
        let text = serde_json::to_string(&short).unwrap();
        assert!(matches!(State::from_json_str(&text), Err(ConfigError::BoardShape { .. })));

        let mut stray = state();
        stray.factories.insert(4, Factory::new(1, 4, Position::new(15, 15), 0, 0, 0));
        let text = serde_json::to_string(&stray).unwrap();
        assert!(matches!(
            State::from_json_str(&text),
            Err(ConfigError::Inconsistent { entity: "factory", id: 4 })
        ));

        assert!(matches!(State::from_json_str("[]"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn lookups() {
        let mut s = state();
        s.factories.insert(3, Factory::new(1, 3, Position::new(5, 5), 0, 0, 0));
        assert_eq!(s.factory_covering(Position::new(4, 6)).map(|f| f.factory_id), Some(3));
        assert!(s.factory_covering(Position::new(3, 5)).is_none());
        assert_eq!(s.factories_of(1).count(), 1);
        assert_eq!(s.factories_of(0).count(), 0);
    }

    #[test]
    fn elimination_only_in_main_phase() {
        let mut s = state();
        assert!(!s.is_team_eliminated(0));
        s.phase = Phase::Main;
        assert!(s.is_team_eliminated(0));
        assert!(s.game_over());
        s.teams[0].owned_factory_ids.push(0);
        s.teams[1].owned_factory_ids.push(1);
        s.real_turn = 10;
        assert!(!s.game_over());
    }
}
