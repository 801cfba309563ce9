//! Per-player metadata: faction, bid outcome, and factory bookkeeping.

use serde::{Deserialize, Serialize};

use super::{FactoryId, TeamId};

/// Cosmetic faction choice made during bidding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    AlphaStrike,
    MotherMars,
    TheBuilders,
    FirstMars,
}

impl Faction {
    pub const ALL: [Faction; 4] = [
        Faction::AlphaStrike,
        Faction::MotherMars,
        Faction::TheBuilders,
        Faction::FirstMars,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Faction::AlphaStrike => "AlphaStrike",
            Faction::MotherMars => "MotherMars",
            Faction::TheBuilders => "TheBuilders",
            Faction::FirstMars => "FirstMars",
        }
    }

    pub fn from_name(name: &str) -> Option<Faction> {
        Faction::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn from_code(code: i64) -> Option<Faction> {
        usize::try_from(code).ok().and_then(|i| Faction::ALL.get(i).copied())
    }
}

/// One of the two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub faction: Faction,
    pub place_first: bool,
    pub init_water: i32,
    pub init_metal: i32,
    pub factories_to_place: i32,
    /// Every factory this team ever placed; lichen of these strains scores.
    pub factory_strains: Vec<FactoryId>,
    /// Factories still standing.
    pub owned_factory_ids: Vec<FactoryId>,
}

impl Team {
    pub fn new(team_id: TeamId) -> Self {
        Team {
            team_id,
            faction: Faction::default(),
            place_first: false,
            init_water: 0,
            init_metal: 0,
            factories_to_place: 0,
            factory_strains: Vec::new(),
            owned_factory_ids: Vec::new(),
        }
    }

    pub fn owns_strain(&self, strain: FactoryId) -> bool {
        self.factory_strains.contains(&strain)
    }

    pub(crate) fn record_factory(&mut self, factory_id: FactoryId) {
        self.factory_strains.push(factory_id);
        self.owned_factory_ids.push(factory_id);
    }

    pub(crate) fn forget_factory(&mut self, factory_id: FactoryId) {
        self.owned_factory_ids.retain(|&id| id != factory_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_names_roundtrip() {
        for f in Faction::ALL {
            assert_eq!(Faction::from_name(f.name()), Some(f));
        }
        assert_eq!(Faction::from_name("Nope"), None);
        assert_eq!(Faction::from_code(2), Some(Faction::TheBuilders));
        assert_eq!(Faction::from_code(-1), None);
    }

    #[test]
    fn strains_outlive_factories() {
        let mut team = Team::new(1);
        team.record_factory(3);
        team.record_factory(5);
        team.forget_factory(3);
        assert_eq!(team.owned_factory_ids, vec![5]);
        assert!(team.owns_strain(3));
        assert!(team.owns_strain(5));
        assert!(!team.owns_strain(4));
    }
}
