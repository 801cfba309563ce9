//! Bid-phase resolution.
//!
//! Both teams bid for placement priority from their starting water/metal
//! pool. The convention lives in `bid_outcome` so it can be changed without
//! touching the phase logic.

use serde::{Deserialize, Serialize};

use crate::board::{Faction, Phase, State, TeamId, TEAM_COUNT};

/// One team's bid submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bid {
    /// Positive to place first, negative to place second; the magnitude is
    /// what the team is willing to pay.
    pub bid: i32,
    pub faction: Faction,
}

impl Bid {
    pub const fn new(bid: i32, faction: Faction) -> Self {
        Bid { bid, faction }
    }
}

/// Who won the bid, what they pay, and who places first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidOutcome {
    pub winner: TeamId,
    pub cost: i32,
    pub first_placer: TeamId,
}

/// Decides the bid.
///
/// Each bid's magnitude is capped at `max_bid`. The larger magnitude wins,
/// with team 0 winning exact ties. The winner pays its magnitude and places
/// first when its bid is non-negative, second otherwise.
pub fn bid_outcome(bids: [i32; TEAM_COUNT], max_bid: i32) -> BidOutcome {
    let clamped = bids.map(|b| b.clamp(-max_bid.max(0), max_bid.max(0)));
    let winner = if clamped[1].abs() > clamped[0].abs() { 1 } else { 0 };
    let cost = clamped[winner].abs();
    let first_placer = if clamped[winner] >= 0 { winner } else { 1 - winner };
    BidOutcome {
        winner,
        cost,
        first_placer,
    }
}

/// Applies the bid to `state`: seeds both pools, charges the winner, records
/// factions and placement order, and enters the placement phase.
pub fn resolve_bid(state: &mut State, bids: [Bid; TEAM_COUNT]) {
    let per_team = state.board.factories_per_team.max(0);
    let pool = state.env_cfg.init_water_metal_per_factory * per_team;

    for (team, bid) in state.teams.iter_mut().zip(bids) {
        team.faction = bid.faction;
        team.init_water = pool;
        team.init_metal = pool;
        team.factories_to_place = per_team;
    }

    let outcome = bid_outcome(bids.map(|b| b.bid), pool);
    let winner = &mut state.teams[outcome.winner];
    winner.init_water -= outcome.cost;
    winner.init_metal -= outcome.cost;
    for team in state.teams.iter_mut() {
        team.place_first = team.team_id == outcome.first_placer;
    }

    tracing::debug!(
        target: "resolve.bid",
        winner = outcome.winner,
        cost = outcome.cost,
        first_placer = outcome.first_placer,
        "bid resolved"
    );

    state.phase = Phase::FactoryPlacement;
    state.turn += 1;
    state.real_turn += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_magnitude_wins() {
        let o = bid_outcome([5, -3], 100);
        assert_eq!(o.winner, 0);
        assert_eq!(o.cost, 5);
        assert_eq!(o.first_placer, 0);

        let o = bid_outcome([2, 7], 100);
        assert_eq!(o.winner, 1);
        assert_eq!(o.first_placer, 1);
    }

    #[test]
    fn negative_winner_places_second() {
        let o = bid_outcome([1, -9], 100);
        assert_eq!(o.winner, 1);
        assert_eq!(o.cost, 9);
        assert_eq!(o.first_placer, 0);
    }

    #[test]
    fn tie_goes_to_team_zero() {
        let o = bid_outcome([4, -4], 100);
        assert_eq!(o.winner, 0);
        assert_eq!(o.first_placer, 0);

        let o = bid_outcome([-4, 4], 100);
        assert_eq!(o.winner, 0);
        assert_eq!(o.first_placer, 1);

        let o = bid_outcome([0, 0], 100);
        assert_eq!(o.winner, 0);
        assert_eq!(o.cost, 0);
        assert_eq!(o.first_placer, 0);
    }

    #[test]
    fn bids_are_capped_at_pool() {
        let o = bid_outcome([1000, 10], 300);
        assert_eq!(o.cost, 300);
        let o = bid_outcome([-1000, -2000], 300);
        assert_eq!(o.winner, 0);
        assert_eq!(o.cost, 300);
        assert_eq!(o.first_placer, 1);
    }
}
