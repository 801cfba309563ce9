//! State transitions.
//!
//! One entry point per phase. Each takes `&self` and returns the next state;
//! calling an entry point in the wrong phase returns an unchanged copy.

pub mod bid;
pub mod lichen;
pub mod movement;
pub mod placement;
pub mod turn;

use serde_json::Value;

use crate::board::{Phase, State, TurnActions, TEAM_COUNT};
use crate::protocol::{parse_bids, parse_placements, ActionError};

pub use bid::{bid_outcome, Bid, BidOutcome};
pub use movement::{collision_power_loss, collision_winner, Collision};
pub use placement::{team_on_turn, validate_spawn, Placement, SpawnRejection};
pub use turn::{resolve_turn, TurnReport};

impl State {
    /// Resolves the bidding turn.
    pub fn bid_step(&self, bids: [Bid; TEAM_COUNT]) -> State {
        let mut next = self.clone();
        if self.phase == Phase::Bidding {
            bid::resolve_bid(&mut next, bids);
        } else {
            tracing::debug!(target: "resolve", phase = ?self.phase, "bid outside bidding phase ignored");
        }
        next
    }

    /// Resolves one factory-placement turn.
    pub fn factory_placement_step(&self, placements: [Placement; TEAM_COUNT]) -> State {
        let mut next = self.clone();
        if self.phase == Phase::FactoryPlacement {
            placement::resolve_placement(&mut next, placements);
        } else {
            tracing::debug!(target: "resolve", phase = ?self.phase, "placement outside placement phase ignored");
        }
        next
    }

    /// Resolves one main-phase turn.
    pub fn step_late_game(&self, actions: &TurnActions) -> State {
        self.step_late_game_with_report(actions).0
    }

    /// Like `step_late_game`, also returning what happened.
    pub fn step_late_game_with_report(&self, actions: &TurnActions) -> (State, TurnReport) {
        let mut next = self.clone();
        if self.phase != Phase::Main {
            tracing::debug!(target: "resolve", phase = ?self.phase, "actions outside main phase ignored");
            return (next, TurnReport::default());
        }
        let report = resolve_turn(&mut next, actions);
        (next, report)
    }

    /// Parses a raw submission for the current phase and resolves it.
    pub fn step(&self, submission: &Value) -> Result<State, ActionError> {
        match self.phase {
            Phase::Bidding => Ok(self.bid_step(parse_bids(submission)?)),
            Phase::FactoryPlacement => {
                let placements = parse_placements(submission, team_on_turn(self))?;
                Ok(self.factory_placement_step(placements))
            }
            Phase::Main => Ok(self.step_late_game(&self.parse_actions_from_dict(submission))),
        }
    }
}
