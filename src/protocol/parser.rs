//! Submission parser.
//!
//! Turns raw JSON submissions into the typed inputs the resolvers take.
//! Main-phase actions are parsed leniently: a malformed entry drops only
//! that entity's actions. Bid and placement submissions are small and
//! structural, so they fail with an `ActionError` instead.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::board::{
    Direction, Faction, FactoryAction, Position, ResourceKind, State, TeamId, TurnActions, UnitAction,
    UnitActionKind, TEAM_COUNT,
};
use crate::resolve::{Bid, Placement};

/// Errors from parsing bid and placement submissions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("submission must be a JSON object")]
    NotAnObject,

    #[error("player_{team}: missing field '{field}'")]
    MissingField { team: TeamId, field: &'static str },

    #[error("player_{team}: invalid value for '{field}'")]
    InvalidField { team: TeamId, field: &'static str },

    #[error("unknown faction '{0}'")]
    UnknownFaction(String),
}

/// Splits `"<prefix>_<id>"` into its numeric id.
fn keyed_id(key: &str, prefix: &str) -> Option<u32> {
    key.strip_prefix(prefix)?.strip_prefix('_')?.parse().ok()
}

fn player_entries(submission: &Value) -> impl Iterator<Item = (TeamId, &Map<String, Value>)> {
    submission
        .as_object()
        .into_iter()
        .flat_map(|players| players.iter())
        .filter_map(|(key, value)| {
            let team = keyed_id(key, "player")? as TeamId;
            (team < TEAM_COUNT).then_some(())?;
            Some((team, value.as_object()?))
        })
}

fn player_object(submission: &Value, team: TeamId) -> Result<Option<&Map<String, Value>>, ActionError> {
    let players = submission.as_object().ok_or(ActionError::NotAnObject)?;
    match players.get(&format!("player_{team}")) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) if obj.is_empty() => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(ActionError::InvalidField { team, field: "player" }),
    }
}

fn int_field(obj: &Map<String, Value>, team: TeamId, field: &'static str) -> Result<i32, ActionError> {
    let value = obj.get(field).ok_or(ActionError::MissingField { team, field })?;
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(ActionError::InvalidField { team, field })
}

/// Parses `{"player_0": {"bid": 5, "faction": "AlphaStrike"}, ...}`.
///
/// A missing player bids zero with the default faction. The faction may be
/// given by name or by numeric code.
pub fn parse_bids(submission: &Value) -> Result<[Bid; TEAM_COUNT], ActionError> {
    let mut bids = [Bid::default(); TEAM_COUNT];
    for (team, bid) in bids.iter_mut().enumerate() {
        let Some(obj) = player_object(submission, team)? else {
            continue;
        };
        bid.bid = match obj.get("bid") {
            None => 0,
            Some(_) => int_field(obj, team, "bid")?,
        };
        bid.faction = match obj.get("faction") {
            None | Some(Value::Null) => Faction::default(),
            Some(Value::String(name)) => {
                Faction::from_name(name).ok_or_else(|| ActionError::UnknownFaction(name.clone()))?
            }
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(Faction::from_code)
                .ok_or_else(|| ActionError::UnknownFaction(n.to_string()))?,
            Some(_) => return Err(ActionError::InvalidField { team, field: "faction" }),
        };
    }
    Ok(bids)
}

/// Parses `{"player_0": {"spawn": [x, y], "water": 150, "metal": 150}}`.
///
/// Only `on_turn` is read; every other team gets a default placement, which
/// the resolver ignores, whatever it submitted. A missing or empty entry for
/// the team on turn is a default placement too.
pub fn parse_placements(
    submission: &Value,
    on_turn: Option<TeamId>,
) -> Result<[Placement; TEAM_COUNT], ActionError> {
    let mut placements = [Placement::default(); TEAM_COUNT];
    for (team, placement) in placements.iter_mut().enumerate() {
        if Some(team) != on_turn {
            if submission.get(format!("player_{team}")).is_some() {
                tracing::debug!(target: "protocol.parser", team, "placement from team off turn ignored");
            }
            continue;
        }
        let Some(obj) = player_object(submission, team)? else {
            continue;
        };
        let spawn = obj
            .get("spawn")
            .ok_or(ActionError::MissingField { team, field: "spawn" })?;
        *placement = Placement::new(
            parse_position(spawn).ok_or(ActionError::InvalidField { team, field: "spawn" })?,
            int_field(obj, team, "water")?,
            int_field(obj, team, "metal")?,
        );
    }
    Ok(placements)
}

fn parse_position(value: &Value) -> Option<Position> {
    match value.as_array()?.as_slice() {
        [x, y] => Some(Position::new(
            i32::try_from(x.as_i64()?).ok()?,
            i32::try_from(y.as_i64()?).ok()?,
        )),
        _ => None,
    }
}

/// Decodes one `[type, direction, resource, amount, repeat, n]` action. The
/// trailing `n` may be omitted and then defaults to one.
pub fn parse_unit_action(value: &Value) -> Option<UnitAction> {
    let fields: Vec<i64> = value.as_array()?.iter().map(Value::as_i64).collect::<Option<_>>()?;
    let (code, dir, res, amount, repeat, n) = match fields.as_slice() {
        &[code, dir, res, amount, repeat] => (code, dir, res, amount, repeat, 1),
        &[code, dir, res, amount, repeat, n] => (code, dir, res, amount, repeat, n),
        _ => return None,
    };
    if amount < 0 || n < 1 {
        return None;
    }
    let amount = i32::try_from(amount).ok()?;
    let repeat = u16::try_from(repeat).ok()?;
    let n = u16::try_from(n).ok()?;

    let kind = match code {
        0 => UnitActionKind::Move {
            direction: Direction::from_code(dir)?,
        },
        1 => UnitActionKind::Transfer {
            direction: Direction::from_code(dir)?,
            resource: ResourceKind::from_code(res)?,
            amount,
        },
        2 => UnitActionKind::Pickup {
            resource: ResourceKind::from_code(res)?,
            amount,
        },
        3 => UnitActionKind::Dig,
        4 => UnitActionKind::SelfDestruct,
        5 => UnitActionKind::Recharge { amount },
        _ => return None,
    };
    Some(UnitAction::once(kind).with_repeat(repeat, n))
}

impl State {
    /// Parses a main-phase submission.
    ///
    /// Shape: `{"player_0": {"unit_7": [[0, 1, 0, 0, 0, 1]], "factory_2": 1}}`.
    /// Entries naming an entity the player does not own, carrying an
    /// out-of-range code, or holding more actions than the queue allows are
    /// dropped individually; everything else in the submission still applies.
    pub fn parse_actions_from_dict(&self, submission: &Value) -> TurnActions {
        let mut actions = TurnActions::empty();
        for (team, entries) in player_entries(submission) {
            for (key, value) in entries {
                if let Some(unit_id) = keyed_id(key, "unit") {
                    if !self.units.get(&unit_id).is_some_and(|u| u.team_id == team) {
                        tracing::debug!(target: "protocol.parser", team, unit = unit_id, "not an owned unit");
                        continue;
                    }
                    match self.parse_queue(value) {
                        Some(queue) => actions.set_queue(unit_id, queue),
                        None => {
                            tracing::debug!(target: "protocol.parser", team, unit = unit_id, "malformed queue dropped")
                        }
                    }
                } else if let Some(factory_id) = keyed_id(key, "factory") {
                    if !self.factories.get(&factory_id).is_some_and(|f| f.team_id == team) {
                        tracing::debug!(target: "protocol.parser", team, factory = factory_id, "not an owned factory");
                        continue;
                    }
                    match value.as_i64().and_then(FactoryAction::from_code) {
                        Some(action) => actions.set_factory(factory_id, action),
                        None => {
                            tracing::debug!(target: "protocol.parser", team, factory = factory_id, "bad factory action")
                        }
                    }
                } else {
                    tracing::debug!(target: "protocol.parser", team, key = key.as_str(), "unknown entity key");
                }
            }
        }
        actions
    }

    fn parse_queue(&self, value: &Value) -> Option<Vec<UnitAction>> {
        let raw = value.as_array()?;
        if raw.len() > self.env_cfg.unit_action_queue_size {
            return None;
        }
        raw.iter().map(parse_unit_action).collect()
    }
}
