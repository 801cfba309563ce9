//! Submission protocol.
//!
//! Parses the JSON submissions agents send each turn: bids, factory
//! placements, and main-phase action dictionaries.

pub mod parser;

pub use parser::{parse_bids, parse_placements, parse_unit_action, ActionError};
