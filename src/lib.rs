//! Lichen engine library.
//!
//! Deterministic turn resolution for a two-team factory and lichen game:
//! bidding, factory placement, and the main-phase pipeline. Exposes the
//! board representation, resolvers, submission parser, and rollout driver.

pub mod board;
pub mod config;
pub mod protocol;
pub mod resolve;
pub mod selfplay;

pub use board::{Phase, State, TurnActions};
pub use config::{BufferConfig, ConfigError, EnvConfig};
pub use protocol::ActionError;
pub use resolve::{Bid, Placement};
