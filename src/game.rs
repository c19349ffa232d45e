//! Board data model and the vocabulary of a match.
//!
//! - Positions, cells and descriptors
//! - Players and vision sets
//! - Tile and unit tokens on a board of spaces
//! - The ruleset
//! - Orders coming in and changes going out

mod bible;
mod board;
mod calendar;
mod change;
mod order;
mod player;
mod position;
mod space;
mod tokens;

pub use bible::{Bible, Climate, TileStats, UnitStats};
pub use board::Board;
pub use calendar::{Daytime, Phase, Season};
pub use change::{AttackKind, Change, ChangeSet, EnterCause, ExitCause, Notice};
pub use order::{Order, OrderType, parse_orders};
pub use player::{Player, Vision};
pub use position::{
    Cell, Descriptor, DescriptorType, Layer, MAX_EXTENT, Move, Position, format_moves, parse_moves,
};
pub use space::{Environment, Hazard, Space};
pub use tokens::{TileToken, TileType, UnitToken, UnitType};
