//! Orders issued by players.
//!
//! Each variant carries exactly the payload its order type uses. Orders have
//! a JSON form (internally tagged by `type`) and a one-line text form:
//!
//! ```text
//! move ground@0,0 target=ground@0,2 moves=ee
//! produce tile@1,1 target=ground@1,2 unit=rifleman
//! upgrade tile@1,1 tile=city
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::game::{Descriptor, Move, TileType, UnitType, format_moves, parse_moves};

/// The kind of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Walk along a path.
    Move,
    /// Attack the first enemy entering a cell.
    Guard,
    /// Attack a unit on a neighbouring cell.
    Focus,
    /// Keep enemies out of a cell.
    Lockdown,
    /// Ranged volleys at a cell.
    Shell,
    /// Long-range volleys at a distant cell.
    Bombard,
    /// Drop bombs on the cell below.
    Bomb,
    /// Take over the building underneath.
    Capture,
    /// Reshape the terrain underneath.
    Shape,
    /// Found a building, consuming the unit.
    Settle,
    /// Found a building on a neighbouring cell.
    Expand,
    /// Grow or transform a building.
    Upgrade,
    /// Turn neighbouring land into farmland.
    Cultivate,
    /// Create a unit.
    Produce,
    /// Cancel standing orders.
    Halt,
    /// Do nothing.
    None,
}

impl OrderType {
    /// Keyword of the text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderType::Move => "move",
            OrderType::Guard => "guard",
            OrderType::Focus => "focus",
            OrderType::Lockdown => "lockdown",
            OrderType::Shell => "shell",
            OrderType::Bombard => "bombard",
            OrderType::Bomb => "bomb",
            OrderType::Capture => "capture",
            OrderType::Shape => "shape",
            OrderType::Settle => "settle",
            OrderType::Expand => "expand",
            OrderType::Upgrade => "upgrade",
            OrderType::Cultivate => "cultivate",
            OrderType::Produce => "produce",
            OrderType::Halt => "halt",
            OrderType::None => "none",
        }
    }

    /// Whether the subject of this order is a tile rather than a unit.
    #[must_use]
    pub const fn is_tile_order(self) -> bool {
        matches!(
            self,
            OrderType::Expand | OrderType::Upgrade | OrderType::Cultivate | OrderType::Produce
        )
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "move" => OrderType::Move,
            "guard" => OrderType::Guard,
            "focus" => OrderType::Focus,
            "lockdown" => OrderType::Lockdown,
            "shell" => OrderType::Shell,
            "bombard" => OrderType::Bombard,
            "bomb" => OrderType::Bomb,
            "capture" => OrderType::Capture,
            "shape" => OrderType::Shape,
            "settle" => OrderType::Settle,
            "expand" => OrderType::Expand,
            "upgrade" => OrderType::Upgrade,
            "cultivate" => OrderType::Cultivate,
            "produce" => OrderType::Produce,
            "halt" => OrderType::Halt,
            "none" => OrderType::None,
            other => return Err(ParseError::UnknownOrderType(other.to_string())),
        })
    }
}

/// One instruction for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Order {
    /// Walk `subject` along `moves`, ending at `target`.
    Move {
        /// Unit being moved; updated as steps complete.
        subject: Descriptor,
        /// Final destination.
        target: Descriptor,
        /// Steps still to take.
        moves: Vec<Move>,
    },
    /// Attack the first enemy entering `target`.
    Guard {
        /// Guarding unit.
        subject: Descriptor,
        /// Guarded cell.
        target: Descriptor,
    },
    /// Attack the unit at `target`.
    Focus {
        /// Attacking unit.
        subject: Descriptor,
        /// Attacked unit slot.
        target: Descriptor,
    },
    /// Attack and block enemies trying to enter `target`.
    Lockdown {
        /// Locking unit.
        subject: Descriptor,
        /// Locked cell.
        target: Descriptor,
    },
    /// Fire ability volleys at `target`.
    Shell {
        /// Shelling unit.
        subject: Descriptor,
        /// Shelled cell.
        target: Descriptor,
    },
    /// Fire ability volleys at a distant `target`.
    Bombard {
        /// Bombarding unit.
        subject: Descriptor,
        /// Bombarded cell.
        target: Descriptor,
    },
    /// Bomb the cell below.
    Bomb {
        /// Bombing aircraft.
        subject: Descriptor,
    },
    /// Take the building underneath.
    Capture {
        /// Capturing unit.
        subject: Descriptor,
    },
    /// Reshape the terrain underneath.
    Shape {
        /// Shaping unit.
        subject: Descriptor,
        /// New terrain.
        #[serde(rename = "tile")]
        tile_type: TileType,
    },
    /// Found a building underneath, consuming the unit.
    Settle {
        /// Settling unit.
        subject: Descriptor,
        /// Building to found.
        #[serde(rename = "tile")]
        tile_type: TileType,
    },
    /// Found a building on a neighbouring cell.
    Expand {
        /// Expanding tile.
        subject: Descriptor,
        /// Cell to build on.
        target: Descriptor,
        /// Building to found.
        #[serde(rename = "tile")]
        tile_type: TileType,
    },
    /// Add a stack, or transform into another building.
    Upgrade {
        /// Upgraded tile.
        subject: Descriptor,
        /// Resulting building.
        #[serde(rename = "tile")]
        tile_type: TileType,
    },
    /// Turn neighbouring land into `tile_type`.
    Cultivate {
        /// Cultivating tile.
        subject: Descriptor,
        /// Resulting terrain.
        #[serde(rename = "tile")]
        tile_type: TileType,
    },
    /// Create a unit at `target`.
    Produce {
        /// Producing tile.
        subject: Descriptor,
        /// Unit slot to place it in.
        target: Descriptor,
        /// Unit to create.
        #[serde(rename = "unit")]
        unit_type: UnitType,
    },
    /// Cancel standing orders of `subject`.
    Halt {
        /// Halted unit.
        subject: Descriptor,
    },
    /// No order.
    None,
}

impl Order {
    /// The kind of this order.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        match self {
            Order::Move { .. } => OrderType::Move,
            Order::Guard { .. } => OrderType::Guard,
            Order::Focus { .. } => OrderType::Focus,
            Order::Lockdown { .. } => OrderType::Lockdown,
            Order::Shell { .. } => OrderType::Shell,
            Order::Bombard { .. } => OrderType::Bombard,
            Order::Bomb { .. } => OrderType::Bomb,
            Order::Capture { .. } => OrderType::Capture,
            Order::Shape { .. } => OrderType::Shape,
            Order::Settle { .. } => OrderType::Settle,
            Order::Expand { .. } => OrderType::Expand,
            Order::Upgrade { .. } => OrderType::Upgrade,
            Order::Cultivate { .. } => OrderType::Cultivate,
            Order::Produce { .. } => OrderType::Produce,
            Order::Halt { .. } => OrderType::Halt,
            Order::None => OrderType::None,
        }
    }

    /// The token this order is for, if any.
    #[must_use]
    pub const fn subject(&self) -> Option<Descriptor> {
        match self {
            Order::Move { subject, .. }
            | Order::Guard { subject, .. }
            | Order::Focus { subject, .. }
            | Order::Lockdown { subject, .. }
            | Order::Shell { subject, .. }
            | Order::Bombard { subject, .. }
            | Order::Bomb { subject }
            | Order::Capture { subject }
            | Order::Shape { subject, .. }
            | Order::Settle { subject, .. }
            | Order::Expand { subject, .. }
            | Order::Upgrade { subject, .. }
            | Order::Cultivate { subject, .. }
            | Order::Produce { subject, .. }
            | Order::Halt { subject } => Some(*subject),
            Order::None => None,
        }
    }

    /// The target descriptor, for orders that have one.
    #[must_use]
    pub const fn target(&self) -> Option<Descriptor> {
        match self {
            Order::Move { target, .. }
            | Order::Guard { target, .. }
            | Order::Focus { target, .. }
            | Order::Lockdown { target, .. }
            | Order::Shell { target, .. }
            | Order::Bombard { target, .. }
            | Order::Expand { target, .. }
            | Order::Produce { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Point the order at a new subject, after the subject moved.
    pub fn set_subject(&mut self, new_subject: Descriptor) {
        match self {
            Order::Move { subject, .. }
            | Order::Guard { subject, .. }
            | Order::Focus { subject, .. }
            | Order::Lockdown { subject, .. }
            | Order::Shell { subject, .. }
            | Order::Bombard { subject, .. }
            | Order::Bomb { subject }
            | Order::Capture { subject }
            | Order::Shape { subject, .. }
            | Order::Settle { subject, .. }
            | Order::Expand { subject, .. }
            | Order::Upgrade { subject, .. }
            | Order::Cultivate { subject, .. }
            | Order::Produce { subject, .. }
            | Order::Halt { subject } => *subject = new_subject,
            Order::None => {}
        }
    }

    /// Decode an order from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] for malformed data or unknown order types.
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        serde_json::from_str(text).map_err(|e| ParseError::Json(e.to_string()))
    }
}

#[derive(Default)]
struct Fields {
    target: Option<Descriptor>,
    tile: Option<TileType>,
    unit: Option<UnitType>,
    moves: Option<Vec<Move>>,
}

impl Fields {
    fn parse<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Self, ParseError> {
        let mut fields = Fields::default();
        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| ParseError::UnexpectedField(token.to_string()))?;
            match key {
                "target" => fields.target = Some(value.parse()?),
                "tile" => fields.tile = Some(value.parse()?),
                "unit" => fields.unit = Some(value.parse()?),
                "moves" => fields.moves = Some(parse_moves(value)?),
                _ => return Err(ParseError::UnexpectedField(token.to_string())),
            }
        }
        Ok(fields)
    }

    fn take_target(&mut self, order: &'static str) -> Result<Descriptor, ParseError> {
        self.target.take().ok_or(ParseError::MissingField {
            order,
            field: "target",
        })
    }

    fn take_tile(&mut self, order: &'static str) -> Result<TileType, ParseError> {
        self.tile.take().ok_or(ParseError::MissingField {
            order,
            field: "tile",
        })
    }

    fn finish(self) -> Result<(), ParseError> {
        let leftover = [
            self.target.map(|_| "target"),
            self.tile.map(|_| "tile"),
            self.unit.map(|_| "unit"),
            self.moves.map(|_| "moves"),
        ];
        match leftover.into_iter().flatten().next() {
            Some(field) => Err(ParseError::UnexpectedField(field.to_string())),
            None => Ok(()),
        }
    }
}

impl FromStr for Order {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let order_type: OrderType = tokens.next().ok_or(ParseError::Empty)?.parse()?;
        if order_type == OrderType::None {
            return match tokens.next() {
                Some(extra) => Err(ParseError::UnexpectedField(extra.to_string())),
                None => Ok(Order::None),
            };
        }

        let name = order_type.as_str();
        let subject: Descriptor = tokens
            .next()
            .ok_or(ParseError::MissingField {
                order: name,
                field: "subject",
            })?
            .parse()?;
        let mut fields = Fields::parse(tokens)?;

        let order = match order_type {
            OrderType::Move => {
                let target = fields.take_target(name)?;
                let moves = fields.moves.take().ok_or(ParseError::MissingField {
                    order: name,
                    field: "moves",
                })?;
                Order::Move {
                    subject,
                    target,
                    moves,
                }
            }
            OrderType::Guard => Order::Guard {
                subject,
                target: fields.take_target(name)?,
            },
            OrderType::Focus => Order::Focus {
                subject,
                target: fields.take_target(name)?,
            },
            OrderType::Lockdown => Order::Lockdown {
                subject,
                target: fields.take_target(name)?,
            },
            OrderType::Shell => Order::Shell {
                subject,
                target: fields.take_target(name)?,
            },
            OrderType::Bombard => Order::Bombard {
                subject,
                target: fields.take_target(name)?,
            },
            OrderType::Bomb => Order::Bomb { subject },
            OrderType::Capture => Order::Capture { subject },
            OrderType::Shape => Order::Shape {
                subject,
                tile_type: fields.take_tile(name)?,
            },
            OrderType::Settle => Order::Settle {
                subject,
                tile_type: fields.take_tile(name)?,
            },
            OrderType::Expand => Order::Expand {
                subject,
                target: fields.take_target(name)?,
                tile_type: fields.take_tile(name)?,
            },
            OrderType::Upgrade => Order::Upgrade {
                subject,
                tile_type: fields.take_tile(name)?,
            },
            OrderType::Cultivate => Order::Cultivate {
                subject,
                tile_type: fields.take_tile(name)?,
            },
            OrderType::Produce => Order::Produce {
                subject,
                target: fields.take_target(name)?,
                unit_type: fields.unit.take().ok_or(ParseError::MissingField {
                    order: name,
                    field: "unit",
                })?,
            },
            OrderType::Halt => Order::Halt { subject },
            OrderType::None => Order::None,
        };
        fields.finish()?;
        Ok(order)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.order_type().as_str())?;
        if let Some(subject) = self.subject() {
            write!(f, " {subject}")?;
        }
        if let Some(target) = self.target() {
            write!(f, " target={target}")?;
        }
        match self {
            Order::Shape { tile_type, .. }
            | Order::Settle { tile_type, .. }
            | Order::Expand { tile_type, .. }
            | Order::Upgrade { tile_type, .. }
            | Order::Cultivate { tile_type, .. } => write!(f, " tile={tile_type}"),
            Order::Produce { unit_type, .. } => write!(f, " unit={unit_type}"),
            Order::Move { moves, .. } => write!(f, " moves={}", format_moves(moves)),
            _ => Ok(()),
        }
    }
}

/// Parse one order per line, skipping blank lines and `#` comments.
///
/// # Errors
///
/// Returns the first parse error.
pub fn parse_orders(text: &str) -> Result<Vec<Order>, ParseError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Layer, Position};

    fn ground(row: i8, col: i8) -> Descriptor {
        Descriptor::unit(Layer::Ground, Position::new(row, col))
    }

    #[test]
    fn test_parse_move() {
        let order: Order = "move ground@0,0 target=ground@0,2 moves=ee".parse().unwrap();
        assert_eq!(
            order,
            Order::Move {
                subject: ground(0, 0),
                target: ground(0, 2),
                moves: vec![Move::East, Move::East],
            }
        );
        assert_eq!(order.to_string(), "move ground@0,0 target=ground@0,2 moves=ee");
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert_eq!(
            "teleport ground@0,0".parse::<Order>(),
            Err(ParseError::UnknownOrderType("teleport".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_missing_and_extra_fields() {
        assert!(matches!(
            "upgrade tile@1,1".parse::<Order>(),
            Err(ParseError::MissingField { field: "tile", .. })
        ));
        assert!(matches!(
            "halt ground@1,1 tile=grass".parse::<Order>(),
            Err(ParseError::UnexpectedField(_))
        ));
        assert!(matches!(
            "guard ground@1,1 cell@1,2".parse::<Order>(),
            Err(ParseError::UnexpectedField(_))
        ));
    }

    #[test]
    fn test_display_parse_agree_for_every_type() {
        let lines = [
            "guard ground@1,1 target=cell@1,2",
            "focus ground@1,1 target=ground@1,2",
            "lockdown ground@1,1 target=cell@2,1",
            "shell ground@1,1 target=cell@3,3",
            "bombard ground@1,1 target=cell@4,4",
            "bomb air@2,2",
            "capture ground@2,2",
            "shape ground@2,2 tile=trenches",
            "settle ground@2,2 tile=town",
            "expand tile@2,2 target=tile@2,3 tile=farm",
            "upgrade tile@2,2 tile=city",
            "cultivate tile@2,2 tile=soil",
            "produce tile@2,2 target=ground@2,2 unit=rifleman",
            "halt ground@0,0",
            "none",
        ];
        for line in lines {
            let order: Order = line.parse().unwrap();
            assert_eq!(order.to_string(), line);
        }
    }

    #[test]
    fn test_json_form() {
        let order = Order::Produce {
            subject: Descriptor::tile(Position::new(1, 1)),
            target: ground(1, 1),
            unit_type: UnitType::Militia,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(
            json,
            r#"{"type":"produce","subject":"tile@1,1","target":"ground@1,1","unit":"militia"}"#
        );
        assert_eq!(Order::from_json(&json).unwrap(), order);
        assert!(Order::from_json(r#"{"type":"warp","subject":"tile@1,1"}"#).is_err());
    }

    #[test]
    fn test_parse_orders_skips_comments() {
        let orders = parse_orders("# plan\nhalt ground@0,0\n\nnone\n").unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn test_set_subject_follows_unit() {
        let mut order: Order = "capture ground@0,0".parse().unwrap();
        order.set_subject(ground(0, 1));
        assert_eq!(order.subject(), Some(ground(0, 1)));
    }
}
