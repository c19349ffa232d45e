//! Tile and unit tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::game::Player;

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $error:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every type, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Lowercase name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseError::$error(other.to_string())),
                }
            }
        }
    };
}

named_enum! {
    /// Kinds of tile.
    ///
    /// What each kind can do lives in the ruleset, not here.
    TileType, UnknownTileType {
        /// No tile.
        #[default]
        None => "none",
        /// Open grassland.
        Grass => "grass",
        /// Bare dirt.
        Dirt => "dirt",
        /// Dry sand.
        Desert => "desert",
        /// Remains of a destroyed building.
        Rubble => "rubble",
        /// Rocky high ground.
        Ridge => "ridge",
        /// Impassable peaks.
        Mountain => "mountain",
        /// Lakes and rivers.
        Water => "water",
        /// Woodland.
        Forest => "forest",
        /// Dug-in fortifications.
        Trenches => "trenches",
        /// Ploughed field.
        Soil => "soil",
        /// Ripe field.
        Crops => "crops",
        /// Small settlement.
        Town => "town",
        /// Large settlement.
        City => "city",
        /// Forward lookout.
        Outpost => "outpost",
        /// Factory.
        Industry => "industry",
        /// Infantry and vehicle depot.
        Barracks => "barracks",
        /// Air depot.
        Airfield => "airfield",
        /// Agricultural building.
        Farm => "farm",
        /// Power plant.
        Reactor => "reactor",
    }
}

named_enum! {
    /// Kinds of unit.
    UnitType, UnknownUnitType {
        /// No unit.
        #[default]
        None => "none",
        /// Basic infantry.
        Rifleman => "rifleman",
        /// Machine-gun infantry.
        Gunner => "gunner",
        /// Engineers and artillery spotters.
        Sapper => "sapper",
        /// Armoured vehicle.
        Tank => "tank",
        /// Founds new settlements.
        Settler => "settler",
        /// Cheap local defenders.
        Militia => "militia",
        /// Airship bomber.
        Zeppelin => "zeppelin",
    }
}

/// The tile occupying a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TileToken {
    /// Kind of tile; `None` means the slot is empty.
    #[serde(rename = "type")]
    pub tile_type: TileType,
    /// Owning player, `None` for natural tiles.
    pub owner: Player,
    /// Number of building stacks.
    pub stacks: i8,
    /// Number of empowered stacks, at most `stacks`.
    pub power: i8,
}

impl TileToken {
    /// An unowned tile with no stacks.
    #[must_use]
    pub const fn natural(tile_type: TileType) -> Self {
        Self {
            tile_type,
            owner: Player::None,
            stacks: 0,
            power: 0,
        }
    }

    /// An owned tile.
    #[must_use]
    pub const fn owned(tile_type: TileType, owner: Player, stacks: i8, power: i8) -> Self {
        Self {
            tile_type,
            owner,
            stacks,
            power,
        }
    }

    /// Whether a tile is present.
    #[must_use]
    pub const fn is_some(&self) -> bool {
        !matches!(self.tile_type, TileType::None)
    }

    /// Whether the slot is empty.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        !self.is_some()
    }

    /// Whether the tile belongs to a player.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.is_some() && !matches!(self.owner, Player::None)
    }
}

impl fmt::Display for TileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_owned() {
            write!(
                f,
                "{} {} x{} ({} powered)",
                self.owner, self.tile_type, self.stacks, self.power
            )
        } else {
            write!(f, "{}", self.tile_type)
        }
    }
}

/// A unit occupying one layer of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitToken {
    /// Kind of unit; `None` means the slot is empty.
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Owning player.
    pub owner: Player,
    /// Number of figures.
    pub stacks: i8,
}

impl UnitToken {
    /// Create a unit.
    #[must_use]
    pub const fn new(unit_type: UnitType, owner: Player, stacks: i8) -> Self {
        Self {
            unit_type,
            owner,
            stacks,
        }
    }

    /// Whether a unit is present.
    #[must_use]
    pub const fn is_some(&self) -> bool {
        !matches!(self.unit_type, UnitType::None)
    }

    /// Whether the slot is empty.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        !self.is_some()
    }
}

impl fmt::Display for UnitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} x{}", self.owner, self.unit_type, self.stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_roundtrip() {
        for &t in TileType::ALL {
            assert_eq!(t.as_str().parse::<TileType>().unwrap(), t);
        }
        for &u in UnitType::ALL {
            assert_eq!(u.as_str().parse::<UnitType>().unwrap(), u);
        }
        assert_eq!(
            "castle".parse::<TileType>(),
            Err(ParseError::UnknownTileType("castle".to_string()))
        );
    }

    #[test]
    fn test_none_tokens_are_falsy() {
        assert!(TileToken::default().is_none());
        assert!(UnitToken::default().is_none());
        assert!(!TileToken::natural(TileType::Grass).is_owned());
        assert!(TileToken::owned(TileType::Town, Player::Red, 1, 0).is_owned());
    }

    #[test]
    fn test_token_json_uses_type_key() {
        let unit = UnitToken::new(UnitType::Tank, Player::Blue, 2);
        let json = serde_json::to_string(&unit).unwrap();
        assert_eq!(json, r#"{"type":"tank","owner":"blue","stacks":2}"#);
        let back: UnitToken = serde_json::from_str(r#"{"type":"tank","owner":"blue"}"#).unwrap();
        assert_eq!(back.stacks, 0);
    }
}
