//! Per-cell state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{Layer, TileToken, UnitToken, Vision};

/// Boolean weather and contamination hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    /// Snow cover.
    Snow,
    /// Lethal cold.
    Frostbite,
    /// Wildfire.
    Firestorm,
    /// Extreme drought.
    Bonedrought,
    /// Wasteland left by runaway chaos.
    Death,
}

impl Hazard {
    /// All hazards.
    pub const ALL: [Hazard; 5] = [
        Hazard::Snow,
        Hazard::Frostbite,
        Hazard::Firestorm,
        Hazard::Bonedrought,
        Hazard::Death,
    ];
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hazard::Snow => "snow",
            Hazard::Frostbite => "frostbite",
            Hazard::Firestorm => "firestorm",
            Hazard::Bonedrought => "bonedrought",
            Hazard::Death => "death",
        };
        f.write_str(name)
    }
}

/// Environmental counters and hazard flags of one space.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Gas concentration.
    pub gas: i8,
    /// Radiation level.
    pub radiation: i8,
    /// Temperature.
    pub temperature: i8,
    /// Humidity.
    pub humidity: i8,
    /// Accumulated chaos.
    pub chaos: i8,
    /// Snow cover.
    pub snow: bool,
    /// Lethal cold.
    pub frostbite: bool,
    /// Wildfire.
    pub firestorm: bool,
    /// Extreme drought.
    pub bonedrought: bool,
    /// Wasteland.
    pub death: bool,
}

impl Environment {
    /// Whether `hazard` is active.
    #[must_use]
    pub const fn hazard(&self, hazard: Hazard) -> bool {
        match hazard {
            Hazard::Snow => self.snow,
            Hazard::Frostbite => self.frostbite,
            Hazard::Firestorm => self.firestorm,
            Hazard::Bonedrought => self.bonedrought,
            Hazard::Death => self.death,
        }
    }

    /// Switch `hazard` on or off.
    pub fn set_hazard(&mut self, hazard: Hazard, active: bool) {
        match hazard {
            Hazard::Snow => self.snow = active,
            Hazard::Frostbite => self.frostbite = active,
            Hazard::Firestorm => self.firestorm = active,
            Hazard::Bonedrought => self.bonedrought = active,
            Hazard::Death => self.death = active,
        }
    }
}

/// Everything on one cell of the board.
///
/// The vision set is read-only outside the crate: only applied vision
/// changes write it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Space {
    #[serde(skip)]
    vision: Vision,
    /// Counters and hazards.
    #[serde(flatten)]
    pub environment: Environment,
    /// Tile slot.
    #[serde(skip_serializing_if = "TileToken::is_none")]
    pub tile: TileToken,
    /// Ground unit slot.
    #[serde(skip_serializing_if = "UnitToken::is_none")]
    pub ground: UnitToken,
    /// Air unit slot.
    #[serde(skip_serializing_if = "UnitToken::is_none")]
    pub air: UnitToken,
    /// Bypass unit slot.
    #[serde(skip_serializing_if = "UnitToken::is_none")]
    pub bypass: UnitToken,
}

impl Space {
    /// A space holding just a tile.
    #[must_use]
    pub fn with_tile(tile: TileToken) -> Self {
        Self {
            tile,
            ..Self::default()
        }
    }

    /// Players that currently see this space.
    #[must_use]
    pub const fn vision(&self) -> Vision {
        self.vision
    }

    pub(crate) fn set_vision(&mut self, vision: Vision) {
        self.vision = vision;
    }

    /// The unit in `layer`.
    #[must_use]
    pub const fn unit(&self, layer: Layer) -> &UnitToken {
        match layer {
            Layer::Ground => &self.ground,
            Layer::Air => &self.air,
            Layer::Bypass => &self.bypass,
        }
    }

    /// Mutable access to the unit in `layer`.
    pub fn unit_mut(&mut self, layer: Layer) -> &mut UnitToken {
        match layer {
            Layer::Ground => &mut self.ground,
            Layer::Air => &mut self.air,
            Layer::Bypass => &mut self.bypass,
        }
    }

    /// Occupied unit slots, in slot order.
    pub fn units(&self) -> impl Iterator<Item = (Layer, &UnitToken)> {
        Layer::ALL
            .into_iter()
            .map(|layer| (layer, self.unit(layer)))
            .filter(|(_, unit)| unit.is_some())
    }
}
