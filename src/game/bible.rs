//! The ruleset.
//!
//! A read-only JSON document describing what every tile and unit type can do,
//! plus the numeric knobs of the environment rules. The automaton only ever
//! queries it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BibleError;
use crate::game::{Layer, OrderType, TileType, UnitType};

/// Rules for one tile type.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileStats {
    /// Maximum building stacks.
    pub stacks_max: i8,
    /// Squared vision radius of an owned tile.
    pub vision: i32,
    /// Hit points per stack.
    pub hitpoints: i16,
    /// Money needed to create it.
    pub cost: i32,
    /// Money per powered stack each growth phase.
    pub income: i32,
    /// Can be owned by a player.
    pub ownable: bool,
    /// Counts as a city for regular defeat.
    pub city: bool,
    /// Natural terrain that units can reshape.
    pub natural: bool,
    /// Settlers and expansions may build here.
    pub buildable: bool,
    /// Ground units may stand here.
    pub walkable: bool,
    /// Cover granted to ground units against attacks.
    pub cover: u8,
    /// Chaos emitted per stack each decay phase.
    pub emission: i8,
    /// Gas released when destroyed.
    pub leak_gas: i8,
    /// Radiation released when destroyed.
    pub leak_radiation: i8,
    /// What remains after the last stack is destroyed.
    pub destroyed: TileType,
    /// Orders this tile may carry out.
    pub orders: Vec<OrderType>,
    /// Units it may produce.
    pub produces: Vec<UnitType>,
    /// Tiles it may expand into on neighbouring cells.
    pub expands: Vec<TileType>,
    /// Tiles it may transform into.
    pub upgrades: Vec<TileType>,
    /// Natural tiles it may cultivate around itself.
    pub cultivates: Vec<TileType>,
}

impl Default for TileStats {
    fn default() -> Self {
        UNKNOWN_TILE.clone()
    }
}

/// Rules for one unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Layer the unit occupies.
    pub layer: Layer,
    /// Maximum figures.
    pub stacks_max: i8,
    /// Squared vision radius.
    pub vision: i32,
    /// Hit points per figure.
    pub hitpoints: i16,
    /// Money needed to produce it.
    pub cost: i32,
    /// Steps per move order.
    pub speed: u8,
    /// Damage of each attack shot.
    pub attack_damage: i16,
    /// Attack shots per figure.
    pub attack_shots: u8,
    /// Damage of each trample shot.
    pub trample_damage: i16,
    /// Trample shots per figure when attacking on the move.
    pub trample_shots: u8,
    /// Damage of each ability shot.
    pub ability_damage: i16,
    /// Ability shots per figure per volley.
    pub ability_shots: u8,
    /// Volleys per ability order.
    pub ability_volleys: u8,
    /// Smallest squared range for ranged abilities.
    pub range_min: i32,
    /// Largest squared range for ranged abilities.
    pub range_max: i32,
    /// Vehicles ignore frostbite and gas.
    pub mechanical: bool,
    /// Attacks enemies that move next to it.
    pub opportunity: bool,
    /// Gas released when destroyed.
    pub leak_gas: i8,
    /// Radiation released when destroyed.
    pub leak_radiation: i8,
    /// Orders this unit may carry out.
    pub orders: Vec<OrderType>,
    /// Tiles it may found by settling.
    pub settles: Vec<TileType>,
    /// Natural tiles it may shape.
    pub shapes: Vec<TileType>,
}

impl Default for UnitStats {
    fn default() -> Self {
        UNKNOWN_UNIT.clone()
    }
}

/// Climate a season pulls the board towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Climate {
    /// Base temperature.
    pub temperature: i8,
    /// Base humidity.
    pub humidity: i8,
}

/// Stats used for types missing from the ruleset.
static UNKNOWN_TILE: TileStats = TileStats {
    stacks_max: 0,
    vision: 0,
    hitpoints: 1,
    cost: 0,
    income: 0,
    ownable: false,
    city: false,
    natural: false,
    buildable: false,
    walkable: true,
    cover: 0,
    emission: 0,
    leak_gas: 0,
    leak_radiation: 0,
    destroyed: TileType::Rubble,
    orders: Vec::new(),
    produces: Vec::new(),
    expands: Vec::new(),
    upgrades: Vec::new(),
    cultivates: Vec::new(),
};

static UNKNOWN_UNIT: UnitStats = UnitStats {
    layer: Layer::Ground,
    stacks_max: 0,
    vision: 0,
    hitpoints: 1,
    cost: 0,
    speed: 0,
    attack_damage: 0,
    attack_shots: 0,
    trample_damage: 0,
    trample_shots: 0,
    ability_damage: 0,
    ability_shots: 0,
    ability_volleys: 0,
    range_min: 0,
    range_max: 0,
    mechanical: false,
    opportunity: false,
    leak_gas: 0,
    leak_radiation: 0,
    orders: Vec::new(),
    settles: Vec::new(),
    shapes: Vec::new(),
};

/// The complete ruleset of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bible {
    /// Ruleset name.
    pub name: String,
    /// Per-tile rules.
    pub tiles: BTreeMap<TileType, TileStats>,
    /// Per-unit rules.
    pub units: BTreeMap<UnitType, UnitStats>,

    /// Money each player starts with.
    pub money_start: i32,
    /// Money cap.
    pub money_max: i32,
    /// Times a postponed order is retried before it is discarded.
    pub order_retry_limit: u8,
    /// The match ends once fewer players than this remain.
    pub victory_threshold: u8,

    /// Sum environmental penalties instead of taking the largest.
    pub vulnerabilities_stack: bool,
    /// Hit point penalty on frostbitten spaces.
    pub frostbite_vulnerability: i16,
    /// Hit point penalty in bonedrought.
    pub bonedrought_vulnerability: i16,
    /// Hit point penalty per point of gas.
    pub gas_vulnerability: i16,
    /// Hit point penalty per point of radiation.
    pub radiation_vulnerability: i16,

    /// Damage of every environmental shot.
    pub hazard_damage: i16,
    /// Shots per point of gas.
    pub gas_shots: u8,
    /// Shots per point of radiation.
    pub radiation_shots: u8,
    /// Shots on frostbitten spaces.
    pub frostbite_shots: u8,
    /// Shots on burning spaces.
    pub firestorm_shots: u8,
    /// Shots on dead spaces.
    pub death_shots: u8,
    /// Gas removed per decay phase.
    pub gas_dissipation: i8,
    /// Radiation removed per decay phase.
    pub radiation_dissipation: i8,
    /// Gas left behind by a bombing run.
    pub bomb_gas: i8,

    /// Upper bound on chaos per space.
    pub chaos_max: i8,
    /// Chaos at which a space dies.
    pub death_chaos: i8,
    /// Climate per season, spring to winter.
    pub seasons: [Climate; 4],
    /// Extra humidity next to water.
    pub water_humidity: i8,
    /// Snow falls at or below this temperature...
    pub snow_temperature: i8,
    /// ...when humidity is at least this.
    pub snow_humidity: i8,
    /// Frostbite at or below this temperature.
    pub frostbite_temperature: i8,
    /// Firestorms at or above this temperature...
    pub firestorm_temperature: i8,
    /// ...when humidity is at most this.
    pub firestorm_humidity: i8,
    /// Bonedrought at or below this humidity.
    pub bonedrought_humidity: i8,
    /// Clouds shield aircraft at or above this humidity.
    pub cloud_humidity: i8,
    /// Cover bodies clouds add against attacks on aircraft.
    pub cloud_cover: u8,

    /// Percent chance per growth phase that soil ripens into crops.
    pub crops_chance: u8,
    /// Percent chance per growth phase that forest spreads to adjacent grass.
    pub forest_chance: u8,

    /// Morale per enemy figure killed.
    pub morale_kill: i32,
    /// Morale per tile captured.
    pub morale_capture: i32,
    /// Morale per tile founded.
    pub morale_build: i32,
    /// Morale per enemy tile destroyed.
    pub morale_destroy: i32,
}

impl Default for Bible {
    fn default() -> Self {
        standard()
    }
}

impl Bible {
    /// Parse a ruleset from JSON text. Missing fields take the standard values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the rules are inconsistent.
    pub fn from_json(text: &str) -> Result<Self, BibleError> {
        let bible: Bible = serde_json::from_str(text)?;
        bible.validate()?;
        Ok(bible)
    }

    /// Load and validate a ruleset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid ruleset.
    pub fn load(path: &Path) -> Result<Self, BibleError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rules for a tile type.
    #[must_use]
    pub fn tile(&self, tile_type: TileType) -> &TileStats {
        self.tiles.get(&tile_type).unwrap_or(&UNKNOWN_TILE)
    }

    /// Rules for a unit type.
    #[must_use]
    pub fn unit(&self, unit_type: UnitType) -> &UnitStats {
        self.units.get(&unit_type).unwrap_or(&UNKNOWN_UNIT)
    }

    /// Largest vision radius of any tile or unit.
    #[must_use]
    pub fn vision_max(&self) -> i32 {
        let tiles = self.tiles.values().map(|t| t.vision);
        let units = self.units.values().map(|u| u.vision);
        tiles.chain(units).max().unwrap_or(0).max(0)
    }

    /// Climate of a season by index, spring first.
    #[must_use]
    pub fn climate(&self, season: usize) -> Climate {
        self.seasons.get(season).copied().unwrap_or_default()
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`BibleError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), BibleError> {
        let invalid = |msg: String| Err(BibleError::Invalid(msg));

        if self.money_start < 0 || self.money_max < self.money_start {
            return invalid(format!(
                "money_start {} must be within 0..={}",
                self.money_start, self.money_max
            ));
        }
        if self.victory_threshold == 0 {
            return invalid("victory_threshold must be at least 1".to_string());
        }
        if self.chaos_max < 0 || self.gas_dissipation < 0 || self.radiation_dissipation < 0 {
            return invalid("chaos_max and dissipation rates must be non-negative".to_string());
        }
        for (kind, penalty) in [
            ("frostbite", self.frostbite_vulnerability),
            ("bonedrought", self.bonedrought_vulnerability),
            ("gas", self.gas_vulnerability),
            ("radiation", self.radiation_vulnerability),
        ] {
            if penalty < 0 {
                return invalid(format!("{kind} vulnerability must be non-negative"));
            }
        }

        for (tile_type, stats) in &self.tiles {
            if *tile_type == TileType::None {
                return invalid("the none tile cannot have stats".to_string());
            }
            if stats.stacks_max < 0 || stats.vision < 0 || stats.hitpoints < 1 || stats.cost < 0 {
                return invalid(format!("{tile_type}: stats out of range"));
            }
            if stats.ownable && stats.stacks_max == 0 {
                return invalid(format!("{tile_type}: ownable tiles need stacks"));
            }
            let references = stats
                .expands
                .iter()
                .chain(&stats.upgrades)
                .chain(&stats.cultivates)
                .chain(std::iter::once(&stats.destroyed));
            for target in references {
                if !self.tiles.contains_key(target) {
                    return invalid(format!("{tile_type}: refers to unknown tile {target}"));
                }
            }
            if let Some(unit) = stats.produces.iter().find(|u| !self.units.contains_key(*u)) {
                return invalid(format!("{tile_type}: produces unknown unit {unit}"));
            }
        }

        for (unit_type, stats) in &self.units {
            if *unit_type == UnitType::None {
                return invalid("the none unit cannot have stats".to_string());
            }
            if stats.stacks_max < 1 || stats.vision < 0 || stats.hitpoints < 1 || stats.cost < 0 {
                return invalid(format!("{unit_type}: stats out of range"));
            }
            if stats.range_min > stats.range_max {
                return invalid(format!("{unit_type}: range_min exceeds range_max"));
            }
            if let Some(tile) = stats
                .settles
                .iter()
                .chain(&stats.shapes)
                .find(|t| !self.tiles.contains_key(*t))
            {
                return invalid(format!("{unit_type}: refers to unknown tile {tile}"));
            }
        }
        Ok(())
    }
}

fn natural(walkable: bool, buildable: bool, cover: u8) -> TileStats {
    TileStats {
        natural: true,
        walkable,
        buildable,
        cover,
        ..TileStats::default()
    }
}

fn building(stacks_max: i8, vision: i32, hitpoints: i16, cost: i32, income: i32) -> TileStats {
    TileStats {
        stacks_max,
        vision,
        hitpoints,
        cost,
        income,
        ownable: true,
        ..TileStats::default()
    }
}

#[allow(clippy::too_many_lines)]
fn standard() -> Bible {
    use OrderType as O;
    use TileType as T;
    use UnitType as U;

    let settlement_expands = vec![T::Farm, T::Industry, T::Barracks, T::Airfield, T::Outpost];

    let mut tiles = BTreeMap::new();
    tiles.insert(T::Grass, natural(true, true, 0));
    tiles.insert(T::Dirt, natural(true, true, 0));
    tiles.insert(T::Desert, natural(true, true, 0));
    tiles.insert(T::Rubble, natural(true, true, 0));
    tiles.insert(T::Ridge, natural(true, false, 1));
    tiles.insert(T::Mountain, natural(false, false, 0));
    tiles.insert(T::Water, natural(false, false, 0));
    tiles.insert(T::Forest, natural(true, false, 1));
    tiles.insert(T::Trenches, natural(true, false, 2));
    tiles.insert(T::Soil, natural(true, true, 0));
    tiles.insert(T::Crops, natural(true, true, 0));
    tiles.insert(
        T::Town,
        TileStats {
            city: true,
            orders: vec![O::Produce, O::Expand, O::Upgrade],
            produces: vec![U::Rifleman, U::Settler, U::Militia],
            expands: settlement_expands.clone(),
            upgrades: vec![T::City],
            ..building(5, 5, 3, 15, 2)
        },
    );
    tiles.insert(
        T::City,
        TileStats {
            city: true,
            orders: vec![O::Produce, O::Expand, O::Upgrade],
            produces: vec![U::Rifleman, U::Gunner, U::Sapper, U::Settler],
            expands: settlement_expands,
            ..building(5, 8, 4, 20, 3)
        },
    );
    tiles.insert(
        T::Outpost,
        TileStats {
            orders: vec![O::Produce],
            produces: vec![U::Militia],
            ..building(1, 10, 3, 5, 0)
        },
    );
    tiles.insert(
        T::Industry,
        TileStats {
            emission: 1,
            leak_gas: 1,
            orders: vec![O::Upgrade],
            ..building(3, 2, 4, 20, 4)
        },
    );
    tiles.insert(
        T::Barracks,
        TileStats {
            orders: vec![O::Produce, O::Upgrade],
            produces: vec![U::Rifleman, U::Gunner, U::Sapper, U::Tank],
            ..building(3, 2, 3, 10, 0)
        },
    );
    tiles.insert(
        T::Airfield,
        TileStats {
            orders: vec![O::Produce],
            produces: vec![U::Zeppelin],
            ..building(2, 3, 3, 15, 0)
        },
    );
    tiles.insert(
        T::Farm,
        TileStats {
            orders: vec![O::Cultivate, O::Upgrade],
            cultivates: vec![T::Soil],
            ..building(3, 2, 2, 10, 2)
        },
    );
    tiles.insert(
        T::Reactor,
        TileStats {
            emission: 3,
            leak_radiation: 3,
            ..building(1, 2, 5, 40, 6)
        },
    );

    let infantry = vec![O::Move, O::Guard, O::Focus, O::Lockdown, O::Capture, O::Halt];
    let mut units = BTreeMap::new();
    units.insert(
        U::Rifleman,
        UnitStats {
            stacks_max: 3,
            vision: 5,
            hitpoints: 2,
            cost: 5,
            speed: 3,
            attack_damage: 1,
            attack_shots: 1,
            orders: infantry.clone(),
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Gunner,
        UnitStats {
            stacks_max: 3,
            vision: 5,
            hitpoints: 2,
            cost: 8,
            speed: 2,
            attack_damage: 1,
            attack_shots: 3,
            opportunity: true,
            orders: vec![O::Move, O::Guard, O::Focus, O::Lockdown, O::Halt],
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Sapper,
        UnitStats {
            stacks_max: 3,
            vision: 5,
            hitpoints: 2,
            cost: 8,
            speed: 2,
            ability_damage: 1,
            ability_shots: 1,
            ability_volleys: 2,
            range_min: 1,
            range_max: 8,
            orders: vec![O::Move, O::Shell, O::Shape, O::Halt],
            shapes: vec![T::Trenches, T::Grass, T::Dirt],
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Tank,
        UnitStats {
            stacks_max: 3,
            vision: 4,
            hitpoints: 4,
            cost: 15,
            speed: 3,
            attack_damage: 3,
            attack_shots: 1,
            trample_damage: 1,
            trample_shots: 1,
            ability_damage: 2,
            ability_shots: 1,
            ability_volleys: 1,
            range_min: 4,
            range_max: 18,
            mechanical: true,
            leak_gas: 1,
            orders: vec![O::Move, O::Focus, O::Lockdown, O::Bombard, O::Halt],
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Settler,
        UnitStats {
            stacks_max: 1,
            vision: 3,
            hitpoints: 1,
            cost: 10,
            speed: 3,
            orders: vec![O::Move, O::Settle, O::Shape, O::Halt],
            settles: vec![T::Town, T::Outpost],
            shapes: vec![T::Grass, T::Dirt, T::Soil],
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Militia,
        UnitStats {
            stacks_max: 5,
            vision: 3,
            hitpoints: 1,
            cost: 3,
            speed: 2,
            attack_damage: 1,
            attack_shots: 1,
            orders: infantry,
            ..UnitStats::default()
        },
    );
    units.insert(
        U::Zeppelin,
        UnitStats {
            layer: Layer::Air,
            stacks_max: 1,
            vision: 8,
            hitpoints: 3,
            cost: 20,
            speed: 2,
            ability_damage: 2,
            ability_shots: 3,
            ability_volleys: 1,
            mechanical: true,
            orders: vec![O::Move, O::Bomb, O::Halt],
            ..UnitStats::default()
        },
    );

    Bible {
        name: "standard".to_string(),
        tiles,
        units,
        money_start: 20,
        money_max: 500,
        order_retry_limit: 3,
        victory_threshold: 2,
        vulnerabilities_stack: false,
        frostbite_vulnerability: 1,
        bonedrought_vulnerability: 1,
        gas_vulnerability: 1,
        radiation_vulnerability: 1,
        hazard_damage: 1,
        gas_shots: 1,
        radiation_shots: 1,
        frostbite_shots: 1,
        firestorm_shots: 2,
        death_shots: 3,
        gas_dissipation: 1,
        radiation_dissipation: 1,
        bomb_gas: 1,
        chaos_max: 100,
        death_chaos: 40,
        seasons: [
            Climate {
                temperature: 10,
                humidity: 50,
            },
            Climate {
                temperature: 25,
                humidity: 30,
            },
            Climate {
                temperature: 10,
                humidity: 60,
            },
            Climate {
                temperature: -5,
                humidity: 40,
            },
        ],
        water_humidity: 20,
        snow_temperature: 0,
        snow_humidity: 30,
        frostbite_temperature: -10,
        firestorm_temperature: 40,
        firestorm_humidity: 20,
        bonedrought_humidity: 10,
        cloud_humidity: 60,
        cloud_cover: 2,
        crops_chance: 50,
        forest_chance: 10,
        morale_kill: 1,
        morale_capture: 3,
        morale_build: 2,
        morale_destroy: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ruleset_is_valid() {
        Bible::default().validate().unwrap();
    }

    #[test]
    fn test_unknown_types_fall_back() {
        let bible = Bible {
            units: BTreeMap::new(),
            ..Bible::default()
        };
        assert_eq!(bible.unit(UnitType::Tank).stacks_max, 0);
        assert!(bible.unit(UnitType::Tank).orders.is_empty());
    }

    #[test]
    fn test_partial_json_uses_standard_values() {
        let bible = Bible::from_json(r#"{"name":"quick","money_start":50}"#).unwrap();
        assert_eq!(bible.name, "quick");
        assert_eq!(bible.money_start, 50);
        assert_eq!(bible.order_retry_limit, Bible::default().order_retry_limit);
        assert!(bible.tiles.contains_key(&TileType::Town));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut bible = Bible::default();
        bible.tiles.remove(&TileType::City);
        let err = bible.validate().unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_validate_rejects_negative_vulnerability() {
        let bible = Bible {
            gas_vulnerability: -1,
            ..Bible::default()
        };
        assert!(bible.validate().is_err());
    }

    #[test]
    fn test_vision_max() {
        assert_eq!(Bible::default().vision_max(), 10);
    }

    #[test]
    fn test_json_roundtrip() {
        let bible = Bible::default();
        let json = serde_json::to_string(&bible).unwrap();
        let back = Bible::from_json(&json).unwrap();
        assert_eq!(back, bible);
    }
}
