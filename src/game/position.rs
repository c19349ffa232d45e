//! Positions, cells and descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Largest number of rows or columns a board may have.
pub const MAX_EXTENT: i8 = 127;

/// A row/column pair on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Row, counted from the top.
    pub row: i8,
    /// Column, counted from the left.
    pub col: i8,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// The position one step away, if it is representable.
    #[must_use]
    pub fn step(self, step: Move) -> Option<Self> {
        let (dr, dc) = step.delta();
        let row = self.row.checked_add(dr)?;
        let col = self.col.checked_add(dc)?;
        (row >= 0 && col >= 0).then_some(Self { row, col })
    }

    /// Squared Euclidean distance.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i32 {
        let dr = i32::from(self.row) - i32::from(other.row);
        let dc = i32::from(self.col) - i32::from(other.col);
        dr * dr + dc * dc
    }

    /// Whether `other` shares an edge with this position.
    #[must_use]
    pub fn is_orthogonal_neighbor(self, other: Self) -> bool {
        self.distance_squared(other) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidPosition(s.to_string());
        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row: i8 = row.trim().parse().map_err(|_| invalid())?;
        let col: i8 = col.trim().parse().map_err(|_| invalid())?;
        if row < 0 || col < 0 || row >= MAX_EXTENT || col >= MAX_EXTENT {
            return Err(invalid());
        }
        Ok(Self { row, col })
    }
}

/// One orthogonal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Towards row 0.
    #[serde(rename = "n")]
    North,
    /// Towards higher columns.
    #[serde(rename = "e")]
    East,
    /// Towards higher rows.
    #[serde(rename = "s")]
    South,
    /// Towards column 0.
    #[serde(rename = "w")]
    West,
}

impl Move {
    /// All four steps.
    pub const ALL: [Move; 4] = [Move::North, Move::East, Move::South, Move::West];

    /// Row and column offsets.
    #[must_use]
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Move::North => (-1, 0),
            Move::East => (0, 1),
            Move::South => (1, 0),
            Move::West => (0, -1),
        }
    }

    /// Single-letter form.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Move::North => 'n',
            Move::East => 'e',
            Move::South => 's',
            Move::West => 'w',
        }
    }

    /// Parse the single-letter form.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidMove`] for any other character.
    pub fn from_char(c: char) -> Result<Self, ParseError> {
        match c.to_ascii_lowercase() {
            'n' => Ok(Move::North),
            'e' => Ok(Move::East),
            's' => Ok(Move::South),
            'w' => Ok(Move::West),
            _ => Err(ParseError::InvalidMove(c)),
        }
    }
}

/// Parse a compact step string such as `nnes`.
///
/// # Errors
///
/// Returns [`ParseError::InvalidMove`] on the first unknown letter.
pub fn parse_moves(s: &str) -> Result<Vec<Move>, ParseError> {
    s.chars().map(Move::from_char).collect()
}

/// Format steps in their compact form.
#[must_use]
pub fn format_moves(moves: &[Move]) -> String {
    moves.iter().map(|m| m.as_char()).collect()
}

/// Opaque index of a space on a board.
///
/// Built from the board's dimensions; anything outside the board maps to
/// [`Cell::SENTINEL`], which is only ever compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell(u16);

impl Cell {
    /// Out-of-bounds marker.
    pub const SENTINEL: Cell = Cell(u16::MAX);

    /// Cell of `position` on a `rows` x `cols` board.
    #[must_use]
    pub fn from_position(rows: i8, cols: i8, position: Position) -> Self {
        if position.row < 0 || position.col < 0 || position.row >= rows || position.col >= cols {
            return Self::SENTINEL;
        }
        // rows, cols <= 127 so the index stays below 16129.
        #[allow(clippy::cast_sign_loss)]
        let index = position.row as u16 * cols as u16 + position.col as u16;
        Cell(index)
    }

    /// Cell from a raw row-major index.
    #[must_use]
    pub(crate) const fn from_index(index: u16) -> Self {
        Cell(index)
    }

    /// Row-major index into the board's storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the out-of-bounds marker.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 == u16::MAX
    }
}

/// The three unit slots of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Infantry and vehicles.
    Ground,
    /// Aircraft.
    Air,
    /// Units that pass beneath or around the others.
    Bypass,
}

impl Layer {
    /// All layers, in slot order.
    pub const ALL: [Layer; 3] = [Layer::Ground, Layer::Air, Layer::Bypass];
}

/// What a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DescriptorType {
    /// Nothing.
    #[default]
    None,
    /// The space as a whole.
    Cell,
    /// The tile token.
    Tile,
    /// The ground unit slot.
    Ground,
    /// The air unit slot.
    Air,
    /// The bypass unit slot.
    Bypass,
}

impl DescriptorType {
    /// Keyword used in the text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DescriptorType::None => "none",
            DescriptorType::Cell => "cell",
            DescriptorType::Tile => "tile",
            DescriptorType::Ground => "ground",
            DescriptorType::Air => "air",
            DescriptorType::Bypass => "bypass",
        }
    }

    /// The unit layer this type addresses.
    #[must_use]
    pub const fn layer(self) -> Option<Layer> {
        match self {
            DescriptorType::Ground => Some(Layer::Ground),
            DescriptorType::Air => Some(Layer::Air),
            DescriptorType::Bypass => Some(Layer::Bypass),
            _ => None,
        }
    }
}

impl From<Layer> for DescriptorType {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Ground => DescriptorType::Ground,
            Layer::Air => DescriptorType::Air,
            Layer::Bypass => DescriptorType::Bypass,
        }
    }
}

impl FromStr for DescriptorType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DescriptorType::None),
            "cell" => Ok(DescriptorType::Cell),
            "tile" => Ok(DescriptorType::Tile),
            "ground" => Ok(DescriptorType::Ground),
            "air" => Ok(DescriptorType::Air),
            "bypass" => Ok(DescriptorType::Bypass),
            other => Err(ParseError::UnknownDescriptorType(other.to_string())),
        }
    }
}

/// Names one thing at one position: the cell, its tile, or a unit slot.
///
/// Ordered by type first, then position. Serialized in its text form,
/// e.g. `ground@3,4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Descriptor {
    /// What is being referred to.
    pub kind: DescriptorType,
    /// Where it is.
    pub position: Position,
}

impl Descriptor {
    /// The empty descriptor.
    pub const NONE: Descriptor = Descriptor {
        kind: DescriptorType::None,
        position: Position::new(0, 0),
    };

    /// Create a new descriptor.
    #[must_use]
    pub const fn new(kind: DescriptorType, position: Position) -> Self {
        Self { kind, position }
    }

    /// Descriptor of a whole cell.
    #[must_use]
    pub const fn cell(position: Position) -> Self {
        Self::new(DescriptorType::Cell, position)
    }

    /// Descriptor of a tile.
    #[must_use]
    pub const fn tile(position: Position) -> Self {
        Self::new(DescriptorType::Tile, position)
    }

    /// Descriptor of a unit slot.
    #[must_use]
    pub fn unit(layer: Layer, position: Position) -> Self {
        Self::new(layer.into(), position)
    }

    /// The unit layer, if this names a unit slot.
    #[must_use]
    pub const fn layer(self) -> Option<Layer> {
        self.kind.layer()
    }

    /// Whether this refers to nothing.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self.kind, DescriptorType::None)
    }

    /// Same kind of descriptor at another position.
    #[must_use]
    pub const fn at(self, position: Position) -> Self {
        Self::new(self.kind, position)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}@{}", self.kind.as_str(), self.position)
        }
    }
}

impl FromStr for Descriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        if s == "none" {
            return Ok(Self::NONE);
        }
        let (kind, position) = s
            .split_once('@')
            .ok_or_else(|| ParseError::InvalidPosition(s.to_string()))?;
        let kind: DescriptorType = kind.parse()?;
        if kind == DescriptorType::None {
            return Ok(Self::NONE);
        }
        Ok(Self::new(kind, position.parse()?))
    }
}

impl TryFrom<String> for Descriptor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Descriptor> for String {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_row_major() {
        let cell = Cell::from_position(3, 4, Position::new(2, 1));
        assert_eq!(cell.index(), 9);
    }

    #[test]
    fn test_cell_out_of_bounds_is_sentinel() {
        assert!(Cell::from_position(3, 4, Position::new(3, 0)).is_sentinel());
        assert!(Cell::from_position(3, 4, Position::new(0, 4)).is_sentinel());
        assert!(Cell::from_position(3, 4, Position::new(-1, 0)).is_sentinel());
        assert!(!Cell::from_position(3, 4, Position::new(2, 3)).is_sentinel());
    }

    #[test]
    fn test_step_stays_non_negative() {
        assert_eq!(Position::new(0, 0).step(Move::North), None);
        assert_eq!(Position::new(0, 0).step(Move::West), None);
        assert_eq!(
            Position::new(0, 0).step(Move::South),
            Some(Position::new(1, 0))
        );
        assert_eq!(Position::new(0, i8::MAX).step(Move::East), None);
    }

    #[test]
    fn test_descriptor_ordering_type_first() {
        let tile = Descriptor::tile(Position::new(5, 5));
        let ground = Descriptor::unit(Layer::Ground, Position::new(0, 0));
        assert!(tile < ground);
        let a = Descriptor::tile(Position::new(0, 1));
        let b = Descriptor::tile(Position::new(1, 0));
        assert!(a < b);
    }

    #[test]
    fn test_descriptor_text_form() {
        let d: Descriptor = "ground@3,4".parse().unwrap();
        assert_eq!(d, Descriptor::unit(Layer::Ground, Position::new(3, 4)));
        assert_eq!(d.to_string(), "ground@3,4");
        assert_eq!("none".parse::<Descriptor>().unwrap(), Descriptor::NONE);
        assert!("tank@1,1".parse::<Descriptor>().is_err());
        assert!("tile@1".parse::<Descriptor>().is_err());
        assert!("tile@200,1".parse::<Descriptor>().is_err());
    }

    #[test]
    fn test_moves_text_form() {
        let moves = parse_moves("nesw").unwrap();
        assert_eq!(moves, Move::ALL.to_vec());
        assert_eq!(format_moves(&moves), "nesw");
        assert_eq!(parse_moves("nx"), Err(ParseError::InvalidMove('x')));
    }
}
