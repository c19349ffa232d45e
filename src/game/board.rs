//! The board: a rectangular arena of spaces.

use serde::{Deserialize, Serialize};

use crate::game::{Cell, MAX_EXTENT, Move, Position, Space};

/// A fixed-size rectangular grid of spaces, stored row-major.
///
/// Every access goes through a [`Cell`]. Reading the sentinel cell yields an
/// empty space that is never written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    rows: i8,
    cols: i8,
    spaces: Vec<Space>,
    #[serde(skip)]
    sentinel: Space,
}

#[derive(Deserialize)]
struct RawBoard {
    rows: i8,
    cols: i8,
    #[serde(default)]
    spaces: Vec<Space>,
}

impl TryFrom<RawBoard> for Board {
    type Error = String;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        let mut board = Board::new(raw.rows, raw.cols)
            .ok_or_else(|| format!("invalid board size {}x{}", raw.rows, raw.cols))?;
        if !raw.spaces.is_empty() {
            if raw.spaces.len() != board.spaces.len() {
                return Err(format!(
                    "board is {}x{} but lists {} spaces",
                    raw.rows,
                    raw.cols,
                    raw.spaces.len()
                ));
            }
            board.spaces = raw.spaces;
        }
        Ok(board)
    }
}

impl Board {
    /// Create an empty board.
    ///
    /// Returns `None` unless both dimensions are in `1..=127`.
    #[must_use]
    pub fn new(rows: i8, cols: i8) -> Option<Self> {
        if rows <= 0 || cols <= 0 || rows > MAX_EXTENT || cols > MAX_EXTENT {
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        let size = rows as usize * cols as usize;
        Some(Self {
            rows,
            cols,
            spaces: vec![Space::default(); size],
            sentinel: Space::default(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> i8 {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> i8 {
        self.cols
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Always false: boards have at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Whether `position` is on the board.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.row >= 0 && position.col >= 0 && position.row < self.rows && position.col < self.cols
    }

    /// The cell of `position`, or the sentinel.
    #[must_use]
    pub fn cell(&self, position: Position) -> Cell {
        Cell::from_position(self.rows, self.cols, position)
    }

    /// Position of a valid cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn position(&self, cell: Cell) -> Position {
        let cols = usize::from(self.cols.unsigned_abs());
        let index = cell.index();
        Position::new((index / cols) as i8, (index % cols) as i8)
    }

    /// The space at `cell`; the empty sentinel space when out of bounds.
    #[must_use]
    pub fn get(&self, cell: Cell) -> &Space {
        self.spaces.get(cell.index()).unwrap_or(&self.sentinel)
    }

    /// The space at `position`.
    #[must_use]
    pub fn at(&self, position: Position) -> &Space {
        self.get(self.cell(position))
    }

    /// Mutable access to the space at `cell`; `None` when out of bounds.
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Space> {
        if cell.is_sentinel() {
            return None;
        }
        self.spaces.get_mut(cell.index())
    }

    /// Mutable access to the space at `position`.
    pub fn at_mut(&mut self, position: Position) -> Option<&mut Space> {
        let cell = self.cell(position);
        self.get_mut(cell)
    }

    /// All valid cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let len = u16::try_from(self.spaces.len()).unwrap_or(u16::MAX);
        (0..len).map(Cell::from_index)
    }

    /// All spaces with their positions, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Space)> {
        self.cells().map(|cell| (self.position(cell), self.get(cell)))
    }

    /// Raw row-major storage.
    #[must_use]
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Cells within squared distance `radius_squared` of `center`, row-major.
    ///
    /// A negative radius yields nothing; zero yields the center alone.
    #[must_use]
    pub fn area(&self, center: Position, radius_squared: i32) -> Vec<Cell> {
        if radius_squared < 0 {
            return Vec::new();
        }
        let reach = isqrt(radius_squared);
        let row_lo = (i32::from(center.row) - reach).max(0);
        let row_hi = (i32::from(center.row) + reach).min(i32::from(self.rows) - 1);
        let col_lo = (i32::from(center.col) - reach).max(0);
        let col_hi = (i32::from(center.col) + reach).min(i32::from(self.cols) - 1);

        let mut cells = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let dr = row - i32::from(center.row);
                let dc = col - i32::from(center.col);
                if dr * dr + dc * dc <= radius_squared {
                    #[allow(clippy::cast_possible_truncation)]
                    let position = Position::new(row as i8, col as i8);
                    cells.push(self.cell(position));
                }
            }
        }
        cells
    }

    /// Orthogonal neighbours that lie on the board, in north, east, south,
    /// west order.
    #[must_use]
    pub fn neighbors(&self, position: Position) -> Vec<Position> {
        Move::ALL
            .iter()
            .filter_map(|&step| position.step(step))
            .filter(|&p| self.contains(p))
            .collect()
    }
}

/// Largest `r` with `r * r <= n`.
fn isqrt(n: i32) -> i32 {
    let mut r = 0;
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}
