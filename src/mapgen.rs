//! Deterministic starting boards.
//!
//! The same seed, size and roster always give the same board. Generation
//! draws from its own [`GameRng`], so it never disturbs a match's stream.

use thiserror::Error;
use tracing::debug;

use crate::game::{Board, Player, Position, TileToken, TileType, UnitToken, UnitType};
use crate::rng::GameRng;

/// Smallest side length that fits every starting anchor.
pub const MIN_SIDE: i8 = 5;

/// Natural terrain and its weight out of 100.
const TERRAIN: [(TileType, usize); 7] = [
    (TileType::Grass, 46),
    (TileType::Dirt, 12),
    (TileType::Forest, 12),
    (TileType::Water, 10),
    (TileType::Desert, 8),
    (TileType::Ridge, 6),
    (TileType::Mountain, 6),
];

/// Directions of the starting anchors from the centre. Opposite pairs come
/// first so small rosters start far apart.
const ANCHORS: [(i32, i32); 8] = [
    (-1, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
];

/// Error type for map generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapGenError {
    /// The board is too small or too large.
    #[error("board size {rows}x{cols} is invalid (sides must be at least {min})", min = MIN_SIDE)]
    InvalidSize {
        /// Requested rows.
        rows: i8,
        /// Requested columns.
        cols: i8,
    },
    /// No players were given.
    #[error("need at least one player")]
    EmptyRoster,
    /// More players than there are anchors.
    #[error("at most {max} players fit, got {0}", max = ANCHORS.len())]
    TooManyPlayers(usize),
    /// `none` and `observer` cannot start on the board.
    #[error("{0} cannot start on the board")]
    UnplayablePlayer(Player),
    /// Not enough free land for every start.
    #[error("not enough starting positions: need {needed}, have {available}")]
    NotEnoughSpace {
        /// Players to place.
        needed: usize,
        /// Buildable cells found.
        available: usize,
    },
}

/// Generate a board with a starting town and rifleman for each player.
///
/// # Errors
///
/// Returns an error if the size is invalid, the roster is empty, too large
/// or holds unplayable colours, or there is not enough land to start on.
pub fn generate(seed: u64, rows: i8, cols: i8, players: &[Player]) -> Result<Board, MapGenError> {
    if players.is_empty() {
        return Err(MapGenError::EmptyRoster);
    }
    if players.len() > ANCHORS.len() {
        return Err(MapGenError::TooManyPlayers(players.len()));
    }
    if let Some(&player) = players.iter().find(|p| !p.is_playable()) {
        return Err(MapGenError::UnplayablePlayer(player));
    }
    let invalid = || MapGenError::InvalidSize { rows, cols };
    if rows < MIN_SIDE || cols < MIN_SIDE {
        return Err(invalid());
    }
    let mut board = Board::new(rows, cols).ok_or_else(invalid)?;

    let mut rng = GameRng::seeded(seed);
    generate_terrain(&mut board, &mut rng);
    let starts = find_starting_positions(&board, players.len())?;
    for (&player, &position) in players.iter().zip(&starts) {
        settle_start(&mut board, player, position);
    }
    debug!(seed, rows, cols, players = players.len(), "board generated");
    Ok(board)
}

fn generate_terrain(board: &mut Board, rng: &mut GameRng) {
    let total: usize = TERRAIN.iter().map(|(_, weight)| weight).sum();
    for cell in board.cells().collect::<Vec<_>>() {
        let mut roll = rng.pick(total);
        let mut tile_type = TileType::Grass;
        for (candidate, weight) in TERRAIN {
            if roll < weight {
                tile_type = candidate;
                break;
            }
            roll -= weight;
        }
        if let Some(space) = board.get_mut(cell) {
            space.tile = TileToken::natural(tile_type);
        }
    }
}

/// The buildable cell nearest to each anchor, ties broken row-major.
fn find_starting_positions(board: &Board, count: usize) -> Result<Vec<Position>, MapGenError> {
    let valid: Vec<Position> = board
        .iter()
        .filter(|(_, space)| {
            matches!(
                space.tile.tile_type,
                TileType::Grass | TileType::Dirt | TileType::Desert
            )
        })
        .map(|(position, _)| position)
        .collect();
    if valid.len() < count {
        return Err(MapGenError::NotEnoughSpace {
            needed: count,
            available: valid.len(),
        });
    }

    let rows = i32::from(board.rows());
    let cols = i32::from(board.cols());
    let (center_row, center_col) = (rows / 2, cols / 2);
    // 35% of the way to the edge, at least one cell in from it
    let reach_row = (rows * 35 / 100).clamp(1, center_row - 1);
    let reach_col = (cols * 35 / 100).clamp(1, center_col - 1);

    let mut positions: Vec<Position> = Vec::with_capacity(count);
    for &(dr, dc) in ANCHORS.iter().take(count) {
        let target_row = center_row + dr * reach_row;
        let target_col = center_col + dc * reach_col;
        let best = valid
            .iter()
            .filter(|position| !positions.contains(position))
            .min_by_key(|position| {
                let dr = i32::from(position.row) - target_row;
                let dc = i32::from(position.col) - target_col;
                (dr * dr + dc * dc, **position)
            })
            .copied()
            .ok_or(MapGenError::NotEnoughSpace {
                needed: count,
                available: positions.len(),
            })?;
        positions.push(best);
    }
    Ok(positions)
}

/// Town with a rifleman on top; impassable neighbours become grass so the
/// start can always produce and move out.
fn settle_start(board: &mut Board, player: Player, position: Position) {
    for neighbor in board.neighbors(position) {
        let blocked = board
            .at_mut(neighbor)
            .filter(|space| matches!(space.tile.tile_type, TileType::Water | TileType::Mountain));
        if let Some(space) = blocked {
            space.tile = TileToken::natural(TileType::Grass);
        }
    }
    if let Some(space) = board.at_mut(position) {
        space.tile = TileToken::owned(TileType::Town, player, 1, 1);
        space.ground = UnitToken::new(UnitType::Rifleman, player, 3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, MatchConfig};
    use crate::game::Bible;

    const DUO: [Player; 2] = [Player::Red, Player::Blue];

    #[test]
    fn test_generation_determinism() {
        let first = generate(42, 16, 16, &DUO).unwrap();
        let second = generate(42, 16, 16, &DUO).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let first = generate(42, 16, 16, &DUO).unwrap();
        let second = generate(43, 16, 16, &DUO).unwrap();
        let differences = first
            .iter()
            .zip(second.iter())
            .filter(|((_, a), (_, b))| a.tile != b.tile)
            .count();
        assert!(differences > 0);
    }

    #[test]
    fn test_every_player_gets_a_town() {
        let roster = Player::PLAYABLE;
        let board = generate(7, 24, 24, &roster).unwrap();
        for player in roster {
            let towns: Vec<_> = board
                .iter()
                .filter(|(_, space)| space.tile.owner == player)
                .collect();
            assert_eq!(towns.len(), 1, "{player}");
            let (position, space) = towns[0];
            assert_eq!(space.tile.tile_type, TileType::Town);
            assert_eq!(space.ground.owner, player);
            for neighbor in board.neighbors(position) {
                let tile = board.at(neighbor).tile.tile_type;
                assert!(!matches!(tile, TileType::Water | TileType::Mountain));
            }
        }
    }

    #[test]
    fn test_small_board_still_fits_everyone() {
        let board = generate(3, MIN_SIDE, MIN_SIDE, &Player::PLAYABLE);
        // either a valid board or a clear lack of land, never a panic
        match board {
            Ok(board) => assert_eq!(board.len(), 25),
            Err(err) => assert!(matches!(err, MapGenError::NotEnoughSpace { .. })),
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            generate(1, 4, 10, &DUO),
            Err(MapGenError::InvalidSize { rows: 4, cols: 10 })
        );
        assert_eq!(generate(1, 10, 10, &[]), Err(MapGenError::EmptyRoster));
        assert_eq!(
            generate(1, 10, 10, &[Player::Red, Player::Observer]),
            Err(MapGenError::UnplayablePlayer(Player::Observer))
        );
    }

    #[test]
    fn test_generated_board_starts_a_match() {
        let board = generate(5, 12, 12, &DUO).unwrap();
        let mut automaton =
            Automaton::new(Bible::default(), board, &DUO, MatchConfig::default()).unwrap();
        automaton.run_round();
        assert!(!automaton.is_game_over());
    }
}
