//! Fog-of-war propagation.
//!
//! Vision is recomputed as a map/reduce over the board. The map step lets
//! every owned token mark the cells within its vision radius; the reduce step
//! compares the result (plus the visionaries, who see everything) with each
//! cell's current vision and emits the minimal set of reveal, obscure, enter
//! and exit changes. The propagator never writes the board: the automaton
//! applies the returned changes.

use std::collections::BTreeMap;

use crate::game::{
    Bible, Board, Cell, Change, ChangeSet, Descriptor, EnterCause, ExitCause, Player, Position,
    Space, Vision,
};

/// Computes vision deltas for one board.
#[derive(Debug, Clone, Copy)]
pub struct VisionPropagator<'a> {
    bible: &'a Bible,
    visionaries: Vision,
    audience: Vision,
}

/// Squared distance bound used by [`VisionPropagator::execute_around`].
///
/// For squared radii `a` and `b`, `(√a + √b)² = a + b + 2√(ab)`, which never
/// exceeds `a + b + 2·max(a, b)`.
#[must_use]
pub const fn search_radius(range: i32, vision_max: i32) -> i32 {
    let larger = if range > vision_max { range } else { vision_max };
    range + vision_max + 2 * larger
}

impl<'a> VisionPropagator<'a> {
    /// Create a propagator.
    ///
    /// `visionaries` see every cell; `audience` is everyone taking part,
    /// used by the initial reveal.
    #[must_use]
    pub const fn new(bible: &'a Bible, visionaries: Vision, audience: Vision) -> Self {
        Self {
            bible,
            visionaries,
            audience,
        }
    }

    /// Recompute vision for the whole board.
    #[must_use]
    pub fn execute(&self, board: &Board) -> ChangeSet {
        let sources: Vec<Cell> = board.cells().collect();
        let accumulated = self.accumulate(board, &sources);
        let mut changes = ChangeSet::new();
        for cell in board.cells() {
            self.reduce(board, cell, &accumulated, &mut changes);
        }
        changes
    }

    /// Recompute vision near `center` after something changed within squared
    /// distance `range` of it.
    ///
    /// Cells within [`search_radius`]`(range, vmax)` are re-reduced, and
    /// tokens within the same bound of that region contribute vision.
    #[must_use]
    pub fn execute_around(&self, board: &Board, center: Position, range: i32) -> ChangeSet {
        let vision_max = self.bible.vision_max();
        let reduce_radius = search_radius(range, vision_max);
        let map_radius = search_radius(reduce_radius, vision_max);

        let sources = board.area(center, map_radius);
        let accumulated = self.accumulate(board, &sources);
        let mut changes = ChangeSet::new();
        for cell in board.area(center, reduce_radius) {
            self.reduce(board, cell, &accumulated, &mut changes);
        }
        changes
    }

    /// Vision for the start of a match.
    ///
    /// Like [`Self::execute`], and additionally shows every participant who
    /// does not see a cell its starting tile, immediately followed by an
    /// obscure so no live vision is granted.
    #[must_use]
    pub fn execute_initial(&self, board: &Board) -> ChangeSet {
        let sources: Vec<Cell> = board.cells().collect();
        let accumulated = self.accumulate(board, &sources);
        let mut changes = ChangeSet::new();
        for cell in board.cells() {
            let new_vision = self.reduce(board, cell, &accumulated, &mut changes);
            let unseeing = self.audience.difference(new_vision);
            if unseeing.is_empty() {
                continue;
            }
            let space = board.get(cell);
            let subject = Descriptor::cell(board.position(cell));
            changes.push(reveal(subject, space), unseeing);
            changes.push(Change::Obscure { subject }, unseeing);
        }
        changes
    }

    /// Everything `player` currently sees, for a player rejoining the match.
    ///
    /// Cells the player does not see are sent as obscured only.
    #[must_use]
    pub fn snapshot(&self, board: &Board, player: Player) -> ChangeSet {
        let only = Vision::only(player);
        let mut changes = ChangeSet::new();
        for (position, space) in board.iter() {
            let subject = Descriptor::cell(position);
            if space.vision().contains(player) {
                changes.push(reveal(subject, space), only);
                for (layer, unit) in space.units() {
                    changes.push(
                        Change::Enter {
                            subject: Descriptor::unit(layer, position),
                            unit: *unit,
                            cause: EnterCause::Vision,
                        },
                        only,
                    );
                }
            } else {
                changes.push(Change::Obscure { subject }, only);
            }
        }
        changes
    }

    /// Map step: vision granted by tokens on `sources`.
    fn accumulate(&self, board: &Board, sources: &[Cell]) -> BTreeMap<Cell, Vision> {
        let mut accumulated: BTreeMap<Cell, Vision> = BTreeMap::new();
        for &cell in sources {
            let space = board.get(cell);
            let position = board.position(cell);
            for (owner, radius) in self.sources_of(space) {
                for seen in board.area(position, radius) {
                    let entry = accumulated.entry(seen).or_default();
                    *entry = entry.with(owner);
                }
            }
        }
        accumulated
    }

    fn sources_of(&self, space: &Space) -> Vec<(Player, i32)> {
        let mut sources = Vec::with_capacity(4);
        if space.tile.is_owned() {
            let radius = self.bible.tile(space.tile.tile_type).vision;
            sources.push((space.tile.owner, radius));
        }
        for (_, unit) in space.units() {
            if unit.owner != Player::None {
                sources.push((unit.owner, self.bible.unit(unit.unit_type).vision));
            }
        }
        sources
    }

    /// Reduce step for one cell. Returns the cell's new vision.
    fn reduce(
        &self,
        board: &Board,
        cell: Cell,
        accumulated: &BTreeMap<Cell, Vision>,
        changes: &mut ChangeSet,
    ) -> Vision {
        let space = board.get(cell);
        let position = board.position(cell);
        let old_vision = space.vision();
        let new_vision = accumulated
            .get(&cell)
            .copied()
            .unwrap_or_default()
            .union(self.visionaries);

        let lost = old_vision.difference(new_vision);
        if !lost.is_empty() {
            for (layer, _) in space.units() {
                changes.push(
                    Change::Exit {
                        subject: Descriptor::unit(layer, position),
                        cause: ExitCause::Vision,
                    },
                    lost,
                );
            }
            changes.push(
                Change::Obscure {
                    subject: Descriptor::cell(position),
                },
                lost,
            );
        }

        let gained = new_vision.difference(old_vision);
        if !gained.is_empty() {
            changes.push(reveal(Descriptor::cell(position), space), gained);
            for (layer, unit) in space.units() {
                changes.push(
                    Change::Enter {
                        subject: Descriptor::unit(layer, position),
                        unit: *unit,
                        cause: EnterCause::Vision,
                    },
                    gained,
                );
            }
        }
        new_vision
    }
}

fn reveal(subject: Descriptor, space: &Space) -> Change {
    Change::Reveal {
        subject,
        tile: space.tile,
        environment: space.environment,
    }
}

/// Apply the vision effect of a reveal or obscure to a space.
///
/// Returns false for changes that do not touch vision.
pub(crate) fn apply(space: &mut Space, change: &Change, recipients: Vision) -> bool {
    match change {
        Change::Reveal { .. } => space.set_vision(space.vision().union(recipients)),
        Change::Obscure { .. } => space.set_vision(space.vision().difference(recipients)),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{TileToken, TileType, UnitToken, UnitType};

    fn board_with_rifleman() -> Board {
        let mut board = Board::new(5, 5).unwrap();
        for cell in board.cells().collect::<Vec<_>>() {
            board.get_mut(cell).unwrap().tile = TileToken::natural(TileType::Grass);
        }
        board.at_mut(Position::new(0, 0)).unwrap().ground =
            UnitToken::new(UnitType::Rifleman, Player::Red, 1);
        board
    }

    fn apply_all(board: &mut Board, changes: &ChangeSet) {
        for (change, recipients) in changes.iter() {
            if let Some(subject) = change_cell(change) {
                let space = board.at_mut(subject).unwrap();
                apply(space, change, *recipients);
            }
        }
    }

    fn change_cell(change: &Change) -> Option<Position> {
        match change {
            Change::Reveal { subject, .. } | Change::Obscure { subject } => Some(subject.position),
            _ => None,
        }
    }

    #[test]
    fn test_search_radius_bound() {
        assert_eq!(search_radius(1, 10), 1 + 10 + 20);
        assert_eq!(search_radius(10, 1), 10 + 1 + 20);
        assert_eq!(search_radius(0, 0), 0);
    }

    #[test]
    fn test_owner_sees_radius() {
        let bible = Bible::default();
        let board = board_with_rifleman();
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, Vision::only(Player::Red));
        let changes = propagator.execute(&board);
        let reveals = changes
            .for_player(Player::Red)
            .filter(|c| matches!(c, Change::Reveal { .. }))
            .count();
        // Rifleman vision 5 from a corner: cells with r² + c² <= 5.
        assert_eq!(reveals, 8);
    }

    #[test]
    fn test_visionary_sees_everything() {
        let bible = Bible::default();
        let board = board_with_rifleman();
        let observer = Vision::only(Player::Observer);
        let propagator = VisionPropagator::new(&bible, observer, observer);
        let changes = propagator.execute(&board);
        let reveals = changes
            .for_player(Player::Observer)
            .filter(|c| matches!(c, Change::Reveal { .. }))
            .count();
        assert_eq!(reveals, 25);
    }

    #[test]
    fn test_second_pass_is_quiet() {
        let bible = Bible::default();
        let mut board = board_with_rifleman();
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, Vision::only(Player::Red));
        let first = propagator.execute(&board);
        apply_all(&mut board, &first);
        assert!(propagator.execute(&board).is_empty());
    }

    #[test]
    fn test_losing_sight_exits_units() {
        let bible = Bible::default();
        let mut board = board_with_rifleman();
        board.at_mut(Position::new(1, 1)).unwrap().ground =
            UnitToken::new(UnitType::Rifleman, Player::Blue, 1);
        let audience = Vision::from_players(&[Player::Red, Player::Blue]);
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, audience);
        let first = propagator.execute(&board);
        apply_all(&mut board, &first);

        // Red's rifleman leaves the board.
        board.at_mut(Position::new(0, 0)).unwrap().ground = UnitToken::default();
        let second = propagator.execute_around(&board, Position::new(0, 0), 0);
        let red: Vec<&Change> = second.for_player(Player::Red).collect();
        assert!(red.iter().any(|c| matches!(
            c,
            Change::Exit {
                cause: ExitCause::Vision,
                ..
            }
        )));
        assert!(red.iter().any(|c| matches!(c, Change::Obscure { .. })));
    }

    #[test]
    fn test_around_matches_full_pass() {
        let bible = Bible::default();
        let mut board = board_with_rifleman();
        let audience = Vision::only(Player::Red);
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, audience);
        let first = propagator.execute(&board);
        apply_all(&mut board, &first);

        let unit = board.at(Position::new(0, 0)).ground;
        board.at_mut(Position::new(0, 0)).unwrap().ground = UnitToken::default();
        board.at_mut(Position::new(0, 1)).unwrap().ground = unit;
        let around = propagator.execute_around(&board, Position::new(0, 0), 1);
        let full = propagator.execute(&board);
        assert_eq!(around, full);
    }

    #[test]
    fn test_initial_reveals_then_obscures_for_unseeing() {
        let bible = Bible::default();
        let board = board_with_rifleman();
        let audience = Vision::from_players(&[Player::Red, Player::Blue]);
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, audience);
        let changes = propagator.execute_initial(&board);
        let blue: Vec<&Change> = changes.for_player(Player::Blue).collect();
        assert_eq!(blue.len(), 50);
        assert!(matches!(blue[0], Change::Reveal { .. }));
        assert!(matches!(blue[1], Change::Obscure { .. }));
    }

    #[test]
    fn test_snapshot_only_for_player() {
        let bible = Bible::default();
        let mut board = board_with_rifleman();
        let propagator = VisionPropagator::new(&bible, Vision::EMPTY, Vision::only(Player::Red));
        let first = propagator.execute(&board);
        apply_all(&mut board, &first);
        let snapshot = propagator.snapshot(&board, Player::Red);
        assert!(snapshot.iter().all(|(_, v)| *v == Vision::only(Player::Red)));
        let enters = snapshot
            .iter()
            .filter(|(c, _)| matches!(c, Change::Enter { .. }))
            .count();
        assert_eq!(enters, 1);
        assert_eq!(snapshot.len(), 25 + 1);
    }
}
