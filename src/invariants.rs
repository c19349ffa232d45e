//! Match invariants: sanity checks that detect bugs.
//!
//! A match that only ever changes through enacted changes keeps these true
//! after every automaton call. They are not rules of the game; orders that
//! would break them are refused long before they get here.

use crate::automaton::Automaton;
use crate::game::{DescriptorType, Player};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all match invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(automaton: &Automaton) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut violation = |message: String| violations.push(InvariantViolation { message });

    let bible = automaton.bible();
    let board = automaton.board();
    let players = automaton.players();
    let audience = players.vision().union(automaton.visionaries());

    let expected = usize::try_from(i32::from(board.rows()) * i32::from(board.cols())).unwrap_or(0);
    if board.len() != expected {
        violation(format!(
            "board has {} spaces, expected {expected}",
            board.len()
        ));
    }

    for (position, space) in board.iter() {
        let tile = space.tile;
        if tile.is_owned() {
            let max = bible.tile(tile.tile_type).stacks_max;
            if !(1..=max).contains(&tile.stacks) {
                violation(format!(
                    "{} at {position} has {} stacks, allowed 1..={max}",
                    tile.tile_type, tile.stacks
                ));
            }
            if !(0..=tile.stacks).contains(&tile.power) {
                violation(format!(
                    "{} at {position} has power {} with {} stacks",
                    tile.tile_type, tile.power, tile.stacks
                ));
            }
            if !players.contains(tile.owner) {
                violation(format!(
                    "{} at {position} belongs to {}, who is not in the match",
                    tile.tile_type, tile.owner
                ));
            }
        }

        for (layer, unit) in space.units() {
            let max = bible.unit(unit.unit_type).stacks_max;
            if !(1..=max).contains(&unit.stacks) {
                violation(format!(
                    "{} in {layer:?} at {position} has {} figures, allowed 1..={max}",
                    unit.unit_type, unit.stacks
                ));
            }
            if !players.contains(unit.owner) {
                violation(format!(
                    "{} in {layer:?} at {position} belongs to {}, who is not in the match",
                    unit.unit_type, unit.owner
                ));
            }
        }

        let strangers = space.vision().difference(audience);
        if !strangers.is_empty() {
            violation(format!("{position} is seen by non-participants"));
        }
    }

    for data in players.iter() {
        if !(0..=bible.money_max.max(bible.money_start)).contains(&data.money) {
            violation(format!("{} has {} money", data.player, data.money));
        }
        if data.defeated && automaton.pending_orders(data.player) > 0 {
            violation(format!("defeated {} still has orders queued", data.player));
        }
    }

    for subject in automaton.subject_ids().descriptors() {
        let space = board.at(subject.position);
        let present = match subject.layer() {
            Some(layer) => space.unit(layer).is_some(),
            None => subject.kind == DescriptorType::Tile && space.tile.is_owned(),
        };
        if !board.contains(subject.position) || !present {
            violation(format!("subject id points at nothing: {subject}"));
        }
    }

    if players.iter().any(|data| data.player == Player::None) {
        violation("the none player is seated".to_string());
    }

    violations
}

/// Assert all match invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(automaton: &Automaton) {
    let violations = check_invariants(automaton);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        for message in &messages {
            tracing::error!(round = automaton.round().round, "{message}");
        }
        panic!("Match invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_automaton: &Automaton) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::MatchConfig;
    use crate::challenge::Challenge;
    use crate::game::{
        Bible, Board, Change, Descriptor, Position, TileToken, TileType, UnitToken, UnitType,
        Vision,
    };

    fn create_valid_match() -> Automaton {
        let mut board = Board::new(4, 4).unwrap();
        board.at_mut(Position::new(1, 1)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 2, 2);
        board.at_mut(Position::new(1, 2)).unwrap().ground =
            UnitToken::new(UnitType::Rifleman, Player::Red, 3);
        Automaton::new(
            Bible::default(),
            board,
            &[Player::Red],
            MatchConfig {
                seed: 1,
                challenge: Challenge::Standard,
                visionaries: Vision::EMPTY,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_valid_match_passes() {
        let mut automaton = create_valid_match();
        assert!(check_invariants(&automaton).is_empty());
        automaton.hibernate();
        assert!(check_invariants(&automaton).is_empty());
    }

    #[test]
    fn test_overpowered_tile_detected() {
        let mut automaton = create_valid_match();
        automaton.enact(
            &Change::Tile {
                subject: Descriptor::tile(Position::new(1, 1)),
                tile: TileToken::owned(TileType::Town, Player::Red, 2, 3),
            },
            Vision::EMPTY,
        );
        let violations = check_invariants(&automaton);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("power"));
    }

    #[test]
    fn test_stack_bounds_are_inclusive() {
        let mut automaton = create_valid_match();
        let max = automaton.bible().tile(TileType::Town).stacks_max;
        let subject = Descriptor::tile(Position::new(1, 1));
        automaton.enact(
            &Change::Tile {
                subject,
                tile: TileToken::owned(TileType::Town, Player::Red, max, 0),
            },
            Vision::EMPTY,
        );
        assert!(check_invariants(&automaton).is_empty());
        automaton.enact(
            &Change::Tile {
                subject,
                tile: TileToken::owned(TileType::Town, Player::Red, max + 1, 0),
            },
            Vision::EMPTY,
        );
        let violations = check_invariants(&automaton);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("stacks"));
    }

    #[test]
    fn test_negative_money_detected() {
        let mut automaton = create_valid_match();
        automaton.enact(
            &Change::Funds {
                player: Player::Red,
                money: -1,
            },
            Vision::EMPTY,
        );
        let violations = check_invariants(&automaton);
        assert!(violations.iter().any(|v| v.message.contains("money")));
    }

    #[test]
    fn test_stranger_vision_detected() {
        let mut automaton = create_valid_match();
        let position = Position::new(0, 0);
        let space = automaton.board().at(position).clone();
        automaton.enact(
            &Change::Reveal {
                subject: Descriptor::cell(position),
                tile: space.tile,
                environment: space.environment,
            },
            Vision::only(Player::Blue),
        );
        let violations = check_invariants(&automaton);
        assert!(violations.iter().any(|v| v.message.contains("non-participants")));
    }

    #[test]
    fn test_multiple_violations_all_reported() {
        let mut automaton = create_valid_match();
        automaton.enact(
            &Change::Casualties {
                subject: Descriptor::unit(crate::game::Layer::Ground, Position::new(1, 2)),
                killed: 3,
                depowered: 0,
            },
            Vision::EMPTY,
        );
        automaton.enact(
            &Change::Funds {
                player: Player::Red,
                money: i32::MAX,
            },
            Vision::EMPTY,
        );
        let violations = check_invariants(&automaton);
        assert!(violations.len() >= 2, "{violations:?}");
        assert!(violations.iter().any(|v| v.message.contains("figures")));
        assert!(violations.iter().any(|v| v.message.contains("money")));
    }
}
