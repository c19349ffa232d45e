// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Frontier: a deterministic simulation core for a turn-based grid strategy game.
//!
//! Players queue orders for their tokens during planning; the automaton then
//! runs the round through its phases and reports everything that happened as
//! change sets, each change tagged with the players allowed to see it.
//!
//! - Bit-exact determinism: one seeded RNG, ordered containers, integer maths
//! - Fog of war: every change carries its recipients
//! - Replayable: a recording re-runs to the same change stream
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Automaton (phases, orders)        │
//! ├──────────────┬──────────┬───────────┤
//! │    Damage    │  Vision  │ Challenge │
//! ├──────────────┴──────────┴───────────┤
//! │   Grid & Tokens, Bible, Changes     │
//! └─────────────────────────────────────┘
//! ```

pub mod automaton;
pub mod challenge;
pub mod damage;
pub mod error;
pub mod game;
pub mod invariants;
pub mod mapgen;
pub mod recording;
pub mod rng;
pub mod vision;

pub use automaton::{Automaton, MatchConfig, Outcome};
pub use challenge::Challenge;
pub use error::{BibleError, ParseError, RecordingError, ReplayError, SetupError};
pub use game::{Bible, Board, Change, ChangeSet, Notice, Order, Player, Position, Vision};
pub use recording::Recording;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_build_a_match() {
        let board = mapgen::generate(9, 10, 10, &[Player::Red, Player::Blue]).unwrap();
        let mut automaton = Automaton::new(
            Bible::default(),
            board,
            &[Player::Red, Player::Blue],
            MatchConfig::default(),
        )
        .unwrap();
        let sets = automaton.run_round();
        assert!(!sets.is_empty());
        assert_eq!(automaton.round().round, 1);
    }
}
