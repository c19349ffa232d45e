//! Recordings re-run to the same change stream and the same state.
//!
//! Run with: cargo test --release replay_equivalence

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use frontier::game::{Descriptor, Layer, Move, Order, Player, Position, TileType, UnitType};
use frontier::recording::{Entry, Stage};
use frontier::{Automaton, Bible, Challenge, MatchConfig, Recording, ReplayError, Vision, mapgen};

const ROSTER: [Player; 3] = [Player::Red, Player::Blue, Player::Yellow];

/// Orders a simple player would give: every city produces a rifleman next
/// to it and every unit takes one step toward the centre.
fn scripted_orders(automaton: &Automaton, player: Player) -> Vec<Order> {
    let board = automaton.board();
    let center = Position::new(board.rows() / 2, board.cols() / 2);
    let mut orders = Vec::new();
    for (position, space) in board.iter() {
        if space.tile.owner == player && space.tile.tile_type == TileType::Town {
            let free = board
                .neighbors(position)
                .into_iter()
                .find(|&n| board.at(n).ground.is_none());
            if let Some(free) = free {
                orders.push(Order::Produce {
                    subject: Descriptor::tile(position),
                    target: Descriptor::unit(Layer::Ground, free),
                    unit_type: UnitType::Rifleman,
                });
            }
        }
        if space.ground.owner == player {
            let step = if position.row < center.row {
                Move::South
            } else if position.row > center.row {
                Move::North
            } else if position.col < center.col {
                Move::East
            } else {
                Move::West
            };
            if let Some(next) = position.step(step) {
                orders.push(Order::Move {
                    subject: Descriptor::unit(Layer::Ground, position),
                    target: Descriptor::unit(Layer::Ground, next),
                    moves: vec![step],
                });
            }
        }
    }
    orders
}

fn play(seed: u64, rounds: u32, challenge: Challenge) -> (Automaton, Recording) {
    let board = mapgen::generate(seed, 12, 12, &ROSTER).unwrap();
    let config = MatchConfig {
        seed,
        challenge,
        visionaries: Vision::only(Player::Observer),
    };
    let mut automaton = Automaton::new(Bible::default(), board, &ROSTER, config).unwrap();
    automaton.start_recording(Some("scripted")).unwrap();
    automaton.hibernate();
    for round in 0..rounds {
        if automaton.is_game_over() {
            break;
        }
        for player in ROSTER {
            if automaton.players().is_alive(player) {
                let orders = scripted_orders(&automaton, player);
                automaton.receive(player, orders);
            }
        }
        if round == 5 {
            automaton.resign(Player::Yellow);
        }
        automaton.run_round();
    }
    let recording = automaton.take_recording().unwrap();
    (automaton, recording)
}

#[test]
fn test_replay_from_orders_reproduces_every_set() {
    for seed in [1, 17, 99] {
        let (original, recording) = play(seed, 12, Challenge::Standard);
        let mut replayed = Automaton::from_recording(&recording).unwrap();
        let sets = replayed.replay(&recording, true).unwrap();
        let recorded: Vec<_> = recording.change_sets().cloned().collect();
        assert_eq!(sets, recorded, "seed {seed}");
        assert_eq!(replayed.board(), original.board(), "seed {seed}");
        assert_eq!(replayed.players(), original.players(), "seed {seed}");
        assert_eq!(replayed.round(), original.round(), "seed {seed}");
    }
}

#[test]
fn test_replay_from_changes_rebuilds_state() {
    for seed in [3, 42] {
        let (original, recording) = play(seed, 12, Challenge::Morale);
        let mut rebuilt = Automaton::from_recording(&recording).unwrap();
        rebuilt.replay(&recording, false).unwrap();
        assert_eq!(rebuilt.board(), original.board(), "seed {seed}");
        assert_eq!(rebuilt.players(), original.players(), "seed {seed}");
        assert_eq!(rebuilt.round(), original.round(), "seed {seed}");
        assert_eq!(rebuilt.rejoin(Player::Red), original.rejoin(Player::Red));
    }
}

#[test]
fn test_recording_survives_a_file() {
    let (original, recording) = play(7, 8, Challenge::Standard);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.jsonl");
    recording.save(&path).unwrap();
    let loaded = Recording::load(&path).unwrap();
    assert_eq!(loaded, recording);
    let verified = Automaton::verify(&loaded).unwrap();
    assert_eq!(verified.board(), original.board());
}

#[test]
fn test_same_seed_same_match() {
    let (first, a) = play(5, 10, Challenge::Elimination);
    let (second, b) = play(5, 10, Challenge::Elimination);
    assert_eq!(a, b);
    assert_eq!(first.board(), second.board());
}

#[test]
fn test_changed_seed_diverges_on_replay() {
    let (_, mut recording) = play(11, 10, Challenge::Standard);
    recording.metadata.seed ^= 0xdead_beef;
    match Automaton::verify(&recording) {
        // A match without any random draw could still agree.
        Ok(_) => {}
        Err(err) => assert!(matches!(err, ReplayError::Divergence { .. }), "{err}"),
    }
}

#[test]
fn test_dropped_orders_diverge() {
    let (_, mut recording) = play(13, 6, Challenge::Standard);
    let first_orders = recording
        .entries
        .iter()
        .position(|entry| matches!(entry, Entry::Orders { orders, .. } if !orders.is_empty()))
        .unwrap();
    recording.entries.remove(first_orders);
    let err = Automaton::verify(&recording).unwrap_err();
    assert!(matches!(
        err,
        ReplayError::Divergence {
            round: 0,
            stage: Stage::Act,
            ..
        }
    ));
}
