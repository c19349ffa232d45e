#![no_main]

use arbitrary::Arbitrary;
use frontier::game::{Descriptor, Layer, Move, Order, Player, Position, TileType, UnitType};
use frontier::invariants::check_invariants;
use frontier::{Automaton, Bible, MatchConfig, Vision, mapgen};
use libfuzzer_sys::fuzz_target;

const ROSTER: [Player; 3] = [Player::Red, Player::Blue, Player::Teal];

/// A raw order; positions are folded onto the board.
#[derive(Arbitrary, Debug)]
enum RawOrder {
    Move { row: u8, col: u8, steps: Vec<u8> },
    Focus { row: u8, col: u8, target_row: u8, target_col: u8 },
    Capture { row: u8, col: u8 },
    Settle { row: u8, col: u8 },
    Produce { row: u8, col: u8, target_row: u8, target_col: u8, militia: bool },
    Upgrade { row: u8, col: u8, city: bool },
    Halt { row: u8, col: u8 },
}

#[derive(Arbitrary, Debug)]
struct RoundInput {
    seed: u64,
    size: u8,
    rounds: Vec<Vec<(u8, RawOrder)>>,
    resign: Option<u8>,
}

fn position(row: u8, col: u8, size: i8) -> Position {
    let size = size.unsigned_abs();
    Position::new(
        i8::try_from(row % size).unwrap_or(0),
        i8::try_from(col % size).unwrap_or(0),
    )
}

fn ground(row: u8, col: u8, size: i8) -> Descriptor {
    Descriptor::unit(Layer::Ground, position(row, col, size))
}

fn convert(raw: &RawOrder, size: i8) -> Order {
    match raw {
        RawOrder::Move { row, col, steps } => {
            let subject = ground(*row, *col, size);
            let moves: Vec<Move> = steps
                .iter()
                .take(4)
                .map(|s| Move::ALL[usize::from(*s) % Move::ALL.len()])
                .collect();
            let mut end = subject.position;
            for &step in &moves {
                end = end.step(step).unwrap_or(end);
            }
            Order::Move {
                subject,
                target: Descriptor::unit(Layer::Ground, end),
                moves,
            }
        }
        RawOrder::Focus { row, col, target_row, target_col } => Order::Focus {
            subject: ground(*row, *col, size),
            target: ground(*target_row, *target_col, size),
        },
        RawOrder::Capture { row, col } => Order::Capture {
            subject: ground(*row, *col, size),
        },
        RawOrder::Settle { row, col } => Order::Settle {
            subject: ground(*row, *col, size),
            tile_type: TileType::Outpost,
        },
        RawOrder::Produce { row, col, target_row, target_col, militia } => Order::Produce {
            subject: Descriptor::tile(position(*row, *col, size)),
            target: ground(*target_row, *target_col, size),
            unit_type: if *militia { UnitType::Militia } else { UnitType::Rifleman },
        },
        RawOrder::Upgrade { row, col, city } => Order::Upgrade {
            subject: Descriptor::tile(position(*row, *col, size)),
            tile_type: if *city { TileType::City } else { TileType::Town },
        },
        RawOrder::Halt { row, col } => Order::Halt {
            subject: ground(*row, *col, size),
        },
    }
}

fuzz_target!(|input: RoundInput| {
    let size = i8::try_from(8 + input.size % 12).unwrap_or(8);
    let Ok(board) = mapgen::generate(input.seed, size, size, &ROSTER) else {
        return;
    };
    let config = MatchConfig {
        seed: input.seed,
        visionaries: Vision::only(Player::Observer),
        ..MatchConfig::default()
    };
    let mut automaton =
        Automaton::new(Bible::default(), board, &ROSTER, config).expect("generated boards are valid");
    automaton.start_recording(None).expect("fresh match records");
    automaton.hibernate();

    for (index, round) in input.rounds.iter().take(8).enumerate() {
        for player in ROSTER {
            let orders: Vec<Order> = round
                .iter()
                .filter(|(who, _)| ROSTER[usize::from(*who) % ROSTER.len()] == player)
                .map(|(_, raw)| convert(raw, size))
                .collect();
            automaton.receive(player, orders);
        }
        if input.resign.is_some_and(|at| usize::from(at) == index) {
            automaton.resign(Player::Teal);
        }
        automaton.run_round();

        let violations = check_invariants(&automaton);
        assert!(violations.is_empty(), "invariants violated: {violations:?}");
    }

    let recording = automaton.take_recording().expect("recording was started");
    let replayed = Automaton::verify(&recording).expect("own recording must verify");
    assert_eq!(replayed.board(), automaton.board());
});
