#![no_main]

use arbitrary::Arbitrary;
use frontier::damage::{BodyKind, Damage, HITPOINTS_MAX, HITPOINTS_MIN};
use frontier::game::{Bible, Descriptor, Environment, Layer, Position};
use frontier::rng::GameRng;
use libfuzzer_sys::fuzz_target;

/// One side of a fight.
#[derive(Arbitrary, Debug)]
struct Target {
    stacks: i8,
    hitpoints: i16,
    power: i8,
    building: bool,
    cover: u8,
}

#[derive(Arbitrary, Debug)]
struct DamageInput {
    seed: u64,
    shots: u8,
    damage: i16,
    targets: Vec<Target>,
    gas: i8,
    radiation: i8,
    frostbite: bool,
}

fuzz_target!(|input: DamageInput| {
    let mut attack = Damage::new();
    let source = Descriptor::unit(Layer::Ground, Position::new(0, 0));
    attack.add_caster(source, usize::from(input.shots), input.damage);

    let environment = Environment {
        gas: input.gas,
        radiation: input.radiation,
        frostbite: input.frostbite,
        ..Environment::default()
    };
    let bible = Bible::default();
    for (col, target) in (0i8..).zip(input.targets.iter().take(16)) {
        let hitpoints = Damage::hitpoints(&bible, &environment, target.hitpoints, target.building);
        assert!((HITPOINTS_MIN..=HITPOINTS_MAX).contains(&hitpoints));
        let position = Position::new(1, col);
        if target.building {
            attack.add_background(Descriptor::tile(position), target.stacks, target.power, hitpoints);
        } else {
            let descriptor = Descriptor::unit(Layer::Ground, position);
            attack.add_taker(descriptor, target.stacks, hitpoints);
            attack.add_trenches(descriptor, target.cover % 8);
        }
    }

    if attack.bodies().is_empty() {
        return;
    }
    let mut rng = GameRng::seeded(input.seed);
    let hits = attack.resolve(&mut rng).to_vec();
    assert_eq!(hits.len(), usize::from(input.shots));
    for hit in &hits {
        let body = &attack.bodies()[hit.body];
        if body.kind == BodyKind::Cover {
            assert!(!hit.killing);
        }
    }
    for target in attack.targets() {
        let casualties = attack.casualties(target);
        let bodies = attack.bodies().iter().filter(|b| b.target == target).count();
        assert!(usize::try_from(casualties.killed + casualties.depowered).unwrap_or(0) <= bodies);
    }
});
