//! Combat resolution.
//!
//! A [`Damage`] collects shots and bodies for one attack, then
//! [`Damage::resolve`] assigns every shot to a body drawn at random from a
//! shrinking pool:
//!
//! 1. Shots are handled in the order they were added.
//! 2. When the pool is empty it is refilled with every body that can still be
//!    killed. If none can, it is refilled with all bodies, so every shot lands.
//! 3. The picked body leaves the pool and accumulates the shot's damage.
//! 4. A body whose damage taken reaches its hit points dies and is never
//!    refilled again; a hit that does not kill depowers a depowerable body.
//!
//! Randomness comes from the match's [`GameRng`], so two automata with the
//! same seed resolve identically.

use tracing::error;

use crate::game::{Bible, Descriptor, Environment, UnitStats};
use crate::rng::GameRng;

/// Lowest hit points a figure can have.
pub const HITPOINTS_MIN: i16 = 1;
/// Highest hit points a figure can have.
pub const HITPOINTS_MAX: i16 = 100;

/// One shot fired at the bodies of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    /// Who fired it.
    pub source: Descriptor,
    /// Damage dealt on impact.
    pub damage: i16,
}

/// What a body stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// One figure of a unit.
    Unit,
    /// One stack of a building.
    Tile,
    /// Trenches or clouds soaking up shots. Never dies.
    Cover,
}

/// One figure, stack or piece of cover that shots can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    /// Token the body belongs to.
    pub target: Descriptor,
    /// Index among that token's bodies.
    pub figure: u8,
    /// What the body stands for.
    pub kind: BodyKind,
    /// Damage needed to kill it.
    pub hitpoints: i16,
    /// Damage taken so far.
    pub taken: i16,
    /// Still alive.
    pub killable: bool,
    /// Can still lose power.
    pub depowerable: bool,
    /// Lost power in this attack.
    pub depowered: bool,
}

impl Body {
    /// Whether this body died in the attack.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.kind != BodyKind::Cover && self.taken >= self.hitpoints
    }
}

/// Immutable record of one shot striking one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Index of the shot.
    pub shot: usize,
    /// Index of the body.
    pub body: usize,
    /// Who fired.
    pub source: Descriptor,
    /// Token that was struck.
    pub target: Descriptor,
    /// Damage of the shot.
    pub damage: i16,
    /// Damage the body had taken after this hit.
    pub taken: i16,
    /// Hit points of the body.
    pub hitpoints: i16,
    /// Whether the body is dead after this hit.
    pub killing: bool,
    /// Whether this hit depowered the body.
    pub depowering: bool,
}

/// Losses of one token after an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Casualties {
    /// Dead figures or stacks.
    pub killed: i8,
    /// Depowered stacks that survived.
    pub depowered: i8,
}

/// Shots and bodies of one attack.
#[derive(Debug, Clone, Default)]
pub struct Damage {
    shots: Vec<Shot>,
    bodies: Vec<Body>,
    hits: Vec<Hit>,
}

impl Damage {
    /// An attack with no shots and no bodies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add_shots(&mut self, source: Descriptor, count: usize, damage: i16) {
        self.shots
            .extend(std::iter::repeat_n(Shot { source, damage }, count));
    }

    /// Attack shots of every figure of a unit.
    pub fn add_attacker(&mut self, source: Descriptor, stacks: i8, stats: &UnitStats) {
        let count = figures(stacks) * usize::from(stats.attack_shots);
        self.add_shots(source, count, stats.attack_damage);
    }

    /// Trample shots of a unit attacking on the move.
    pub fn add_trampler(&mut self, source: Descriptor, stacks: i8, stats: &UnitStats) {
        let count = figures(stacks) * usize::from(stats.trample_shots);
        self.add_shots(source, count, stats.trample_damage);
    }

    /// A volley of ability or environmental shots.
    pub fn add_caster(&mut self, source: Descriptor, shots: usize, damage: i16) {
        self.add_shots(source, shots, damage);
    }

    /// One body per figure of a unit.
    pub fn add_taker(&mut self, target: Descriptor, stacks: i8, hitpoints: i16) {
        self.add_bodies(target, BodyKind::Unit, stacks, 0, hitpoints);
    }

    /// One body per stack of a building; the first `power` can be depowered.
    pub fn add_background(&mut self, target: Descriptor, stacks: i8, power: i8, hitpoints: i16) {
        self.add_bodies(target, BodyKind::Tile, stacks, power, hitpoints);
    }

    /// Cover from trenches around ground targets.
    pub fn add_trenches(&mut self, target: Descriptor, amount: u8) {
        self.add_cover(target, amount);
    }

    /// Cover from clouds around aircraft.
    pub fn add_clouds(&mut self, target: Descriptor, amount: u8) {
        self.add_cover(target, amount);
    }

    fn add_cover(&mut self, target: Descriptor, amount: u8) {
        for figure in 0..amount {
            self.bodies.push(Body {
                target,
                figure,
                kind: BodyKind::Cover,
                hitpoints: i16::MAX,
                taken: 0,
                killable: true,
                depowerable: false,
                depowered: false,
            });
        }
    }

    fn add_bodies(&mut self, target: Descriptor, kind: BodyKind, stacks: i8, power: i8, hitpoints: i16) {
        let count = u8::try_from(stacks.max(0)).unwrap_or(0);
        for figure in 0..count {
            self.bodies.push(Body {
                target,
                figure,
                kind,
                hitpoints,
                taken: 0,
                killable: true,
                depowerable: i16::from(figure) < i16::from(power),
                depowered: false,
            });
        }
    }

    /// Number of shots added.
    #[must_use]
    pub fn shots(&self) -> usize {
        self.shots.len()
    }

    /// Bodies with their current state.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Hits of the last resolution.
    #[must_use]
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Resolve every shot against the bodies.
    ///
    /// Resolving without bodies is a contract violation: it asserts in debug
    /// builds and does nothing in release builds.
    pub fn resolve(&mut self, rng: &mut GameRng) -> &[Hit] {
        self.hits.clear();
        if self.bodies.is_empty() {
            error!(shots = self.shots.len(), "damage resolved without bodies");
            debug_assert!(!self.bodies.is_empty(), "damage resolved without bodies");
            return &self.hits;
        }

        let mut pool: Vec<usize> = Vec::with_capacity(self.bodies.len());
        for (shot_index, shot) in self.shots.iter().enumerate() {
            if pool.is_empty() {
                pool.extend(
                    self.bodies
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| b.killable)
                        .map(|(i, _)| i),
                );
                if pool.is_empty() {
                    pool.extend(0..self.bodies.len());
                }
            }

            let body_index = pool.remove(rng.pick(pool.len()));
            let body = &mut self.bodies[body_index];
            body.taken = body.taken.saturating_add(shot.damage.max(0));
            let killing = body.is_dead();
            let depowering = !killing && body.depowerable;
            if killing {
                body.killable = false;
                body.depowerable = false;
            } else if depowering {
                body.depowerable = false;
                body.depowered = true;
            }

            self.hits.push(Hit {
                shot: shot_index,
                body: body_index,
                source: shot.source,
                target: body.target,
                damage: shot.damage,
                taken: body.taken,
                hitpoints: body.hitpoints,
                killing,
                depowering,
            });
        }
        &self.hits
    }

    /// Losses of `target` after resolution.
    #[must_use]
    pub fn casualties(&self, target: Descriptor) -> Casualties {
        let mut result = Casualties::default();
        for body in self.bodies.iter().filter(|b| b.target == target) {
            if body.is_dead() {
                result.killed = result.killed.saturating_add(1);
            } else if body.depowered {
                result.depowered = result.depowered.saturating_add(1);
            }
        }
        result
    }

    /// Targets that have bodies, in the order they were added.
    #[must_use]
    pub fn targets(&self) -> Vec<Descriptor> {
        let mut targets: Vec<Descriptor> = Vec::new();
        for body in &self.bodies {
            if body.kind != BodyKind::Cover && !targets.contains(&body.target) {
                targets.push(body.target);
            }
        }
        targets
    }

    /// Hit points of a figure standing in `environment`.
    ///
    /// Frostbite and gas spare mechanical figures. Penalties are summed when
    /// the ruleset stacks vulnerabilities, otherwise only the largest applies.
    /// The result is clamped to `[1, 100]`.
    #[must_use]
    pub fn hitpoints(bible: &Bible, environment: &Environment, base: i16, mechanical: bool) -> i16 {
        let frostbite = if environment.frostbite && !mechanical {
            bible.frostbite_vulnerability
        } else {
            0
        };
        let bonedrought = if environment.bonedrought {
            bible.bonedrought_vulnerability
        } else {
            0
        };
        let gas = if mechanical {
            0
        } else {
            bible
                .gas_vulnerability
                .saturating_mul(i16::from(environment.gas.max(0)))
        };
        let radiation = bible
            .radiation_vulnerability
            .saturating_mul(i16::from(environment.radiation.max(0)));

        let penalties = [frostbite, bonedrought, gas, radiation].map(|p| p.max(0));
        let penalty = if bible.vulnerabilities_stack {
            penalties.iter().fold(0i16, |sum, &p| sum.saturating_add(p))
        } else {
            penalties.iter().copied().max().unwrap_or(0)
        };
        base.saturating_sub(penalty).clamp(HITPOINTS_MIN, HITPOINTS_MAX)
    }
}

fn figures(stacks: i8) -> usize {
    usize::try_from(stacks.max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Layer, Position, UnitType};

    fn target(col: i8) -> Descriptor {
        Descriptor::unit(Layer::Ground, Position::new(0, col))
    }

    #[test]
    fn test_every_shot_hits() {
        let bible = Bible::default();
        let mut damage = Damage::new();
        damage.add_attacker(target(0), 3, bible.unit(UnitType::Gunner));
        damage.add_taker(target(1), 2, 2);
        let mut rng = GameRng::seeded(1);
        let hits = damage.resolve(&mut rng).len();
        assert_eq!(hits, damage.shots());
        assert_eq!(hits, 9);
    }

    #[test]
    fn test_killing_matches_taken() {
        let mut damage = Damage::new();
        damage.add_caster(target(0), 5, 1);
        damage.add_taker(target(1), 2, 2);
        let mut rng = GameRng::seeded(2);
        for hit in damage.resolve(&mut rng) {
            assert_eq!(hit.killing, hit.taken >= hit.hitpoints);
        }
    }

    #[test]
    fn test_pool_spreads_before_repeating() {
        // Two bodies with plenty of hit points: the first two shots must land
        // on different bodies because a picked body leaves the pool.
        let mut damage = Damage::new();
        damage.add_caster(target(0), 2, 1);
        damage.add_taker(target(1), 2, 50);
        let mut rng = GameRng::seeded(9);
        let hits = damage.resolve(&mut rng);
        assert_ne!(hits[0].body, hits[1].body);
    }

    #[test]
    fn test_overkill_lands_on_dead_bodies() {
        let mut damage = Damage::new();
        damage.add_caster(target(0), 4, 5);
        damage.add_taker(target(1), 1, 1);
        let mut rng = GameRng::seeded(3);
        let hits = damage.resolve(&mut rng).to_vec();
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| h.killing));
        assert_eq!(damage.casualties(target(1)).killed, 1);
    }

    #[test]
    fn test_cover_absorbs_but_never_dies() {
        let mut damage = Damage::new();
        damage.add_caster(target(0), 20, 100);
        damage.add_taker(target(1), 1, 1);
        damage.add_trenches(target(1), 2);
        let mut rng = GameRng::seeded(4);
        let hits = damage.resolve(&mut rng).to_vec();
        assert_eq!(hits.len(), 20);
        assert_eq!(damage.casualties(target(1)).killed, 1);
        let cover_kills = hits
            .iter()
            .filter(|h| damage.bodies()[h.body].kind == BodyKind::Cover && h.killing)
            .count();
        assert_eq!(cover_kills, 0);
    }

    #[test]
    fn test_depower_before_destroy() {
        let tile = Descriptor::tile(Position::new(0, 1));
        let mut damage = Damage::new();
        damage.add_caster(target(0), 1, 1);
        damage.add_background(tile, 1, 1, 3);
        let mut rng = GameRng::seeded(5);
        let hits = damage.resolve(&mut rng).to_vec();
        assert!(hits[0].depowering);
        assert_eq!(
            damage.casualties(tile),
            Casualties {
                killed: 0,
                depowered: 1
            }
        );
    }

    #[test]
    fn test_no_shots_is_noop() {
        let mut damage = Damage::new();
        damage.add_taker(target(1), 1, 1);
        let mut rng = GameRng::seeded(6);
        assert_eq!(damage.shots(), 0);
        assert!(damage.resolve(&mut rng).is_empty());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "without bodies"))]
    fn test_no_bodies_is_contract_violation() {
        let mut damage = Damage::new();
        damage.add_caster(target(0), 3, 1);
        let mut rng = GameRng::seeded(7);
        assert!(damage.resolve(&mut rng).is_empty());
    }

    #[test]
    fn test_same_seed_same_hits() {
        let run = |seed| {
            let mut damage = Damage::new();
            damage.add_caster(target(0), 6, 1);
            damage.add_taker(target(1), 3, 2);
            damage.add_taker(target(2), 2, 1);
            let mut rng = GameRng::seeded(seed);
            damage.resolve(&mut rng).to_vec()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_hitpoints_penalties() {
        let bible = Bible::default();
        let mut env = Environment {
            frostbite: true,
            gas: 2,
            ..Environment::default()
        };
        // Largest penalty only: gas 2.
        assert_eq!(Damage::hitpoints(&bible, &env, 5, false), 3);
        // Mechanical figures ignore frostbite and gas.
        assert_eq!(Damage::hitpoints(&bible, &env, 5, true), 5);

        let stacking = Bible {
            vulnerabilities_stack: true,
            ..Bible::default()
        };
        assert_eq!(Damage::hitpoints(&stacking, &env, 5, false), 2);

        env.radiation = 100;
        assert_eq!(Damage::hitpoints(&bible, &env, 5, false), HITPOINTS_MIN);
        assert_eq!(
            Damage::hitpoints(&bible, &Environment::default(), 500, false),
            HITPOINTS_MAX
        );
    }
}
