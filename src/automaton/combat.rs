//! Attacks and their consequences.
//!
//! Every attack builds a [`Damage`], announces itself with an
//! [`Change::Attack`], resolves on the match RNG and then emits one
//! [`Change::Casualties`] per hurt token. Tokens left without stacks die or
//! crumble right after.

use crate::automaton::{Automaton, StandingKind};
use crate::damage::Damage;
use crate::game::{
    AttackKind, Change, Descriptor, ExitCause, Layer, Player, Position, TileToken, UnitToken,
};

/// Layers shelling and bombing reach.
const GROUND_LAYERS: [Layer; 2] = [Layer::Ground, Layer::Bypass];

impl Automaton {
    /// Unit against unit. Active and focused attacks draw retaliation from a
    /// surviving defender; active attacks also trample an enemy building.
    pub(super) fn check_attack_damage(
        &mut self,
        attacker: Descriptor,
        defender: Descriptor,
        kind: AttackKind,
    ) {
        let unit = self.unit(attacker);
        let victim = self.unit(defender);
        if unit.is_none() || victim.is_none() || unit.owner == victim.owner {
            return;
        }

        let mut damage = Damage::new();
        damage.add_attacker(attacker, unit.stacks, self.bible.unit(unit.unit_type));
        if damage.shots() > 0 {
            self.add_unit_body(&mut damage, defender, &victim);
        }
        if !damage.bodies().is_empty() {
            let recipients = self.seen(attacker.position).union(self.seen(defender.position));
            self.emit(
                Change::Attack {
                    subject: attacker,
                    target: defender,
                    kind,
                },
                recipients,
            );
            damage.resolve(&mut self.rng);
            self.apply_damage(&damage);
        }

        if kind == AttackKind::Active {
            self.check_trample_damage(attacker, defender.position);
        }
        if matches!(kind, AttackKind::Active | AttackKind::Focus) {
            let survivor = self.unit(defender);
            if survivor.is_some() && survivor.owner == victim.owner && self.unit(attacker).is_some() {
                self.check_attack_damage(defender, attacker, AttackKind::Retaliation);
            }
        }
        let range = attacker.position.distance_squared(defender.position);
        self.refresh_vision(defender.position, range);
    }

    /// Trample shots of a moving unit against an enemy building.
    fn check_trample_damage(&mut self, attacker: Descriptor, position: Position) {
        let unit = self.unit(attacker);
        let tile = self.board.at(position).tile;
        if unit.is_none() || !tile.is_owned() || tile.owner == unit.owner {
            return;
        }
        let mut damage = Damage::new();
        damage.add_trampler(attacker, unit.stacks, self.bible.unit(unit.unit_type));
        if damage.shots() == 0 {
            return;
        }
        self.add_tile_body(&mut damage, position, &tile);
        let recipients = self.seen(attacker.position).union(self.seen(position));
        self.emit(
            Change::Attack {
                subject: attacker,
                target: Descriptor::tile(position),
                kind: AttackKind::Active,
            },
            recipients,
        );
        damage.resolve(&mut self.rng);
        self.apply_damage(&damage);
    }

    /// Whether shelling or bombing `position` would hit anything that does
    /// not belong to `player`.
    pub(super) fn has_ground_targets(&self, player: Player, position: Position) -> bool {
        let space = self.board.at(position);
        let unit = GROUND_LAYERS.iter().any(|&layer| {
            let unit = space.unit(layer);
            unit.is_some() && unit.owner != player
        });
        unit || (space.tile.is_owned() && space.tile.owner != player)
    }

    /// Ability volleys of `caster` at the cell `position`. Each volley is a
    /// separate attack; volleys stop once nothing is left to hit.
    pub(super) fn check_ability_damage(
        &mut self,
        caster: Descriptor,
        position: Position,
        kind: AttackKind,
    ) {
        let unit = self.unit(caster);
        if unit.is_none() {
            return;
        }
        let stats = self.bible.unit(unit.unit_type);
        let (volleys, per_figure, strength) =
            (stats.ability_volleys.max(1), stats.ability_shots, stats.ability_damage);

        for _ in 0..volleys {
            let unit = self.unit(caster);
            let shots = usize::try_from(unit.stacks.max(0)).unwrap_or(0) * usize::from(per_figure);
            if unit.is_none() || shots == 0 {
                break;
            }
            let mut damage = Damage::new();
            damage.add_caster(caster, shots, strength);
            let space = self.board.at(position);
            for layer in GROUND_LAYERS {
                let target = *space.unit(layer);
                if target.is_some() && target.owner != unit.owner {
                    self.add_unit_body(&mut damage, Descriptor::unit(layer, position), &target);
                }
            }
            let tile = space.tile;
            if tile.is_owned() && tile.owner != unit.owner {
                self.add_tile_body(&mut damage, position, &tile);
            }
            if damage.bodies().is_empty() {
                break;
            }

            let recipients = self.seen(caster.position).union(self.seen(position));
            self.emit(
                Change::Attack {
                    subject: caster,
                    target: Descriptor::cell(position),
                    kind,
                },
                recipients,
            );
            damage.resolve(&mut self.rng);
            self.apply_damage(&damage);
        }
        let range = caster.position.distance_squared(position);
        self.refresh_vision(position, range);
    }

    /// Hazards and contamination hurt everything on a cell: death, gas,
    /// radiation, frostbite, then firestorm shots.
    pub(super) fn check_environment_damage(&mut self, position: Position) {
        let source = Descriptor::cell(position);
        let environment = self.board.at(position).environment;
        let bible = &self.bible;
        let sources = [
            (environment.death, bible.death_shots),
            (environment.gas > 0, bible.gas_shots),
            (environment.radiation > 0, bible.radiation_shots),
            (environment.frostbite, bible.frostbite_shots),
            (environment.firestorm, bible.firestorm_shots),
        ];
        let mut damage = Damage::new();
        for (active, shots) in sources {
            if active && shots > 0 {
                damage.add_caster(source, usize::from(shots), bible.hazard_damage);
            }
        }
        if damage.shots() == 0 {
            return;
        }

        let space = self.board.at(position);
        let units: Vec<(Layer, UnitToken)> = space.units().map(|(l, u)| (l, *u)).collect();
        let tile = space.tile;
        for (layer, unit) in units {
            self.add_unit_body(&mut damage, Descriptor::unit(layer, position), &unit);
        }
        if tile.is_owned() {
            self.add_tile_body(&mut damage, position, &tile);
        }
        if damage.bodies().is_empty() {
            return;
        }

        let recipients = self.seen(position);
        self.emit(
            Change::Attack {
                subject: source,
                target: source,
                kind: AttackKind::Environment,
            },
            recipients,
        );
        damage.resolve(&mut self.rng);
        self.apply_damage(&damage);
        self.refresh_vision(position, 0);
    }

    /// Enemy lockdowns on `next` fire at a unit trying to enter it.
    ///
    /// Returns whether any lockdown fired; the move is then blocked.
    pub(super) fn check_lockdown(&mut self, player: Player, mover: Descriptor, next: Position) -> bool {
        let lockers: Vec<_> = self
            .standing
            .iter()
            .filter(|s| s.kind == StandingKind::Lockdown && s.target == next && s.player != player)
            .copied()
            .collect();
        let mut blocked = false;
        for locker in lockers {
            if self.unit(mover).is_none() {
                break;
            }
            if !self.players.is_alive(locker.player)
                || self.ids.get(locker.subject) != Some(locker.subject_id)
            {
                continue;
            }
            self.check_attack_damage(locker.subject, mover, AttackKind::Lockdown);
            blocked = true;
        }
        blocked
    }

    /// Enemy guards on the cell `mover` just entered fire once and stand down.
    pub(super) fn check_guards(&mut self, player: Player, mover: Descriptor) {
        let position = mover.position;
        let (firing, rest): (Vec<_>, Vec<_>) = self.standing.iter().copied().partition(|s| {
            s.kind == StandingKind::Guard && s.target == position && s.player != player
        });
        if firing.is_empty() {
            return;
        }
        self.standing = rest;
        for guard in firing {
            if self.unit(mover).is_none() {
                break;
            }
            if self.players.is_alive(guard.player)
                && self.ids.get(guard.subject) == Some(guard.subject_id)
            {
                self.check_attack_damage(guard.subject, mover, AttackKind::Guard);
            }
        }
    }

    /// Neighbouring enemies in the same layer that strike at passing units.
    pub(super) fn check_opportunity(&mut self, player: Player, mover: Descriptor) {
        let Some(layer) = mover.layer() else {
            return;
        };
        for neighbor in self.board.neighbors(mover.position) {
            if self.unit(mover).is_none() {
                break;
            }
            let unit = *self.board.at(neighbor).unit(layer);
            if unit.is_some() && unit.owner != player && self.bible.unit(unit.unit_type).opportunity {
                self.check_attack_damage(
                    Descriptor::unit(layer, neighbor),
                    mover,
                    AttackKind::Opportunity,
                );
            }
        }
    }

    fn add_unit_body(&self, damage: &mut Damage, target: Descriptor, unit: &UnitToken) {
        let space = self.board.at(target.position);
        let stats = self.bible.unit(unit.unit_type);
        let hitpoints = Damage::hitpoints(
            &self.bible,
            &space.environment,
            stats.hitpoints,
            stats.mechanical,
        );
        damage.add_taker(target, unit.stacks, hitpoints);
        if target.layer() == Some(Layer::Air) {
            if space.environment.humidity >= self.bible.cloud_humidity && self.bible.cloud_cover > 0 {
                damage.add_clouds(target, self.bible.cloud_cover);
            }
        } else {
            let cover = self.bible.tile(space.tile.tile_type).cover;
            if cover > 0 {
                damage.add_trenches(target, cover);
            }
        }
    }

    fn add_tile_body(&self, damage: &mut Damage, position: Position, tile: &TileToken) {
        let environment = &self.board.at(position).environment;
        let stats = self.bible.tile(tile.tile_type);
        let hitpoints = Damage::hitpoints(&self.bible, environment, stats.hitpoints, true);
        damage.add_background(Descriptor::tile(position), tile.stacks, tile.power, hitpoints);
    }

    /// Emit the losses of a resolved attack and remove what died.
    fn apply_damage(&mut self, damage: &Damage) {
        let targets = damage.targets();
        for &target in &targets {
            let casualties = damage.casualties(target);
            if casualties.killed == 0 && casualties.depowered == 0 {
                continue;
            }
            let recipients = self.seen(target.position);
            self.emit(
                Change::Casualties {
                    subject: target,
                    killed: casualties.killed,
                    depowered: casualties.depowered,
                },
                recipients,
            );
        }
        self.check_deaths(&targets);
    }

    fn check_deaths(&mut self, targets: &[Descriptor]) {
        let aggressor = self.aggressor;
        for &target in targets {
            let position = target.position;
            let recipients = self.seen(position);
            if let Some(layer) = target.layer() {
                let unit = *self.board.at(position).unit(layer);
                if unit.is_none() || unit.stacks > 0 {
                    continue;
                }
                let stats = self.bible.unit(unit.unit_type);
                let (gas, radiation) = (stats.leak_gas, stats.leak_radiation);
                self.emit(
                    Change::Exit {
                        subject: target,
                        cause: ExitCause::Died,
                    },
                    recipients,
                );
                self.leak(position, gas, radiation);
                if aggressor.is_playable() && aggressor != unit.owner {
                    self.add_morale(aggressor, self.bible.morale_kill);
                }
            } else {
                let tile = self.board.at(position).tile;
                if !tile.is_owned() || tile.stacks > 0 {
                    continue;
                }
                let stats = self.bible.tile(tile.tile_type);
                let (destroyed, gas, radiation) = (stats.destroyed, stats.leak_gas, stats.leak_radiation);
                self.emit(
                    Change::Tile {
                        subject: Descriptor::tile(position),
                        tile: TileToken::natural(destroyed),
                    },
                    recipients,
                );
                self.leak(position, gas, radiation);
                if aggressor.is_playable() && aggressor != tile.owner {
                    self.add_morale(aggressor, self.bible.morale_destroy);
                }
            }
        }
    }

    /// Contamination released where something was destroyed.
    fn leak(&mut self, position: Position, gas: i8, radiation: i8) {
        let subject = Descriptor::cell(position);
        let environment = self.board.at(position).environment;
        let recipients = self.seen(position);
        if gas > 0 {
            let value = environment.gas.saturating_add(gas);
            self.emit(Change::Gas { subject, value }, recipients);
        }
        if radiation > 0 {
            let value = environment.radiation.saturating_add(radiation);
            self.emit(Change::Radiation { subject, value }, recipients);
        }
    }

    /// The unit at `subject`, or an empty token.
    pub(super) fn unit(&self, subject: Descriptor) -> UnitToken {
        subject
            .layer()
            .map(|layer| *self.board.at(subject.position).unit(layer))
            .unwrap_or_default()
    }
}
