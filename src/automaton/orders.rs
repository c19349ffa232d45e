//! Order handlers.
//!
//! Each handler either finishes its order, keeps it in progress (a move with
//! steps left), postpones it to the next action phase, or discards it. Orders
//! that are illegal never fail loudly: the issuer gets a [`Notice`].

use crate::automaton::{Automaton, QueuedOrder, Standing, StandingKind, SubjectId};
use crate::game::{
    AttackKind, Change, Descriptor, DescriptorType, EnterCause, ExitCause, Layer, Move, Notice,
    Order, Player, Position, TileToken, TileType, UnitToken, UnitType,
};

/// What happened to an order when it was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Done; leaves the queue.
    Finished,
    /// A move with steps left; stays at the head of the queue.
    InProgress,
    /// Blocked for now; retried next action phase.
    Postponed(Notice),
    /// Dropped for good.
    Discarded(Notice),
}

/// Why a handler gave up.
enum Rejection {
    Discard(Notice),
    Postpone(Notice),
}

impl From<Notice> for Rejection {
    fn from(notice: Notice) -> Self {
        Rejection::Discard(notice)
    }
}

type Handled = Result<Outcome, Rejection>;

impl Automaton {
    /// Process one order of `player`.
    pub(super) fn execute(&mut self, player: Player, queued: &mut QueuedOrder) -> Outcome {
        if !self.players.is_alive(player) {
            return Outcome::Discarded(Notice::Defeated);
        }
        let result = match self.verify_subject(player, queued) {
            Ok(()) => self.dispatch(player, queued),
            Err(notice) => Err(Rejection::Discard(notice)),
        };
        match result {
            Ok(outcome) => outcome,
            Err(Rejection::Discard(notice)) => Outcome::Discarded(notice),
            Err(Rejection::Postpone(notice)) => Outcome::Postponed(notice),
        }
    }

    fn dispatch(&mut self, player: Player, queued: &mut QueuedOrder) -> Handled {
        let subject_id = queued.subject_id;
        match &mut queued.order {
            Order::Move {
                subject,
                target,
                moves,
            } => self.order_move(player, subject, *target, moves),
            Order::Guard { subject, target } => {
                self.order_standing(player, StandingKind::Guard, *subject, *target, subject_id)
            }
            Order::Lockdown { subject, target } => {
                self.order_standing(player, StandingKind::Lockdown, *subject, *target, subject_id)
            }
            Order::Focus { subject, target } => self.order_focus(player, *subject, *target),
            Order::Shell { subject, target } => {
                self.order_volley(*subject, *target, AttackKind::Shell)
            }
            Order::Bombard { subject, target } => {
                self.order_volley(*subject, *target, AttackKind::Bombard)
            }
            Order::Bomb { subject } => self.order_bomb(*subject),
            Order::Capture { subject } => self.order_capture(player, *subject),
            Order::Shape { subject, tile_type } => self.order_shape(*subject, *tile_type),
            Order::Settle { subject, tile_type } => self.order_settle(player, *subject, *tile_type),
            Order::Expand {
                subject,
                target,
                tile_type,
            } => self.order_expand(player, *subject, *target, *tile_type),
            Order::Upgrade { subject, tile_type } => {
                self.order_upgrade(player, *subject, *tile_type)
            }
            Order::Cultivate { subject, tile_type } => {
                self.order_cultivate(*subject, *tile_type)
            }
            Order::Produce {
                subject,
                target,
                unit_type,
            } => self.order_produce(player, *subject, *target, *unit_type),
            Order::Halt { subject } => {
                let subject = *subject;
                self.standing.retain(|standing| standing.subject != subject);
                Ok(Outcome::Finished)
            }
            Order::None => Ok(Outcome::Finished),
        }
    }

    /// The subject must still be the token the order was issued for, belong
    /// to `player`, and be able to carry out the order.
    fn verify_subject(&self, player: Player, queued: &QueuedOrder) -> Result<(), Notice> {
        let order = &queued.order;
        let subject = order.subject().ok_or(Notice::InvalidSubject)?;
        let fits = if order.order_type().is_tile_order() {
            subject.kind == DescriptorType::Tile
        } else {
            subject.layer().is_some()
        };
        if !fits {
            return Err(Notice::InvalidSubject);
        }
        if self.ids.get(subject) != Some(queued.subject_id) {
            return Err(Notice::SubjectLost);
        }

        let space = self.board.at(subject.position);
        let (owner, orders) = match subject.layer() {
            Some(layer) => {
                let unit = space.unit(layer);
                (unit.owner, &self.bible.unit(unit.unit_type).orders)
            }
            None => (
                space.tile.owner,
                &self.bible.tile(space.tile.tile_type).orders,
            ),
        };
        if owner != player {
            return Err(Notice::NotOwner);
        }
        if !orders.contains(&order.order_type()) {
            return Err(Notice::Incapable);
        }
        Ok(())
    }

    /// The path must be non-empty, no longer than the unit's speed, stay on
    /// the board and end at the target in the same layer.
    fn validate_move_steps(
        &self,
        subject: Descriptor,
        target: Descriptor,
        moves: &[Move],
        speed: u8,
    ) -> Result<(), Notice> {
        if target.kind != subject.kind || moves.is_empty() || moves.len() > usize::from(speed) {
            return Err(Notice::InvalidMoves);
        }
        let mut position = subject.position;
        for &step in moves {
            position = position
                .step(step)
                .filter(|p| self.board.contains(*p))
                .ok_or(Notice::InvalidMoves)?;
        }
        if position != target.position {
            return Err(Notice::InvalidMoves);
        }
        Ok(())
    }

    fn order_move(
        &mut self,
        player: Player,
        subject: &mut Descriptor,
        target: Descriptor,
        moves: &mut Vec<Move>,
    ) -> Handled {
        let layer = subject.layer().ok_or(Notice::InvalidSubject)?;
        let unit = *self.board.at(subject.position).unit(layer);
        let speed = self.bible.unit(unit.unit_type).speed;
        self.validate_move_steps(*subject, target, moves, speed)?;
        let next = moves
            .first()
            .and_then(|&step| subject.position.step(step))
            .ok_or(Notice::InvalidMoves)?;
        let destination = Descriptor::unit(layer, next);

        let walkable = self.bible.tile(self.board.at(next).tile.tile_type).walkable;
        if layer != Layer::Air && !walkable {
            return Err(Notice::Blocked.into());
        }

        let occupant = *self.board.at(next).unit(layer);
        if occupant.is_some() {
            if occupant.owner == player {
                return Err(Rejection::Postpone(Notice::Occupied));
            }
            self.check_attack_damage(*subject, destination, AttackKind::Active);
            return Ok(Outcome::Finished);
        }

        if self.check_lockdown(player, *subject, next) {
            if self.board.at(subject.position).unit(layer).is_none() {
                return Ok(Outcome::Finished);
            }
            return Err(Rejection::Postpone(Notice::Blocked));
        }

        self.move_unit(*subject, destination);
        *subject = destination;
        moves.remove(0);

        self.check_opportunity(player, destination);
        self.check_guards(player, destination);
        if self.board.at(next).unit(layer).is_none() || moves.is_empty() {
            return Ok(Outcome::Finished);
        }
        Ok(Outcome::InProgress)
    }

    /// Step a unit to a neighbouring slot.
    ///
    /// Observers of both cells see the move, observers of only the origin
    /// see it leave, observers of only the destination see it arrive.
    fn move_unit(&mut self, from: Descriptor, to: Descriptor) {
        let Some(layer) = from.layer() else {
            return;
        };
        let unit = *self.board.at(from.position).unit(layer);
        let origin = self.seen(from.position);
        let destination = self.seen(to.position);
        self.emit(
            Change::Exit {
                subject: from,
                cause: ExitCause::Moved,
            },
            origin.difference(destination),
        );
        self.emit(
            Change::Move {
                subject: from,
                target: to,
            },
            origin.intersection(destination),
        );
        self.emit(
            Change::Enter {
                subject: to,
                unit,
                cause: EnterCause::Moved,
            },
            destination.difference(origin),
        );
        self.refresh_vision(from.position, 1);
    }

    fn order_standing(
        &mut self,
        player: Player,
        kind: StandingKind,
        subject: Descriptor,
        target: Descriptor,
        subject_id: SubjectId,
    ) -> Handled {
        if !self.board.contains(target.position) {
            return Err(Notice::IllegalTarget.into());
        }
        if subject.position.distance_squared(target.position) > 1 {
            return Err(Notice::OutOfRange.into());
        }
        self.standing.push(Standing {
            kind,
            player,
            subject,
            subject_id,
            target: target.position,
        });
        Ok(Outcome::Finished)
    }

    fn order_focus(&mut self, player: Player, subject: Descriptor, target: Descriptor) -> Handled {
        let layer = target.layer().ok_or(Notice::IllegalTarget)?;
        if !self.board.contains(target.position) {
            return Err(Notice::IllegalTarget.into());
        }
        if subject.position.distance_squared(target.position) > 1 {
            return Err(Notice::OutOfRange.into());
        }
        let victim = self.board.at(target.position).unit(layer);
        if victim.is_none() || victim.owner == player {
            return Err(Notice::NoTarget.into());
        }
        self.check_attack_damage(subject, target, AttackKind::Focus);
        Ok(Outcome::Finished)
    }

    /// Shell and bombard: ability volleys at a cell within the unit's range.
    fn order_volley(&mut self, subject: Descriptor, target: Descriptor, kind: AttackKind) -> Handled {
        if !self.board.contains(target.position) {
            return Err(Notice::IllegalTarget.into());
        }
        let stats = self.bible.unit(self.unit(subject).unit_type);
        let distance = subject.position.distance_squared(target.position);
        if distance < stats.range_min || distance > stats.range_max {
            return Err(Notice::OutOfRange.into());
        }
        if !self.has_ground_targets(self.owner_of(subject), target.position) {
            return Err(Notice::NoTarget.into());
        }
        self.check_ability_damage(subject, target.position, kind);
        Ok(Outcome::Finished)
    }

    fn order_bomb(&mut self, subject: Descriptor) -> Handled {
        if subject.layer() != Some(Layer::Air) {
            return Err(Notice::InvalidSubject.into());
        }
        let position = subject.position;
        if !self.has_ground_targets(self.owner_of(subject), position) {
            return Err(Notice::NoTarget.into());
        }
        self.check_ability_damage(subject, position, AttackKind::Bomb);
        let gas = self.board.at(position).environment.gas;
        let value = gas.saturating_add(self.bible.bomb_gas);
        if value != gas {
            let recipients = self.seen(position);
            self.emit(
                Change::Gas {
                    subject: Descriptor::cell(position),
                    value,
                },
                recipients,
            );
        }
        Ok(Outcome::Finished)
    }

    fn order_capture(&mut self, player: Player, subject: Descriptor) -> Handled {
        let position = subject.position;
        let tile = self.board.at(position).tile;
        if !tile.is_owned() || tile.owner == player {
            return Err(Notice::NoTarget.into());
        }
        if !self.bible.tile(tile.tile_type).ownable {
            return Err(Notice::IllegalTarget.into());
        }
        let recipients = self.seen(position);
        self.emit(
            Change::Tile {
                subject: Descriptor::tile(position),
                tile: TileToken {
                    owner: player,
                    power: 0,
                    ..tile
                },
            },
            recipients,
        );
        self.add_morale(player, self.bible.morale_capture);
        self.refresh_vision(position, 0);
        Ok(Outcome::Finished)
    }

    fn order_shape(&mut self, subject: Descriptor, tile_type: TileType) -> Handled {
        let stats = self.bible.unit(self.unit(subject).unit_type);
        if !stats.shapes.contains(&tile_type) {
            return Err(Notice::Incapable.into());
        }
        let position = subject.position;
        let tile = self.board.at(position).tile;
        if tile.is_owned()
            || !self.bible.tile(tile.tile_type).natural
            || !self.bible.tile(tile_type).natural
        {
            return Err(Notice::IllegalTarget.into());
        }
        if tile.tile_type == tile_type {
            return Err(Notice::NoTarget.into());
        }
        let recipients = self.seen(position);
        self.emit(
            Change::Tile {
                subject: Descriptor::tile(position),
                tile: TileToken::natural(tile_type),
            },
            recipients,
        );
        Ok(Outcome::Finished)
    }

    fn order_settle(&mut self, player: Player, subject: Descriptor, tile_type: TileType) -> Handled {
        let stats = self.bible.unit(self.unit(subject).unit_type);
        if !stats.settles.contains(&tile_type) {
            return Err(Notice::Incapable.into());
        }
        let position = subject.position;
        self.check_buildable(position)?;
        self.pay(player, self.bible.tile(tile_type).cost)?;

        let recipients = self.seen(position);
        self.emit(
            Change::Exit {
                subject,
                cause: ExitCause::Settled,
            },
            recipients,
        );
        self.emit(
            Change::Tile {
                subject: Descriptor::tile(position),
                tile: TileToken::owned(tile_type, player, 1, 1),
            },
            recipients,
        );
        self.add_morale(player, self.bible.morale_build);
        self.refresh_vision(position, 0);
        Ok(Outcome::Finished)
    }

    fn order_expand(
        &mut self,
        player: Player,
        subject: Descriptor,
        target: Descriptor,
        tile_type: TileType,
    ) -> Handled {
        let tile = self.board.at(subject.position).tile;
        if !self.bible.tile(tile.tile_type).expands.contains(&tile_type) {
            return Err(Notice::Incapable.into());
        }
        if !self.board.contains(target.position) {
            return Err(Notice::IllegalTarget.into());
        }
        if !subject.position.is_orthogonal_neighbor(target.position) {
            return Err(Notice::OutOfRange.into());
        }
        self.check_buildable(target.position)?;
        self.pay(player, self.bible.tile(tile_type).cost)?;

        let recipients = self.seen(target.position);
        self.emit(
            Change::Tile {
                subject: Descriptor::tile(target.position),
                tile: TileToken::owned(tile_type, player, 1, 1),
            },
            recipients,
        );
        self.add_morale(player, self.bible.morale_build);
        self.refresh_vision(target.position, 0);
        Ok(Outcome::Finished)
    }

    /// Same type adds a stack; another type transforms the building.
    /// Either way every stack must be powered.
    fn order_upgrade(&mut self, player: Player, subject: Descriptor, tile_type: TileType) -> Handled {
        let position = subject.position;
        let tile = self.board.at(position).tile;
        let stats = self.bible.tile(tile.tile_type);
        let upgraded = if tile_type == tile.tile_type {
            if tile.stacks >= stats.stacks_max {
                return Err(Notice::IllegalTarget.into());
            }
            TileToken {
                stacks: tile.stacks.saturating_add(1),
                ..tile
            }
        } else {
            if !stats.upgrades.contains(&tile_type) {
                return Err(Notice::Incapable.into());
            }
            let stacks = tile.stacks.min(self.bible.tile(tile_type).stacks_max).max(1);
            TileToken::owned(tile_type, player, stacks, 0)
        };
        if tile.power < tile.stacks {
            return Err(Notice::InsufficientPower.into());
        }
        self.pay(player, self.bible.tile(tile_type).cost)?;

        let recipients = self.seen(position);
        self.emit(
            Change::Tile {
                subject: Descriptor::tile(position),
                tile: upgraded,
            },
            recipients,
        );
        self.add_morale(player, self.bible.morale_build);
        self.refresh_vision(position, 0);
        Ok(Outcome::Finished)
    }

    fn order_cultivate(&mut self, subject: Descriptor, tile_type: TileType) -> Handled {
        let tile = self.board.at(subject.position).tile;
        if !self.bible.tile(tile.tile_type).cultivates.contains(&tile_type) {
            return Err(Notice::Incapable.into());
        }
        let fields: Vec<Position> = self
            .board
            .neighbors(subject.position)
            .into_iter()
            .filter(|&position| {
                let current = self.board.at(position).tile;
                let stats = self.bible.tile(current.tile_type);
                !current.is_owned() && stats.natural && stats.buildable && current.tile_type != tile_type
            })
            .collect();
        if fields.is_empty() {
            return Err(Notice::NoTarget.into());
        }
        for position in fields {
            let recipients = self.seen(position);
            self.emit(
                Change::Tile {
                    subject: Descriptor::tile(position),
                    tile: TileToken::natural(tile_type),
                },
                recipients,
            );
        }
        Ok(Outcome::Finished)
    }

    fn order_produce(
        &mut self,
        player: Player,
        subject: Descriptor,
        target: Descriptor,
        unit_type: UnitType,
    ) -> Handled {
        let tile = self.board.at(subject.position).tile;
        if !self.bible.tile(tile.tile_type).produces.contains(&unit_type) {
            return Err(Notice::Incapable.into());
        }
        let stats = self.bible.unit(unit_type);
        let (stacks, cost) = (stats.stacks_max, stats.cost);
        if target.layer() != Some(stats.layer) || !self.board.contains(target.position) {
            return Err(Notice::IllegalTarget.into());
        }
        if subject.position.distance_squared(target.position) > 1 {
            return Err(Notice::OutOfRange.into());
        }
        let space = self.board.at(target.position);
        if stats.layer != Layer::Air && !self.bible.tile(space.tile.tile_type).walkable {
            return Err(Notice::IllegalTarget.into());
        }
        if space.unit(stats.layer).is_some() {
            return Err(Rejection::Postpone(Notice::Occupied));
        }
        if tile.power < 1 {
            return Err(Rejection::Postpone(Notice::InsufficientPower));
        }
        self.pay(player, cost)?;

        let recipients = self.seen(subject.position);
        self.emit(
            Change::Tile {
                subject,
                tile: TileToken {
                    power: tile.power - 1,
                    ..tile
                },
            },
            recipients,
        );
        let recipients = self.seen(target.position);
        self.emit(
            Change::Enter {
                subject: target,
                unit: UnitToken::new(unit_type, player, stacks),
                cause: EnterCause::Produced,
            },
            recipients,
        );
        self.refresh_vision(target.position, 0);
        Ok(Outcome::Finished)
    }

    fn check_buildable(&self, position: Position) -> Result<(), Notice> {
        let tile = self.board.at(position).tile;
        if tile.is_owned() || !self.bible.tile(tile.tile_type).buildable {
            return Err(Notice::IllegalTarget);
        }
        Ok(())
    }

    /// Take `cost` from `player`, or postpone when they cannot afford it.
    fn pay(&mut self, player: Player, cost: i32) -> Result<(), Rejection> {
        let money = self.players.get(player).map_or(0, |data| data.money);
        if money < cost {
            return Err(Rejection::Postpone(Notice::Unaffordable));
        }
        if cost != 0 {
            self.set_money(player, money - cost);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::tests::{duel, duel_board};
    use crate::game::{Board, ChangeSet};

    fn ground(row: i8, col: i8) -> Descriptor {
        Descriptor::unit(Layer::Ground, Position::new(row, col))
    }

    /// Run one full round with `orders` for red and return every change set.
    fn play(automaton: &mut Automaton, orders: Vec<Order>) -> Vec<ChangeSet> {
        if !automaton.initialized {
            automaton.hibernate();
        }
        automaton.receive(Player::Red, orders);
        let mut sets = vec![automaton.awake()];
        automaton.prepare();
        while automaton.active() {
            sets.push(automaton.act());
        }
        sets.push(automaton.hibernate());
        sets
    }

    fn notices(sets: &[ChangeSet]) -> Vec<Notice> {
        sets.iter()
            .flat_map(|set| set.iter())
            .filter_map(|(change, _)| match change {
                Change::Notice { notice, .. } => Some(*notice),
                _ => None,
            })
            .collect()
    }

    fn with_unit(board: &mut Board, row: i8, col: i8, unit_type: UnitType, owner: Player, stacks: i8) {
        board.at_mut(Position::new(row, col)).unwrap().ground = UnitToken::new(unit_type, owner, stacks);
    }

    #[test]
    fn test_move_walks_one_step_per_tick() {
        let mut board = duel_board();
        with_unit(&mut board, 0, 0, UnitType::Rifleman, Player::Red, 3);
        let mut automaton = duel(board);
        let sets = play(
            &mut automaton,
            vec![Order::Move {
                subject: ground(0, 0),
                target: ground(0, 2),
                moves: vec![Move::East, Move::East],
            }],
        );
        // awake, two ticks, decay, growth, hibernate
        assert_eq!(sets.len(), 6);
        assert!(automaton.board().at(Position::new(0, 2)).ground.is_some());
        assert!(automaton.board().at(Position::new(0, 0)).ground.is_none());
    }

    #[test]
    fn test_move_rejects_bad_paths() {
        let mut board = duel_board();
        with_unit(&mut board, 0, 0, UnitType::Rifleman, Player::Red, 3);
        let mut automaton = duel(board);
        let sets = play(
            &mut automaton,
            vec![Order::Move {
                subject: ground(0, 0),
                target: ground(2, 2),
                moves: vec![Move::East],
            }],
        );
        assert_eq!(notices(&sets), vec![Notice::InvalidMoves]);
    }

    #[test]
    fn test_foreign_subject_is_not_owned() {
        let mut board = duel_board();
        with_unit(&mut board, 1, 1, UnitType::Rifleman, Player::Blue, 1);
        let mut automaton = duel(board);
        let sets = play(&mut automaton, vec![Order::Halt { subject: ground(1, 1) }]);
        assert_eq!(notices(&sets), vec![Notice::NotOwner]);
    }

    #[test]
    fn test_missing_subject_is_lost() {
        let mut automaton = duel(duel_board());
        let sets = play(&mut automaton, vec![Order::Halt { subject: ground(1, 1) }]);
        assert_eq!(notices(&sets), vec![Notice::SubjectLost]);
    }

    #[test]
    fn test_friendly_occupant_postpones_until_retry_limit() {
        let mut board = duel_board();
        with_unit(&mut board, 0, 0, UnitType::Rifleman, Player::Red, 1);
        with_unit(&mut board, 0, 1, UnitType::Rifleman, Player::Red, 1);
        let mut automaton = duel(board);
        let order = Order::Move {
            subject: ground(0, 0),
            target: ground(0, 1),
            moves: vec![Move::East],
        };
        let mut seen = Vec::new();
        let limit = automaton.bible().order_retry_limit;
        seen.extend(notices(&play(&mut automaton, vec![order])));
        for _ in 0..limit {
            seen.extend(notices(&play(&mut automaton, Vec::new())));
        }
        let occupied = seen.iter().filter(|n| **n == Notice::Occupied).count();
        assert_eq!(occupied, usize::from(limit));
        assert_eq!(seen.last(), Some(&Notice::RetryLimit));
        assert_eq!(automaton.pending_orders(Player::Red), 0);
    }

    #[test]
    fn test_produce_places_unit_and_pays() {
        let mut automaton = duel(duel_board());
        let sets = play(
            &mut automaton,
            vec![Order::Produce {
                subject: Descriptor::tile(Position::new(0, 0)),
                target: ground(0, 1),
                unit_type: UnitType::Rifleman,
            }],
        );
        let unit = automaton.board().at(Position::new(0, 1)).ground;
        assert_eq!(unit.unit_type, UnitType::Rifleman);
        assert_eq!(unit.owner, Player::Red);
        let produced = sets.iter().flat_map(|s| s.iter()).any(|(c, _)| {
            matches!(
                c,
                Change::Enter {
                    cause: EnterCause::Produced,
                    ..
                }
            )
        });
        assert!(produced);
        // 20 start - 5 rifleman + 2 town income
        assert_eq!(automaton.players().get(Player::Red).unwrap().money, 17);
    }

    #[test]
    fn test_upgrade_without_power_is_discarded() {
        let mut board = duel_board();
        board.at_mut(Position::new(0, 0)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 2, 1);
        let mut automaton = duel(board);
        automaton.hibernate();
        let money = automaton.players().get(Player::Red).unwrap().money;
        automaton.receive(
            Player::Red,
            vec![Order::Upgrade {
                subject: Descriptor::tile(Position::new(0, 0)),
                tile_type: TileType::Town,
            }],
        );
        automaton.awake();
        automaton.prepare();
        let tick = automaton.act();
        let notices: Vec<&Change> = tick.for_player(Player::Red).collect();
        assert!(notices.iter().any(|c| matches!(
            c,
            Change::Notice {
                notice: Notice::InsufficientPower,
                ..
            }
        )));
        assert_eq!(automaton.players().get(Player::Red).unwrap().money, money);
        assert_eq!(automaton.board().at(Position::new(0, 0)).tile.stacks, 2);
        assert_eq!(automaton.pending_orders(Player::Red), 0);
    }

    #[test]
    fn test_settle_consumes_unit() {
        let mut board = duel_board();
        with_unit(&mut board, 1, 0, UnitType::Settler, Player::Red, 1);
        let mut automaton = duel(board);
        play(
            &mut automaton,
            vec![Order::Settle {
                subject: ground(1, 0),
                tile_type: TileType::Outpost,
            }],
        );
        let space = automaton.board().at(Position::new(1, 0));
        assert!(space.ground.is_none());
        assert_eq!(space.tile.tile_type, TileType::Outpost);
        assert_eq!(space.tile.owner, Player::Red);
        assert_eq!(
            automaton.players().get(Player::Red).unwrap().morale,
            automaton.bible().morale_build
        );
    }

    #[test]
    fn test_capture_takes_enemy_building() {
        let mut board = duel_board();
        with_unit(&mut board, 2, 2, UnitType::Rifleman, Player::Red, 1);
        board.at_mut(Position::new(1, 1)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 1, 1);
        let mut automaton = duel(board);
        play(&mut automaton, vec![Order::Capture { subject: ground(2, 2) }]);
        assert_eq!(automaton.board().at(Position::new(2, 2)).tile.owner, Player::Red);
        assert!(automaton.players().get(Player::Blue).unwrap().defeated);
    }

    #[test]
    fn test_lockdown_blocks_and_fires() {
        let mut board = duel_board();
        with_unit(&mut board, 0, 1, UnitType::Rifleman, Player::Red, 3);
        with_unit(&mut board, 2, 0, UnitType::Militia, Player::Red, 1);
        with_unit(&mut board, 1, 2, UnitType::Gunner, Player::Blue, 3);
        let mut automaton = duel(board);
        automaton.hibernate();
        // Red acts first, so its move goes second to let the lockdown land.
        automaton.receive(
            Player::Red,
            vec![
                Order::Halt { subject: ground(2, 0) },
                Order::Move {
                    subject: ground(0, 1),
                    target: ground(1, 1),
                    moves: vec![Move::South],
                },
            ],
        );
        automaton.receive(
            Player::Blue,
            vec![Order::Lockdown {
                subject: ground(1, 2),
                target: Descriptor::cell(Position::new(1, 1)),
            }],
        );
        automaton.awake();
        automaton.prepare();
        automaton.act();
        let second = automaton.act();
        assert!(second.iter().any(|(c, _)| matches!(
            c,
            Change::Attack {
                kind: AttackKind::Lockdown,
                ..
            }
        )));
        assert!(automaton.board().at(Position::new(1, 1)).ground.is_none());
        assert!(!second.iter().any(|(c, _)| matches!(c, Change::Move { .. })));
    }

    #[test]
    fn test_focus_needs_enemy() {
        let mut board = duel_board();
        with_unit(&mut board, 1, 1, UnitType::Rifleman, Player::Red, 3);
        with_unit(&mut board, 1, 2, UnitType::Rifleman, Player::Red, 3);
        let mut automaton = duel(board);
        let sets = play(
            &mut automaton,
            vec![Order::Focus {
                subject: ground(1, 1),
                target: ground(1, 2),
            }],
        );
        assert_eq!(notices(&sets), vec![Notice::NoTarget]);
    }
}
