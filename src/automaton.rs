//! The turn and phase engine.
//!
//! An [`Automaton`] owns one match. Callers feed it orders during planning
//! and then drive one round at a time:
//!
//! ```text
//! hibernate()                      once, before the first round
//! loop {
//!     receive(..) / resign(..)     planning
//!     awake()                      -> ACTION
//!     prepare()
//!     while active() { act() }     ACTION ticks, then DECAY, then GROWTH
//!     hibernate()                  vision, defeat, round counters -> PLANNING
//! }
//! ```
//!
//! Every state mutation is a [`Change`] passed through [`Automaton::enact`],
//! which is also what replays use, so a recorded change stream rebuilds the
//! exact same state.

mod combat;
mod environment;
mod ids;
mod info;
mod orders;
mod replay;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::mem;

use tracing::{debug, trace, warn};

pub use ids::{SubjectId, SubjectIds};
pub use info::{PlayerData, PlayerInfo, RoundInfo, Tally};
pub use orders::Outcome;

use crate::challenge::Challenge;
use crate::error::{RecordingError, SetupError};
use crate::game::{
    Bible, Board, Change, ChangeSet, Descriptor, DescriptorType, EnterCause, Environment, Notice,
    Order, Phase, Player, Position, Space, UnitToken, Vision,
};
use crate::recording::{Entry, RECORDING_VERSION, Recording, RecordingMetadata, Stage};
use crate::rng::GameRng;
use crate::vision::{self, VisionPropagator};

/// Match settings besides ruleset, board and roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchConfig {
    /// Seed of the match RNG.
    pub seed: u64,
    /// Win condition.
    pub challenge: Challenge,
    /// Players who see the whole board.
    pub visionaries: Vision,
}

/// An order waiting in a player's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedOrder {
    serial: u64,
    subject_id: SubjectId,
    order: Order,
    retries: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandingKind {
    Guard,
    Lockdown,
}

/// A guard or lockdown in force until the end of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Standing {
    kind: StandingKind,
    player: Player,
    subject: Descriptor,
    subject_id: SubjectId,
    target: Position,
}

/// Deterministic simulation of one match.
#[derive(Debug, Clone)]
pub struct Automaton {
    bible: Bible,
    board: Board,
    players: PlayerInfo,
    round: RoundInfo,
    challenge: Challenge,
    rng: GameRng,
    seed: u64,
    visionaries: Vision,
    ids: SubjectIds,
    received: BTreeMap<Player, Vec<Order>>,
    carried: BTreeMap<Player, Vec<QueuedOrder>>,
    active: BTreeMap<Player, VecDeque<QueuedOrder>>,
    rotation: Vec<Player>,
    standing: Vec<Standing>,
    discarded: BTreeSet<u64>,
    next_serial: u64,
    resignations: BTreeSet<Player>,
    aggressor: Player,
    initialized: bool,
    changes: ChangeSet,
    recording: Option<Recording>,
}

impl Automaton {
    /// Set up a match.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset is inconsistent, the roster is empty,
    /// too large, repeats a colour or seats `none`/`observer`, or the board
    /// holds tokens of players outside the roster.
    pub fn new(
        bible: Bible,
        board: Board,
        roster: &[Player],
        config: MatchConfig,
    ) -> Result<Self, SetupError> {
        bible.validate()?;
        if roster.is_empty() {
            return Err(SetupError::EmptyRoster);
        }
        if roster.len() > Player::PLAYABLE.len() {
            return Err(SetupError::TooManyPlayers(roster.len()));
        }
        let mut seated = BTreeSet::new();
        for &player in roster {
            if !player.is_playable() {
                return Err(SetupError::UnplayablePlayer(player));
            }
            if !seated.insert(player) {
                return Err(SetupError::DuplicatePlayer(player));
            }
        }
        for (position, space) in board.iter() {
            let owners = std::iter::once(space.tile.owner).chain(space.units().map(|(_, u)| u.owner));
            for owner in owners {
                if owner != Player::None && !seated.contains(&owner) {
                    return Err(SetupError::UnknownOwner { position, owner });
                }
            }
            if !tokens_valid(&bible, space) {
                return Err(SetupError::InvalidToken(position));
            }
        }

        let players = PlayerInfo::new(roster, bible.money_start);
        Ok(Self {
            bible,
            board,
            players,
            round: RoundInfo::default(),
            challenge: config.challenge,
            rng: GameRng::seeded(config.seed),
            seed: config.seed,
            visionaries: config.visionaries,
            ids: SubjectIds::default(),
            received: BTreeMap::new(),
            carried: BTreeMap::new(),
            active: BTreeMap::new(),
            rotation: Vec::new(),
            standing: Vec::new(),
            discarded: BTreeSet::new(),
            next_serial: 0,
            resignations: BTreeSet::new(),
            aggressor: Player::None,
            initialized: false,
            changes: ChangeSet::new(),
            recording: None,
        })
    }

    /// The ruleset.
    #[must_use]
    pub fn bible(&self) -> &Bible {
        &self.bible
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Per-player state.
    #[must_use]
    pub fn players(&self) -> &PlayerInfo {
        &self.players
    }

    /// Round counters and phase.
    #[must_use]
    pub fn round(&self) -> &RoundInfo {
        &self.round
    }

    /// Win condition.
    #[must_use]
    pub const fn challenge(&self) -> Challenge {
        self.challenge
    }

    /// RNG seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Players with global vision.
    #[must_use]
    pub const fn visionaries(&self) -> Vision {
        self.visionaries
    }

    /// Current subject ids.
    #[must_use]
    pub fn subject_ids(&self) -> &SubjectIds {
        &self.ids
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.round.game_over
    }

    /// Orders of `player` queued for this action phase or carried to the next.
    #[must_use]
    pub fn pending_orders(&self, player: Player) -> usize {
        let active = self.active.get(&player).map_or(0, VecDeque::len);
        let carried = self.carried.get(&player).map_or(0, Vec::len);
        active + carried
    }

    /// Whether more [`Self::act`] calls are needed this round.
    #[must_use]
    pub fn active(&self) -> bool {
        !self.round.game_over && matches!(self.round.phase, Phase::Action | Phase::Decay)
    }

    /// Start logging inputs and outputs.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::LateStart`] once the first hibernation has
    /// run, because the log could no longer be replayed from the start.
    pub fn start_recording(&mut self, name: Option<&str>) -> Result<(), RecordingError> {
        if self.initialized {
            return Err(RecordingError::LateStart);
        }
        self.recording = Some(Recording::new(RecordingMetadata {
            version: RECORDING_VERSION,
            name: name.unwrap_or_default().to_string(),
            seed: self.seed,
            bible: self.bible.clone(),
            board: self.board.clone(),
            players: self.players.roster(),
            visionaries: self.visionaries,
            challenge: self.challenge,
        }));
        Ok(())
    }

    /// The log so far, if recording.
    #[must_use]
    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    /// Stop recording and hand over the log.
    pub fn take_recording(&mut self) -> Option<Recording> {
        self.recording.take()
    }

    /// Accept orders from `player` for the coming action phase.
    ///
    /// Only honoured during planning and for players still in the match.
    /// Orders accumulate; when two orders name the same subject the later
    /// one wins.
    pub fn receive(&mut self, player: Player, orders: Vec<Order>) {
        if self.round.game_over || self.round.phase != Phase::Planning {
            warn!(%player, phase = %self.round.phase, "orders received outside planning");
            return;
        }
        if !self.players.is_alive(player) {
            warn!(%player, "orders from a player not in the match");
            return;
        }
        let round = self.round.round;
        self.record(|| Entry::Orders {
            round,
            player,
            orders: orders.clone(),
        });
        self.received.entry(player).or_default().extend(orders);
    }

    /// Register a resignation, honoured at the next [`Self::awake`].
    pub fn resign(&mut self, player: Player) {
        if !self.players.is_alive(player) {
            warn!(%player, "resignation from a player not in the match");
            return;
        }
        let round = self.round.round;
        self.record(|| Entry::Resign { round, player });
        self.resignations.insert(player);
    }

    /// Close the round: recompute vision, settle defeats, advance the round
    /// counters and return to planning.
    ///
    /// The first call sets the match up instead: it sends the initial vision
    /// and everyone's starting counters.
    pub fn hibernate(&mut self) -> ChangeSet {
        if !self.initialized {
            self.initialize();
            return self.finish(Stage::Hibernate);
        }
        if self.round.game_over || !matches!(self.round.phase, Phase::Growth | Phase::Planning) {
            warn!(phase = %self.round.phase, "hibernate called out of turn");
            return self.finish(Stage::Hibernate);
        }

        let vision = self.propagator().execute(&self.board);
        self.emit_all(vision);
        self.update_tallies();

        self.check_regular_defeat();
        let upcoming = self.round.advanced();
        self.check_challenge_defeat(&upcoming);
        let limit_reached = self
            .challenge
            .round_limit()
            .is_some_and(|limit| upcoming.round >= limit);
        if limit_reached {
            self.end_game();
        }

        let everyone = self.everyone();
        self.emit(
            Change::Round {
                round: upcoming.round,
                season: upcoming.season,
                daytime: upcoming.daytime,
                year: upcoming.year,
            },
            everyone,
        );
        self.set_phase(Phase::Planning);
        debug!(
            round = self.round.round,
            season = %self.round.season,
            alive = self.players.alive().count(),
            game_over = self.round.game_over,
            "round closed"
        );
        self.finish(Stage::Hibernate)
    }

    fn initialize(&mut self) {
        self.initialized = true;
        let initial = self.propagator().execute_initial(&self.board);
        self.emit_all(initial);

        let everyone = self.everyone();
        let round = self.round;
        self.emit(
            Change::Round {
                round: round.round,
                season: round.season,
                daytime: round.daytime,
                year: round.year,
            },
            everyone,
        );
        let starting: Vec<(Player, i32, u8)> = self
            .players
            .iter()
            .map(|data| (data.player, data.money, data.initiative))
            .collect();
        for (player, money, initiative) in starting {
            self.emit(Change::Funds { player, money }, self.private(player));
            self.emit(Change::Initiative { player, initiative }, everyone);
        }
        self.update_tallies();
        debug!(players = self.players.len(), "match initialized");
    }

    /// Open the round: honour resignations, rotate initiative, clear
    /// standing orders and enter the action phase.
    pub fn awake(&mut self) -> ChangeSet {
        if !self.initialized || self.round.game_over || self.round.phase != Phase::Planning {
            warn!(phase = %self.round.phase, "awake called out of turn");
            return self.finish(Stage::Awake);
        }

        let resigning: Vec<Player> = mem::take(&mut self.resignations).into_iter().collect();
        self.do_defeat(&resigning, Notice::Resigned);
        if self.round.game_over {
            return self.finish(Stage::Awake);
        }

        if self.round.round > 0 {
            self.rotate_initiative();
        }
        self.standing.clear();
        self.discarded.clear();
        self.set_phase(Phase::Action);
        debug!(round = self.round.round, "action phase");
        self.finish(Stage::Awake)
    }

    /// The player who acted first moves to the back.
    fn rotate_initiative(&mut self) {
        let order = self.players.turn_order();
        let count = order.len();
        let everyone = self.everyone();
        for (index, player) in order.into_iter().enumerate() {
            let initiative = u8::try_from((index + count - 1) % count).unwrap_or(u8::MAX);
            self.emit(Change::Initiative { player, initiative }, everyone);
        }
    }

    /// Queue the received and carried orders for the action phase.
    ///
    /// Subjects get fresh ids. Per player, carried orders come first; a later
    /// order for the same subject replaces the earlier one and `none` orders
    /// are dropped.
    pub fn prepare(&mut self) {
        if self.round.game_over || self.round.phase != Phase::Action {
            warn!(phase = %self.round.phase, "prepare called outside the action phase");
            return;
        }
        let round = self.round.round;
        self.record(|| Entry::Prepare { round });

        // Carried orders keep their subject only if it is still the same token.
        for queued in self.carried.values_mut().flatten() {
            let current = queued.order.subject().map(|s| self.ids.resolve(s));
            if current != Some(queued.subject_id) {
                queued.subject_id = SubjectId::STALE;
            }
        }
        self.ids.assign(&self.board);
        for queued in self.carried.values_mut().flatten() {
            if queued.subject_id != SubjectId::STALE {
                queued.subject_id = queued
                    .order
                    .subject()
                    .map_or(SubjectId::STALE, |s| self.ids.resolve(s));
            }
        }

        self.rotation = self.players.turn_order();
        self.active.clear();
        let mut total = 0;
        for player in self.rotation.clone() {
            let carried = self.carried.remove(&player).unwrap_or_default();
            let received = self.received.remove(&player).unwrap_or_default();
            let fresh: Vec<QueuedOrder> = received
                .into_iter()
                .map(|order| self.enqueue(order))
                .collect();

            let mut queue: VecDeque<QueuedOrder> = VecDeque::new();
            for queued in carried.into_iter().chain(fresh) {
                if matches!(queued.order, Order::None) {
                    continue;
                }
                let subject = queued.order.subject();
                queue.retain(|earlier| earlier.order.subject() != subject);
                queue.push_back(queued);
            }
            total += queue.len();
            if !queue.is_empty() {
                self.active.insert(player, queue);
            }
        }
        self.carried.clear();
        self.received.clear();
        debug!(orders = total, "orders prepared");
    }

    fn enqueue(&mut self, order: Order) -> QueuedOrder {
        let serial = self.next_serial;
        self.next_serial += 1;
        let subject_id = order
            .subject()
            .map_or(SubjectId::STALE, |s| self.ids.resolve(s));
        QueuedOrder {
            serial,
            subject_id,
            order,
            retries: 0,
        }
    }

    /// Advance the round by one step.
    ///
    /// During ACTION each call is one tick in which every player processes
    /// at most one order. The call after the last order runs DECAY, the one
    /// after that GROWTH.
    pub fn act(&mut self) -> ChangeSet {
        match self.round.phase {
            Phase::Action if !self.round.game_over => {
                if self.active.values().all(VecDeque::is_empty) {
                    self.set_phase(Phase::Decay);
                    self.decay();
                    debug!(round = self.round.round, "decay phase");
                } else {
                    self.tick();
                }
            }
            Phase::Decay if !self.round.game_over => {
                self.set_phase(Phase::Growth);
                self.growth();
                debug!(round = self.round.round, "growth phase");
            }
            phase => warn!(%phase, "act called outside the action phase"),
        }
        self.finish(Stage::Act)
    }

    fn tick(&mut self) {
        for player in self.rotation.clone() {
            let Some(mut queued) = self.active.get_mut(&player).and_then(VecDeque::pop_front)
            else {
                continue;
            };
            let outcome = self.execute(player, &mut queued);
            trace!(
                %player,
                order = %queued.order.order_type(),
                ?outcome,
                "order processed"
            );
            match outcome {
                Outcome::Finished => {}
                Outcome::InProgress => {
                    if let Some(queue) = self.active.get_mut(&player) {
                        queue.push_front(queued);
                    }
                }
                Outcome::Discarded(notice) => self.discard(player, &queued, notice),
                Outcome::Postponed(notice) => self.postpone(player, queued, notice),
            }
        }
    }

    /// Drop an order with a notice. A discarded order is reported once.
    fn discard(&mut self, player: Player, queued: &QueuedOrder, notice: Notice) {
        if self.discarded.insert(queued.serial) {
            let subject = queued.order.subject().unwrap_or(Descriptor::NONE);
            self.notify(player, subject, notice);
        }
    }

    /// Carry an order over to the next action phase, or discard it once it
    /// has been postponed more often than the ruleset allows.
    fn postpone(&mut self, player: Player, mut queued: QueuedOrder, notice: Notice) {
        queued.retries = queued.retries.saturating_add(1);
        if queued.retries > self.bible.order_retry_limit {
            self.discard(player, &queued, Notice::RetryLimit);
            return;
        }
        let subject = queued.order.subject().unwrap_or(Descriptor::NONE);
        self.notify(player, subject, notice);
        self.carried.entry(player).or_default().push(queued);
    }

    /// One full round: awake, prepare, act until done, hibernate.
    ///
    /// Runs the initial hibernation first if it has not happened yet.
    pub fn run_round(&mut self) -> Vec<ChangeSet> {
        let mut sets = Vec::new();
        if !self.initialized {
            sets.push(self.hibernate());
        }
        if self.round.game_over {
            return sets;
        }
        sets.push(self.awake());
        self.prepare();
        while self.active() {
            sets.push(self.act());
        }
        sets.push(self.hibernate());
        sets
    }

    /// Everything `player` needs to pick the match up again.
    #[must_use]
    pub fn rejoin(&self, player: Player) -> ChangeSet {
        let only = Vision::only(player);
        let mut set = self.propagator().snapshot(&self.board, player);
        set.push(
            Change::Round {
                round: self.round.round,
                season: self.round.season,
                daytime: self.round.daytime,
                year: self.round.year,
            },
            only,
        );
        set.push(
            Change::Phase {
                phase: self.round.phase,
            },
            only,
        );
        for data in self.players.iter() {
            set.push(
                Change::Initiative {
                    player: data.player,
                    initiative: data.initiative,
                },
                only,
            );
            if data.defeated {
                set.push(Change::Defeat { player: data.player }, only);
            }
        }
        if let Some(data) = self.players.get(player) {
            set.push(
                Change::Funds {
                    player,
                    money: data.money,
                },
                only,
            );
            set.push(
                Change::Morale {
                    player,
                    morale: data.morale,
                },
                only,
            );
        }
        if self.round.game_over {
            set.push(Change::GameOver, only);
        }
        set
    }

    fn update_tallies(&mut self) {
        let mut tallies: BTreeMap<Player, Tally> = BTreeMap::new();
        for (_, space) in self.board.iter() {
            if space.tile.is_owned() {
                let tally = tallies.entry(space.tile.owner).or_default();
                tally.tiles += 1;
                if self.bible.tile(space.tile.tile_type).city {
                    tally.cities += 1;
                }
            }
            for (_, unit) in space.units() {
                let tally = tallies.entry(unit.owner).or_default();
                tally.units += 1;
                tally.figures += u32::try_from(unit.stacks.max(0)).unwrap_or(0);
            }
        }
        for data in self.players.iter_mut() {
            data.tally = tallies.get(&data.player).copied().unwrap_or_default();
        }
    }

    /// Players without a city-capable tile are out.
    fn check_regular_defeat(&mut self) {
        let defeated: Vec<Player> = self
            .players
            .alive()
            .filter(|data| data.tally.cities == 0)
            .map(|data| data.player)
            .collect();
        self.do_defeat(&defeated, Notice::Defeated);
    }

    fn check_challenge_defeat(&mut self, upcoming: &RoundInfo) {
        if self.round.game_over {
            return;
        }
        let mut defeated = Vec::new();
        let notice = self.challenge.check(&self.players, upcoming, &mut defeated);
        self.do_defeat(&defeated, notice);
    }

    /// Take `defeated` out of the match and end it once too few remain.
    fn do_defeat(&mut self, defeated: &[Player], notice: Notice) {
        let mut any = false;
        for &player in defeated {
            if !self.players.is_alive(player) {
                continue;
            }
            any = true;
            let everyone = self.everyone();
            self.emit(Change::Defeat { player }, everyone);
            if notice != Notice::None {
                self.notify(player, Descriptor::NONE, notice);
            }
            self.active.remove(&player);
            self.carried.remove(&player);
            self.received.remove(&player);
            debug!(%player, %notice, "player defeated");
        }
        if !any {
            return;
        }
        let threshold = usize::from(self.bible.victory_threshold).min(self.players.len());
        if self.players.alive().count() < threshold {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        if self.round.game_over {
            return;
        }
        let everyone = self.everyone();
        let results: Vec<(Player, i32, u8)> = self
            .players
            .iter()
            .map(|data| {
                let score = self.challenge.score(data);
                (data.player, score, self.challenge.award(score, data.defeated))
            })
            .collect();
        for (player, score, stars) in results {
            self.emit(Change::Score { player, score }, everyone);
            self.emit(Change::Award { player, stars }, everyone);
        }
        self.emit(Change::GameOver, everyone);
        debug!(round = self.round.round, "game over");
    }

    fn propagator(&self) -> VisionPropagator<'_> {
        VisionPropagator::new(&self.bible, self.visionaries, self.players.vision())
    }

    /// Re-run vision near `center` after a change within squared distance
    /// `range` of it.
    fn refresh_vision(&mut self, center: Position, range: i32) {
        let changes = self.propagator().execute_around(&self.board, center, range);
        self.emit_all(changes);
    }

    /// Everyone taking part or watching.
    fn everyone(&self) -> Vision {
        self.players.vision().union(self.visionaries)
    }

    /// A player and the visionaries.
    fn private(&self, player: Player) -> Vision {
        Vision::only(player).union(self.visionaries)
    }

    /// Who sees the cell at `position`.
    fn seen(&self, position: Position) -> Vision {
        self.board.at(position).vision()
    }

    fn notify(&mut self, player: Player, subject: Descriptor, notice: Notice) {
        let recipients = self.private(player);
        self.emit(
            Change::Notice {
                player,
                subject,
                notice,
            },
            recipients,
        );
    }

    fn set_phase(&mut self, phase: Phase) {
        let everyone = self.everyone();
        self.emit(Change::Phase { phase }, everyone);
    }

    fn set_money(&mut self, player: Player, money: i32) {
        let recipients = self.private(player);
        self.emit(Change::Funds { player, money }, recipients);
    }

    fn add_morale(&mut self, player: Player, gain: i32) {
        let Some(morale) = self.players.get(player).map(|data| data.morale) else {
            return;
        };
        if gain == 0 {
            return;
        }
        let recipients = self.private(player);
        self.emit(
            Change::Morale {
                player,
                morale: morale.saturating_add(gain),
            },
            recipients,
        );
    }

    fn emit_all(&mut self, changes: ChangeSet) {
        for (change, recipients) in changes {
            self.emit(change, recipients);
        }
    }

    /// Apply a change and append it to the current set.
    fn emit(&mut self, change: Change, recipients: Vision) {
        self.enact(&change, recipients);
        self.changes.push(change, recipients);
    }

    fn record(&mut self, entry: impl FnOnce() -> Entry) {
        if let Some(recording) = &mut self.recording {
            recording.push(entry());
        }
    }

    fn finish(&mut self, stage: Stage) -> ChangeSet {
        let changes = mem::take(&mut self.changes);
        let round = self.round.round;
        self.record(|| Entry::Changes {
            round,
            stage,
            changes: changes.clone(),
        });
        crate::invariants::assert_invariants(self);
        changes
    }

    fn environment_mut(&mut self, subject: Descriptor) -> Option<&mut Environment> {
        self.board
            .at_mut(subject.position)
            .map(|space| &mut space.environment)
    }

    /// Owner of the token at `subject`, or `none` for cells and empty slots.
    fn owner_of(&self, subject: Descriptor) -> Player {
        let space = self.board.at(subject.position);
        match subject.layer() {
            Some(layer) => space.unit(layer).owner,
            None if subject.kind == DescriptorType::Tile => space.tile.owner,
            None => Player::None,
        }
    }

    /// Apply one change to the state. The only place state is written.
    pub(crate) fn enact(&mut self, change: &Change, recipients: Vision) {
        match *change {
            Change::Reveal { subject, .. } | Change::Obscure { subject } => {
                if let Some(space) = self.board.at_mut(subject.position) {
                    vision::apply(space, change, recipients);
                }
            }
            Change::Enter {
                subject,
                unit,
                cause: EnterCause::Produced,
            } => {
                if let (Some(layer), Some(space)) =
                    (subject.layer(), self.board.at_mut(subject.position))
                {
                    *space.unit_mut(layer) = unit;
                    self.ids.insert(subject);
                }
            }
            Change::Exit { subject, cause } if cause.removes() => {
                if let (Some(layer), Some(space)) =
                    (subject.layer(), self.board.at_mut(subject.position))
                {
                    *space.unit_mut(layer) = UnitToken::default();
                    self.ids.remove(subject);
                }
            }
            Change::Move { subject, target } => {
                let (Some(from), Some(to)) = (subject.layer(), target.layer()) else {
                    return;
                };
                let Some(unit) = self
                    .board
                    .at_mut(subject.position)
                    .map(|space| mem::take(space.unit_mut(from)))
                else {
                    return;
                };
                if let Some(space) = self.board.at_mut(target.position) {
                    *space.unit_mut(to) = unit;
                }
                self.ids.relocate(subject, target);
            }
            Change::Attack { subject, .. } => {
                self.aggressor = self.owner_of(subject);
            }
            Change::Casualties {
                subject,
                killed,
                depowered,
            } => self.enact_casualties(subject, killed, depowered),
            Change::Tile { subject, tile } => {
                let Some(space) = self.board.at_mut(subject.position) else {
                    return;
                };
                let old = mem::replace(&mut space.tile, tile);
                if old.tile_type != tile.tile_type || old.owner != tile.owner {
                    self.ids.remove(subject);
                    if tile.is_owned() {
                        self.ids.insert(subject);
                    }
                }
            }
            Change::Gas { subject, value } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.gas = value;
                }
            }
            Change::Radiation { subject, value } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.radiation = value;
                }
            }
            Change::Temperature { subject, value } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.temperature = value;
                }
            }
            Change::Humidity { subject, value } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.humidity = value;
                }
            }
            Change::Chaos { subject, value } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.chaos = value;
                }
            }
            Change::Hazard {
                subject,
                hazard,
                active,
            } => {
                if let Some(env) = self.environment_mut(subject) {
                    env.set_hazard(hazard, active);
                }
            }
            Change::Funds { player, money } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.money = money;
                }
            }
            Change::Morale { player, morale } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.morale = morale;
                }
            }
            Change::Initiative { player, initiative } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.initiative = initiative;
                }
            }
            Change::Phase { phase } => self.round.phase = phase,
            Change::Round {
                round,
                season,
                daytime,
                year,
            } => {
                self.round.round = round;
                self.round.season = season;
                self.round.daytime = daytime;
                self.round.year = year;
            }
            Change::Defeat { player } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.defeated = true;
                }
            }
            Change::Score { player, score } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.score = score;
                }
            }
            Change::Award { player, stars } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.award = stars;
                }
            }
            Change::GameOver => self.round.game_over = true,
            Change::Notice {
                player,
                notice: Notice::Resigned,
                ..
            } => {
                if let Some(data) = self.players.get_mut(player) {
                    data.resigned = true;
                }
            }
            Change::Enter { .. } | Change::Exit { .. } | Change::Notice { .. } => {}
        }
    }

    fn enact_casualties(&mut self, subject: Descriptor, killed: i8, depowered: i8) {
        let aggressor = self.aggressor;
        let Some(space) = self.board.at_mut(subject.position) else {
            return;
        };
        match subject.layer() {
            Some(layer) => {
                let unit = space.unit_mut(layer);
                unit.stacks = unit.stacks.saturating_sub(killed).max(0);
                let victim = unit.owner;
                if aggressor.is_playable() && aggressor != victim {
                    if let Some(data) = self.players.get_mut(aggressor) {
                        data.kills = data
                            .kills
                            .saturating_add(u32::try_from(killed.max(0)).unwrap_or(0));
                    }
                }
            }
            None => {
                let tile = &mut space.tile;
                tile.stacks = tile.stacks.saturating_sub(killed).max(0);
                tile.power = tile.power.saturating_sub(depowered).clamp(0, tile.stacks);
            }
        }
    }
}

/// Owned tiles need `1..=stacks_max` stacks and no more power than stacks;
/// units need an owner and `1..=stacks_max` figures.
fn tokens_valid(bible: &Bible, space: &Space) -> bool {
    let tile = space.tile;
    let tile_ok = !tile.is_owned()
        || ((1..=bible.tile(tile.tile_type).stacks_max).contains(&tile.stacks)
            && (0..=tile.stacks).contains(&tile.power));
    let units_ok = space.units().all(|(_, unit)| {
        unit.owner.is_playable() && (1..=bible.unit(unit.unit_type).stacks_max).contains(&unit.stacks)
    });
    tile_ok && units_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Layer, TileToken, TileType, UnitType};

    /// 3x3 grass with a red town top-left and a blue town bottom-right.
    pub(crate) fn duel_board() -> Board {
        let mut board = Board::new(3, 3).unwrap();
        for cell in board.cells().collect::<Vec<_>>() {
            board.get_mut(cell).unwrap().tile = TileToken::natural(TileType::Grass);
        }
        board.at_mut(Position::new(0, 0)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 1, 1);
        board.at_mut(Position::new(2, 2)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Blue, 1, 1);
        board
    }

    pub(crate) fn duel(board: Board) -> Automaton {
        Automaton::new(
            Bible::default(),
            board,
            &[Player::Red, Player::Blue],
            MatchConfig {
                seed: 11,
                challenge: Challenge::Standard,
                visionaries: Vision::only(Player::Observer),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_setup_rejects_bad_rosters() {
        let board = duel_board;
        let config = MatchConfig::default();
        assert!(matches!(
            Automaton::new(Bible::default(), board(), &[], config),
            Err(SetupError::EmptyRoster)
        ));
        assert!(matches!(
            Automaton::new(Bible::default(), board(), &[Player::Red, Player::Red], config),
            Err(SetupError::DuplicatePlayer(Player::Red))
        ));
        assert!(matches!(
            Automaton::new(Bible::default(), board(), &[Player::Observer], config),
            Err(SetupError::UnplayablePlayer(Player::Observer))
        ));
        assert!(matches!(
            Automaton::new(Bible::default(), board(), &[Player::Red], config),
            Err(SetupError::UnknownOwner {
                owner: Player::Blue,
                ..
            })
        ));
        let mut overpowered = board();
        overpowered.at_mut(Position::new(0, 0)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 1, 2);
        assert!(matches!(
            Automaton::new(Bible::default(), overpowered, &[Player::Red, Player::Blue], config),
            Err(SetupError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_first_hibernate_initializes() {
        let mut automaton = duel(duel_board());
        let changes = automaton.hibernate();
        let observer_reveals = changes
            .for_player(Player::Observer)
            .filter(|c| matches!(c, Change::Reveal { .. }))
            .count();
        assert_eq!(observer_reveals, 9);
        assert!(changes.for_player(Player::Red).any(|c| matches!(
            c,
            Change::Funds {
                player: Player::Red,
                ..
            }
        )));
        assert!(
            !changes
                .for_player(Player::Blue)
                .any(|c| matches!(c, Change::Funds { player: Player::Red, .. }))
        );
        assert_eq!(automaton.round().phase, Phase::Planning);
        assert_eq!(automaton.round().round, 0);
    }

    #[test]
    fn test_round_cycles_phases() {
        let mut automaton = duel(duel_board());
        let sets = automaton.run_round();
        // initial hibernate, awake, decay, growth, hibernate
        assert_eq!(sets.len(), 5);
        assert_eq!(automaton.round().round, 1);
        assert_eq!(automaton.round().phase, Phase::Planning);
        assert!(!automaton.active());
    }

    #[test]
    fn test_orders_outside_planning_are_ignored() {
        let mut automaton = duel(duel_board());
        automaton.hibernate();
        automaton.awake();
        automaton.receive(
            Player::Red,
            vec![Order::Halt {
                subject: Descriptor::unit(Layer::Ground, Position::new(0, 0)),
            }],
        );
        automaton.prepare();
        assert_eq!(automaton.pending_orders(Player::Red), 0);
    }

    #[test]
    fn test_later_order_replaces_earlier() {
        let mut board = duel_board();
        board.at_mut(Position::new(0, 0)).unwrap().ground =
            UnitToken::new(UnitType::Rifleman, Player::Red, 1);
        let mut automaton = duel(board);
        automaton.hibernate();
        let subject = Descriptor::unit(Layer::Ground, Position::new(0, 0));
        automaton.receive(Player::Red, vec![Order::Halt { subject }, Order::None]);
        automaton.receive(
            Player::Red,
            vec![Order::Guard {
                subject,
                target: Descriptor::cell(Position::new(0, 1)),
            }],
        );
        automaton.awake();
        automaton.prepare();
        assert_eq!(automaton.pending_orders(Player::Red), 1);
        let queued = &automaton.active[&Player::Red][0];
        assert!(matches!(queued.order, Order::Guard { .. }));
    }

    #[test]
    fn test_discard_reports_once() {
        let mut automaton = duel(duel_board());
        automaton.hibernate();
        let queued = QueuedOrder {
            serial: 3,
            subject_id: SubjectId::STALE,
            order: Order::Halt {
                subject: Descriptor::unit(Layer::Ground, Position::new(1, 1)),
            },
            retries: 0,
        };
        automaton.discard(Player::Red, &queued, Notice::SubjectLost);
        automaton.discard(Player::Red, &queued, Notice::SubjectLost);
        let notices = automaton
            .changes
            .iter()
            .filter(|(c, _)| matches!(c, Change::Notice { .. }))
            .count();
        assert_eq!(notices, 1);
    }

    #[test]
    fn test_initiative_rotates_after_first_round() {
        let mut automaton = duel(duel_board());
        automaton.run_round();
        assert_eq!(automaton.players().turn_order(), vec![Player::Red, Player::Blue]);
        automaton.run_round();
        assert_eq!(automaton.players().turn_order(), vec![Player::Blue, Player::Red]);
    }

    #[test]
    fn test_losing_last_city_ends_match() {
        let mut automaton = duel(duel_board());
        automaton.hibernate();
        let blue_town = Descriptor::tile(Position::new(2, 2));
        automaton.enact(
            &Change::Tile {
                subject: blue_town,
                tile: TileToken::natural(TileType::Rubble),
            },
            Vision::EMPTY,
        );
        let sets = automaton.run_round();
        let last = sets.last().unwrap();
        assert!(last.iter().any(|(c, _)| *c == Change::Defeat { player: Player::Blue }));
        assert!(last.iter().any(|(c, _)| *c == Change::GameOver));
        assert!(automaton.is_game_over());
        assert_eq!(automaton.players().get(Player::Blue).unwrap().award, 0);
        assert!(automaton.run_round().is_empty());
    }

    #[test]
    fn test_resignation_honoured_at_awake() {
        let mut automaton = duel(duel_board());
        automaton.hibernate();
        automaton.resign(Player::Blue);
        let changes = automaton.awake();
        assert!(changes.iter().any(|(c, _)| *c == Change::Defeat { player: Player::Blue }));
        assert!(automaton.players().get(Player::Blue).unwrap().resigned);
        assert!(automaton.is_game_over());
    }

    #[test]
    fn test_recording_must_start_early() {
        let mut automaton = duel(duel_board());
        automaton.start_recording(Some("early")).unwrap();
        automaton.hibernate();
        assert!(matches!(
            automaton.start_recording(None),
            Err(RecordingError::LateStart)
        ));
        assert_eq!(automaton.recording().unwrap().metadata.name, "early");
    }

    #[test]
    fn test_rejoin_is_private() {
        let mut automaton = duel(duel_board());
        automaton.run_round();
        let snapshot = automaton.rejoin(Player::Blue);
        assert!(snapshot.iter().all(|(_, v)| *v == Vision::only(Player::Blue)));
        assert!(snapshot.iter().any(|(c, _)| matches!(c, Change::Funds { player: Player::Blue, .. })));
    }
}
