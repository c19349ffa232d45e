//! Per-player and per-round bookkeeping of one match.

use serde::Serialize;

use crate::game::{Daytime, Phase, Player, Season, Vision};

/// What a player has on the board, counted at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    /// Owned tiles.
    pub tiles: u32,
    /// Owned city-capable tiles.
    pub cities: u32,
    /// Units.
    pub units: u32,
    /// Unit figures.
    pub figures: u32,
}

/// State of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerData {
    /// Colour.
    pub player: Player,
    /// Money.
    pub money: i32,
    /// Morale.
    pub morale: i32,
    /// Turn position; lower acts first.
    pub initiative: u8,
    /// Enemy figures and stacks killed.
    pub kills: u32,
    /// Out of the match.
    pub defeated: bool,
    /// Left voluntarily.
    pub resigned: bool,
    /// Final score.
    pub score: i32,
    /// Star rating.
    pub award: u8,
    /// Board holdings at the last count.
    pub tally: Tally,
}

/// All participants, in seat order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlayerInfo {
    players: Vec<PlayerData>,
}

impl PlayerInfo {
    /// Seat `roster` with `money` each. Initiative follows seat order.
    #[must_use]
    pub fn new(roster: &[Player], money: i32) -> Self {
        let players = roster
            .iter()
            .enumerate()
            .map(|(seat, &player)| PlayerData {
                player,
                money,
                morale: 0,
                initiative: u8::try_from(seat).unwrap_or(u8::MAX),
                kills: 0,
                defeated: false,
                resigned: false,
                score: 0,
                award: 0,
                tally: Tally::default(),
            })
            .collect();
        Self { players }
    }

    /// Data of one player.
    #[must_use]
    pub fn get(&self, player: Player) -> Option<&PlayerData> {
        self.players.iter().find(|data| data.player == player)
    }

    /// Mutable data of one player.
    pub fn get_mut(&mut self, player: Player) -> Option<&mut PlayerData> {
        self.players.iter_mut().find(|data| data.player == player)
    }

    /// Whether `player` takes part.
    #[must_use]
    pub fn contains(&self, player: Player) -> bool {
        self.get(player).is_some()
    }

    /// Whether `player` takes part and is still in.
    #[must_use]
    pub fn is_alive(&self, player: Player) -> bool {
        self.get(player).is_some_and(|data| !data.defeated)
    }

    /// Everyone, in seat order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerData> {
        self.players.iter()
    }

    /// Everyone, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerData> {
        self.players.iter_mut()
    }

    /// Players still in the match.
    pub fn alive(&self) -> impl Iterator<Item = &PlayerData> {
        self.players.iter().filter(|data| !data.defeated)
    }

    /// Seat order.
    #[must_use]
    pub fn roster(&self) -> Vec<Player> {
        self.players.iter().map(|data| data.player).collect()
    }

    /// Players still in, lowest initiative first.
    #[must_use]
    pub fn turn_order(&self) -> Vec<Player> {
        let mut alive: Vec<&PlayerData> = self.alive().collect();
        alive.sort_by_key(|data| (data.initiative, data.player));
        alive.into_iter().map(|data| data.player).collect()
    }

    /// Vision set of the whole roster.
    #[must_use]
    pub fn vision(&self) -> Vision {
        self.players
            .iter()
            .fold(Vision::EMPTY, |v, data| v.with(data.player))
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody takes part.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Global round counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundInfo {
    /// Rounds completed.
    pub round: u32,
    /// Year, starting at 1.
    pub year: u32,
    /// Current season.
    pub season: Season,
    /// Half of the season.
    pub daytime: Daytime,
    /// Current phase.
    pub phase: Phase,
    /// The match has ended.
    pub game_over: bool,
}

impl Default for RoundInfo {
    fn default() -> Self {
        Self {
            round: 0,
            year: 1,
            season: Season::Spring,
            daytime: Daytime::Early,
            phase: Phase::Planning,
            game_over: false,
        }
    }
}

impl RoundInfo {
    /// Counters after one more round.
    ///
    /// Two rounds make a season; a year ends after winter.
    #[must_use]
    pub fn advanced(&self) -> Self {
        let daytime = self.daytime.next();
        let mut season = self.season;
        let mut year = self.year;
        if daytime == Daytime::Early {
            season = season.next();
            if season == Season::Spring {
                year += 1;
            }
        }
        Self {
            round: self.round + 1,
            year,
            season,
            daytime,
            ..*self
        }
    }

    /// Whether the next advance starts a new season.
    #[must_use]
    pub fn season_ends(&self) -> bool {
        self.daytime == Daytime::Late
    }
}
