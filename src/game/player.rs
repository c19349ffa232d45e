//! Player colours and per-player visibility sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A participant slot.
///
/// Eight playable colours plus an observer seat. `None` marks unowned tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// No player.
    #[default]
    None,
    /// First colour.
    Red,
    /// Second colour.
    Blue,
    /// Third colour.
    Teal,
    /// Fourth colour.
    Yellow,
    /// Fifth colour.
    Pink,
    /// Sixth colour.
    Black,
    /// Seventh colour.
    Indigo,
    /// Eighth colour.
    Purple,
    /// Spectator seat.
    Observer,
}

impl Player {
    /// Colours that may take part in a match, in seat order.
    pub const PLAYABLE: [Player; 8] = [
        Player::Red,
        Player::Blue,
        Player::Teal,
        Player::Yellow,
        Player::Pink,
        Player::Black,
        Player::Indigo,
        Player::Purple,
    ];

    /// Whether this colour may take part in a match.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        !matches!(self, Player::None | Player::Observer)
    }

    /// Bit of this player in a [`Vision`]; zero for `None`.
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            Player::None => 0,
            Player::Red => 1 << 0,
            Player::Blue => 1 << 1,
            Player::Teal => 1 << 2,
            Player::Yellow => 1 << 3,
            Player::Pink => 1 << 4,
            Player::Black => 1 << 5,
            Player::Indigo => 1 << 6,
            Player::Purple => 1 << 7,
            Player::Observer => 1 << 8,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Player::None => "none",
            Player::Red => "red",
            Player::Blue => "blue",
            Player::Teal => "teal",
            Player::Yellow => "yellow",
            Player::Pink => "pink",
            Player::Black => "black",
            Player::Indigo => "indigo",
            Player::Purple => "purple",
            Player::Observer => "observer",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Player {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = Player::PLAYABLE
            .iter()
            .chain(&[Player::None, Player::Observer]);
        for &player in all {
            if player.as_str().eq_ignore_ascii_case(s) {
                return Ok(player);
            }
        }
        Err(ParseError::UnknownPlayer(s.to_string()))
    }
}

/// The set of players that see something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vision(u16);

const ALL_SEATS: [Player; 9] = [
    Player::Red,
    Player::Blue,
    Player::Teal,
    Player::Yellow,
    Player::Pink,
    Player::Black,
    Player::Indigo,
    Player::Purple,
    Player::Observer,
];

impl Vision {
    /// Nobody.
    pub const EMPTY: Vision = Vision(0);

    /// Just one player.
    #[must_use]
    pub const fn only(player: Player) -> Self {
        Vision(player.bit())
    }

    /// Build from a list of players.
    #[must_use]
    pub fn from_players(players: &[Player]) -> Self {
        players.iter().fold(Self::EMPTY, |v, &p| v.with(p))
    }

    /// Whether `player` is in the set.
    #[must_use]
    pub const fn contains(self, player: Player) -> bool {
        let bit = player.bit();
        bit != 0 && self.0 & bit != 0
    }

    /// A copy with `player` added.
    #[must_use]
    pub const fn with(self, player: Player) -> Self {
        Vision(self.0 | player.bit())
    }

    /// A copy with `player` removed.
    #[must_use]
    pub const fn without(self, player: Player) -> Self {
        Vision(self.0 & !player.bit())
    }

    /// Players in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Vision(self.0 | other.0)
    }

    /// Players in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Vision(self.0 & other.0)
    }

    /// Players in this set but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Vision(self.0 & !other.0)
    }

    /// Whether nobody is in the set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in seat order.
    pub fn players(self) -> impl Iterator<Item = Player> {
        ALL_SEATS.into_iter().filter(move |&p| self.contains(p))
    }
}

impl fmt::Display for Vision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        f.write_str("[")?;
        for player in self.players() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(player.as_str())?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_parse_roundtrip() {
        for player in Player::PLAYABLE {
            assert_eq!(player.to_string().parse::<Player>().unwrap(), player);
        }
        assert!("green".parse::<Player>().is_err());
    }

    #[test]
    fn test_vision_set_operations() {
        let a = Vision::from_players(&[Player::Red, Player::Blue]);
        let b = Vision::from_players(&[Player::Blue, Player::Observer]);
        assert_eq!(a.difference(b), Vision::only(Player::Red));
        assert_eq!(a.intersection(b), Vision::only(Player::Blue));
        assert_eq!(a.union(b).players().count(), 3);
        assert!(!Vision::only(Player::None).contains(Player::None));
        assert!(Vision::EMPTY.is_empty());
    }

    #[test]
    fn test_vision_display() {
        let v = Vision::from_players(&[Player::Teal, Player::Red]);
        assert_eq!(v.to_string(), "[red teal]");
    }
}
