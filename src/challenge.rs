//! Win conditions and scoring variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::automaton::{PlayerData, PlayerInfo, RoundInfo};
use crate::error::ParseError;
use crate::game::{Notice, Player};

/// Rounds played before a timed challenge ends.
pub const TIMED_ROUNDS: u32 = 20;

/// The scenario a match is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Challenge {
    /// Last player with a city standing wins.
    #[default]
    Standard,
    /// Players without units are out.
    Elimination,
    /// Richest player after a fixed number of rounds wins.
    Investment,
    /// Player with the highest morale after a fixed number of rounds wins.
    Morale,
}

impl Challenge {
    /// Round at which the challenge ends the match, if it is timed.
    #[must_use]
    pub const fn round_limit(self) -> Option<u32> {
        match self {
            Challenge::Standard | Challenge::Elimination => None,
            Challenge::Investment | Challenge::Morale => Some(TIMED_ROUNDS),
        }
    }

    /// Apply challenge-specific defeat rules.
    ///
    /// Appends newly defeated players to `defeated` and returns the notice
    /// they receive, or [`Notice::None`] when nobody is out.
    pub fn check(self, players: &PlayerInfo, round: &RoundInfo, defeated: &mut Vec<Player>) -> Notice {
        let before = defeated.len();
        let notice = match self {
            Challenge::Standard => Notice::None,
            Challenge::Elimination => {
                defeated.extend(
                    players
                        .alive()
                        .filter(|data| data.tally.units == 0)
                        .map(|data| data.player),
                );
                Notice::Eliminated
            }
            Challenge::Investment | Challenge::Morale => {
                let limit_reached = self.round_limit().is_some_and(|limit| round.round >= limit);
                if limit_reached {
                    let best = players.alive().map(|data| self.metric(data)).max();
                    defeated.extend(
                        players
                            .alive()
                            .filter(|data| Some(self.metric(data)) < best)
                            .map(|data| data.player),
                    );
                }
                Notice::ChallengeEnded
            }
        };
        if defeated.len() == before {
            Notice::None
        } else {
            notice
        }
    }

    fn metric(self, data: &PlayerData) -> i32 {
        match self {
            Challenge::Investment => data.money,
            Challenge::Morale => data.morale,
            Challenge::Standard | Challenge::Elimination => self.score(data),
        }
    }

    /// Final score of one player.
    #[must_use]
    pub fn score(self, data: &PlayerData) -> i32 {
        let tiles = i32::try_from(data.tally.tiles).unwrap_or(i32::MAX);
        let cities = i32::try_from(data.tally.cities).unwrap_or(i32::MAX);
        let kills = i32::try_from(data.kills).unwrap_or(i32::MAX);
        let units = i32::try_from(data.tally.units).unwrap_or(i32::MAX);
        match self {
            Challenge::Standard => data
                .money
                .saturating_add(tiles.saturating_mul(5))
                .saturating_add(cities.saturating_mul(20)),
            Challenge::Elimination => kills.saturating_mul(10).saturating_add(units),
            Challenge::Investment => data.money,
            Challenge::Morale => data.morale,
        }
    }

    /// Star rating from 0 to 3. Defeated players get none.
    #[must_use]
    pub fn award(self, score: i32, defeated: bool) -> u8 {
        if defeated {
            return 0;
        }
        let thresholds: [i32; 3] = match self {
            Challenge::Standard => [50, 150, 300],
            Challenge::Elimination => [10, 30, 60],
            Challenge::Investment => [100, 250, 450],
            Challenge::Morale => [10, 25, 50],
        };
        let stars = thresholds.iter().filter(|&&t| score >= t).count();
        u8::try_from(stars).unwrap_or(3)
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Challenge::Standard => "standard",
            Challenge::Elimination => "elimination",
            Challenge::Investment => "investment",
            Challenge::Morale => "morale",
        };
        f.write_str(name)
    }
}

impl FromStr for Challenge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Challenge::Standard),
            "elimination" => Ok(Challenge::Elimination),
            "investment" => Ok(Challenge::Investment),
            "morale" => Ok(Challenge::Morale),
            other => Err(ParseError::UnknownChallenge(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Tally;

    fn info() -> PlayerInfo {
        PlayerInfo::new(&[Player::Red, Player::Blue], 10)
    }

    #[test]
    fn test_standard_defeats_nobody() {
        let players = info();
        let mut defeated = Vec::new();
        let notice = Challenge::Standard.check(&players, &RoundInfo::default(), &mut defeated);
        assert_eq!(notice, Notice::None);
        assert!(defeated.is_empty());
    }

    #[test]
    fn test_elimination_defeats_players_without_units() {
        let mut players = info();
        if let Some(red) = players.get_mut(Player::Red) {
            red.tally = Tally {
                units: 2,
                ..Tally::default()
            };
        }
        let mut defeated = Vec::new();
        let notice = Challenge::Elimination.check(&players, &RoundInfo::default(), &mut defeated);
        assert_eq!(notice, Notice::Eliminated);
        assert_eq!(defeated, vec![Player::Blue]);
    }

    #[test]
    fn test_investment_waits_for_round_limit() {
        let mut players = info();
        if let Some(blue) = players.get_mut(Player::Blue) {
            blue.money = 99;
        }
        let mut round = RoundInfo::default();
        let mut defeated = Vec::new();
        assert_eq!(
            Challenge::Investment.check(&players, &round, &mut defeated),
            Notice::None
        );
        round.round = TIMED_ROUNDS;
        assert_eq!(
            Challenge::Investment.check(&players, &round, &mut defeated),
            Notice::ChallengeEnded
        );
        assert_eq!(defeated, vec![Player::Red]);
    }

    #[test]
    fn test_award_thresholds() {
        assert_eq!(Challenge::Standard.award(0, false), 0);
        assert_eq!(Challenge::Standard.award(150, false), 2);
        assert_eq!(Challenge::Standard.award(10_000, false), 3);
        assert_eq!(Challenge::Standard.award(10_000, true), 0);
    }

    #[test]
    fn test_score_formulas() {
        let mut players = info();
        let red = players.get_mut(Player::Red).unwrap();
        red.money = 7;
        red.morale = 4;
        red.kills = 2;
        red.tally = Tally {
            tiles: 3,
            cities: 1,
            units: 5,
            figures: 9,
        };
        let red = players.get(Player::Red).unwrap();
        assert_eq!(Challenge::Standard.score(red), 7 + 15 + 20);
        assert_eq!(Challenge::Elimination.score(red), 25);
        assert_eq!(Challenge::Investment.score(red), 7);
        assert_eq!(Challenge::Morale.score(red), 4);
    }
}
