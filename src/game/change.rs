//! State changes and the vision-tagged sets they travel in.
//!
//! Changes are the only way observers learn about the match. Every entry of a
//! [`ChangeSet`] carries the players that receive it; entries that alter state
//! are kept even when nobody sees them, so replaying a set rebuilds the board.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{
    Daytime, Descriptor, Environment, Hazard, Phase, Player, Season, TileToken, UnitToken, Vision,
};

/// Why a unit appeared to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnterCause {
    /// The observer started seeing its cell.
    Vision,
    /// It moved in from a cell the observer does not see.
    Moved,
    /// It was just produced.
    Produced,
}

/// Why a unit disappeared for an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCause {
    /// The observer stopped seeing its cell.
    Vision,
    /// It moved to a cell the observer does not see.
    Moved,
    /// Its last figure died.
    Died,
    /// It founded a building.
    Settled,
}

impl ExitCause {
    /// Whether the unit is really gone, not just out of sight.
    #[must_use]
    pub const fn removes(self) -> bool {
        matches!(self, ExitCause::Died | ExitCause::Settled)
    }
}

/// What kind of attack an [`Change::Attack`] announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    /// Moving into an enemy.
    Active,
    /// Striking back.
    Retaliation,
    /// Ordered attack on a neighbour.
    Focus,
    /// Reaction to an enemy moving past.
    Opportunity,
    /// Standing guard firing.
    Guard,
    /// Lockdown firing.
    Lockdown,
    /// Shelling volley.
    Shell,
    /// Bombardment volley.
    Bombard,
    /// Bombing run.
    Bomb,
    /// Hazards and contamination.
    Environment,
}

/// Player-facing explanation for a discarded or postponed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// Nothing to report.
    #[default]
    None,
    /// The subject no longer exists.
    SubjectLost,
    /// The subject belongs to someone else.
    NotOwner,
    /// The subject descriptor does not fit the order.
    InvalidSubject,
    /// The subject's type cannot carry out this order.
    Incapable,
    /// The target is too close or too far.
    OutOfRange,
    /// The target cannot be used for this order.
    IllegalTarget,
    /// The path does not lead to the target.
    InvalidMoves,
    /// Not enough money.
    Unaffordable,
    /// Not enough powered stacks.
    InsufficientPower,
    /// An enemy lockdown or impassable terrain is in the way.
    Blocked,
    /// The destination slot is taken.
    Occupied,
    /// Nothing to attack or work on.
    NoTarget,
    /// Postponed too many times.
    RetryLimit,
    /// The issuing player is out of the match.
    Defeated,
    /// The player resigned.
    Resigned,
    /// The player lost all their units.
    Eliminated,
    /// The challenge ran out of rounds.
    ChallengeEnded,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::None => "none",
            Notice::SubjectLost => "subject lost",
            Notice::NotOwner => "not owner",
            Notice::InvalidSubject => "invalid subject",
            Notice::Incapable => "incapable",
            Notice::OutOfRange => "out of range",
            Notice::IllegalTarget => "illegal target",
            Notice::InvalidMoves => "invalid moves",
            Notice::Unaffordable => "unaffordable",
            Notice::InsufficientPower => "insufficient power",
            Notice::Blocked => "blocked",
            Notice::Occupied => "occupied",
            Notice::NoTarget => "no target",
            Notice::RetryLimit => "retry limit",
            Notice::Defeated => "defeated",
            Notice::Resigned => "resigned",
            Notice::Eliminated => "eliminated",
            Notice::ChallengeEnded => "challenge ended",
        };
        f.write_str(text)
    }
}

/// One observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Change {
    /// A cell comes into view with its tile and environment.
    Reveal {
        /// The cell.
        subject: Descriptor,
        /// Tile on it.
        tile: TileToken,
        /// Its counters and hazards.
        environment: Environment,
    },
    /// A cell leaves view.
    Obscure {
        /// The cell.
        subject: Descriptor,
    },
    /// A unit becomes visible or is created.
    Enter {
        /// Unit slot.
        subject: Descriptor,
        /// The unit.
        unit: UnitToken,
        /// Why.
        cause: EnterCause,
    },
    /// A unit stops being visible or ceases to exist.
    Exit {
        /// Unit slot.
        subject: Descriptor,
        /// Why.
        cause: ExitCause,
    },
    /// A unit steps to a neighbouring cell.
    Move {
        /// Where it was.
        subject: Descriptor,
        /// Where it is now.
        target: Descriptor,
    },
    /// Something attacks something.
    Attack {
        /// Attacker.
        subject: Descriptor,
        /// Attacked slot or cell.
        target: Descriptor,
        /// Kind of attack.
        kind: AttackKind,
    },
    /// Losses from an attack.
    Casualties {
        /// Hurt token.
        subject: Descriptor,
        /// Stacks or figures killed.
        killed: i8,
        /// Stacks depowered.
        depowered: i8,
    },
    /// A tile is replaced or changes stacks, power or owner.
    Tile {
        /// The tile.
        subject: Descriptor,
        /// New token.
        tile: TileToken,
    },
    /// New gas level.
    Gas {
        /// The cell.
        subject: Descriptor,
        /// New value.
        value: i8,
    },
    /// New radiation level.
    Radiation {
        /// The cell.
        subject: Descriptor,
        /// New value.
        value: i8,
    },
    /// New temperature.
    Temperature {
        /// The cell.
        subject: Descriptor,
        /// New value.
        value: i8,
    },
    /// New humidity.
    Humidity {
        /// The cell.
        subject: Descriptor,
        /// New value.
        value: i8,
    },
    /// New chaos level.
    Chaos {
        /// The cell.
        subject: Descriptor,
        /// New value.
        value: i8,
    },
    /// A hazard starts or stops.
    Hazard {
        /// The cell.
        subject: Descriptor,
        /// Which hazard.
        hazard: Hazard,
        /// Whether it is now active.
        active: bool,
    },
    /// A player's money.
    Funds {
        /// Whose.
        player: Player,
        /// New balance.
        money: i32,
    },
    /// A player's morale.
    Morale {
        /// Whose.
        player: Player,
        /// New value.
        morale: i32,
    },
    /// A player's turn position; lower acts first.
    Initiative {
        /// Whose.
        player: Player,
        /// New position.
        initiative: u8,
    },
    /// The phase changes.
    Phase {
        /// New phase.
        phase: Phase,
    },
    /// Round counters.
    Round {
        /// Round number.
        round: u32,
        /// Season.
        season: Season,
        /// Half of the season.
        daytime: Daytime,
        /// Year.
        year: u32,
    },
    /// Why an order was discarded or postponed.
    Notice {
        /// Who issued it.
        player: Player,
        /// Its subject.
        subject: Descriptor,
        /// The reason.
        notice: Notice,
    },
    /// A player is out.
    Defeat {
        /// Who.
        player: Player,
    },
    /// Final score.
    Score {
        /// Whose.
        player: Player,
        /// Points.
        score: i32,
    },
    /// Star rating, 0 to 3.
    Award {
        /// Whose.
        player: Player,
        /// Stars.
        stars: u8,
    },
    /// The match is over.
    GameOver,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Reveal { subject, tile, .. } => write!(f, "reveal {subject} {tile}"),
            Change::Obscure { subject } => write!(f, "obscure {subject}"),
            Change::Enter {
                subject,
                unit,
                cause,
            } => write!(f, "enter {subject} {unit} ({cause:?})"),
            Change::Exit { subject, cause } => write!(f, "exit {subject} ({cause:?})"),
            Change::Move { subject, target } => write!(f, "move {subject} -> {target}"),
            Change::Attack {
                subject,
                target,
                kind,
            } => write!(f, "attack {subject} -> {target} ({kind:?})"),
            Change::Casualties {
                subject,
                killed,
                depowered,
            } => write!(f, "casualties {subject} killed={killed} depowered={depowered}"),
            Change::Tile { subject, tile } => write!(f, "tile {subject} {tile}"),
            Change::Gas { subject, value } => write!(f, "gas {subject} {value}"),
            Change::Radiation { subject, value } => write!(f, "radiation {subject} {value}"),
            Change::Temperature { subject, value } => write!(f, "temperature {subject} {value}"),
            Change::Humidity { subject, value } => write!(f, "humidity {subject} {value}"),
            Change::Chaos { subject, value } => write!(f, "chaos {subject} {value}"),
            Change::Hazard {
                subject,
                hazard,
                active,
            } => write!(f, "{hazard} {subject} {}", if *active { "on" } else { "off" }),
            Change::Funds { player, money } => write!(f, "funds {player} {money}"),
            Change::Morale { player, morale } => write!(f, "morale {player} {morale}"),
            Change::Initiative { player, initiative } => {
                write!(f, "initiative {player} {initiative}")
            }
            Change::Phase { phase } => write!(f, "phase {phase}"),
            Change::Round {
                round,
                season,
                daytime,
                year,
            } => write!(f, "round {round} ({daytime} {season}, year {year})"),
            Change::Notice {
                player,
                subject,
                notice,
            } => write!(f, "notice {player} {subject}: {notice}"),
            Change::Defeat { player } => write!(f, "defeat {player}"),
            Change::Score { player, score } => write!(f, "score {player} {score}"),
            Change::Award { player, stars } => write!(f, "award {player} {stars}"),
            Change::GameOver => write!(f, "game over"),
        }
    }
}

/// Ordered changes, each tagged with its recipients.
///
/// Order matters: applying the entries in sequence is how replays rebuild
/// state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    entries: Vec<(Change, Vision)>,
}

impl ChangeSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a change for `vision`.
    pub fn push(&mut self, change: Change, vision: Vision) {
        self.entries.push((change, vision));
    }

    /// Append every entry of `other`.
    pub fn append(&mut self, other: ChangeSet) {
        self.entries.extend(other.entries);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &(Change, Vision)> {
        self.entries.iter()
    }

    /// The changes `player` receives, in order.
    pub fn for_player(&self, player: Player) -> impl Iterator<Item = &Change> {
        self.entries
            .iter()
            .filter(move |(_, vision)| vision.contains(player))
            .map(|(change, _)| change)
    }

    /// Index of the first entry that differs from `other`, if any.
    #[must_use]
    pub fn first_difference(&self, other: &ChangeSet) -> Option<usize> {
        let common = self.entries.len().min(other.entries.len());
        (0..common)
            .find(|&i| self.entries[i] != other.entries[i])
            .or_else(|| (self.entries.len() != other.entries.len()).then_some(common))
    }
}

impl IntoIterator for ChangeSet {
    type Item = (Change, Vision);
    type IntoIter = std::vec::IntoIter<(Change, Vision)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;

    #[test]
    fn test_for_player_filters_by_vision() {
        let mut set = ChangeSet::new();
        set.push(Change::GameOver, Vision::only(Player::Red));
        set.push(
            Change::Funds {
                player: Player::Blue,
                money: 3,
            },
            Vision::only(Player::Blue),
        );
        assert_eq!(set.for_player(Player::Red).count(), 1);
        assert_eq!(set.for_player(Player::Teal).count(), 0);
    }

    #[test]
    fn test_first_difference() {
        let mut a = ChangeSet::new();
        a.push(Change::GameOver, Vision::EMPTY);
        let mut b = a.clone();
        assert_eq!(a.first_difference(&b), None);
        b.push(Change::GameOver, Vision::EMPTY);
        assert_eq!(a.first_difference(&b), Some(1));
        let mut c = ChangeSet::new();
        c.push(
            Change::Obscure {
                subject: Descriptor::cell(Position::new(0, 0)),
            },
            Vision::EMPTY,
        );
        assert_eq!(a.first_difference(&c), Some(0));
    }

    #[test]
    fn test_json_tagged_by_type() {
        let change = Change::Defeat {
            player: Player::Pink,
        };
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"type":"defeat","player":"pink"}"#);
    }
}
