//! Phases, seasons and time of day.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Players submit orders.
    #[default]
    Planning,
    /// Orders are carried out.
    Action,
    /// Hazards hurt and contamination fades.
    Decay,
    /// Income, regrowth and weather.
    Growth,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Action => "action",
            Phase::Decay => "decay",
            Phase::Growth => "growth",
        };
        f.write_str(name)
    }
}

/// Season of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// First season.
    #[default]
    Spring,
    /// Second season.
    Summer,
    /// Third season.
    Autumn,
    /// Fourth season.
    Winter,
}

impl Season {
    /// The following season.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    /// Zero-based index, spring first.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        };
        f.write_str(name)
    }
}

/// Half of a season. Every two rounds make one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Daytime {
    /// First round of a season.
    #[default]
    Early,
    /// Second round of a season.
    Late,
}

impl Daytime {
    /// The following daytime.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Daytime::Early => Daytime::Late,
            Daytime::Late => Daytime::Early,
        }
    }
}

impl fmt::Display for Daytime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Daytime::Early => f.write_str("early"),
            Daytime::Late => f.write_str("late"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_cycle() {
        let mut season = Season::Spring;
        for _ in 0..4 {
            season = season.next();
        }
        assert_eq!(season, Season::Spring);
        assert_eq!(Season::Winter.index(), 3);
    }
}
