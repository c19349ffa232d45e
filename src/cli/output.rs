//! Output formatting utilities for CLI.

use frontier::automaton::PlayerData;
use frontier::recording::Stage;
use frontier::{Automaton, Change, ChangeSet, Player};
use serde::Serialize;
use std::fmt::Write;

/// JSON-serializable match result.
#[derive(Debug, Serialize)]
pub(super) struct JsonMatchResult<'a> {
    /// Random seed used.
    pub(super) seed: u64,
    /// Rounds completed.
    pub(super) rounds: u32,
    /// Whether the match ended.
    pub(super) game_over: bool,
    /// Players still in the match.
    pub(super) winners: Vec<Player>,
    /// Per-player state.
    pub(super) players: Vec<&'a PlayerData>,
}

impl<'a> JsonMatchResult<'a> {
    /// Create from the automaton's final state.
    pub(super) fn from_automaton(automaton: &'a Automaton) -> Self {
        Self {
            seed: automaton.seed(),
            rounds: automaton.round().round,
            game_over: automaton.is_game_over(),
            winners: automaton.players().alive().map(|data| data.player).collect(),
            players: automaton.players().iter().collect(),
        }
    }
}

/// One change set as printed by `replay` and `rejoin`.
#[derive(Debug, Serialize)]
pub(super) struct JsonChangeSet<'a> {
    pub(super) round: u32,
    pub(super) stage: Option<Stage>,
    pub(super) changes: Vec<&'a Change>,
}

/// Format the final state of a match as human-readable text.
pub(super) fn format_text(automaton: &Automaton) -> String {
    let mut output = String::new();
    let round = automaton.round();

    let _ = writeln!(output, "Match Result (seed: {})", automaton.seed());
    let _ = writeln!(
        output,
        "  Rounds: {} (year {}, {} {})",
        round.round, round.year, round.daytime, round.season
    );
    let status = if automaton.is_game_over() {
        "over"
    } else {
        "in progress"
    };
    let _ = writeln!(output, "  Status: {status}");
    let _ = writeln!(output);

    for data in automaton.players().iter() {
        let _ = write!(
            output,
            "  {:<8} money {:>4}  morale {:>5}  kills {:>4}  tiles {:>3}  units {:>3}",
            data.player.to_string(),
            data.money,
            data.morale,
            data.kills,
            data.tally.tiles,
            data.tally.units,
        );
        if automaton.is_game_over() {
            let _ = write!(output, "  score {} ({} stars)", data.score, data.award);
        }
        if data.resigned {
            output.push_str(" [resigned]");
        } else if data.defeated {
            output.push_str(" [defeated]");
        }
        output.push('\n');
    }

    output
}

/// Format one change set, optionally as seen by a single player.
pub(super) fn format_change_set(
    round: u32,
    stage: Option<Stage>,
    set: &ChangeSet,
    player: Option<Player>,
) -> String {
    let mut output = String::new();
    let label = stage.map_or_else(|| "snapshot".to_string(), |stage| stage.to_string());
    let changes = visible(set, player);
    let _ = writeln!(output, "[round {round} {label}] {} changes", changes.len());
    for change in changes {
        let _ = writeln!(output, "  {change}");
    }
    output
}

/// The changes of `set` that `player` receives, or all of them.
pub(super) fn visible(set: &ChangeSet, player: Option<Player>) -> Vec<&Change> {
    match player {
        Some(player) => set.for_player(player).collect(),
        None => set.iter().map(|(change, _)| change).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier::Vision;

    #[test]
    fn test_change_set_filtered_by_player() {
        let mut set = ChangeSet::new();
        set.push(Change::GameOver, Vision::only(Player::Red));
        set.push(
            Change::Funds {
                player: Player::Blue,
                money: 3,
            },
            Vision::only(Player::Blue),
        );
        assert_eq!(visible(&set, None).len(), 2);
        assert_eq!(visible(&set, Some(Player::Red)), vec![&Change::GameOver]);

        let text = format_change_set(4, Some(Stage::Act), &set, Some(Player::Blue));
        assert!(text.starts_with("[round 4 act] 1 changes"), "{text}");
    }
}
