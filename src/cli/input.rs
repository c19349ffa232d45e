//! Loading rulesets, boards, order scripts and recordings from disk.

use super::CliError;
use frontier::{Bible, Board, Order, Player, Recording};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One order in a script: a JSON object or the one-line text form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptOrder {
    Text(String),
    Order(Order),
}

/// One line of an order script.
#[derive(Debug, Deserialize)]
struct ScriptLine {
    round: u32,
    player: Player,
    orders: Vec<ScriptOrder>,
}

/// Orders to hand to the automaton, grouped by the round they are due in.
#[derive(Debug, Default)]
pub(super) struct OrderScript {
    rounds: BTreeMap<u32, Vec<(Player, Vec<Order>)>>,
}

impl OrderScript {
    /// Remove and return the orders due in `round`, in file order.
    pub(super) fn take(&mut self, round: u32) -> Vec<(Player, Vec<Order>)> {
        self.rounds.remove(&round).unwrap_or_default()
    }

    /// Number of script lines.
    pub(super) fn len(&self) -> usize {
        self.rounds.values().map(Vec::len).sum()
    }

    /// Players the script gives orders to.
    pub(super) fn players(&self) -> impl Iterator<Item = Player> + '_ {
        self.rounds.values().flatten().map(|(player, _)| *player)
    }
}

/// The ruleset at `path`, or the built-in one.
pub(super) fn load_bible(path: Option<&Path>) -> Result<Bible, CliError> {
    match path {
        Some(path) => Bible::load(path)
            .map_err(|e| CliError::new(format!("Failed to load {}: {e}", path.display()))),
        None => Ok(Bible::default()),
    }
}

pub(super) fn load_board(path: &Path) -> Result<Board, CliError> {
    let text = read(path)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::new(format!("Failed to load board {}: {e}", path.display())))
}

/// Parse an order script: one JSON object per line, blank lines and lines
/// starting with `#` ignored.
pub(super) fn load_script(path: &Path) -> Result<OrderScript, CliError> {
    let text = read(path)?;
    parse_script(&text).map_err(|e| CliError::new(format!("{}: {e}", path.display())))
}

fn parse_script(text: &str) -> Result<OrderScript, CliError> {
    let mut script = OrderScript::default();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let parsed: ScriptLine = serde_json::from_str(line)
            .map_err(|e| CliError::new(format!("line {number}: {e}")))?;
        let mut orders = Vec::with_capacity(parsed.orders.len());
        for order in parsed.orders {
            orders.push(match order {
                ScriptOrder::Order(order) => order,
                ScriptOrder::Text(text) => text
                    .parse()
                    .map_err(|e| CliError::new(format!("line {number}: {e}")))?,
            });
        }
        script
            .rounds
            .entry(parsed.round)
            .or_default()
            .push((parsed.player, orders));
    }
    Ok(script)
}

pub(super) fn load_recording(path: &Path) -> Result<Recording, CliError> {
    Recording::load(path).map_err(|e| {
        CliError::new(format!("Failed to load recording {}: {e}", path.display()))
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_mixes_json_and_text_orders() {
        let text = r#"
# opening
{"round": 0, "player": "red", "orders": ["halt ground@1,1"]}
{"round": 0, "player": "blue", "orders": [{"type": "halt", "subject": "ground@2,2"}]}

{"round": 3, "player": "red", "orders": []}
"#;
        let mut script = parse_script(text).unwrap();
        assert_eq!(script.len(), 3);
        let opening = script.take(0);
        assert_eq!(opening.len(), 2);
        assert_eq!(opening[0].0, Player::Red);
        assert_eq!(opening[0].1, opening[1].1);
        assert!(script.take(0).is_empty());
        assert_eq!(script.take(3).len(), 1);
    }

    #[test]
    fn test_script_reports_line_numbers() {
        let text = "{\"round\": 0, \"player\": \"red\", \"orders\": []}\nnot json\n";
        let err = parse_script(text).unwrap_err();
        assert!(err.to_string().starts_with("line 2"), "{err}");

        let text = "{\"round\": 0, \"player\": \"red\", \"orders\": [\"teleport ground@0,0\"]}";
        let err = parse_script(text).unwrap_err();
        assert!(err.to_string().contains("teleport"), "{err}");
    }
}
