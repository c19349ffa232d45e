//! Input validation command implementation.

use super::CliError;
use super::input::{load_bible, load_board, load_script};
use frontier::{Automaton, Board, MatchConfig, Player};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Execute the validate command.
///
/// When a board is given it is also set up as a match between the players
/// who own tokens on it, under the given or built-in ruleset.
///
/// # Errors
///
/// Returns an error if nothing was given or any file is invalid.
pub(crate) fn execute(
    bible: Option<PathBuf>,
    board: Option<PathBuf>,
    orders: Option<PathBuf>,
) -> Result<(), CliError> {
    if bible.is_none() && board.is_none() && orders.is_none() {
        return Err(CliError::new("Nothing to validate (use --bible, --board or --orders)"));
    }

    if let Some(path) = &bible {
        println!("Validating ruleset: {}", path.display());
    }
    let loaded = load_bible(bible.as_deref());
    print_check("ruleset", loaded.is_ok());
    let bible = loaded?;
    println!(
        "    {} tile types, {} unit types, vision up to {}",
        bible.tiles.len(),
        bible.units.len(),
        bible.vision_max()
    );

    if let Some(path) = &board {
        println!();
        println!("Validating board: {}", path.display());
        let loaded = load_board(path);
        print_check("board file", loaded.is_ok());
        let board = loaded?;
        let roster = owners(&board);
        let names: Vec<String> = roster.iter().map(ToString::to_string).collect();
        println!(
            "    {}x{}, owners: {}",
            board.rows(),
            board.cols(),
            if names.is_empty() { "none".to_string() } else { names.join(", ") }
        );
        let setup = Automaton::new(bible.clone(), board, &roster, MatchConfig::default());
        print_check("match setup", setup.is_ok());
        setup?;
    }

    if let Some(path) = &orders {
        println!();
        println!("Validating order script: {}", path.display());
        let loaded = load_script(path);
        print_check("order script", loaded.is_ok());
        let script = loaded?;
        println!("    {} order lines", script.len());
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

/// Players owning any token on `board`, in colour order.
fn owners(board: &Board) -> Vec<Player> {
    let mut owners = BTreeSet::new();
    for (_, space) in board.iter() {
        if space.tile.is_owned() {
            owners.insert(space.tile.owner);
        }
        for (_, unit) in space.units() {
            owners.insert(unit.owner);
        }
    }
    owners.into_iter().collect()
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
