//! Rejoin command implementation.

use super::input::load_recording;
use super::output::{JsonChangeSet, format_change_set, visible};
use super::{CliError, OutputFormat};
use frontier::{Automaton, Player};
use std::path::PathBuf;

/// Execute the rejoin command.
///
/// The recording's changes are enacted to rebuild the final state, then the
/// rejoin snapshot for `player` is printed.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or `player` did not
/// take part.
pub(crate) fn execute(
    recording_path: PathBuf,
    player: Player,
    format: OutputFormat,
) -> Result<(), CliError> {
    let recording = load_recording(&recording_path)?;
    let mut automaton = Automaton::from_recording(&recording)?;
    if !automaton.players().contains(player) && !automaton.visionaries().contains(player) {
        return Err(CliError::new(format!("{player} did not take part in this match")));
    }
    automaton.replay(&recording, false)?;

    let set = automaton.rejoin(player);
    let round = automaton.round().round;
    match format {
        OutputFormat::Text => print!("{}", format_change_set(round, None, &set, Some(player))),
        OutputFormat::Json => {
            let json = JsonChangeSet {
                round,
                stage: None,
                changes: visible(&set, Some(player)),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
