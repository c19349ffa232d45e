//! Replay command implementation.

use super::input::load_recording;
use super::output::{JsonChangeSet, JsonMatchResult, format_change_set, format_text, visible};
use super::{CliError, OutputFormat};
use frontier::Automaton;
use frontier::Player;
use frontier::recording::{Entry, Stage};
use std::path::PathBuf;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or, when re-running
/// orders, diverges from what was recorded.
pub(crate) fn execute(
    recording_path: PathBuf,
    from_changes: bool,
    player: Option<Player>,
    last_round: Option<u32>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut recording = load_recording(&recording_path)?;
    if let Some(last_round) = last_round {
        // The hibernation closing a round is stamped with the next round.
        let limit = last_round.saturating_add(1);
        recording.entries.retain(|entry| match entry {
            Entry::Changes {
                round,
                stage: Stage::Hibernate,
                ..
            } => *round <= limit,
            other => entry_round(other) < limit,
        });
    }

    let mut automaton = Automaton::from_recording(&recording)?;
    let sets = automaton.replay(&recording, !from_changes)?;

    // Sets come back in the order of the recording's change entries.
    let labels = recording.entries.iter().filter_map(|entry| match entry {
        Entry::Changes { round, stage, .. } => Some((*round, *stage)),
        _ => None,
    });

    match format {
        OutputFormat::Text => {
            for ((round, stage), set) in labels.zip(&sets) {
                print!("{}", format_change_set(round, Some(stage), set, player));
            }
            println!();
            print!("{}", format_text(&automaton));
        }
        OutputFormat::Json => {
            let sets: Vec<JsonChangeSet<'_>> = labels
                .zip(&sets)
                .map(|((round, stage), set)| JsonChangeSet {
                    round,
                    stage: Some(stage),
                    changes: visible(set, player),
                })
                .collect();
            let json = serde_json::json!({
                "sets": sets,
                "result": JsonMatchResult::from_automaton(&automaton),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn entry_round(entry: &Entry) -> u32 {
    match entry {
        Entry::Orders { round, .. }
        | Entry::Resign { round, .. }
        | Entry::Prepare { round }
        | Entry::Changes { round, .. } => *round,
    }
}
