//! Run command implementation.

use super::input::{OrderScript, load_bible, load_board, load_script};
use super::output::{JsonMatchResult, format_text};
use super::{CliError, OutputFormat};
use frontier::{Automaton, Challenge, MatchConfig, Player, Vision, mapgen};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options of the run command.
#[derive(Debug)]
pub(crate) struct RunOptions {
    pub(crate) players: Vec<Player>,
    pub(crate) seed: Option<u64>,
    pub(crate) rounds: u32,
    pub(crate) challenge: Challenge,
    pub(crate) board: Option<PathBuf>,
    pub(crate) size: i8,
    pub(crate) bible: Option<PathBuf>,
    pub(crate) orders: Option<PathBuf>,
    pub(crate) save: Option<PathBuf>,
    pub(crate) name: Option<String>,
    pub(crate) format: OutputFormat,
    pub(crate) quiet: bool,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if an input file is invalid, the match cannot be set up
/// or the recording cannot be saved.
pub(crate) fn execute(options: RunOptions) -> Result<(), CliError> {
    let bible = load_bible(options.bible.as_deref())?;

    // Generate seed if not provided
    let seed = options.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(42)
    });

    let board = match &options.board {
        Some(path) => load_board(path)?,
        None => mapgen::generate(seed, options.size, options.size, &options.players)?,
    };

    let mut script = match &options.orders {
        Some(path) => load_script(path)?,
        None => OrderScript::default(),
    };
    for player in script.players() {
        if !options.players.contains(&player) {
            warn!(%player, "order script names a player outside the match");
        }
    }

    let config = MatchConfig {
        seed,
        challenge: options.challenge,
        visionaries: Vision::EMPTY,
    };
    let mut automaton = Automaton::new(bible, board, &options.players, config)?;
    if options.save.is_some() {
        automaton.start_recording(options.name.as_deref())?;
    }

    if !options.quiet && options.format == OutputFormat::Text {
        println!("Running match with seed {seed}...");
        let names: Vec<String> = options.players.iter().map(ToString::to_string).collect();
        println!("Players: {}", names.join(", "));
        println!("Script: {} order lines", script.len());
        println!();
    }

    automaton.hibernate();
    for round in 0..options.rounds {
        if automaton.is_game_over() {
            break;
        }
        for (player, orders) in script.take(round) {
            automaton.receive(player, orders);
        }
        let sets = automaton.run_round();
        let changes: usize = sets.iter().map(|set| set.len()).sum();
        info!(round, changes, "round played");
        if !options.quiet && options.format == OutputFormat::Text {
            let alive = automaton.players().alive().count();
            println!("  round {round:>3}: {changes:>5} changes, {alive} players left");
        }
    }

    if let Some((path, recording)) = options.save.as_ref().zip(automaton.take_recording()) {
        recording.save(path)?;
        if !options.quiet && options.format == OutputFormat::Text {
            println!();
            println!("Recording saved to: {}", path.display());
        }
    }

    match options.format {
        OutputFormat::Text => {
            if !options.quiet {
                println!();
            }
            print!("{}", format_text(&automaton));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonMatchResult::from_automaton(&automaton))?;
            println!("{json}");
        }
    }

    Ok(())
}
