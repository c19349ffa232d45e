//! Verify command implementation.

use super::CliError;
use super::input::load_recording;
use frontier::Automaton;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of checking one recording.
#[derive(Debug)]
struct Verdict {
    path: PathBuf,
    result: Result<u32, String>,
}

/// Execute the verify command.
///
/// Each recording is re-run from its orders on its own automaton; the files
/// are spread over a rayon pool.
///
/// # Errors
///
/// Returns an error if any recording fails to load or does not reproduce
/// itself.
pub(crate) fn execute(
    recordings: Vec<PathBuf>,
    threads: Option<usize>,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let pb = ProgressBar::new(recordings.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} recordings")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let verdicts: Vec<Verdict> = recordings
        .into_par_iter()
        .map(|path| {
            let result = verify_one(&path);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            Verdict { path, result }
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let mut failures = 0usize;
    for verdict in &verdicts {
        match &verdict.result {
            Ok(rounds) => println!("  ✓ {} ({rounds} rounds)", verdict.path.display()),
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {e}", verdict.path.display());
            }
        }
    }
    println!();
    println!(
        "{} of {} recordings verified in {:.2}s",
        verdicts.len() - failures,
        verdicts.len(),
        start.elapsed().as_secs_f64()
    );

    if failures > 0 {
        return Err(CliError::new(format!("{failures} recordings failed verification")));
    }
    Ok(())
}

fn verify_one(path: &Path) -> Result<u32, String> {
    let recording = load_recording(path).map_err(|e| e.to_string())?;
    let automaton = Automaton::verify(&recording).map_err(|e| e.to_string())?;
    Ok(automaton.round().round)
}
