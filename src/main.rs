//! Frontier CLI - run, replay and inspect deterministic matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{ArgAction, Parser, Subcommand};
use frontier::{Challenge, Player};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Frontier - a deterministic grid strategy simulation
#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a match from an order script
    Run {
        /// Participants, comma separated (e.g. red,blue)
        #[arg(short, long, value_delimiter = ',', default_value = "red,blue")]
        players: Vec<Player>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Rounds to play unless the match ends first
        #[arg(short, long, default_value = "20")]
        rounds: u32,

        /// Win condition: standard, elimination, investment or morale
        #[arg(short, long, default_value = "standard")]
        challenge: Challenge,

        /// Starting board (JSON); generated from the seed when omitted
        #[arg(long)]
        board: Option<PathBuf>,

        /// Side length of a generated board
        #[arg(long, default_value = "16")]
        size: i8,

        /// Ruleset (JSON); the built-in one when omitted
        #[arg(long)]
        bible: Option<PathBuf>,

        /// Order script (JSON lines of {round, player, orders})
        #[arg(short, long)]
        orders: Option<PathBuf>,

        /// Save the recording to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Match name stored in the recording
        #[arg(long)]
        name: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Only print the final result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Re-enact a recording and print its change sets
    Replay {
        /// Recording file
        #[arg(required = true)]
        recording: PathBuf,

        /// Enact the recorded changes instead of re-running the orders
        #[arg(long)]
        from_changes: bool,

        /// Only show what this player saw
        #[arg(short, long)]
        player: Option<Player>,

        /// Stop after this round
        #[arg(short, long)]
        round: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check that recordings reproduce themselves
    Verify {
        /// Recording files
        #[arg(required = true)]
        recordings: Vec<PathBuf>,

        /// Worker threads (default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Print what a player needs to pick a recorded match up again
    Rejoin {
        /// Recording file
        #[arg(required = true)]
        recording: PathBuf,

        /// The rejoining player
        #[arg(short, long)]
        player: Player,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check ruleset, board and order script files
    Validate {
        /// Ruleset (JSON)
        #[arg(long)]
        bible: Option<PathBuf>,

        /// Board (JSON)
        #[arg(long)]
        board: Option<PathBuf>,

        /// Order script (JSON lines)
        #[arg(long)]
        orders: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            players,
            seed,
            rounds,
            challenge,
            board,
            size,
            bible,
            orders,
            save,
            name,
            format,
            quiet,
        } => cli::run::execute(cli::run::RunOptions {
            players,
            seed,
            rounds,
            challenge,
            board,
            size,
            bible,
            orders,
            save,
            name,
            format,
            quiet,
        }),

        Commands::Replay {
            recording,
            from_changes,
            player,
            round,
            format,
        } => cli::replay::execute(recording, from_changes, player, round, format),

        Commands::Verify {
            recordings,
            threads,
            progress,
        } => cli::verify::execute(recordings, threads, progress),

        Commands::Rejoin {
            recording,
            player,
            format,
        } => cli::rejoin::execute(recording, player, format),

        Commands::Validate {
            bible,
            board,
            orders,
        } => cli::validate::execute(bible, board, orders),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
