//! CLI command implementations for Frontier.

pub(crate) mod rejoin;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod validate;
pub(crate) mod verify;

mod input;
mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format shared by the commands that print match data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontier::SetupError> for CliError {
    fn from(e: frontier::SetupError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontier::RecordingError> for CliError {
    fn from(e: frontier::RecordingError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontier::ReplayError> for CliError {
    fn from(e: frontier::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontier::mapgen::MapGenError> for CliError {
    fn from(e: frontier::mapgen::MapGenError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
