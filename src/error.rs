//! Error types for the simulation core.
//!
//! Only malformed input and I/O surface as errors. Orders that are well formed
//! but illegal never do: the automaton turns those into notices.

use std::io;

use thiserror::Error;

use crate::game::{Player, Position};
use crate::recording::Stage;

/// Malformed order, descriptor or type-name text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing to parse.
    #[error("empty input")]
    Empty,
    /// The order keyword is not one of the known order types.
    #[error("unknown order type `{0}`")]
    UnknownOrderType(String),
    /// The descriptor prefix is not one of the known descriptor types.
    #[error("unknown descriptor type `{0}`")]
    UnknownDescriptorType(String),
    /// Not a tile type name.
    #[error("unknown tile type `{0}`")]
    UnknownTileType(String),
    /// Not a unit type name.
    #[error("unknown unit type `{0}`")]
    UnknownUnitType(String),
    /// Not a player colour.
    #[error("unknown player `{0}`")]
    UnknownPlayer(String),
    /// Not a challenge name.
    #[error("unknown challenge `{0}`")]
    UnknownChallenge(String),
    /// A position that is not `row,col` within `0..=126`.
    #[error("invalid position `{0}`")]
    InvalidPosition(String),
    /// A move step that is not one of `n`, `e`, `s`, `w`.
    #[error("invalid move step `{0}`")]
    InvalidMove(char),
    /// The order requires a field that was not given.
    #[error("`{order}` order requires `{field}`")]
    MissingField {
        /// Order keyword.
        order: &'static str,
        /// Missing field name.
        field: &'static str,
    },
    /// A field the order does not take, or a token that is not `key=value`.
    #[error("unexpected field `{0}`")]
    UnexpectedField(String),
    /// JSON order data failed to decode.
    #[error("malformed order data: {0}")]
    Json(String),
}

/// Problems loading or validating a ruleset.
#[derive(Debug, Error)]
pub enum BibleError {
    /// The ruleset file could not be read.
    #[error("failed to read ruleset: {0}")]
    Io(#[from] io::Error),
    /// The ruleset is not valid JSON for a [`crate::game::Bible`].
    #[error("malformed ruleset: {0}")]
    Json(#[from] serde_json::Error),
    /// The ruleset decoded but is internally inconsistent.
    #[error("invalid ruleset: {0}")]
    Invalid(String),
}

/// Problems creating a match.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No players were given.
    #[error("a match needs at least one player")]
    EmptyRoster,
    /// More players than there are colours.
    #[error("too many players: {0}")]
    TooManyPlayers(usize),
    /// The same colour appears twice in the roster.
    #[error("player {0} appears more than once")]
    DuplicatePlayer(Player),
    /// `none` and `observer` cannot take part as players.
    #[error("{0} cannot be a participant")]
    UnplayablePlayer(Player),
    /// A board token belongs to a player outside the roster.
    #[error("token at {position} belongs to {owner}, who is not in the match")]
    UnknownOwner {
        /// Cell holding the token.
        position: Position,
        /// Owner recorded on the token.
        owner: Player,
    },
    /// A token's stacks or power are outside what its type allows.
    #[error("token at {0} has invalid stacks or power")]
    InvalidToken(Position),
    /// The ruleset failed validation.
    #[error(transparent)]
    Bible(#[from] BibleError),
}

/// Problems reading or writing a recording.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// The recording file could not be read or written.
    #[error("recording I/O failed: {0}")]
    Io(#[from] io::Error),
    /// A line of the recording failed to decode.
    #[error("malformed recording at line {line}: {source}")]
    Json {
        /// One-based line number.
        line: usize,
        /// Decoder error.
        source: serde_json::Error,
    },
    /// A value failed to encode.
    #[error("failed to encode recording: {0}")]
    Encode(#[source] serde_json::Error),
    /// The file has no metadata line.
    #[error("recording has no header")]
    MissingHeader,
    /// The header declares a format this build does not read.
    #[error("unsupported recording version {0}")]
    UnsupportedVersion(u32),
    /// Recording must start before the first hibernation.
    #[error("recording must start before the match begins")]
    LateStart,
}

/// Problems re-enacting a recording.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The recording itself is unusable.
    #[error(transparent)]
    Recording(#[from] RecordingError),
    /// The recorded match could not be recreated.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Re-running the orders produced a different change set.
    #[error("replay diverged in round {round} at {stage} (change {index})")]
    Divergence {
        /// Round of the diverging change set.
        round: u32,
        /// Stage that produced it.
        stage: Stage,
        /// Index of the first differing change.
        index: usize,
    },
}
