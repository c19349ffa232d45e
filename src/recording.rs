//! Match recordings.
//!
//! A recording is everything needed to re-run a match: the setup (seed,
//! ruleset, starting board, roster, visionaries, challenge) and, in order,
//! every input the automaton received and every change set it produced.
//!
//! On disk a recording is JSON lines. The first line is the
//! [`RecordingMetadata`]; each following line is one [`Entry`].

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;
use crate::error::RecordingError;
use crate::game::{Bible, Board, ChangeSet, Order, Player, Vision};

/// Format version written by this build.
pub const RECORDING_VERSION: u32 = 1;

/// Which automaton call produced a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Start of a round.
    Awake,
    /// One action, decay or growth step.
    Act,
    /// End of a round, or the initial call.
    Hibernate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Awake => "awake",
            Stage::Act => "act",
            Stage::Hibernate => "hibernate",
        })
    }
}

/// Header line: how the match was set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Format version.
    pub version: u32,
    /// Free-form match name.
    #[serde(default)]
    pub name: String,
    /// RNG seed.
    pub seed: u64,
    /// Ruleset the match was played with.
    pub bible: Bible,
    /// Board before the first hibernation.
    pub board: Board,
    /// Participants in seat order.
    pub players: Vec<Player>,
    /// Players with global vision.
    #[serde(default)]
    pub visionaries: Vision,
    /// Win condition.
    #[serde(default)]
    pub challenge: Challenge,
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "lowercase")]
pub enum Entry {
    /// Orders received during planning.
    Orders {
        /// Round they were received in.
        round: u32,
        /// Issuer.
        player: Player,
        /// The orders, as received.
        orders: Vec<Order>,
    },
    /// A resignation.
    Resign {
        /// Round it was received in.
        round: u32,
        /// Who resigned.
        player: Player,
    },
    /// Orders were queued for the action phase.
    Prepare {
        /// Round.
        round: u32,
    },
    /// Output of one automaton call.
    Changes {
        /// Round when the set was produced.
        round: u32,
        /// Which call produced it.
        stage: Stage,
        /// The set itself.
        changes: ChangeSet,
    },
}

/// A full match log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Setup.
    pub metadata: RecordingMetadata,
    /// Events in the order they happened.
    pub entries: Vec<Entry>,
}

impl Recording {
    /// Start an empty log.
    #[must_use]
    pub fn new(metadata: RecordingMetadata) -> Self {
        Self {
            metadata,
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Recorded change sets, in order.
    pub fn change_sets(&self) -> impl Iterator<Item = &ChangeSet> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Changes { changes, .. } => Some(changes),
            _ => None,
        })
    }

    /// Write the log as JSON lines.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RecordingError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, &self.metadata).map_err(RecordingError::Encode)?;
        writer.write_all(b"\n")?;
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry).map_err(RecordingError::Encode)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a log written by [`Self::write_to`].
    ///
    /// Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a line fails to decode, the header is missing, or
    /// the header declares an unsupported version.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, RecordingError> {
        let reader = BufReader::new(reader);
        let mut metadata: Option<RecordingMetadata> = None;
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let number = index + 1;
            if metadata.is_none() {
                let header: RecordingMetadata = serde_json::from_str(&line)
                    .map_err(|source| RecordingError::Json { line: number, source })?;
                if header.version != RECORDING_VERSION {
                    return Err(RecordingError::UnsupportedVersion(header.version));
                }
                metadata = Some(header);
            } else {
                let entry: Entry = serde_json::from_str(&line)
                    .map_err(|source| RecordingError::Json { line: number, source })?;
                entries.push(entry);
            }
        }
        let metadata = metadata.ok_or(RecordingError::MissingHeader)?;
        Ok(Self { metadata, entries })
    }

    /// Save to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), RecordingError> {
        self.write_to(File::create(path)?)
    }

    /// Load from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        Self::read_from(File::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Change, Descriptor, Position};

    fn sample() -> Recording {
        let mut recording = Recording::new(RecordingMetadata {
            version: RECORDING_VERSION,
            name: "sample".to_string(),
            seed: 7,
            bible: Bible::default(),
            board: Board::new(2, 3).unwrap(),
            players: vec![Player::Red, Player::Blue],
            visionaries: Vision::only(Player::Observer),
            challenge: Challenge::Standard,
        });
        recording.push(Entry::Orders {
            round: 0,
            player: Player::Red,
            orders: vec![Order::Halt {
                subject: Descriptor::unit(crate::game::Layer::Ground, Position::new(0, 0)),
            }],
        });
        recording.push(Entry::Prepare { round: 0 });
        let mut changes = ChangeSet::new();
        changes.push(Change::GameOver, Vision::only(Player::Red));
        recording.push(Entry::Changes {
            round: 0,
            stage: Stage::Act,
            changes,
        });
        recording
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.jsonl");
        let recording = sample();
        recording.save(&path).unwrap();
        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded, recording);
        assert_eq!(loaded.change_sets().count(), 1);
    }

    #[test]
    fn test_header_is_first_line() {
        let mut buffer = Vec::new();
        sample().write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.contains("\"version\":1"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_missing_header() {
        let err = Recording::read_from("\n\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RecordingError::MissingHeader));
    }

    #[test]
    fn test_bad_line_reports_number() {
        let mut buffer = Vec::new();
        sample().write_to(&mut buffer).unwrap();
        buffer.extend_from_slice(b"{not json}\n");
        let err = Recording::read_from(buffer.as_slice()).unwrap_err();
        assert!(matches!(err, RecordingError::Json { line: 5, .. }));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut recording = sample();
        recording.metadata.version = RECORDING_VERSION + 1;
        let mut buffer = Vec::new();
        recording.write_to(&mut buffer).unwrap();
        let err = Recording::read_from(buffer.as_slice()).unwrap_err();
        assert!(matches!(err, RecordingError::UnsupportedVersion(2)));
    }
}
