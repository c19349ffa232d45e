//! Re-enacting recordings.
//!
//! A recording can be replayed two ways. From orders, the automaton is fed
//! the recorded inputs and runs the match again; every change set it makes
//! must equal the recorded one. From changes, the recorded change sets are
//! enacted directly, which rebuilds the state without running any rules.

use tracing::{debug, info};

use crate::automaton::{Automaton, MatchConfig};
use crate::error::{ReplayError, SetupError};
use crate::game::ChangeSet;
use crate::recording::{Entry, Recording, Stage};

impl Automaton {
    /// A fresh automaton set up like the recorded match.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded setup is invalid.
    pub fn from_recording(recording: &Recording) -> Result<Self, SetupError> {
        let metadata = &recording.metadata;
        Self::new(
            metadata.bible.clone(),
            metadata.board.clone(),
            &metadata.players,
            MatchConfig {
                seed: metadata.seed,
                challenge: metadata.challenge,
                visionaries: metadata.visionaries,
            },
        )
    }

    /// Run every entry of `recording` through this automaton and return the
    /// change sets, in order.
    ///
    /// With `from_orders` the rules run again and each produced set is
    /// compared with the recorded one; otherwise the recorded sets are
    /// enacted as they are.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Divergence`] at the first change set that
    /// differs from the recording.
    pub fn replay(
        &mut self,
        recording: &Recording,
        from_orders: bool,
    ) -> Result<Vec<ChangeSet>, ReplayError> {
        let mut sets = Vec::new();
        for entry in &recording.entries {
            if let Some(set) = self.act_as_replay(entry, from_orders)? {
                sets.push(set);
            }
        }
        debug!(sets = sets.len(), from_orders, "replay finished");
        Ok(sets)
    }

    /// Re-run a recording from its orders and check it reproduces itself.
    ///
    /// Returns the automaton in its final state.
    ///
    /// # Errors
    ///
    /// Returns an error if the setup is invalid or the replay diverges.
    pub fn verify(recording: &Recording) -> Result<Self, ReplayError> {
        let mut automaton = Self::from_recording(recording)?;
        let sets = automaton.replay(recording, true)?;
        info!(
            name = %recording.metadata.name,
            sets = sets.len(),
            round = automaton.round.round,
            "recording verified"
        );
        Ok(automaton)
    }

    fn act_as_replay(
        &mut self,
        entry: &Entry,
        from_orders: bool,
    ) -> Result<Option<ChangeSet>, ReplayError> {
        match entry {
            Entry::Orders { player, orders, .. } => {
                if from_orders {
                    self.receive(*player, orders.clone());
                }
                Ok(None)
            }
            Entry::Resign { player, .. } => {
                if from_orders {
                    self.resign(*player);
                }
                Ok(None)
            }
            Entry::Prepare { .. } => {
                if from_orders {
                    self.prepare();
                }
                Ok(None)
            }
            Entry::Changes {
                round,
                stage,
                changes,
            } => {
                if from_orders {
                    self.reenact_from_orders(*round, *stage, changes).map(Some)
                } else {
                    Ok(Some(self.reenact_from_changes(*stage, changes)))
                }
            }
        }
    }

    fn reenact_from_orders(
        &mut self,
        round: u32,
        stage: Stage,
        expected: &ChangeSet,
    ) -> Result<ChangeSet, ReplayError> {
        let produced = match stage {
            Stage::Awake => self.awake(),
            Stage::Act => self.act(),
            Stage::Hibernate => self.hibernate(),
        };
        if let Some(index) = produced.first_difference(expected) {
            return Err(ReplayError::Divergence {
                round,
                stage,
                index,
            });
        }
        Ok(produced)
    }

    fn reenact_from_changes(&mut self, stage: Stage, changes: &ChangeSet) -> ChangeSet {
        for (change, recipients) in changes.iter() {
            self.enact(change, *recipients);
        }
        if stage == Stage::Hibernate {
            self.initialized = true;
            self.update_tallies();
        }
        changes.clone()
    }
}
