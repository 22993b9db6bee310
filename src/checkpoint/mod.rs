//! Checkpoint and restore of resource instances.
//!
//! A checkpoint captures everything needed to rebuild an instance in
//! another process: its identity, kind, owner, initial and current state
//! and session log. Operation actions are not part of it; they are supplied
//! again on every `invoke`.
//!
//! Restoring is checked. [`Registry::restore`] refuses checkpoints whose
//! states fall outside the kind's space or whose log is not a session the
//! kind's registered operations could have produced.
//!
//! # Example
//!
//! ```rust
//! use tenet::checkpoint::Checkpoint;
//! use tenet::protocols::file::{self, FileOutcome, FileState};
//!
//! let registry = file::registry().unwrap();
//! let handle = registry.instantiate(file::KIND).unwrap();
//! handle.perform(file::OPEN_WRITE, FileOutcome::Opened(true)).unwrap();
//!
//! let json = handle.checkpoint().to_json().unwrap();
//! let restored = registry.restore(Checkpoint::from_json(&json).unwrap()).unwrap();
//!
//! assert_eq!(restored.id(), handle.id());
//! assert_eq!(restored.state(), FileState::WriteOpen);
//! ```

use crate::checker::{ProtocolError, ResourceInstance};
use crate::core::{Outcome, SessionLog, State};
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a resource instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State, O: Outcome> {
    /// Checkpoint format version
    pub version: u32,

    /// Id of the checkpointed instance
    pub id: Uuid,

    pub kind: String,

    pub owner: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub initial: S,

    pub current: S,

    /// Whether the instance was recording its session log. When it was
    /// not, the log is empty and the current state cannot be replayed.
    pub history_recorded: bool,

    pub log: SessionLog<S, O>,
}

impl<S: State, O: Outcome> Checkpoint<S, O> {
    pub(crate) fn new(
        id: Uuid,
        kind: &str,
        owner: &str,
        initial: S,
        current: S,
        history_recorded: bool,
        log: SessionLog<S, O>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id,
            kind: kind.to_string(),
            owner: owner.to_string(),
            timestamp: Utc::now(),
            initial,
            current,
            history_recorded,
            log,
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode from JSON, rejecting unknown format versions.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Encode in the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode from the binary format, rejecting unknown format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

impl<S: State + 'static, O: Outcome + 'static> Registry<S, O> {
    /// Rebuild an instance from a checkpoint.
    ///
    /// The restored instance keeps the checkpoint's id, owner and log and
    /// takes a fresh snapshot of the kind's current catalogue. It records
    /// history exactly when the checkpointed instance did, whatever this
    /// registry's configuration, so its own checkpoints restore again.
    pub fn restore(
        &self,
        checkpoint: Checkpoint<S, O>,
    ) -> Result<ResourceInstance<S, O>, CheckpointError> {
        checkpoint.check_version()?;
        let catalog = self.catalog(&checkpoint.kind)?;

        for state in [&checkpoint.initial, &checkpoint.current] {
            if !catalog.kind.contains(state) {
                return Err(ProtocolError::StateOutsideSpace {
                    kind: checkpoint.kind.clone(),
                    state: format!("{state:?}"),
                }
                .into());
            }
        }

        if !catalog.is_well_formed(&checkpoint.initial, &checkpoint.log) {
            warn!(kind = %checkpoint.kind, id = %checkpoint.id, "rejected malformed checkpoint log");
            return Err(CheckpointError::ValidationFailed(format!(
                "log of instance {} is not a well-formed '{}' session",
                checkpoint.id, checkpoint.kind
            )));
        }

        if checkpoint.history_recorded {
            let reached = checkpoint.log.last_state().unwrap_or(&checkpoint.initial);
            if *reached != checkpoint.current {
                return Err(CheckpointError::ValidationFailed(format!(
                    "log ends in {reached:?} but current state is {:?}",
                    checkpoint.current
                )));
            }
        } else if !checkpoint.log.is_empty() {
            return Err(CheckpointError::ValidationFailed(
                "log present although history was not recorded".to_string(),
            ));
        }

        debug!(
            kind = %checkpoint.kind,
            id = %checkpoint.id,
            state = ?checkpoint.current,
            steps = checkpoint.log.len(),
            "restored resource instance"
        );
        Ok(ResourceInstance::restored(
            Arc::clone(catalog),
            checkpoint.id,
            checkpoint.owner,
            checkpoint.initial,
            checkpoint.current,
            checkpoint.log,
            checkpoint.history_recorded,
        ))
    }
}
