//! Ready-made protocols.
//!
//! Each submodule declares one resource kind together with its operations
//! and exposes a `registry()` constructor plus a `declare()` function for
//! adding the kind to an existing registry.
//!
//! - [`file`]: a file handle that must be closed before the session ends.
//! - [`game`]: a word-guess game whose running state is indexed by the
//!   guesses and letters left.
//! - [`vector`]: a length-indexed buffer with validated-index removal.

pub mod file;
pub mod game;
pub mod vector;

use crate::builder::BuildError;
use crate::checker::ProtocolError;
use thiserror::Error;

/// Errors raised while assembling a ready-made protocol.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
