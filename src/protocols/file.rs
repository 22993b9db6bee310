//! File handle protocol.
//!
//! A handle starts `Closed`, may be opened for reading or writing, and must
//! be `Closed` again when the session ends. Opening may fail; the outcome
//! tells the caller which state the handle is in afterwards.
//!
//! ```text
//!            open_read(Opened(true))
//!   Closed ───────────────────────────▶ ReadOpen
//!     ▲  │   open_write(Opened(true))      │
//!     │  └──────────────────────────▶ WriteOpen
//!     │                                    │
//!     └──────────── close(Closed) ─────────┘
//! ```

use super::SetupError;
use crate::builder::fixed_operation;
use crate::kind::{ResourceKind, StateSpace};
use crate::registry::{Operation, Registry};
use crate::state_enum;
use serde::{Deserialize, Serialize};

pub const KIND: &str = "file";
pub const OPEN_READ: &str = "open_read";
pub const OPEN_WRITE: &str = "open_write";
pub const CLOSE: &str = "close";

state_enum! {
    /// State of a file handle.
    pub enum FileState {
        Closed,
        ReadOpen,
        WriteOpen,
    }
}

/// What a file operation reports back.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum FileOutcome {
    /// Result of an open attempt: `true` if the handle is now open.
    Opened(bool),
    Closed,
}

/// Mode requested when opening a handle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    /// Operation that opens a handle in this mode.
    pub fn operation(self) -> &'static str {
        match self {
            Mode::Read => OPEN_READ,
            Mode::Write => OPEN_WRITE,
        }
    }

    /// State a handle is in after a successful open.
    pub fn open_state(self) -> FileState {
        match self {
            Mode::Read => FileState::ReadOpen,
            Mode::Write => FileState::WriteOpen,
        }
    }
}

/// The `file` kind: initial and terminal `Closed`, cleanup by `close`.
pub fn kind() -> Result<ResourceKind<FileState, FileOutcome>, SetupError> {
    Ok(ResourceKind::builder(KIND)
        .initial(FileState::Closed)
        .terminal([FileState::Closed])
        .space(StateSpace::finite(FileState::all()))
        .cleanup(CLOSE, FileOutcome::Closed)
        .build()?)
}

fn open(mode: Mode) -> Result<Operation<FileState, FileOutcome>, SetupError> {
    Ok(Operation::builder(mode.operation())
        .when(|s| *s == FileState::Closed)
        .outcomes([FileOutcome::Opened(true), FileOutcome::Opened(false)])
        .next(move |_, outcome| match outcome {
            FileOutcome::Opened(true) => Some(mode.open_state()),
            FileOutcome::Opened(false) => Some(FileState::Closed),
            FileOutcome::Closed => None,
        })
        .build()?)
}

/// Declare the `file` kind and its operations on `registry`.
pub fn declare(registry: &mut Registry<FileState, FileOutcome>) -> Result<(), SetupError> {
    declare_with(registry, kind()?)
}

/// Declare the file operations on a caller-built kind named [`KIND`], for
/// hosts whose `close` cleanup does real work.
pub fn declare_with(
    registry: &mut Registry<FileState, FileOutcome>,
    kind: ResourceKind<FileState, FileOutcome>,
) -> Result<(), SetupError> {
    registry.declare_kind(kind)?;
    registry.register_operation(KIND, open(Mode::Read)?)?;
    registry.register_operation(KIND, open(Mode::Write)?)?;
    registry.register_operation(
        KIND,
        fixed_operation(
            CLOSE,
            |s| *s != FileState::Closed,
            FileOutcome::Closed,
            FileState::Closed,
        )?,
    )?;
    Ok(())
}

/// A registry holding only the `file` kind.
pub fn registry() -> Result<Registry<FileState, FileOutcome>, SetupError> {
    let mut registry = Registry::new();
    declare(&mut registry)?;
    Ok(registry)
}
