//! Tenet: protocol-checked resource handles
//!
//! Tenet tracks stateful resources (file handles, game sessions, buffers)
//! against declared usage protocols. A protocol is a resource kind with a
//! state space, an initial state and terminal states, plus operations
//! whose next state is computed from the outcome their action actually
//! produced. Every invocation is checked at runtime: an operation whose
//! precondition does not hold is refused before anything runs, a failed
//! action leaves the state untouched, and a session only counts as
//! completed when it ends in a terminal state.
//!
//! # Core Concepts
//!
//! - **Kind**: a named protocol (`ResourceKind`) over a finite or indexed
//!   `StateSpace`
//! - **Operation**: precondition, declared outcomes and a postcondition
//!   `(state, outcome) -> next state`, validated for totality when
//!   registered
//! - **Instance**: a live handle whose every operation goes through
//!   `ResourceInstance::invoke`
//! - **Session**: a complete run against one instance, reported as
//!   completed or aborted
//!
//! # Example
//!
//! ```rust
//! use tenet::protocols::file::{self, FileOutcome, FileState};
//! use tenet::ProtocolError;
//!
//! let registry = file::registry().unwrap();
//! let handle = registry.instantiate(file::KIND).unwrap();
//!
//! handle.perform(file::OPEN_READ, FileOutcome::Opened(true)).unwrap();
//! assert_eq!(handle.state(), FileState::ReadOpen);
//!
//! // Opening again without closing breaks the protocol.
//! let err = handle.perform(file::OPEN_WRITE, FileOutcome::Opened(true)).unwrap_err();
//! assert!(matches!(err, ProtocolError::PreconditionViolation { .. }));
//!
//! handle.perform(file::CLOSE, FileOutcome::Closed).unwrap();
//! assert!(handle.finish().is_completed());
//! ```

pub mod builder;
pub mod checker;
pub mod checkpoint;
pub mod core;
pub mod kind;
pub mod protocols;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use builder::{BuildError, KindBuilder, OperationBuilder};
pub use checker::{BoxError, HandoffRefused, ProtocolError, ResourceInstance};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Guard, Outcome, SessionLog, SessionStep, State};
pub use kind::{ResourceKind, StateSpace};
pub use registry::{Operation, Registry, RegistryConfig};
pub use session::{run_session, with_resource, AbortReason, SessionReport, SessionResult};
