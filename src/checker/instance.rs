//! Resource instances and the checked `invoke` sequence.

use crate::checker::error::{BoxError, ProtocolError};
use crate::checkpoint::Checkpoint;
use crate::core::{Outcome, SessionLog, SessionStep, State};
use crate::kind::ResourceKind;
use crate::registry::KindCatalog;
use crate::session::{AbortReason, SessionResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Mutable part of an instance, guarded by the instance lock.
struct Cell<S: State, O: Outcome> {
    initial: S,
    current: S,
    history: SessionLog<S, O>,
    retired: bool,
}

/// A live binding of a resource kind to its current state.
///
/// Instances are not `Clone`. Concurrent callers share one through `Arc`
/// and every `invoke` runs under the instance's exclusive lock, so at most
/// one transition is in flight and no partial update is ever observable.
///
/// # Example
///
/// ```rust
/// use tenet::protocols::file::{self, FileOutcome, FileState};
///
/// let registry = file::registry().unwrap();
/// let handle = registry.instantiate(file::KIND).unwrap();
///
/// match handle.invoke(file::OPEN_READ, || Ok::<_, std::io::Error>(FileOutcome::Opened(true))) {
///     Ok(FileOutcome::Opened(true)) => assert_eq!(handle.state(), FileState::ReadOpen),
///     Ok(_) => assert_eq!(handle.state(), FileState::Closed),
///     Err(err) => panic!("{err}"),
/// }
/// ```
pub struct ResourceInstance<S: State, O: Outcome> {
    id: Uuid,
    owner: String,
    catalog: Arc<KindCatalog<S, O>>,
    record_history: bool,
    cell: Mutex<Cell<S, O>>,
}

impl<S: State, O: Outcome> ResourceInstance<S, O> {
    pub(crate) fn new(catalog: Arc<KindCatalog<S, O>>, initial: S, record_history: bool) -> Self {
        let id = Uuid::new_v4();
        debug!(kind = catalog.kind.name(), %id, state = ?initial, "created resource instance");
        Self {
            id,
            owner: String::new(),
            catalog,
            record_history,
            cell: Mutex::new(Cell {
                initial: initial.clone(),
                current: initial,
                history: SessionLog::new(),
                retired: false,
            }),
        }
    }

    pub(crate) fn restored(
        catalog: Arc<KindCatalog<S, O>>,
        id: Uuid,
        owner: String,
        initial: S,
        current: S,
        history: SessionLog<S, O>,
        record_history: bool,
    ) -> Self {
        Self {
            id,
            owner,
            catalog,
            record_history,
            cell: Mutex::new(Cell {
                initial,
                current,
                history,
                retired: false,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Label of the current owner; empty until the first handoff.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> &ResourceKind<S, O> {
        &self.catalog.kind
    }

    pub fn kind_name(&self) -> &str {
        self.catalog.kind.name()
    }

    /// Current state.
    pub fn state(&self) -> S {
        self.cell.lock().current.clone()
    }

    /// State the instance was created in.
    pub fn initial_state(&self) -> S {
        self.cell.lock().initial.clone()
    }

    /// Whether the current state is terminal for the kind.
    pub fn is_terminal(&self) -> bool {
        self.catalog.kind.is_terminal(&self.cell.lock().current)
    }

    pub fn is_retired(&self) -> bool {
        self.cell.lock().retired
    }

    /// Copy of the session log.
    pub fn history(&self) -> SessionLog<S, O> {
        self.cell.lock().history.clone()
    }

    /// Whether the named operation's precondition holds right now.
    /// Runs nothing and changes nothing.
    pub fn can_invoke(&self, operation: &str) -> Result<bool, ProtocolError> {
        let op = self.catalog.operation(operation)?;
        Ok(op.allows(&self.cell.lock().current))
    }

    /// Invoke an operation.
    ///
    /// The precondition is checked against the current state before
    /// `action` runs; the next state is computed from the outcome `action`
    /// returns and committed before the outcome is handed back. If `action`
    /// fails (or panics) the state is left exactly as it was.
    ///
    /// Callers learn which state the instance moved to by matching on the
    /// returned outcome.
    ///
    /// `action` runs while the instance lock is held and must not call back
    /// into the same instance.
    pub fn invoke<F, E>(&self, operation: &str, action: F) -> Result<O, ProtocolError>
    where
        F: FnOnce() -> Result<O, E>,
        E: Into<BoxError>,
    {
        let mut cell = self.cell.lock();

        if cell.retired {
            return Err(ProtocolError::InstanceRetired {
                kind: self.kind_name().to_string(),
                id: self.id,
            });
        }

        let op = self.catalog.operation(operation)?;

        if !op.allows(&cell.current) {
            warn!(
                kind = self.kind_name(),
                operation,
                state = ?cell.current,
                "precondition violated"
            );
            return Err(ProtocolError::PreconditionViolation {
                operation: operation.to_string(),
                state: format!("{:?}", cell.current),
            });
        }

        let outcome = match action() {
            Ok(outcome) => outcome,
            Err(cause) => {
                let err = ProtocolError::action_failed(operation, cause);
                warn!(
                    kind = self.kind_name(),
                    operation,
                    state = ?cell.current,
                    error = %err,
                    "action failed; state unchanged"
                );
                return Err(err);
            }
        };

        if !op.declares(&outcome) {
            warn!(
                kind = self.kind_name(),
                operation,
                outcome = ?outcome,
                "action produced an undeclared outcome"
            );
            return Err(ProtocolError::UndeclaredOutcome {
                operation: operation.to_string(),
                outcome: format!("{outcome:?}"),
            });
        }

        let next = match op.next_state(&cell.current, &outcome) {
            Some(next) if self.catalog.kind.contains(&next) => next,
            _ => {
                error!(
                    kind = self.kind_name(),
                    operation,
                    state = ?cell.current,
                    outcome = ?outcome,
                    "no transition for outcome"
                );
                return Err(ProtocolError::TransitionUndefined {
                    operation: operation.to_string(),
                    state: format!("{:?}", cell.current),
                    outcome: format!("{outcome:?}"),
                });
            }
        };

        debug!(
            kind = self.kind_name(),
            operation,
            from = ?cell.current,
            to = ?next,
            "committed transition"
        );

        if self.record_history {
            let from = cell.current.clone();
            cell.history.push(SessionStep {
                operation: operation.to_string(),
                from,
                outcome: outcome.clone(),
                to: next.clone(),
                timestamp: Utc::now(),
            });
        }
        cell.current = next;

        Ok(outcome)
    }

    /// Invoke an operation whose outcome is already known.
    pub fn perform(&self, operation: &str, outcome: O) -> Result<O, ProtocolError> {
        self.invoke(operation, || Ok::<_, BoxError>(outcome))
    }

    /// Hand the instance to a new owner.
    ///
    /// Allowed only in states accepted by the kind's handoff predicate; on
    /// refusal the instance comes back inside the error untouched.
    pub fn hand_off(
        mut self,
        new_owner: impl Into<String>,
    ) -> Result<Self, HandoffRefused<S, O>> {
        let refusal = {
            let cell = self.cell.lock();
            if cell.retired {
                Some(ProtocolError::InstanceRetired {
                    kind: self.kind_name().to_string(),
                    id: self.id,
                })
            } else if !self.catalog.kind.can_hand_off(&cell.current) {
                Some(ProtocolError::PreconditionViolation {
                    operation: "hand_off".to_string(),
                    state: format!("{:?}", cell.current),
                })
            } else {
                None
            }
        };

        if let Some(reason) = refusal {
            return Err(HandoffRefused {
                instance: self,
                reason,
            });
        }

        let new_owner = new_owner.into();
        debug!(
            kind = self.kind_name(),
            id = %self.id,
            from = %self.owner,
            to = %new_owner,
            "handed off resource instance"
        );
        self.owner = new_owner;
        Ok(self)
    }

    /// Freeze the instance; every later invocation is refused. Only session
    /// ends retire an instance.
    pub(crate) fn retire(&self) {
        self.cell.lock().retired = true;
    }

    /// Retire the instance and report how its session ended.
    pub fn finish(self) -> SessionResult<S> {
        let state = {
            let mut cell = self.cell.lock();
            cell.retired = true;
            cell.current.clone()
        };
        if self.catalog.kind.is_terminal(&state) {
            SessionResult::Completed(state)
        } else {
            warn!(
                kind = self.kind_name(),
                id = %self.id,
                state = ?state,
                "session ended outside a terminal state"
            );
            SessionResult::Aborted(AbortReason::ProtocolNotCompleted { state })
        }
    }

    /// Snapshot the instance for persistence. See [`crate::checkpoint`].
    pub fn checkpoint(&self) -> Checkpoint<S, O> {
        let cell = self.cell.lock();
        Checkpoint::new(
            self.id,
            self.kind_name(),
            &self.owner,
            cell.initial.clone(),
            cell.current.clone(),
            self.record_history,
            cell.history.clone(),
        )
    }
}

impl<S: State, O: Outcome> fmt::Debug for ResourceInstance<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("ResourceInstance");
        out.field("id", &self.id)
            .field("kind", &self.kind_name())
            .field("owner", &self.owner);
        match self.cell.try_lock() {
            Some(cell) => out
                .field("state", &cell.current)
                .field("retired", &cell.retired)
                .finish(),
            None => out.finish_non_exhaustive(),
        }
    }
}

/// A refused handoff; the instance is returned to its current owner.
#[derive(Debug, Error)]
#[error("handoff refused: {reason}")]
pub struct HandoffRefused<S: State, O: Outcome> {
    pub instance: ResourceInstance<S, O>,
    #[source]
    pub reason: ProtocolError,
}
