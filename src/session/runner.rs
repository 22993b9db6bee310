//! Session runner: drives checked invocations to the end of a session.

use super::result::SessionReport;
use crate::checker::{BoxError, ProtocolError, ResourceInstance};
use crate::core::{Outcome, State};
use crate::registry::Registry;
use tracing::{debug, warn};

/// What the script sees before choosing its next step.
#[derive(Debug)]
pub enum Observed<'a, O> {
    /// No step has run yet.
    Start,
    /// The previous step committed and produced this outcome.
    Outcome(&'a O),
    /// The previous step's action failed; the state is unchanged.
    Failed(&'a ProtocolError),
}

/// One step requested by a script: an operation and the action producing
/// its outcome.
pub struct Step<'a, O> {
    pub(crate) operation: String,
    pub(crate) action: Box<dyn FnOnce() -> Result<O, BoxError> + 'a>,
}

impl<'a, O: 'a> Step<'a, O> {
    pub fn new<F, E>(operation: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Result<O, E> + 'a,
        E: Into<BoxError>,
    {
        Self {
            operation: operation.into(),
            action: Box::new(move || action().map_err(Into::into)),
        }
    }

    /// Step whose action yields a known outcome.
    pub fn returning(operation: impl Into<String>, outcome: O) -> Self {
        Self::new(operation, move || Ok::<_, BoxError>(outcome))
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Run a scripted session against a fresh instance of `kind`.
///
/// The script is called with the current state and what happened on the
/// previous step, and returns the next step or `None` to end the session.
/// Action failures are handed back to the script so it can take an error
/// branch; every other protocol error retires the instance and is returned.
///
/// The report is `Completed` iff the session ends in a terminal state.
///
/// # Example
///
/// ```rust
/// use tenet::protocols::file::{self, FileOutcome, FileState};
/// use tenet::session::{run_session, Observed, Step};
///
/// let registry = file::registry().unwrap();
/// let report = run_session(&registry, file::KIND, FileState::Closed, |state, observed| {
///     match (state, observed) {
///         (FileState::Closed, Observed::Start) => {
///             Some(Step::returning(file::OPEN_READ, FileOutcome::Opened(true)))
///         }
///         (FileState::ReadOpen, _) => Some(Step::returning(file::CLOSE, FileOutcome::Closed)),
///         _ => None,
///     }
/// })
/// .unwrap();
///
/// assert!(report.is_completed());
/// ```
pub fn run_session<'a, S, O, F>(
    registry: &Registry<S, O>,
    kind: &str,
    initial: S,
    mut script: F,
) -> Result<SessionReport<S, O>, ProtocolError>
where
    S: State + 'static,
    O: Outcome + 'static,
    F: FnMut(&S, Observed<'_, O>) -> Option<Step<'a, O>>,
{
    let instance = registry.instantiate_at(kind, initial)?;
    debug!(kind, id = %instance.id(), "session started");

    let mut last: Option<Result<O, ProtocolError>> = None;
    loop {
        let state = instance.state();
        let observed = match &last {
            None => Observed::Start,
            Some(Ok(outcome)) => Observed::Outcome(outcome),
            Some(Err(err)) => Observed::Failed(err),
        };
        let Some(step) = script(&state, observed) else {
            break;
        };

        match instance.invoke(&step.operation, step.action) {
            Ok(outcome) => last = Some(Ok(outcome)),
            Err(err) if err.is_action_failure() => last = Some(Err(err)),
            Err(err) => {
                instance.retire();
                return Err(err);
            }
        }
    }

    let report = SessionReport::close(instance);
    debug!(kind, completed = report.is_completed(), steps = report.log.len(), "session ended");
    Ok(report)
}

/// Run `body` against a fresh instance of `kind` with guaranteed cleanup.
///
/// If `body` fails (or panics), the kind's cleanup operation is attempted
/// when one is declared and its precondition holds, the instance is retired,
/// and the original failure is propagated. A cleanup failure is logged and
/// never replaces the original error.
pub fn with_resource<S, O, T, E, F>(
    registry: &Registry<S, O>,
    kind: &str,
    initial: S,
    body: F,
) -> Result<(T, SessionReport<S, O>), E>
where
    S: State + 'static,
    O: Outcome + 'static,
    F: FnOnce(&ResourceInstance<S, O>) -> Result<T, E>,
    E: From<ProtocolError>,
{
    let instance = registry.instantiate_at(kind, initial)?;
    let mut guard = CleanupGuard {
        instance: &instance,
        armed: true,
    };

    match body(guard.instance) {
        Ok(value) => {
            guard.armed = false;
            drop(guard);
            Ok((value, SessionReport::close(instance)))
        }
        Err(err) => {
            guard.run();
            drop(guard);
            instance.retire();
            Err(err)
        }
    }
}

/// Runs the kind's cleanup operation if the body did not finish normally.
struct CleanupGuard<'i, S: State, O: Outcome> {
    instance: &'i ResourceInstance<S, O>,
    armed: bool,
}

impl<S: State, O: Outcome> CleanupGuard<'_, S, O> {
    fn run(&mut self) {
        if !std::mem::replace(&mut self.armed, false) {
            return;
        }
        let instance = self.instance;
        let Some(cleanup) = instance.kind().cleanup() else {
            return;
        };

        match instance.can_invoke(&cleanup.operation) {
            Ok(true) => match instance.invoke(&cleanup.operation, || (cleanup.action)()) {
                Ok(_) => debug!(
                    kind = instance.kind_name(),
                    operation = %cleanup.operation,
                    "cleanup reached {:?}",
                    instance.state()
                ),
                Err(err) => warn!(
                    kind = instance.kind_name(),
                    operation = %cleanup.operation,
                    error = %err,
                    "cleanup failed"
                ),
            },
            Ok(false) => debug!(
                kind = instance.kind_name(),
                operation = %cleanup.operation,
                "cleanup not applicable in current state"
            ),
            Err(err) => warn!(
                kind = instance.kind_name(),
                error = %err,
                "cleanup operation is not registered"
            ),
        }
    }
}

impl<S: State, O: Outcome> Drop for CleanupGuard<'_, S, O> {
    fn drop(&mut self) {
        if self.armed {
            self.run();
            self.instance.retire();
        }
    }
}
