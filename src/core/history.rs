//! Session log: the ordered record of checked invocations.
//!
//! Every committed invocation appends one `SessionStep` holding the entry
//! state, the outcome the action produced and the state the postcondition
//! computed from it.

use super::state::{Outcome, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of one committed invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SessionStep<S: State, O: Outcome> {
    /// Name of the operation that was invoked
    pub operation: String,
    /// State the instance was in when the operation was invoked
    pub from: S,
    /// Outcome returned by the operation's action
    pub outcome: O,
    /// State committed after applying the postcondition
    pub to: S,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of session steps.
///
/// # Example
///
/// ```rust
/// use tenet::core::{SessionLog, SessionStep, State};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door { Shut, Ajar }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Shut => "Shut",
///             Self::Ajar => "Ajar",
///         }
///     }
/// }
///
/// let log = SessionLog::new().record(SessionStep {
///     operation: "push".to_string(),
///     from: Door::Shut,
///     outcome: true,
///     to: Door::Ajar,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(log.get_path(), vec![&Door::Shut, &Door::Ajar]);
/// assert!(log.is_chained(&Door::Shut));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SessionLog<S: State, O: Outcome> {
    steps: Vec<SessionStep<S, O>>,
}

impl<S: State, O: Outcome> Default for SessionLog<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, O: Outcome> SessionLog<S, O> {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step, returning the extended log.
    pub fn record(mut self, step: SessionStep<S, O>) -> Self {
        self.steps.push(step);
        self
    }

    pub(crate) fn push(&mut self, step: SessionStep<S, O>) {
        self.steps.push(step);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the entry state of the first step followed by the `to`
    /// state of every step. Empty when nothing was recorded.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.steps.len() + 1);
        if let Some(first) = self.steps.first() {
            path.push(&first.from);
        }
        for step in &self.steps {
            path.push(&step.to);
        }
        path
    }

    /// Outcomes in invocation order.
    pub fn outcomes(&self) -> Vec<&O> {
        self.steps.iter().map(|s| &s.outcome).collect()
    }

    /// Operation names in invocation order.
    pub fn operations(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.operation.as_str()).collect()
    }

    /// Whether the steps form an unbroken chain starting at `initial`:
    /// the first step leaves `initial` and every later step leaves the
    /// state the previous one committed.
    pub fn is_chained(&self, initial: &S) -> bool {
        let mut expected = initial;
        for step in &self.steps {
            if step.from != *expected {
                return false;
            }
            expected = &step.to;
        }
        true
    }

    /// State committed by the last step, if any.
    pub fn last_state(&self) -> Option<&S> {
        self.steps.last().map(|s| &s.to)
    }

    /// Elapsed time between the first and last committed step.
    pub fn duration(&self) -> Option<Duration> {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => last
                .timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok(),
            _ => None,
        }
    }

    /// All recorded steps.
    pub fn steps(&self) -> &[SessionStep<S, O>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
