//! Session results and reports.

use crate::checker::ResourceInstance;
use crate::core::{Outcome, SessionLog, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a session did not complete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum AbortReason<S: State> {
    /// The session ended in a state that is not terminal for its kind.
    ProtocolNotCompleted { state: S },
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum SessionResult<S: State> {
    /// Ended in a terminal state.
    Completed(S),
    Aborted(AbortReason<S>),
}

impl<S: State> SessionResult<S> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionResult::Completed(_))
    }

    /// The state the session ended in, whichever way it ended.
    pub fn final_state(&self) -> &S {
        match self {
            SessionResult::Completed(state) => state,
            SessionResult::Aborted(AbortReason::ProtocolNotCompleted { state }) => state,
        }
    }
}

/// Everything a finished session leaves behind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SessionReport<S: State, O: Outcome> {
    pub instance: Uuid,
    pub result: SessionResult<S>,
    pub log: SessionLog<S, O>,
}

impl<S: State, O: Outcome> SessionReport<S, O> {
    /// Retire `instance` and collect its report.
    pub(crate) fn close(instance: ResourceInstance<S, O>) -> Self {
        let id = instance.id();
        let log = instance.history();
        let result = instance.finish();
        Self {
            instance: id,
            result,
            log,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_completed()
    }
}
