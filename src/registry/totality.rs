//! Totality validation of postcondition functions.
//!
//! Uses Stillwater's `Validation` so that every missing transition is
//! reported at once instead of stopping at the first one.

use super::operation::Operation;
use crate::core::{Outcome, State};
use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Why a (state, outcome) pair has no usable next state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GapDefect {
    /// The postcondition returned `None`.
    Undefined,
    /// The postcondition returned a state outside the kind's space.
    OutsideSpace { target: String },
}

/// A (state, outcome) pair the postcondition function does not cover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionGap {
    pub state: String,
    pub outcome: String,
    pub defect: GapDefect,
}

impl fmt::Display for TransitionGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.defect {
            GapDefect::Undefined => {
                write!(f, "{} on {} is undefined", self.state, self.outcome)
            }
            GapDefect::OutsideSpace { target } => write!(
                f,
                "{} on {} leads to {} outside the state space",
                self.state, self.outcome, target
            ),
        }
    }
}

/// States over which totality is checked.
#[derive(Clone, Debug)]
pub(crate) struct Exploration<S> {
    pub states: Vec<S>,
    /// Set when an indexed family was cut off at the exploration limit.
    pub truncated: bool,
}

/// Collect the candidate states of a kind.
///
/// Finite spaces contribute every declared state. Indexed families are
/// explored breadth-first from the initial state through every
/// operation's defined, in-space successors, stopping at `limit` states.
pub(crate) fn explore<'a, S, O, I>(kind: &ResourceKind<S, O>, operations: I, limit: usize) -> Exploration<S>
where
    S: State + 'a,
    O: Outcome + 'a,
    I: IntoIterator<Item = &'a Operation<S, O>>,
{
    if let Some(states) = kind.space().states() {
        return Exploration {
            states: states.to_vec(),
            truncated: false,
        };
    }

    let operations: Vec<&Operation<S, O>> = operations.into_iter().collect();
    let mut seen = vec![kind.initial().clone()];
    let mut frontier = VecDeque::from([kind.initial().clone()]);

    while let Some(state) = frontier.pop_front() {
        for op in operations.iter().filter(|op| op.allows(&state)) {
            for outcome in op.outcomes() {
                let Some(next) = op.next_state(&state, outcome) else {
                    continue;
                };
                if !kind.contains(&next) || seen.contains(&next) {
                    continue;
                }
                if seen.len() >= limit {
                    return Exploration {
                        states: seen,
                        truncated: true,
                    };
                }
                seen.push(next.clone());
                frontier.push_back(next);
            }
        }
    }

    Exploration {
        states: seen,
        truncated: false,
    }
}

/// Check one (state, outcome) pair.
fn check_pair<S: State, O: Outcome>(
    kind: &ResourceKind<S, O>,
    operation: &Operation<S, O>,
    state: &S,
    outcome: &O,
) -> Validation<(), NonEmptyVec<TransitionGap>> {
    match operation.next_state(state, outcome) {
        Some(next) if kind.contains(&next) => Validation::success(()),
        Some(next) => Validation::fail(TransitionGap {
            state: format!("{state:?}"),
            outcome: format!("{outcome:?}"),
            defect: GapDefect::OutsideSpace {
                target: format!("{next:?}"),
            },
        }),
        None => Validation::fail(TransitionGap {
            state: format!("{state:?}"),
            outcome: format!("{outcome:?}"),
            defect: GapDefect::Undefined,
        }),
    }
}

/// Validate that `operation` maps every candidate state satisfying its
/// precondition and every declared outcome to a state in the space.
/// Accumulates ALL gaps.
pub(crate) fn validate_totality<S: State, O: Outcome>(
    kind: &ResourceKind<S, O>,
    operation: &Operation<S, O>,
    candidates: &[S],
) -> Validation<(), NonEmptyVec<TransitionGap>> {
    let checks: Vec<Validation<(), NonEmptyVec<TransitionGap>>> = candidates
        .iter()
        .filter(|state| operation.allows(state))
        .flat_map(|state| {
            operation
                .outcomes()
                .iter()
                .map(move |outcome| check_pair(kind, operation, state, outcome))
        })
        .collect();

    Validation::all_vec(checks).map(|_| ())
}
