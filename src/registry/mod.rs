//! Registry of resource kinds and the operations usable against them.
//!
//! Declaring a kind and registering its operations is the configuration
//! phase. Registration validates each postcondition function for totality
//! and fails fast on the first registration that leaves a transition
//! undefined.
//!
//! # Example
//!
//! ```rust
//! use tenet::kind::{ResourceKind, StateSpace};
//! use tenet::registry::{Operation, Registry};
//! use tenet::state_enum;
//!
//! state_enum! {
//!     enum Lock {
//!         Free,
//!         Held,
//!     }
//! }
//!
//! let mut registry: Registry<Lock, bool> = Registry::new();
//! registry
//!     .declare_kind(
//!         ResourceKind::builder("lock")
//!             .initial(Lock::Free)
//!             .terminal([Lock::Free])
//!             .space(StateSpace::finite(Lock::all()))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! registry
//!     .register_operation(
//!         "lock",
//!         Operation::builder("acquire")
//!             .when(|l| *l == Lock::Free)
//!             .outcomes([true, false])
//!             .next(|_, acquired| Some(if *acquired { Lock::Held } else { Lock::Free }))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.is_terminal("lock", &Lock::Free).unwrap());
//! ```

mod config;
mod operation;
mod totality;

pub use config::{RegistryConfig, DEFAULT_EXPLORATION_LIMIT};
pub use operation::{NextFn, Operation};
pub use totality::{GapDefect, TransitionGap};

use crate::checker::{ProtocolError, ResourceInstance};
use crate::core::{Outcome, SessionLog, State};
use crate::kind::ResourceKind;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use stillwater::validation::Validation;
use tracing::{debug, warn};

/// A kind together with its operation catalogue.
///
/// Instances hold an `Arc` snapshot of the catalogue taken when they were
/// created.
#[derive(Clone, Debug)]
pub(crate) struct KindCatalog<S: State, O: Outcome> {
    pub kind: ResourceKind<S, O>,
    pub operations: BTreeMap<String, Operation<S, O>>,
}

impl<S: State, O: Outcome> KindCatalog<S, O> {
    pub fn operation(&self, name: &str) -> Result<&Operation<S, O>, ProtocolError> {
        self.operations
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownOperation {
                kind: self.kind.name().to_string(),
                operation: name.to_string(),
            })
    }

    /// Whether `log` is a well-formed session starting at `initial`: the
    /// steps chain, every entry state satisfies its operation's
    /// precondition, every outcome is declared and every recorded target
    /// equals the postcondition applied to (entry state, outcome).
    pub fn is_well_formed(&self, initial: &S, log: &SessionLog<S, O>) -> bool {
        log.is_chained(initial)
            && log.steps().iter().all(|step| {
                self.operations.get(&step.operation).is_some_and(|op| {
                    op.allows(&step.from)
                        && op.declares(&step.outcome)
                        && op.next_state(&step.from, &step.outcome).as_ref() == Some(&step.to)
                })
            })
    }
}

/// Catalogue of resource kinds sharing one state and outcome type.
pub struct Registry<S: State, O: Outcome> {
    kinds: HashMap<String, Arc<KindCatalog<S, O>>>,
    config: RegistryConfig,
}

impl<S: State + 'static, O: Outcome + 'static> Default for Registry<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State + 'static, O: Outcome + 'static> Registry<S, O> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            kinds: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a resource kind.
    pub fn declare_kind(&mut self, kind: ResourceKind<S, O>) -> Result<(), ProtocolError> {
        if self.kinds.contains_key(kind.name()) {
            return Err(ProtocolError::DuplicateKind {
                kind: kind.name().to_string(),
            });
        }
        kind.validate()?;

        debug!(kind = kind.name(), initial = ?kind.initial(), "declared resource kind");
        self.kinds.insert(
            kind.name().to_string(),
            Arc::new(KindCatalog {
                kind,
                operations: BTreeMap::new(),
            }),
        );
        Ok(())
    }

    /// Look up a declared kind.
    pub fn kind(&self, name: &str) -> Option<&ResourceKind<S, O>> {
        self.kinds.get(name).map(|c| &c.kind)
    }

    /// Whether `state` is terminal for the named kind.
    pub fn is_terminal(&self, kind: &str, state: &S) -> Result<bool, ProtocolError> {
        Ok(self.catalog(kind)?.kind.is_terminal(state))
    }

    /// Register an operation against a kind.
    ///
    /// Fails with `DuplicateOperation` on a name collision and with
    /// `IncompleteTransition`, listing every gap found, when a postcondition
    /// leaves a candidate state/outcome pair without a next state in the
    /// space. Already registered operations are checked again over the
    /// states the new one makes reachable; the error names whichever
    /// operation has the gaps, and the catalogue is left unchanged.
    pub fn register_operation(
        &mut self,
        kind: &str,
        operation: Operation<S, O>,
    ) -> Result<(), ProtocolError> {
        let limit = self.config.exploration_limit;
        let entry = self
            .kinds
            .get_mut(kind)
            .ok_or_else(|| ProtocolError::UnknownKind {
                kind: kind.to_string(),
            })?;

        if entry.operations.contains_key(operation.name()) {
            return Err(ProtocolError::DuplicateOperation {
                kind: kind.to_string(),
                operation: operation.name().to_string(),
            });
        }

        let explored = totality::explore(
            &entry.kind,
            entry.operations.values().chain(std::iter::once(&operation)),
            limit,
        );
        if explored.truncated {
            debug!(
                kind,
                operation = operation.name(),
                limit,
                "state exploration truncated; remaining gaps surface at invoke time"
            );
        }

        // Registered operations are checked again: the new one can make
        // states reachable that they were never checked against.
        for op in std::iter::once(&operation).chain(entry.operations.values()) {
            if let Validation::Failure(gaps) =
                totality::validate_totality(&entry.kind, op, &explored.states)
            {
                let gaps: Vec<TransitionGap> = gaps.into_iter().collect();
                warn!(
                    kind,
                    registering = operation.name(),
                    operation = op.name(),
                    gaps = gaps.len(),
                    "rejected operation with incomplete transitions"
                );
                return Err(ProtocolError::IncompleteTransition {
                    kind: kind.to_string(),
                    operation: op.name().to_string(),
                    gaps,
                });
            }
        }

        debug!(
            kind,
            operation = operation.name(),
            outcomes = operation.outcomes().len(),
            "registered operation"
        );
        Arc::make_mut(entry)
            .operations
            .insert(operation.name().to_string(), operation);
        Ok(())
    }

    /// Names of the operations registered for a kind, sorted.
    pub fn operation_names(&self, kind: &str) -> Result<Vec<&str>, ProtocolError> {
        Ok(self
            .catalog(kind)?
            .operations
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// States reachable from the kind's initial state through its
    /// registered operations (bounded by the exploration limit).
    pub fn reachable_states(&self, kind: &str) -> Result<Vec<S>, ProtocolError> {
        let catalog = self.catalog(kind)?;
        let explored = totality::explore(
            &catalog.kind,
            catalog.operations.values(),
            self.config.exploration_limit,
        );
        Ok(explored.states)
    }

    /// Create an instance in the kind's declared initial state.
    pub fn instantiate(&self, kind: &str) -> Result<ResourceInstance<S, O>, ProtocolError> {
        let catalog = self.catalog(kind)?;
        let initial = catalog.kind.initial().clone();
        self.instantiate_at(kind, initial)
    }

    /// Create an instance in an explicit initial state, which must lie in
    /// the kind's space.
    pub fn instantiate_at(
        &self,
        kind: &str,
        initial: S,
    ) -> Result<ResourceInstance<S, O>, ProtocolError> {
        let catalog = self.catalog(kind)?;
        if !catalog.kind.contains(&initial) {
            return Err(ProtocolError::StateOutsideSpace {
                kind: kind.to_string(),
                state: format!("{initial:?}"),
            });
        }
        Ok(ResourceInstance::new(
            Arc::clone(catalog),
            initial,
            self.config.record_history,
        ))
    }

    pub(crate) fn catalog(&self, kind: &str) -> Result<&Arc<KindCatalog<S, O>>, ProtocolError> {
        self.kinds.get(kind).ok_or_else(|| ProtocolError::UnknownKind {
            kind: kind.to_string(),
        })
    }
}
