//! Length-indexed buffer protocol.
//!
//! The state of a buffer carries its length: `Building { len }` while items
//! may still be added or removed, `Sealed { len }` once it is frozen. Every
//! sealed length is terminal. [`TrackedVec`] pairs a plain `Vec<T>` with a
//! checked instance of this kind so the recorded length and the real one
//! move together.
//!
//! Removal goes through a validated index: [`TrackedVec::locate`] either
//! finds the value and returns a [`Located`] witness, or returns `None`.
//! The witness borrows the buffer mutably, so the index it holds stays valid
//! until it is used and [`Located::remove`] never searches again.
//!
//! # Example
//!
//! ```rust
//! use tenet::protocols::vector::{self, TrackedVec, VecState};
//!
//! let registry = vector::registry().unwrap();
//! let mut names = TrackedVec::with_declared_len(&registry, 3, vec!["ada", "bob", "cy"]).unwrap();
//!
//! if let Some(found) = names.locate(&"bob") {
//!     assert_eq!(found.remove().unwrap(), "bob");
//! }
//! assert!(names.locate(&"zed").is_none());
//!
//! names.seal().unwrap();
//! assert_eq!(names.state(), VecState::Sealed { len: 2 });
//! ```

use super::SetupError;
use crate::checker::{ProtocolError, ResourceInstance};
use crate::core::{SessionLog, State};
use crate::kind::{ResourceKind, StateSpace};
use crate::registry::{Operation, Registry, RegistryConfig};
use crate::session::SessionReport;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;
use uuid::Uuid;

pub const KIND: &str = "vector";
pub const PUSH: &str = "push";
pub const POP: &str = "pop";
pub const REMOVE: &str = "remove";
pub const SEAL: &str = "seal";

/// Exploration limit used by [`registry`]; the family is unbounded, so
/// totality is checked over the first lengths only.
pub const EXPLORATION_LIMIT: usize = 256;

/// State of a buffer, indexed by its length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum VecState {
    Building { len: usize },
    Sealed { len: usize },
}

impl State for VecState {
    fn name(&self) -> &str {
        match self {
            VecState::Building { .. } => "Building",
            VecState::Sealed { .. } => "Sealed",
        }
    }
}

impl VecState {
    pub fn len(&self) -> usize {
        match self {
            VecState::Building { len } | VecState::Sealed { len } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a buffer operation reports back.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum VecOutcome {
    Pushed,
    Popped,
    Removed,
    Sealed,
}

/// Errors raised by [`TrackedVec`] construction.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Declared length {declared} does not match the {actual} item(s) supplied")]
    LengthMismatch { declared: usize, actual: usize },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

fn building(state: &VecState) -> bool {
    matches!(state, VecState::Building { .. })
}

fn shrinkable(state: &VecState) -> bool {
    matches!(state, VecState::Building { len } if *len > 0)
}

fn shrink(state: &VecState) -> Option<VecState> {
    match state {
        VecState::Building { len } => Some(VecState::Building {
            len: len.checked_sub(1)?,
        }),
        VecState::Sealed { .. } => None,
    }
}

/// The `vector` kind: starts `Building { len: 0 }`, every `Sealed` length
/// is terminal.
pub fn kind() -> Result<ResourceKind<VecState, VecOutcome>, SetupError> {
    Ok(ResourceKind::builder(KIND)
        .initial(VecState::Building { len: 0 })
        .terminal_when(|s| matches!(s, VecState::Sealed { .. }))
        .space(StateSpace::indexed(|_| true))
        .build()?)
}

fn operations() -> Result<Vec<Operation<VecState, VecOutcome>>, SetupError> {
    let push = Operation::builder(PUSH)
        .when(building)
        .outcome(VecOutcome::Pushed)
        .next(|state, _| match state {
            VecState::Building { len } => Some(VecState::Building {
                len: len.checked_add(1)?,
            }),
            VecState::Sealed { .. } => None,
        })
        .build()?;

    let pop = Operation::builder(POP)
        .when(shrinkable)
        .outcome(VecOutcome::Popped)
        .next(|state, _| shrink(state))
        .build()?;

    let remove = Operation::builder(REMOVE)
        .when(shrinkable)
        .outcome(VecOutcome::Removed)
        .next(|state, _| shrink(state))
        .build()?;

    let seal = Operation::builder(SEAL)
        .when(building)
        .outcome(VecOutcome::Sealed)
        .next(|state, _| Some(VecState::Sealed { len: state.len() }))
        .build()?;

    Ok(vec![push, pop, remove, seal])
}

/// Declare the `vector` kind and its operations on `registry`.
pub fn declare(registry: &mut Registry<VecState, VecOutcome>) -> Result<(), SetupError> {
    registry.declare_kind(kind()?)?;
    for op in operations()? {
        registry.register_operation(KIND, op)?;
    }
    Ok(())
}

/// A registry holding only the `vector` kind, explored up to
/// [`EXPLORATION_LIMIT`] states.
pub fn registry() -> Result<Registry<VecState, VecOutcome>, SetupError> {
    let mut registry =
        Registry::with_config(RegistryConfig::default().exploration_limit(EXPLORATION_LIMIT));
    declare(&mut registry)?;
    Ok(registry)
}

/// A `Vec<T>` whose length is tracked by a checked `vector` instance.
#[derive(Debug)]
pub struct TrackedVec<T> {
    items: Vec<T>,
    instance: ResourceInstance<VecState, VecOutcome>,
}

impl<T> TrackedVec<T> {
    /// An empty buffer.
    pub fn new(registry: &Registry<VecState, VecOutcome>) -> Result<Self, ProtocolError> {
        Ok(Self {
            items: Vec::new(),
            instance: registry.instantiate(KIND)?,
        })
    }

    /// A buffer built from `items`, whose length must equal `len`.
    pub fn with_declared_len(
        registry: &Registry<VecState, VecOutcome>,
        len: usize,
        items: Vec<T>,
    ) -> Result<Self, VectorError> {
        if items.len() != len {
            return Err(VectorError::LengthMismatch {
                declared: len,
                actual: items.len(),
            });
        }
        Ok(Self {
            items,
            instance: registry.instantiate_at(KIND, VecState::Building { len })?,
        })
    }

    pub fn state(&self) -> VecState {
        self.instance.state()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Id of the tracking instance.
    pub fn id(&self) -> Uuid {
        self.instance.id()
    }

    /// Operations recorded so far.
    pub fn history(&self) -> SessionLog<VecState, VecOutcome> {
        self.instance.history()
    }

    pub fn push(&mut self, item: T) -> Result<(), ProtocolError> {
        let items = &mut self.items;
        self.instance.invoke(PUSH, || {
            items.push(item);
            Ok::<_, Infallible>(VecOutcome::Pushed)
        })?;
        Ok(())
    }

    /// Remove and return the last item.
    pub fn pop(&mut self) -> Result<T, ProtocolError> {
        let items = &mut self.items;
        let mut popped = None;
        self.instance.invoke(POP, || match items.pop() {
            Some(item) => {
                popped = Some(item);
                Ok(VecOutcome::Popped)
            }
            None => Err("buffer is empty"),
        })?;
        popped.ok_or_else(|| ProtocolError::action_failed(POP, "buffer is empty"))
    }

    /// Freeze the buffer; no item can be added or removed afterwards.
    pub fn seal(&mut self) -> Result<(), ProtocolError> {
        self.instance.perform(SEAL, VecOutcome::Sealed)?;
        Ok(())
    }

    /// Retire the buffer and hand back its items with the session report.
    pub fn finish(self) -> (Vec<T>, SessionReport<VecState, VecOutcome>) {
        (self.items, SessionReport::close(self.instance))
    }

    fn remove_at(&mut self, index: usize) -> Result<T, ProtocolError> {
        let items = &mut self.items;
        let mut removed = None;
        self.instance.invoke(REMOVE, || {
            removed = Some(items.remove(index));
            Ok::<_, Infallible>(VecOutcome::Removed)
        })?;
        removed.ok_or_else(|| ProtocolError::action_failed(REMOVE, "nothing removed"))
    }
}

impl<T: PartialEq> TrackedVec<T> {
    /// Find `value`, returning a witness that can remove it.
    pub fn locate(&mut self, value: &T) -> Option<Located<'_, T>> {
        let index = self.items.iter().position(|item| item == value)?;
        Some(Located { vec: self, index })
    }
}

/// Proof that an item sits at `index` of a [`TrackedVec`].
#[derive(Debug)]
pub struct Located<'v, T> {
    vec: &'v mut TrackedVec<T>,
    index: usize,
}

impl<T> Located<'_, T> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self) -> &T {
        &self.vec.items[self.index]
    }

    /// Remove the located item without searching again.
    ///
    /// Still checked against the protocol: a sealed buffer refuses.
    pub fn remove(self) -> Result<T, ProtocolError> {
        self.vec.remove_at(self.index)
    }
}
