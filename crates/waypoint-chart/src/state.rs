//! Statechart nodes

use crate::error::BoxError;
use crate::event::EventId;
use crate::wait::WaitOp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a state within its chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state:{}", self.0)
    }
}

/// The kind of a statechart node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Entry pseudostate, left immediately through its only transition
    Initial,
    /// Reaching it completes the enclosing level
    Final,
    /// Ordinary state that waits for events
    Simple,
    /// Contains its own sub-chart
    Nested,
    /// Pseudostate that picks a transition by evaluating guards
    Choice,
    /// Starts an asynchronous operation and waits for its completion
    AsyncWait,
}

impl StateKind {
    /// Whether the state is left as soon as it is entered
    pub fn is_pseudostate(&self) -> bool {
        matches!(self, StateKind::Initial | StateKind::Choice)
    }
}

pub(crate) type Action<C> = Box<dyn FnMut(&mut C) -> Result<(), BoxError>>;
pub(crate) type Guard<C> = Box<dyn Fn(&C) -> bool>;

/// A transition triggered by an event
pub(crate) struct EventTransition {
    pub event: EventId,
    pub target: StateId,
}

pub(crate) struct Node<C> {
    pub name: String,
    pub kind: StateKind,
    pub parent: Option<StateId>,
    pub entry: Vec<Action<C>>,
    pub exit: Vec<Action<C>>,
    pub events: Vec<EventTransition>,
    /// Choice guards, evaluated in declaration order
    pub conditions: Vec<(Guard<C>, StateId)>,
    pub fallback: Option<StateId>,
    /// Unconditional transitions (only Initial may have one)
    pub next: Vec<StateId>,
    /// Taken when a Nested child reaches Final or a wait finishes
    pub completion: Option<StateId>,
    pub wait: Option<WaitOp<C>>,
    /// Initial child of a Nested state
    pub initial_child: Option<StateId>,
}

impl<C> Node<C> {
    pub(crate) fn new(name: String, kind: StateKind, parent: Option<StateId>) -> Self {
        Self {
            name,
            kind,
            parent,
            entry: Vec::new(),
            exit: Vec::new(),
            events: Vec::new(),
            conditions: Vec::new(),
            fallback: None,
            next: Vec::new(),
            completion: None,
            wait: None,
            initial_child: None,
        }
    }

    /// Every state this node may transition to
    pub(crate) fn targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.events
            .iter()
            .map(|t| t.target)
            .chain(self.conditions.iter().map(|(_, target)| *target))
            .chain(self.fallback)
            .chain(self.next.iter().copied())
            .chain(self.completion)
    }
}
