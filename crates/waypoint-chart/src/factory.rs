//! Declarative construction of statecharts

use crate::error::{BoxError, ChartError};
use crate::event::Event;
use crate::state::{EventTransition, Guard, Node, StateId, StateKind};
use crate::wait::WaitFuture;

/// Declares the states of one chart level and the transitions between them
///
/// Obtained from [`Statechart::build`](crate::Statechart::build) for the root
/// level and from [`nest`](Self::nest) for sub-charts. Mistakes such as an
/// event transition out of a Choice are collected and reported by `build`.
pub struct StateFactory<'a, C> {
    nodes: &'a mut Vec<Node<C>>,
    parent: Option<StateId>,
    issues: &'a mut Vec<ChartError>,
}

impl<'a, C> StateFactory<'a, C> {
    pub(crate) fn new(
        nodes: &'a mut Vec<Node<C>>,
        parent: Option<StateId>,
        issues: &'a mut Vec<ChartError>,
    ) -> Self {
        Self {
            nodes,
            parent,
            issues,
        }
    }

    fn push(&mut self, name: String, kind: StateKind) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(Node::new(name, kind, self.parent));
        id
    }

    fn node(&mut self, id: StateId) -> &mut Node<C> {
        &mut self.nodes[id.0]
    }

    fn expect_kind(&mut self, id: StateId, allowed: &[StateKind], what: &str) -> bool {
        let node = &self.nodes[id.0];
        if allowed.contains(&node.kind) {
            return true;
        }
        self.issues.push(ChartError::InvalidTransition {
            state: node.name.clone(),
            reason: format!("{:?} states cannot have {}", node.kind, what),
        });
        false
    }

    /// The Initial pseudostate of this level
    pub fn initial(&mut self) -> StateId {
        self.push("Initial".to_string(), StateKind::Initial)
    }

    /// The Final state of this level
    pub fn final_state(&mut self) -> StateId {
        self.push("Final".to_string(), StateKind::Final)
    }

    /// An ordinary state
    pub fn state(&mut self, name: impl Into<String>) -> StateId {
        self.push(name.into(), StateKind::Simple)
    }

    /// A Choice pseudostate; give it guards with [`condition`](Self::condition)
    /// and exactly one [`fallback`](Self::fallback)
    pub fn choice(&mut self, name: impl Into<String>) -> StateId {
        self.push(name.into(), StateKind::Choice)
    }

    /// An AsyncWait state that calls `op` on every entry
    pub fn wait(
        &mut self,
        name: impl Into<String>,
        op: impl FnMut(&mut C) -> WaitFuture<C> + 'static,
    ) -> StateId {
        let id = self.push(name.into(), StateKind::AsyncWait);
        self.node(id).wait = Some(Box::new(op));
        id
    }

    /// A Nested state whose sub-chart is declared by `define`
    pub fn nest(
        &mut self,
        name: impl Into<String>,
        define: impl FnOnce(&mut StateFactory<'_, C>),
    ) -> StateId {
        let id = self.push(name.into(), StateKind::Nested);
        let mut sub = StateFactory::new(&mut *self.nodes, Some(id), &mut *self.issues);
        define(&mut sub);
        id
    }

    /// The unconditional transition out of an Initial state
    pub fn transition(&mut self, from: StateId, to: StateId) -> &mut Self {
        if self.expect_kind(from, &[StateKind::Initial], "unconditional transitions") {
            self.node(from).next.push(to);
        }
        self
    }

    /// Move to `to` when `event` reaches `from` while it is the active leaf
    pub fn event(&mut self, from: StateId, event: &Event, to: StateId) -> &mut Self {
        if self.expect_kind(
            from,
            &[StateKind::Simple, StateKind::AsyncWait],
            "event transitions",
        ) {
            self.node(from).events.push(EventTransition {
                event: event.id(),
                target: to,
            });
        }
        self
    }

    /// A guarded branch of a Choice, tried in declaration order
    pub fn condition(
        &mut self,
        choice: StateId,
        guard: impl Fn(&C) -> bool + 'static,
        to: StateId,
    ) -> &mut Self {
        if self.expect_kind(choice, &[StateKind::Choice], "guarded transitions") {
            let guard: Guard<C> = Box::new(guard);
            self.node(choice).conditions.push((guard, to));
        }
        self
    }

    /// The branch a Choice takes when no guard holds
    pub fn fallback(&mut self, choice: StateId, to: StateId) -> &mut Self {
        if self.expect_kind(choice, &[StateKind::Choice], "a fallback") {
            let node = self.node(choice);
            if node.fallback.is_some() {
                let state = node.name.clone();
                self.issues.push(ChartError::InvalidTransition {
                    state,
                    reason: "more than one fallback".to_string(),
                });
            } else {
                node.fallback = Some(to);
            }
        }
        self
    }

    /// Where to go when a Nested state's sub-chart reaches Final, or when a
    /// wait finishes with [`WaitOutcome::Done`](crate::WaitOutcome::Done)
    pub fn on_complete(&mut self, state: StateId, to: StateId) -> &mut Self {
        if self.expect_kind(
            state,
            &[StateKind::Nested, StateKind::AsyncWait],
            "a completion transition",
        ) {
            self.node(state).completion = Some(to);
        }
        self
    }

    /// Run `action` every time `state` is entered
    pub fn on_enter(
        &mut self,
        state: StateId,
        action: impl FnMut(&mut C) -> Result<(), BoxError> + 'static,
    ) -> &mut Self {
        self.node(state).entry.push(Box::new(action));
        self
    }

    /// Run `action` every time `state` is exited
    pub fn on_exit(
        &mut self,
        state: StateId,
        action: impl FnMut(&mut C) -> Result<(), BoxError> + 'static,
    ) -> &mut Self {
        self.node(state).exit.push(Box::new(action));
        self
    }
}

/// Check every level of a freshly built chart
///
/// Fills in the initial child of each Nested state and returns the root
/// Initial.
pub(crate) fn validate<C>(chart: &str, nodes: &mut [Node<C>]) -> Result<StateId, ChartError> {
    let root_initial = level_initial(chart, None, nodes)?;

    for index in 0..nodes.len() {
        let id = StateId(index);
        let node = &nodes[index];
        let name = node.name.clone();
        let kind = node.kind;

        if kind.is_pseudostate() && node.targets().any(|target| target == id) {
            return Err(ChartError::SelfTargetingPseudostate { state: name });
        }

        match kind {
            StateKind::Initial if node.next.len() != 1 => {
                return Err(ChartError::InitialWithoutTransition { state: name });
            }
            StateKind::Choice if node.fallback.is_none() => {
                return Err(ChartError::ChoiceWithoutFallback { state: name });
            }
            StateKind::AsyncWait if node.wait.is_none() => {
                return Err(ChartError::WaitWithoutOperation { state: name });
            }
            StateKind::Final if node.targets().next().is_some() => {
                return Err(ChartError::InvalidTransition {
                    state: name,
                    reason: "Final states cannot have transitions".to_string(),
                });
            }
            StateKind::Nested => {
                let has_children = nodes.iter().any(|n| n.parent == Some(id));
                if !has_children {
                    return Err(ChartError::NestedWithoutSubchart { state: name });
                }
                let has_final = nodes
                    .iter()
                    .any(|n| n.parent == Some(id) && n.kind == StateKind::Final);
                match (has_final, nodes[index].completion.is_some()) {
                    (true, false) => {
                        return Err(ChartError::UnreachableCompletion {
                            state: name,
                            reason: "sub-chart reaches Final but nothing follows".to_string(),
                        });
                    }
                    (false, true) => {
                        return Err(ChartError::UnreachableCompletion {
                            state: name,
                            reason: "sub-chart has no Final state".to_string(),
                        });
                    }
                    _ => {}
                }
                let initial = level_initial(&name, Some(id), nodes)?;
                nodes[index].initial_child = Some(initial);
            }
            _ => {}
        }
    }

    Ok(root_initial)
}

fn level_initial<C>(
    level: &str,
    parent: Option<StateId>,
    nodes: &[Node<C>],
) -> Result<StateId, ChartError> {
    let mut initials = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.parent == parent && n.kind == StateKind::Initial)
        .map(|(index, _)| StateId(index));

    match (initials.next(), initials.next()) {
        (Some(initial), None) => Ok(initial),
        (None, _) => Err(ChartError::MissingInitial {
            level: level.to_string(),
        }),
        (Some(_), Some(_)) => Err(ChartError::MultipleInitial {
            level: level.to_string(),
        }),
    }
}
