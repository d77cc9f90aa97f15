//! The statechart runtime

use crate::error::{ChartError, Result};
use crate::event::Event;
use crate::factory::{validate, StateFactory};
use crate::journal::{Cause, Journal, JournalConfig};
use crate::state::{Node, StateId, StateKind};
use crate::wait::{Completion, PendingWait, WaitOutcome, WaitToken};
use std::collections::{HashMap, HashSet};

/// What happened to an input delivered to the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The input caused a transition
    Transitioned,
    /// Nothing handled the input; the chart did not change
    Dropped,
}

/// A pending transition: leave `source`, enter `target`
struct Step {
    source: StateId,
    target: StateId,
    cause: Cause,
}

/// A hierarchical statechart over a context `C`
///
/// Built once with [`Statechart::build`] and never changed afterwards. The
/// chart owns no context: every operation borrows it, so whoever drives the
/// chart decides where the context lives.
///
/// Inputs are handled one at a time and each one runs to completion,
/// including any chain of pseudostates, nested entries and completions it
/// triggers, before the call returns.
pub struct Statechart<C> {
    name: String,
    nodes: Vec<Node<C>>,
    root_initial: StateId,
    /// Active states from the root level down to the leaf
    active: Vec<StateId>,
    started: bool,
    complete: bool,
    next_epoch: u64,
    wait_epochs: HashMap<StateId, u64>,
    pending: Vec<PendingWait<C>>,
    journal: Journal,
}

impl<C: 'static> Statechart<C> {
    /// Build and validate a chart
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint_chart::{Delivery, Event, Statechart};
    ///
    /// let toggle = Event::new("Toggle");
    /// let mut chart = Statechart::<u32>::build("switch", |f| {
    ///     let start = f.initial();
    ///     let off = f.state("Off");
    ///     let on = f.state("On");
    ///     f.transition(start, off);
    ///     f.event(off, &toggle, on);
    ///     f.event(on, &toggle, off);
    ///     f.on_enter(on, |flips: &mut u32| {
    ///         *flips += 1;
    ///         Ok(())
    ///     });
    /// })
    /// .unwrap();
    ///
    /// let mut flips = 0;
    /// chart.start(&mut flips).unwrap();
    /// assert_eq!(chart.trigger(&mut flips, &toggle).unwrap(), Delivery::Transitioned);
    /// assert_eq!(chart.active_path(), vec!["On"]);
    /// assert_eq!(flips, 1);
    /// ```
    pub fn build(
        name: impl Into<String>,
        define: impl FnOnce(&mut StateFactory<'_, C>),
    ) -> Result<Self> {
        let name = name.into();
        let mut nodes = Vec::new();
        let mut issues = Vec::new();
        define(&mut StateFactory::new(&mut nodes, None, &mut issues));

        if let Some(issue) = issues.into_iter().next() {
            return Err(issue);
        }
        let root_initial = validate(&name, &mut nodes)?;
        tracing::debug!(chart = %name, states = nodes.len(), "statechart built");

        Ok(Self {
            name,
            nodes,
            root_initial,
            active: Vec::new(),
            started: false,
            complete: false,
            next_epoch: 0,
            wait_epochs: HashMap::new(),
            pending: Vec::new(),
            journal: Journal::new(),
        })
    }

    /// Replace the journal configuration, discarding recorded entries
    pub fn with_journal(mut self, config: JournalConfig) -> Self {
        self.journal = Journal::with_config(config);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the root level reached its Final state
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Names of the active states, outermost first
    pub fn active_path(&self) -> Vec<&str> {
        self.active
            .iter()
            .map(|id| self.nodes[id.0].name.as_str())
            .collect()
    }

    /// The innermost active state
    pub fn active_leaf(&self) -> Option<StateId> {
        self.active.last().copied()
    }

    /// Whether a state with this name is on the active path
    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|id| self.nodes[id.0].name == name)
    }

    /// Name and kind of a state
    pub fn state(&self, id: StateId) -> Option<(&str, StateKind)> {
        self.nodes.get(id.0).map(|n| (n.name.as_str(), n.kind))
    }

    /// Enter the root Initial state and settle
    pub fn start(&mut self, ctx: &mut C) -> Result<()> {
        if self.started {
            return Err(ChartError::AlreadyStarted(self.name.clone()));
        }
        self.started = true;
        tracing::info!(chart = %self.name, "statechart started");

        let next = self.enter_and_settle(ctx, self.root_initial)?;
        self.follow(ctx, next)
    }

    /// Deliver an event to the active leaf
    ///
    /// Only the leaf's own transitions are considered. An event it does not
    /// handle is dropped and the chart stays where it is.
    pub fn trigger(&mut self, ctx: &mut C, event: &Event) -> Result<Delivery> {
        let Some(leaf) = self.active_leaf().filter(|_| !self.complete) else {
            tracing::debug!(chart = %self.name, %event, "event dropped, chart not running");
            return Ok(Delivery::Dropped);
        };

        let target = self.nodes[leaf.0]
            .events
            .iter()
            .find(|t| t.event == event.id())
            .map(|t| t.target);

        match target {
            Some(target) => {
                tracing::debug!(chart = %self.name, %event, "event accepted");
                self.follow(
                    ctx,
                    Some(Step {
                        source: leaf,
                        target,
                        cause: Cause::Event(event.name().to_string()),
                    }),
                )?;
                Ok(Delivery::Transitioned)
            }
            None => {
                let state = self.qualified_name(leaf);
                tracing::debug!(chart = %self.name, %event, %state, "event dropped");
                self.journal.dropped(event.name().to_string(), state);
                Ok(Delivery::Dropped)
            }
        }
    }

    /// Apply the completion of a wait operation
    ///
    /// Completions whose token does not match the current entry of their
    /// wait state are discarded without touching the context.
    pub fn complete_wait(
        &mut self,
        ctx: &mut C,
        token: WaitToken,
        completion: Completion<C>,
    ) -> Result<Delivery> {
        if !self.is_wait_current(token) {
            let state = self.qualified_name(token.state);
            tracing::debug!(
                chart = %self.name,
                %state,
                epoch = token.epoch,
                "stale wait completion discarded"
            );
            self.journal.stale(state);
            return Ok(Delivery::Dropped);
        }
        self.wait_epochs.remove(&token.state);

        let outcome = completion
            .apply(ctx)
            .map_err(|e| ChartError::action(&self.nodes[token.state.0].name, e))?;

        match outcome {
            WaitOutcome::Raise(event) => self.trigger(ctx, &event),
            WaitOutcome::Done => match self.nodes[token.state.0].completion {
                Some(target) => {
                    self.follow(
                        ctx,
                        Some(Step {
                            source: token.state,
                            target,
                            cause: Cause::WaitDone,
                        }),
                    )?;
                    Ok(Delivery::Transitioned)
                }
                None => {
                    tracing::warn!(
                        chart = %self.name,
                        state = %self.nodes[token.state.0].name,
                        "wait finished but has no completion transition"
                    );
                    Ok(Delivery::Dropped)
                }
            },
        }
    }

    /// Whether `token` belongs to the wait entry that is still active
    pub fn is_wait_current(&self, token: WaitToken) -> bool {
        self.wait_epochs.get(&token.state) == Some(&token.epoch)
            && self.active_leaf() == Some(token.state)
    }

    /// Take the operations started by wait states entered since the last call
    pub fn take_pending_waits(&mut self) -> Vec<PendingWait<C>> {
        std::mem::take(&mut self.pending)
    }

    fn follow(&mut self, ctx: &mut C, mut next: Option<Step>) -> Result<()> {
        while let Some(step) = next {
            next = self.take(ctx, step)?;
        }
        Ok(())
    }

    fn take(&mut self, ctx: &mut C, step: Step) -> Result<Option<Step>> {
        let ancestor = self.common_ancestor(step.source, step.target);

        while let Some(&top) = self.active.last() {
            if Some(top) == ancestor {
                break;
            }
            self.exit_state(ctx, top)?;
        }

        let from = self.qualified_name(step.source);
        let to = self.qualified_name(step.target);
        tracing::debug!(chart = %self.name, %from, %to, cause = ?step.cause, "transition");
        self.journal.transition(from, to, step.cause);

        let mut chain = Vec::new();
        let mut cursor = self.nodes[step.target.0].parent;
        while let Some(state) = cursor {
            if Some(state) == ancestor {
                break;
            }
            chain.push(state);
            cursor = self.nodes[state.0].parent;
        }
        for state in chain.into_iter().rev() {
            self.enter_state(ctx, state)?;
        }

        self.enter_and_settle(ctx, step.target)
    }

    /// Enter `state`, descend into nested Initials and report what follows
    fn enter_and_settle(&mut self, ctx: &mut C, state: StateId) -> Result<Option<Step>> {
        let mut current = state;
        loop {
            self.enter_state(ctx, current)?;
            let node = &self.nodes[current.0];

            return match node.kind {
                StateKind::Nested => match node.initial_child {
                    Some(child) => {
                        current = child;
                        continue;
                    }
                    None => Ok(None),
                },
                StateKind::Initial => Ok(node.next.first().map(|&target| Step {
                    source: current,
                    target,
                    cause: Cause::Initial,
                })),
                StateKind::Choice => {
                    let target = node
                        .conditions
                        .iter()
                        .find(|(guard, _)| guard(&*ctx))
                        .map(|(_, target)| *target)
                        .or(node.fallback);
                    Ok(target.map(|target| Step {
                        source: current,
                        target,
                        cause: Cause::Choice,
                    }))
                }
                StateKind::Final => match node.parent {
                    Some(parent) => Ok(self.nodes[parent.0].completion.map(|target| Step {
                        source: parent,
                        target,
                        cause: Cause::Completion,
                    })),
                    None => {
                        self.complete = true;
                        self.journal.completed();
                        tracing::info!(chart = %self.name, "statechart completed");
                        Ok(None)
                    }
                },
                StateKind::AsyncWait => {
                    self.start_wait(ctx, current);
                    Ok(None)
                }
                StateKind::Simple => Ok(None),
            };
        }
    }

    fn enter_state(&mut self, ctx: &mut C, state: StateId) -> Result<()> {
        self.active.push(state);
        let qualified = self.qualified_name(state);
        tracing::debug!(chart = %self.name, state = %qualified, "enter");
        self.journal.entered(qualified);

        let node = &mut self.nodes[state.0];
        for action in node.entry.iter_mut() {
            action(&mut *ctx).map_err(|e| ChartError::action(&node.name, e))?;
        }
        Ok(())
    }

    fn exit_state(&mut self, ctx: &mut C, state: StateId) -> Result<()> {
        self.active.pop();
        self.wait_epochs.remove(&state);
        let qualified = self.qualified_name(state);
        tracing::debug!(chart = %self.name, state = %qualified, "exit");
        self.journal.exited(qualified);

        let node = &mut self.nodes[state.0];
        for action in node.exit.iter_mut() {
            action(&mut *ctx).map_err(|e| ChartError::action(&node.name, e))?;
        }
        Ok(())
    }

    fn start_wait(&mut self, ctx: &mut C, state: StateId) {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        self.wait_epochs.insert(state, epoch);

        if let Some(op) = self.nodes[state.0].wait.as_mut() {
            let future = op(ctx);
            self.pending.push(PendingWait {
                token: WaitToken { state, epoch },
                future,
            });
        }
    }

    /// Deepest state that is a proper ancestor of both `a` and `b`
    ///
    /// `None` is the chart's root level.
    fn common_ancestor(&self, a: StateId, b: StateId) -> Option<StateId> {
        let mut ancestors_of_a = HashSet::new();
        let mut cursor = self.nodes[a.0].parent;
        while let Some(state) = cursor {
            ancestors_of_a.insert(state);
            cursor = self.nodes[state.0].parent;
        }

        let mut cursor = self.nodes[b.0].parent;
        while let Some(state) = cursor {
            if ancestors_of_a.contains(&state) {
                return Some(state);
            }
            cursor = self.nodes[state.0].parent;
        }
        None
    }

    fn qualified_name(&self, state: StateId) -> String {
        let mut names = vec![self.nodes[state.0].name.as_str()];
        let mut cursor = self.nodes[state.0].parent;
        while let Some(parent) = cursor {
            names.push(self.nodes[parent.0].name.as_str());
            cursor = self.nodes[parent.0].parent;
        }
        names.reverse();
        names.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::WaitFuture;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Trace {
        log: Vec<String>,
        ready: bool,
    }

    impl Trace {
        fn note(&mut self, what: &str) {
            self.log.push(what.to_string());
        }
    }

    fn noting(what: &'static str) -> impl FnMut(&mut Trace) -> std::result::Result<(), crate::BoxError> {
        move |t: &mut Trace| {
            t.note(what);
            Ok(())
        }
    }

    fn done_op() -> impl FnMut(&mut Trace) -> WaitFuture<Trace> {
        |_: &mut Trace| {
            let future: WaitFuture<Trace> = Box::pin(async { Completion::done() });
            future
        }
    }

    #[test]
    fn test_nested_entry_and_exit_order() {
        let next = Event::new("Next");
        let mut chart = Statechart::<Trace>::build("order", |f| {
            let start = f.initial();
            let outer = f.nest("Outer", |sub| {
                let start = sub.initial();
                let inner = sub.state("Inner");
                sub.transition(start, inner);
                sub.on_enter(inner, noting("enter Inner"));
                sub.on_exit(inner, noting("exit Inner"));
            });
            let after = f.state("After");
            f.transition(start, outer);
            f.on_enter(outer, noting("enter Outer"));
            f.on_exit(outer, noting("exit Outer"));
            f.on_enter(after, noting("enter After"));
            f.event(after, &next, after);
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        assert_eq!(chart.active_path(), vec!["Outer", "Inner"]);
        assert_eq!(trace.log, vec!["enter Outer", "enter Inner"]);

        // Inner has no transition for Next, so it is dropped even though
        // After handles it
        assert_eq!(chart.trigger(&mut trace, &next).unwrap(), Delivery::Dropped);
        assert_eq!(chart.active_path(), vec!["Outer", "Inner"]);
    }

    #[test]
    fn test_completion_exits_from_leaf_up() {
        let finish = Event::new("Finish");
        let mut chart = Statechart::<Trace>::build("completion", |f| {
            let start = f.initial();
            let phase = f.nest("Phase", |sub| {
                let start = sub.initial();
                let work = sub.state("Work");
                let end = sub.final_state();
                sub.transition(start, work);
                sub.event(work, &finish, end);
                sub.on_exit(work, noting("exit Work"));
                sub.on_enter(end, noting("enter Phase/Final"));
                sub.on_exit(end, noting("exit Phase/Final"));
            });
            let end = f.final_state();
            f.transition(start, phase);
            f.on_complete(phase, end);
            f.on_exit(phase, noting("exit Phase"));
            f.on_enter(end, noting("enter Final"));
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        chart.trigger(&mut trace, &finish).unwrap();

        assert!(chart.is_complete());
        assert_eq!(
            trace.log,
            vec![
                "exit Work",
                "enter Phase/Final",
                "exit Phase/Final",
                "exit Phase",
                "enter Final"
            ]
        );
    }

    #[test]
    fn test_choice_takes_first_true_guard() {
        let mut chart = Statechart::<Trace>::build("choice", |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let ready = f.state("Ready");
            let also_ready = f.state("AlsoReady");
            let waiting = f.state("Waiting");
            f.transition(start, check);
            f.condition(check, |t: &Trace| t.ready, ready);
            f.condition(check, |t: &Trace| t.ready, also_ready);
            f.fallback(check, waiting);
        })
        .unwrap();

        let mut trace = Trace {
            ready: true,
            ..Trace::default()
        };
        chart.start(&mut trace).unwrap();
        assert_eq!(chart.active_path(), vec!["Ready"]);
    }

    #[test]
    fn test_choice_fallback_taken_exactly_once() {
        let evaluations = Rc::new(Cell::new(0));
        let counter = evaluations.clone();
        let mut chart = Statechart::<Trace>::build("fallback", move |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let ready = f.state("Ready");
            let waiting = f.state("Waiting");
            f.transition(start, check);
            f.condition(
                check,
                move |_: &Trace| {
                    counter.set(counter.get() + 1);
                    false
                },
                ready,
            );
            f.fallback(check, waiting);
            f.on_enter(waiting, noting("enter Waiting"));
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        assert_eq!(chart.active_path(), vec!["Waiting"]);
        assert_eq!(evaluations.get(), 1);
        assert_eq!(trace.log, vec!["enter Waiting"]);
    }

    #[test]
    fn test_choice_runs_entry_before_guards() {
        let mut chart = Statechart::<Trace>::build("entry-first", |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let ready = f.state("Ready");
            let waiting = f.state("Waiting");
            f.transition(start, check);
            f.on_enter(check, |t: &mut Trace| {
                t.ready = true;
                Ok(())
            });
            f.condition(check, |t: &Trace| t.ready, ready);
            f.fallback(check, waiting);
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        assert_eq!(chart.active_path(), vec!["Ready"]);
    }

    #[test]
    fn test_wait_completion_and_stale_token() {
        let cancel = Event::new("Cancel");
        let mut chart = Statechart::<Trace>::build("wait", |f| {
            let start = f.initial();
            let loading = f.wait("Loading", done_op());
            let idle = f.state("Idle");
            let loaded = f.state("Loaded");
            f.transition(start, loading);
            f.on_complete(loading, loaded);
            f.event(loading, &cancel, idle);
        })
        .unwrap()
        .with_journal(JournalConfig {
            recording_enabled: true,
            max_entries: 0,
        });

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        let mut waits = chart.take_pending_waits();
        assert_eq!(waits.len(), 1);
        let pending = waits.remove(0);

        chart.trigger(&mut trace, &cancel).unwrap();
        assert_eq!(chart.active_path(), vec!["Idle"]);

        let completion = block_on(pending.future);
        let delivery = chart
            .complete_wait(&mut trace, pending.token, completion)
            .unwrap();
        assert_eq!(delivery, Delivery::Dropped);
        assert_eq!(chart.active_path(), vec!["Idle"]);
        assert_eq!(chart.journal().stats().stale_count, 1);
    }

    #[test]
    fn test_reentered_wait_rejects_previous_token() {
        let retry = Event::new("Retry");
        let mut chart = Statechart::<Trace>::build("reenter", |f| {
            let start = f.initial();
            let loading = f.wait("Loading", done_op());
            let loaded = f.state("Loaded");
            f.transition(start, loading);
            f.on_complete(loading, loaded);
            f.event(loading, &retry, loading);
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        let first = chart.take_pending_waits().remove(0);
        chart.trigger(&mut trace, &retry).unwrap();
        let second = chart.take_pending_waits().remove(0);
        assert_ne!(first.token, second.token);
        assert!(!chart.is_wait_current(first.token));
        assert!(chart.is_wait_current(second.token));

        let stale = block_on(first.future);
        assert_eq!(
            chart.complete_wait(&mut trace, first.token, stale).unwrap(),
            Delivery::Dropped
        );
        let fresh = block_on(second.future);
        assert_eq!(
            chart.complete_wait(&mut trace, second.token, fresh).unwrap(),
            Delivery::Transitioned
        );
        assert_eq!(chart.active_path(), vec!["Loaded"]);
    }

    #[test]
    fn test_wait_can_raise_event() {
        let ok = Event::new("Ok");
        let raised = ok.clone();
        let mut chart = Statechart::<Trace>::build("raise", move |f| {
            let start = f.initial();
            let auth = f.wait("Auth", move |_: &mut Trace| {
                let event = raised.clone();
                let future: WaitFuture<Trace> = Box::pin(async move {
                    Completion::with(move |t: &mut Trace| {
                        t.note("authenticated");
                        Ok(WaitOutcome::Raise(event))
                    })
                });
                future
            });
            let home = f.state("Home");
            f.transition(start, auth);
            f.event(auth, &ok, home);
        })
        .unwrap();

        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        let pending = chart.take_pending_waits().remove(0);
        let completion = block_on(pending.future);
        chart
            .complete_wait(&mut trace, pending.token, completion)
            .unwrap();

        assert_eq!(chart.active_path(), vec!["Home"]);
        assert_eq!(trace.log, vec!["authenticated"]);
    }

    #[test]
    fn test_failing_action_is_reported() {
        let mut chart = Statechart::<Trace>::build("failing", |f| {
            let start = f.initial();
            let broken = f.state("Broken");
            f.transition(start, broken);
            f.on_enter(broken, |_: &mut Trace| Err("disk on fire".into()));
        })
        .unwrap();

        match chart.start(&mut Trace::default()) {
            Err(ChartError::Action { state, source }) => {
                assert_eq!(state, "Broken");
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_same_inputs_same_journal() {
        fn run() -> (Vec<String>, crate::Journal) {
            let go = Event::new("Go");
            let back = Event::new("Back");
            let mut chart = Statechart::<Trace>::build("replay", |f| {
                let start = f.initial();
                let a = f.state("A");
                let b = f.nest("B", |sub| {
                    let start = sub.initial();
                    let inner = sub.state("Inner");
                    sub.transition(start, inner);
                    sub.event(inner, &back, inner);
                });
                f.transition(start, a);
                f.event(a, &go, b);
            })
            .unwrap()
            .with_journal(JournalConfig {
                recording_enabled: true,
                max_entries: 0,
            });

            let mut trace = Trace::default();
            chart.start(&mut trace).unwrap();
            for event in [&go, &back, &go, &back] {
                chart.trigger(&mut trace, event).unwrap();
            }
            let path = chart.active_path().iter().map(|s| s.to_string()).collect();
            (path, chart.journal().clone())
        }

        let (first_path, first) = run();
        let (second_path, second) = run();
        assert_eq!(first_path, second_path);
        assert_eq!(first.entries(), second.entries());
        assert_eq!(first.stats().dropped_count, 1);
        assert!(first.was_entered("B/Inner"));
    }

    #[test]
    fn test_start_twice_fails() {
        let mut chart = Statechart::<Trace>::build("once", |f| {
            let start = f.initial();
            let idle = f.state("Idle");
            f.transition(start, idle);
        })
        .unwrap();
        let mut trace = Trace::default();
        chart.start(&mut trace).unwrap();
        assert!(matches!(
            chart.start(&mut trace),
            Err(ChartError::AlreadyStarted(_))
        ));
    }

    #[test]
    fn test_build_errors() {
        let missing = Statechart::<Trace>::build("empty", |f| {
            f.state("Lonely");
        });
        assert!(matches!(missing, Err(ChartError::MissingInitial { .. })));

        let two = Statechart::<Trace>::build("two", |f| {
            let a = f.initial();
            let b = f.initial();
            let s = f.state("S");
            f.transition(a, s);
            f.transition(b, s);
        });
        assert!(matches!(two, Err(ChartError::MultipleInitial { .. })));

        let dangling = Statechart::<Trace>::build("dangling", |f| {
            f.initial();
        });
        assert!(matches!(
            dangling,
            Err(ChartError::InitialWithoutTransition { .. })
        ));

        let no_fallback = Statechart::<Trace>::build("no-fallback", |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let s = f.state("S");
            f.transition(start, check);
            f.condition(check, |_: &Trace| true, s);
        });
        assert!(matches!(
            no_fallback,
            Err(ChartError::ChoiceWithoutFallback { .. })
        ));

        let hollow = Statechart::<Trace>::build("hollow", |f| {
            let start = f.initial();
            let nest = f.nest("Hollow", |_| {});
            f.transition(start, nest);
        });
        assert!(matches!(
            hollow,
            Err(ChartError::NestedWithoutSubchart { .. })
        ));

        let looping = Statechart::<Trace>::build("looping", |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let s = f.state("S");
            f.transition(start, check);
            f.condition(check, |_: &Trace| true, check);
            f.fallback(check, s);
        });
        assert!(matches!(
            looping,
            Err(ChartError::SelfTargetingPseudostate { .. })
        ));

        let orphaned = Statechart::<Trace>::build("orphaned", |f| {
            let start = f.initial();
            let phase = f.nest("Phase", |sub| {
                let start = sub.initial();
                let end = sub.final_state();
                sub.transition(start, end);
            });
            f.transition(start, phase);
        });
        assert!(matches!(
            orphaned,
            Err(ChartError::UnreachableCompletion { .. })
        ));

        let misplaced = Statechart::<Trace>::build("misplaced", |f| {
            let start = f.initial();
            let check = f.choice("Check");
            let s = f.state("S");
            f.transition(start, check);
            f.event(check, &Event::new("Nope"), s);
            f.fallback(check, s);
        });
        let err = misplaced.err().unwrap();
        assert!(matches!(err, ChartError::InvalidTransition { .. }));
        assert!(err.is_build_error());
    }
}
