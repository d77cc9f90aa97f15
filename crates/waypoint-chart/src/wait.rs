//! Asynchronous wait operations
//!
//! An AsyncWait state starts an operation when it is entered. The operation
//! is a future that runs off the chart's serialized path and resolves to a
//! [`Completion`]. The completion is handed back to the chart together with
//! the [`WaitToken`] of the entry that started it, and only then touches the
//! context.

use crate::event::Event;
use crate::error::BoxError;
use crate::state::StateId;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What a finished wait asks the chart to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Take the wait state's completion transition
    Done,
    /// Deliver an event to the wait state's transition table
    Raise(Event),
}

type CompletionFn<C> = Box<dyn FnOnce(&mut C) -> Result<WaitOutcome, BoxError> + Send>;

/// Result of a wait operation, applied to the context on the chart's path
pub struct Completion<C> {
    apply: CompletionFn<C>,
}

impl<C: 'static> Completion<C> {
    /// Finish the wait without touching the context
    pub fn done() -> Self {
        Self::with(|_| Ok(WaitOutcome::Done))
    }

    /// Raise an event without touching the context
    pub fn raise(event: Event) -> Self {
        Self::with(move |_| Ok(WaitOutcome::Raise(event)))
    }

    /// Run `f` against the context, then follow its outcome
    pub fn with(
        f: impl FnOnce(&mut C) -> Result<WaitOutcome, BoxError> + Send + 'static,
    ) -> Self {
        Self { apply: Box::new(f) }
    }

    pub(crate) fn apply(self, ctx: &mut C) -> Result<WaitOutcome, BoxError> {
        (self.apply)(ctx)
    }
}

impl<C> fmt::Debug for Completion<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}

/// Future produced by a wait operation
pub type WaitFuture<C> = BoxFuture<'static, Completion<C>>;

/// Starts the operation of an AsyncWait state
///
/// Called on the chart's path with the context, so it may read whatever it
/// needs before handing the work to the returned future.
pub type WaitOp<C> = Box<dyn FnMut(&mut C) -> WaitFuture<C>>;

/// Identifies one entry into a wait state
///
/// Every entry gets a new epoch. A completion is applied only while the
/// entry that produced it is still active; anything else is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitToken {
    pub(crate) state: StateId,
    pub(crate) epoch: u64,
}

impl WaitToken {
    /// The wait state this token belongs to
    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// An operation started by entering a wait state, not yet running
pub struct PendingWait<C> {
    pub token: WaitToken,
    pub future: WaitFuture<C>,
}

impl<C> fmt::Debug for PendingWait<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWait").field("token", &self.token).finish()
    }
}

/// Wait operation that finishes after `duration`
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use waypoint_chart::{timer, Statechart};
///
/// let chart = Statechart::<()>::build("idle", |f| {
///     let start = f.initial();
///     let nap = f.wait("Nap", timer(Duration::from_secs(5)));
///     let end = f.final_state();
///     f.transition(start, nap);
///     f.on_complete(nap, end);
/// })
/// .unwrap();
/// assert_eq!(chart.name(), "idle");
/// ```
pub fn timer<C: 'static>(duration: Duration) -> impl FnMut(&mut C) -> WaitFuture<C> + 'static {
    timer_then(duration, |_| Ok(()))
}

/// Timer whose completion runs `on_elapsed` against the context first
pub fn timer_then<C: 'static, F>(
    duration: Duration,
    on_elapsed: F,
) -> impl FnMut(&mut C) -> WaitFuture<C> + 'static
where
    F: Fn(&mut C) -> Result<(), BoxError> + Clone + Send + 'static,
{
    move |_ctx: &mut C| {
        let on_elapsed = on_elapsed.clone();
        let future: WaitFuture<C> = Box::pin(async move {
            tokio::time::sleep(duration).await;
            Completion::with(move |ctx| {
                on_elapsed(ctx)?;
                Ok(WaitOutcome::Done)
            })
        });
        future
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_applies_to_context() {
        let mut hits = 0u32;
        let completion = Completion::with(|n: &mut u32| {
            *n += 1;
            Ok(WaitOutcome::Done)
        });
        assert_eq!(completion.apply(&mut hits).unwrap(), WaitOutcome::Done);
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_raise_carries_event() {
        let event = Event::new("AuthSuccess");
        let outcome = Completion::<()>::raise(event.clone()).apply(&mut ()).unwrap();
        assert_eq!(outcome, WaitOutcome::Raise(event));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_runs_hook_on_completion() {
        let mut op = timer_then(Duration::from_secs(30), |n: &mut u32| {
            *n = 7;
            Ok(())
        });
        let mut value = 0u32;
        let completion = op(&mut value).await;
        assert_eq!(value, 0);
        assert_eq!(completion.apply(&mut value).unwrap(), WaitOutcome::Done);
        assert_eq!(value, 7);
    }
}
