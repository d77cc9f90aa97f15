//! Serialized tokio driver for a statechart

use crate::chart::Statechart;
use crate::error::{BoxError, ChartError, Result};
use crate::event::Event;
use crate::wait::{Completion, PendingWait, WaitToken};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError, JoinSet};

type CallFn<C> = Box<dyn FnOnce(&mut C) -> std::result::Result<(), BoxError> + Send>;

/// An input waiting to be processed by the driver
pub enum ChartInput<C> {
    /// Deliver an event to the active leaf
    Event(Event),
    /// Run a closure against the context between two inputs
    Call(CallFn<C>),
}

/// Cloneable sender for a running [`ChartDriver`]
///
/// Sending never blocks and never waits for the input to be processed.
/// Once every handle is dropped the driver stops as soon as no wait
/// operation is left to finish.
pub struct ChartHandle<C> {
    tx: mpsc::UnboundedSender<ChartInput<C>>,
}

impl<C: 'static> ChartHandle<C> {
    /// Queue an event
    pub fn send(&self, event: &Event) -> Result<()> {
        self.tx
            .send(ChartInput::Event(event.clone()))
            .map_err(|_| ChartError::DriverClosed)
    }

    /// Queue a closure to run against the context
    ///
    /// An error returned by the closure stops the driver.
    pub fn call(
        &self,
        f: impl FnOnce(&mut C) -> std::result::Result<(), BoxError> + Send + 'static,
    ) -> Result<()> {
        self.tx
            .send(ChartInput::Call(Box::new(f)))
            .map_err(|_| ChartError::DriverClosed)
    }

    /// Whether the driver has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<C> Clone for ChartHandle<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// What the driver hands back once the chart completes
pub struct Completed<C> {
    pub context: C,
    pub chart: Statechart<C>,
}

/// Owns a chart and its context and feeds them one input at a time
///
/// Events and queued calls from [`ChartHandle`]s arrive through a single
/// unbounded channel and are processed in arrival order. Wait operations run
/// as tokio tasks owned by the driver; their completions are applied on the
/// same path, between two inputs. Leaving a wait state aborts its task.
///
/// The context never leaves the task that awaits [`run`](Self::run), so it
/// does not need to be `Send`.
pub struct ChartDriver<C> {
    chart: Statechart<C>,
    context: C,
    tx: mpsc::UnboundedSender<ChartInput<C>>,
    rx: mpsc::UnboundedReceiver<ChartInput<C>>,
}

impl<C: 'static> ChartDriver<C> {
    pub fn new(chart: Statechart<C>, context: C) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            chart,
            context,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ChartHandle<C> {
        ChartHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn chart(&self) -> &Statechart<C> {
        &self.chart
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Start the chart and process inputs until it completes
    ///
    /// Returns the first error raised by an action, guard, completion or
    /// queued call; the chart is left where the failure happened. Returns
    /// [`ChartError::DriverClosed`] when every handle is gone and no wait
    /// is running, since nothing could move the chart any more.
    pub async fn run(self) -> Result<Completed<C>> {
        let ChartDriver {
            mut chart,
            mut context,
            tx,
            mut rx,
        } = self;
        // Handles are the only senders from here on
        drop(tx);

        let mut waits = Waits::new();
        let mut inputs_open = true;
        chart.start(&mut context)?;
        waits.spawn_pending(&mut chart);

        while !chart.is_complete() {
            if !inputs_open && waits.is_empty() {
                tracing::warn!(
                    chart = %chart.name(),
                    state = %chart.active_path().join("/"),
                    "every handle dropped, chart cannot move"
                );
                return Err(ChartError::DriverClosed);
            }

            tokio::select! {
                biased;
                input = rx.recv(), if inputs_open => match input {
                    Some(input) => process(&mut chart, &mut context, input)?,
                    None => inputs_open = false,
                },
                finished = waits.next(), if !waits.is_empty() => match finished {
                    Ok(Some((token, completion))) => {
                        chart.complete_wait(&mut context, token, completion)?;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        return Err(ChartError::Action {
                            state: chart.active_path().join("/"),
                            source: Box::new(err),
                        });
                    }
                },
            }

            waits.abort_exited(&chart);
            waits.spawn_pending(&mut chart);
        }

        tracing::debug!(chart = %chart.name(), "driver finished");
        Ok(Completed { context, chart })
    }
}

fn process<C: 'static>(
    chart: &mut Statechart<C>,
    context: &mut C,
    input: ChartInput<C>,
) -> Result<()> {
    match input {
        ChartInput::Event(event) => {
            chart.trigger(context, &event)?;
        }
        ChartInput::Call(f) => {
            f(context).map_err(|source| ChartError::Action {
                state: chart.active_path().join("/"),
                source,
            })?;
        }
    }
    Ok(())
}

/// Wait operations running for the current chart entries
struct Waits<C> {
    tasks: JoinSet<(WaitToken, Completion<C>)>,
    running: HashMap<WaitToken, AbortHandle>,
}

impl<C: 'static> Waits<C> {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            running: HashMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn spawn_pending(&mut self, chart: &mut Statechart<C>) {
        for PendingWait { token, future } in chart.take_pending_waits() {
            let task = self.tasks.spawn(async move { (token, future.await) });
            self.running.insert(token, task);
        }
    }

    /// Abort the operations of wait entries the chart has left
    fn abort_exited(&mut self, chart: &Statechart<C>) {
        self.running.retain(|token, task| {
            let current = chart.is_wait_current(*token);
            if !current {
                tracing::debug!(chart = %chart.name(), epoch = token.epoch(), "wait aborted");
                task.abort();
            }
            current
        });
    }

    /// The next finished operation; `None` for one that was aborted
    async fn next(
        &mut self,
    ) -> std::result::Result<Option<(WaitToken, Completion<C>)>, JoinError> {
        match self.tasks.join_next().await {
            Some(Ok((token, completion))) => {
                self.running.remove(&token);
                Ok(Some((token, completion)))
            }
            Some(Err(err)) if err.is_cancelled() => Ok(None),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}
