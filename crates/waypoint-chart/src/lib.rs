//! Waypoint Chart - Hierarchical statecharts with asynchronous wait states
//!
//! A chart is a tree of states declared once through a [`StateFactory`]:
//! - **Initial** / **Final** mark where each level starts and ends
//! - **Simple** states wait for [`Event`]s
//! - **Nested** states run a sub-chart; reaching its Final fires the
//!   nested state's completion transition
//! - **Choice** states evaluate guards on entry and leave immediately
//! - **AsyncWait** states start a future on entry and react to its
//!   [`Completion`]
//!
//! The [`Statechart`] itself is synchronous and borrows its context for every
//! step. [`ChartDriver`] puts it on a tokio task, funnels events and wait
//! results through one channel and spawns the wait futures.
//!
//! # Example
//!
//! ```
//! use waypoint_chart::{ChartDriver, Event, Statechart};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let finish = Event::new("Finish");
//! let chart = Statechart::<Vec<&'static str>>::build("demo", |f| {
//!     let start = f.initial();
//!     let work = f.nest("Work", |sub| {
//!         let start = sub.initial();
//!         let busy = sub.state("Busy");
//!         let end = sub.final_state();
//!         sub.transition(start, busy);
//!         sub.event(busy, &finish, end);
//!     });
//!     let end = f.final_state();
//!     f.transition(start, work);
//!     f.on_complete(work, end);
//!     f.on_exit(work, |log: &mut Vec<&'static str>| {
//!         log.push("work done");
//!         Ok(())
//!     });
//! })
//! .unwrap();
//!
//! let driver = ChartDriver::new(chart, Vec::new());
//! driver.handle().send(&finish).unwrap();
//! let done = driver.run().await.unwrap();
//! assert_eq!(done.context, vec!["work done"]);
//! # });
//! ```

mod chart;
mod driver;
mod error;
mod event;
mod factory;
pub mod journal;
mod state;
mod wait;

pub use chart::{Delivery, Statechart};
pub use driver::{ChartDriver, ChartHandle, ChartInput, Completed};
pub use error::{BoxError, ChartError, Result};
pub use event::{Event, EventId};
pub use factory::StateFactory;
pub use journal::{Cause, Journal, JournalConfig, JournalEntry, JournalStats};
pub use state::{StateId, StateKind};
pub use wait::{
    timer, timer_then, Completion, PendingWait, WaitFuture, WaitOp, WaitOutcome, WaitToken,
};
