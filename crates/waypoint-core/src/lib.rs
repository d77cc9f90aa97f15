//! Waypoint Core - Leaf primitives for the lifecycle orchestrator
//!
//! This crate provides the types every other waypoint crate builds on:
//! - `ReactiveField` - an observable value bound to a location in a state bag
//! - `FieldReader` - the read-and-subscribe view handed to observers
//! - Identities (`BagKind`, `SubscriptionId`)
//! - Wall clocks (`Clock`, `SystemClock`, `ManualClock`)
//!
//! ## Reactive Fields
//!
//! Fields never cache. Every read goes through the getter, every write goes
//! through the setter and then notifies listeners in subscription order:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use waypoint_core::ReactiveField;
//!
//! #[derive(Default)]
//! struct Bag {
//!     level: u32,
//! }
//!
//! let bag = Rc::new(RefCell::new(Bag::default()));
//! let level = ReactiveField::bind(bag.clone(), |b: &Bag| b.level, |b: &mut Bag, v| b.level = v);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! level.subscribe(move |old: &u32, new: &u32| {
//!     sink.borrow_mut().push((*old, *new));
//!     Ok(())
//! });
//!
//! level.set(3).unwrap();
//! assert_eq!(bag.borrow().level, 3);
//! assert_eq!(*seen.borrow(), vec![(0, 3)]);
//! ```

mod error;
mod field;
mod identity;
pub mod time;

pub use error::{Error, ListenerError, Result};
pub use field::{FieldReader, ReactiveField, Subscription};
pub use identity::{BagKind, SubscriptionId};
pub use time::{Clock, ManualClock, SystemClock};
