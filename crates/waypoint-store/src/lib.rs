//! Waypoint Store - Domain state bags and their persistence
//!
//! Provides:
//! - [`Bag`] - a plain, serializable block of related state
//! - [`DomainStore`] - owns exactly one instance of each bag kind
//! - [`PersistenceStore`] - the byte-level load/save collaborator
//! - [`MemoryPersistence`] - in-process backend with call counters
//! - [`DbPersistence`] - native_db backend, one row per bag kind
//!
//! Bags are encoded with bincode before they reach a backend, so backends
//! only ever see `(kind, bytes)` pairs.

mod bag;
mod db;
mod domain;
mod error;
mod memory;
mod models;

pub use bag::{Bag, BagHandle};
pub use db::DbPersistence;
pub use domain::{DomainStore, LoadOutcome};
pub use error::{Error, Result};
pub use memory::MemoryPersistence;

use waypoint_core::BagKind;

/// Byte-level storage for encoded bags
///
/// `load` is called once per bag kind at startup and `save` once per kind on
/// every [`DomainStore::persist_all`]. A missing entry means "start from the
/// default bag", not an error.
pub trait PersistenceStore {
    /// Fetch the stored bytes for a bag kind, if any
    fn load(&self, kind: BagKind) -> Result<Option<Vec<u8>>>;

    /// Overwrite the stored bytes for a bag kind
    fn save(&self, kind: BagKind, bytes: &[u8]) -> Result<()>;
}
