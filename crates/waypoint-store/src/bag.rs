//! State bags and shared handles to them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use waypoint_core::{BagKind, ReactiveField};

/// A named block of related persisted state.
///
/// Bags are plain records with no behaviour. The `KIND` is the persistence
/// key, so it must stay stable across releases.
pub trait Bag: Serialize + DeserializeOwned + Default + 'static {
    /// The kind this bag is stored under.
    const KIND: BagKind;
}

/// Shared handle to the single live instance of a bag.
///
/// Every handle for a kind points at the same instance; replacing a bag in
/// the [`DomainStore`](crate::DomainStore) swaps the contents in place, so no
/// handle ever observes a stale copy.
pub struct BagHandle<B> {
    cell: Rc<RefCell<B>>,
}

impl<B: Bag> BagHandle<B> {
    pub(crate) fn new(cell: Rc<RefCell<B>>) -> Self {
        Self { cell }
    }

    /// Read from the bag.
    pub fn read<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&*self.cell.borrow())
    }

    /// Mutate the bag.
    ///
    /// Only domain logic façades should call this; everything else goes
    /// through commands.
    pub fn write<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut *self.cell.borrow_mut())
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> B
    where
        B: Clone,
    {
        self.cell.borrow().clone()
    }

    /// Create a reactive field bound to a location inside this bag.
    pub fn field<T: Clone + 'static>(
        &self,
        get: impl Fn(&B) -> T + 'static,
        set: impl Fn(&mut B, T) + 'static,
    ) -> ReactiveField<T> {
        ReactiveField::bind(Rc::clone(&self.cell), get, set)
    }

    /// Whether two handles point at the same instance.
    pub fn same_instance(&self, other: &BagHandle<B>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<B> Clone for BagHandle<B> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<B: fmt::Debug> fmt::Debug for BagHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BagHandle").field(&self.cell.borrow()).finish()
    }
}
