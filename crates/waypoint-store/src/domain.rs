//! The domain store: one live instance per bag kind.

use crate::bag::{Bag, BagHandle};
use crate::error::{Error, Result};
use crate::PersistenceStore;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use waypoint_core::BagKind;

/// What `load` found in the persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored bytes were decoded into the bag.
    Restored,
    /// Nothing was stored; the default bag was installed.
    Fresh,
}

impl LoadOutcome {
    /// Whether the bag started from its default.
    pub fn is_fresh(&self) -> bool {
        matches!(self, LoadOutcome::Fresh)
    }
}

type Encoder = Box<dyn Fn() -> Result<Vec<u8>>>;

struct BagSlot {
    handle: Rc<dyn Any>,
    encode: Encoder,
}

/// Owner of every state bag.
///
/// At most one instance of each kind exists. Bags are kept in installation
/// order, which is also the order `persist_all` writes them in.
pub struct DomainStore {
    persistence: Box<dyn PersistenceStore>,
    bags: IndexMap<BagKind, BagSlot>,
}

impl DomainStore {
    /// Create an empty store on top of a persistence backend.
    pub fn new(persistence: impl PersistenceStore + 'static) -> Self {
        Self {
            persistence: Box::new(persistence),
            bags: IndexMap::new(),
        }
    }

    /// Load a bag from the backend, or install its default when nothing is stored.
    pub fn load<B: Bag>(&mut self) -> Result<LoadOutcome> {
        match self.persistence.load(B::KIND)? {
            Some(bytes) => {
                let bag: B = bincode::deserialize(&bytes).map_err(|e| Error::Decode {
                    kind: B::KIND,
                    message: e.to_string(),
                })?;
                tracing::debug!(kind = %B::KIND, bytes = bytes.len(), "restored bag");
                self.add_or_replace(bag)?;
                Ok(LoadOutcome::Restored)
            }
            None => {
                tracing::debug!(kind = %B::KIND, "no stored bag, using default");
                self.add_or_replace(B::default())?;
                Ok(LoadOutcome::Fresh)
            }
        }
    }

    /// Install a bag, overwriting the contents of any existing instance.
    ///
    /// Handles obtained earlier keep pointing at the same instance and see
    /// the new contents.
    pub fn add_or_replace<B: Bag>(&mut self, bag: B) -> Result<()> {
        if let Some(slot) = self.bags.get(&B::KIND) {
            let cell = Rc::clone(&slot.handle)
                .downcast::<RefCell<B>>()
                .map_err(|_| Error::KindConflict(B::KIND))?;
            *cell.borrow_mut() = bag;
            return Ok(());
        }

        let cell = Rc::new(RefCell::new(bag));
        let encoded = Rc::clone(&cell);
        let encode: Encoder = Box::new(move || {
            bincode::serialize(&*encoded.borrow()).map_err(|e| Error::Encode {
                kind: B::KIND,
                message: e.to_string(),
            })
        });
        let handle: Rc<dyn Any> = cell;
        self.bags.insert(B::KIND, BagSlot { handle, encode });
        Ok(())
    }

    /// Get the live instance of a bag.
    pub fn bag<B: Bag>(&self) -> Result<BagHandle<B>> {
        let slot = self.bags.get(&B::KIND).ok_or(Error::BagNotLoaded(B::KIND))?;
        let cell = Rc::clone(&slot.handle)
            .downcast::<RefCell<B>>()
            .map_err(|_| Error::KindConflict(B::KIND))?;
        Ok(BagHandle::new(cell))
    }

    /// Whether a bag kind is installed.
    pub fn contains(&self, kind: BagKind) -> bool {
        self.bags.contains_key(&kind)
    }

    /// Installed kinds, in installation order.
    pub fn kinds(&self) -> impl Iterator<Item = BagKind> + '_ {
        self.bags.keys().copied()
    }

    /// Write every installed bag to the backend.
    ///
    /// Each kind is encoded and saved once. Calling this repeatedly simply
    /// overwrites the previous write. Stops at the first failing bag; bags
    /// saved before it stay saved.
    pub fn persist_all(&self) -> Result<()> {
        for (kind, slot) in &self.bags {
            let bytes = (slot.encode)()?;
            self.persistence.save(*kind, &bytes)?;
        }
        tracing::debug!(bags = self.bags.len(), "persisted all bags");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryPersistence;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wallet {
        coins: i64,
        owner: String,
    }

    impl Default for Wallet {
        fn default() -> Self {
            Self {
                coins: 10,
                owner: String::new(),
            }
        }
    }

    impl Bag for Wallet {
        const KIND: BagKind = BagKind("wallet");
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Impostor {
        coins: u8,
    }

    impl Bag for Impostor {
        const KIND: BagKind = BagKind("wallet");
    }

    #[test]
    fn test_load_fresh_installs_default() {
        let mut store = DomainStore::new(MemoryPersistence::new());
        assert_eq!(store.load::<Wallet>().unwrap(), LoadOutcome::Fresh);
        assert_eq!(store.bag::<Wallet>().unwrap().snapshot(), Wallet::default());
    }

    #[test]
    fn test_missing_bag_is_an_error() {
        let store = DomainStore::new(MemoryPersistence::new());
        assert!(matches!(
            store.bag::<Wallet>(),
            Err(Error::BagNotLoaded(BagKind("wallet")))
        ));
    }

    #[test]
    fn test_round_trip_through_persistence() {
        let backend = MemoryPersistence::new();
        let mut store = DomainStore::new(backend.clone());
        store.load::<Wallet>().unwrap();
        let saved = Wallet {
            coins: 99,
            owner: "kay".to_string(),
        };
        store.add_or_replace(saved.clone()).unwrap();
        store.persist_all().unwrap();

        let mut reopened = DomainStore::new(backend);
        assert_eq!(reopened.load::<Wallet>().unwrap(), LoadOutcome::Restored);
        assert_eq!(reopened.bag::<Wallet>().unwrap().snapshot(), saved);
    }

    #[test]
    fn test_replace_keeps_existing_handles_current() {
        let mut store = DomainStore::new(MemoryPersistence::new());
        store.load::<Wallet>().unwrap();
        let before = store.bag::<Wallet>().unwrap();

        store
            .add_or_replace(Wallet {
                coins: 1,
                owner: "new".to_string(),
            })
            .unwrap();

        let after = store.bag::<Wallet>().unwrap();
        assert!(before.same_instance(&after));
        assert_eq!(before.read(|w| w.coins), 1);
        assert_eq!(store.kinds().count(), 1);
    }

    #[test]
    fn test_kind_conflict() {
        let mut store = DomainStore::new(MemoryPersistence::new());
        store.load::<Wallet>().unwrap();
        assert!(matches!(
            store.add_or_replace(Impostor::default()),
            Err(Error::KindConflict(_))
        ));
        assert!(matches!(store.bag::<Impostor>(), Err(Error::KindConflict(_))));
    }

    #[test]
    fn test_persist_all_is_idempotent() {
        let backend = MemoryPersistence::new();
        let mut store = DomainStore::new(backend.clone());
        store.load::<Wallet>().unwrap();

        store.persist_all().unwrap();
        let first = backend.bytes(Wallet::KIND);
        store.persist_all().unwrap();

        assert_eq!(backend.save_count(), 2);
        assert_eq!(backend.bytes(Wallet::KIND), first);
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let backend = MemoryPersistence::new();
        backend.save(Wallet::KIND, &[0xff]).unwrap();
        let mut store = DomainStore::new(backend);
        assert!(matches!(
            store.load::<Wallet>(),
            Err(Error::Decode { .. })
        ));
    }
}
