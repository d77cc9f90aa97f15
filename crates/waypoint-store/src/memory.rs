//! In-process persistence backend.

use crate::error::{Error, Result};
use crate::PersistenceStore;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use waypoint_core::BagKind;

#[derive(Debug, Default)]
struct MemoryInner {
    entries: IndexMap<BagKind, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_saves: bool,
}

/// Persistence backend that keeps encoded bags in memory.
///
/// Clones share the same storage, so a test can hand one clone to a
/// [`DomainStore`](crate::DomainStore) and inspect the call counters through
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryPersistence {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.inner.borrow().loads
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }

    /// Stored bytes for a kind.
    pub fn bytes(&self, kind: BagKind) -> Option<Vec<u8>> {
        self.inner.borrow().entries.get(&kind).cloned()
    }

    /// Make every following `save` fail, simulating a full disk.
    pub fn fail_saves(&self, fail: bool) {
        self.inner.borrow_mut().fail_saves = fail;
    }
}

impl PersistenceStore for MemoryPersistence {
    fn load(&self, kind: BagKind) -> Result<Option<Vec<u8>>> {
        let mut inner = self.inner.borrow_mut();
        inner.loads += 1;
        Ok(inner.entries.get(&kind).cloned())
    }

    fn save(&self, kind: BagKind, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_saves {
            return Err(Error::Save {
                kind,
                message: "memory backend is refusing writes".to_string(),
            });
        }
        inner.saves += 1;
        inner.entries.insert(kind, bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let backend = MemoryPersistence::new();
        let kind = BagKind("player");

        assert_eq!(backend.load(kind).unwrap(), None);
        backend.save(kind, b"abc").unwrap();
        assert_eq!(backend.load(kind).unwrap(), Some(b"abc".to_vec()));

        assert_eq!(backend.load_count(), 2);
        assert_eq!(backend.save_count(), 1);
    }

    #[test]
    fn test_failing_saves_leave_data_untouched() {
        let backend = MemoryPersistence::new();
        let kind = BagKind("player");
        backend.save(kind, b"v1").unwrap();

        backend.fail_saves(true);
        assert!(matches!(backend.save(kind, b"v2"), Err(Error::Save { .. })));
        assert_eq!(backend.bytes(kind), Some(b"v1".to_vec()));
        assert_eq!(backend.save_count(), 1);
    }
}
