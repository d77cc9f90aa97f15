//! native_db persistence backend.

use crate::error::{Error, Result};
use crate::models::*;
use crate::PersistenceStore;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use waypoint_core::BagKind;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models
        .define::<StoredBag>()
        .expect("StoredBag model definition is valid");
    models
});

/// Database-backed persistence, one row per bag kind.
pub struct DbPersistence {
    db: Database<'static>,
}

impl DbPersistence {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        tracing::info!(path = %path.as_ref().display(), "opened bag database");
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Get the stored row for a kind, including its write time.
    pub fn stored(&self, kind: BagKind) -> Result<Option<StoredBag>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredBag> = r.get().primary(kind.as_str().to_string())?;
        Ok(stored)
    }

    /// List the kinds that have been saved.
    pub fn stored_kinds(&self) -> Result<Vec<String>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredBag>()?;
        let iter = scan.all()?;
        let rows: std::result::Result<Vec<StoredBag>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|row| row.kind).collect())
    }

    /// Clear all data.
    pub fn clear(&self) -> Result<()> {
        // First, collect all kinds
        let kinds = self.stored_kinds()?;

        // Now delete in a separate transaction
        let rw = self.db.rw_transaction()?;
        for kind in kinds {
            if let Some(row) = rw.get().primary::<StoredBag>(kind)? {
                rw.remove(row)?;
            }
        }
        rw.commit()?;
        Ok(())
    }
}

impl PersistenceStore for DbPersistence {
    fn load(&self, kind: BagKind) -> Result<Option<Vec<u8>>> {
        Ok(self.stored(kind)?.map(|row| row.payload))
    }

    fn save(&self, kind: BagKind, bytes: &[u8]) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredBag::new(kind.as_str(), bytes))?;
        rw.commit()?;
        Ok(())
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bag, DomainStore, LoadOutcome};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Inventory {
        slots: Vec<u32>,
        label: Option<String>,
    }

    impl Bag for Inventory {
        const KIND: BagKind = BagKind("inventory");
    }

    #[test]
    fn test_save_and_load_in_memory() {
        let db = DbPersistence::in_memory().unwrap();
        let kind = BagKind("inventory");

        assert_eq!(db.load(kind).unwrap(), None);
        db.save(kind, &[1, 2, 3]).unwrap();
        db.save(kind, &[4, 5]).unwrap();

        assert_eq!(db.load(kind).unwrap(), Some(vec![4, 5]));
        assert_eq!(db.stored_kinds().unwrap(), vec!["inventory".to_string()]);
        assert!(db.stored(kind).unwrap().unwrap().saved_at > 0);
    }

    #[test]
    fn test_clear() {
        let db = DbPersistence::in_memory().unwrap();
        db.save(BagKind("a"), &[1]).unwrap();
        db.save(BagKind("b"), &[2]).unwrap();

        db.clear().unwrap();
        assert!(db.stored_kinds().unwrap().is_empty());
    }

    #[test]
    fn test_bag_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bags.db");
        let saved = Inventory {
            slots: vec![3, 1, 4],
            label: Some("satchel".to_string()),
        };

        {
            let mut store = DomainStore::new(DbPersistence::open(&path).unwrap());
            store.load::<Inventory>().unwrap();
            store.add_or_replace(saved.clone()).unwrap();
            store.persist_all().unwrap();
        }

        let mut store = DomainStore::new(DbPersistence::open(&path).unwrap());
        assert_eq!(store.load::<Inventory>().unwrap(), LoadOutcome::Restored);
        assert_eq!(store.bag::<Inventory>().unwrap().snapshot(), saved);
    }
}
