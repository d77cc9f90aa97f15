//! Bag models for database storage.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// One encoded bag, keyed by its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredBag {
    /// Primary key - bag kind.
    #[primary_key]
    pub kind: String,
    /// Bincode-encoded bag.
    pub payload: Vec<u8>,
    /// When this row was last written (Unix milliseconds).
    pub saved_at: i64,
}

impl StoredBag {
    /// Create a row for a freshly encoded bag.
    pub fn new(kind: &str, payload: &[u8]) -> Self {
        Self {
            kind: kind.to_string(),
            payload: payload.to_vec(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
