//! Error types for store operations.

use thiserror::Error;
use waypoint_core::BagKind;

/// Errors that can occur while loading, reading or persisting bags.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// A bag could not be encoded for saving.
    #[error("Failed to encode {kind}: {message}")]
    Encode { kind: BagKind, message: String },

    /// Stored bytes could not be decoded into a bag.
    #[error("Failed to decode {kind}: {message}")]
    Decode { kind: BagKind, message: String },

    /// A bag was requested before it was loaded or installed.
    ///
    /// This only happens when startup skipped loading the bag, so callers
    /// treat it as fatal.
    #[error("{0} was never loaded")]
    BagNotLoaded(BagKind),

    /// Two different bag types claim the same kind.
    #[error("{0} is already installed with a different type")]
    KindConflict(BagKind),

    /// The backend refused a write.
    #[error("Failed to save {kind}: {message}")]
    Save { kind: BagKind, message: String },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
