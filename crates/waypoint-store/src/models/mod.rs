//! Database models for persistent storage.

mod bag;

pub use bag::*;
