//! Error types for waypoint-lifecycle

use thiserror::Error;

/// Errors raised while setting up or running the lifecycle
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration was malformed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// RON parse error
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A façade could not be built or refused an operation
    #[error("logic error: {0}")]
    Logic(#[from] waypoint_logic::Error),

    /// A command failed before anything was persisted
    #[error(transparent)]
    Dispatch(#[from] waypoint_logic::DispatchError),

    /// The persistence backend failed
    #[error("store error: {0}")]
    Store(#[from] waypoint_store::Error),

    /// The lifecycle chart failed to build or stopped on an error
    #[error("chart error: {0}")]
    Chart(#[from] waypoint_chart::ChartError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
