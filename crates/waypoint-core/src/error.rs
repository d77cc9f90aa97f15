//! Error types for waypoint-core

use thiserror::Error;

/// Failure reported by a single field listener
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Create a listener error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more listeners failed while a field was being written.
    ///
    /// The write itself already happened and every listener was still invoked.
    #[error("{} of {notified} field listeners failed: {}", .failures.len(), Self::join(.failures))]
    ListenersFailed {
        /// How many listeners were notified
        notified: usize,
        /// Failures in notification order
        failures: Vec<ListenerError>,
    },
}

impl Error {
    fn join(failures: &[ListenerError]) -> String {
        failures
            .iter()
            .map(|f| f.0.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_failed_display() {
        let err = Error::ListenersFailed {
            notified: 3,
            failures: vec![ListenerError::new("ui gone"), ListenerError::new("haptics off")],
        };
        assert_eq!(
            err.to_string(),
            "2 of 3 field listeners failed: ui gone; haptics off"
        );
    }
}
