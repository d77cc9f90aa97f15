//! Error types for waypoint-logic

use thiserror::Error;

/// Errors raised by façades and configuration loading
#[derive(Error, Debug)]
pub enum Error {
    /// A façade precondition was violated
    ///
    /// Returned to the caller as-is, never retried.
    #[error("domain invariant violated: {0}")]
    Invariant(String),

    /// A field listener failed after the write was applied
    #[error("field notification failed: {0}")]
    Field(#[from] waypoint_core::Error),

    /// A bag was missing or could not be read
    #[error("store error: {0}")]
    Store(#[from] waypoint_store::Error),

    /// Configuration was malformed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// RON parse error
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invariant error
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant(message.into())
    }

    /// Whether this is a precondition failure rather than an infrastructure fault
    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`CommandDispatcher::execute`](crate::CommandDispatcher::execute)
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The façade call failed; nothing was persisted
    #[error("command {command} failed: {source}")]
    Logic {
        /// Name of the command
        command: &'static str,
        /// Underlying failure
        #[source]
        source: Error,
    },

    /// The façade call succeeded but the durable write failed
    ///
    /// The in-memory state already reflects the command. Callers either
    /// retry with [`CommandDispatcher::flush`](crate::CommandDispatcher::flush)
    /// or accept the gap until the next successful write.
    #[error("command {command} applied but not persisted: {source}")]
    Persistence {
        /// Name of the command
        command: &'static str,
        /// Underlying failure
        #[source]
        source: waypoint_store::Error,
    },
}

impl DispatchError {
    /// The name of the command that failed
    pub fn command(&self) -> &'static str {
        match self {
            DispatchError::Logic { command, .. } | DispatchError::Persistence { command, .. } => {
                command
            }
        }
    }

    /// The façade error, if the command itself failed
    pub fn logic_error(&self) -> Option<&Error> {
        match self {
            DispatchError::Logic { source, .. } => Some(source),
            DispatchError::Persistence { .. } => None,
        }
    }

    /// Whether the mutation was applied in memory
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchError::Persistence { .. })
    }
}

/// Collects listener failures across several field writes
///
/// A façade operation that writes more than one field keeps going after a
/// listener fails, so the bag never ends up half-updated; the failures are
/// reported together at the end.
#[derive(Debug, Default)]
pub(crate) struct Notifications {
    notified: usize,
    failures: Vec<waypoint_core::ListenerError>,
}

impl Notifications {
    pub(crate) fn track(&mut self, result: waypoint_core::Result<()>) {
        if let Err(waypoint_core::Error::ListenersFailed { notified, failures }) = result {
            self.notified += notified;
            self.failures.extend(failures);
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Field(waypoint_core::Error::ListenersFailed {
                notified: self.notified,
                failures: self.failures,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::ListenerError;

    #[test]
    fn test_notifications_merge_failures() {
        let mut notes = Notifications::default();
        notes.track(Ok(()));
        notes.track(Err(waypoint_core::Error::ListenersFailed {
            notified: 2,
            failures: vec![ListenerError::new("a")],
        }));
        notes.track(Err(waypoint_core::Error::ListenersFailed {
            notified: 1,
            failures: vec![ListenerError::new("b")],
        }));

        match notes.finish() {
            Err(Error::Field(waypoint_core::Error::ListenersFailed { notified, failures })) => {
                assert_eq!(notified, 3);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_error_accessors() {
        let err = DispatchError::Logic {
            command: "mark_game_reviewed",
            source: Error::invariant("already reviewed"),
        };
        assert_eq!(err.command(), "mark_game_reviewed");
        assert!(err.logic_error().unwrap().is_invariant());
        assert!(!err.is_applied());
    }
}
