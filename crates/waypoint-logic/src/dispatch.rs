//! Command dispatcher

use crate::command::{DispatchToken, GameCommand};
use crate::error::DispatchError;
use crate::game::GameLogic;
use std::rc::Rc;
use waypoint_store::DomainStore;

/// Runs commands against the façades and persists the result
///
/// Execution is synchronous and finishes before `execute` returns. State is
/// written to the backend only after a command succeeds.
pub struct CommandDispatcher {
    store: Rc<DomainStore>,
}

impl CommandDispatcher {
    pub fn new(store: Rc<DomainStore>) -> Self {
        Self { store }
    }

    /// Run one command, then persist every bag
    ///
    /// A failing command skips persistence and its error is returned as
    /// [`DispatchError::Logic`]. A failing write after a successful command
    /// is [`DispatchError::Persistence`]: the mutation stays applied in
    /// memory and [`flush`](Self::flush) may be retried.
    pub fn execute<C: GameCommand>(
        &self,
        command: C,
        logic: &mut GameLogic,
    ) -> Result<(), DispatchError> {
        let name = command.name();
        tracing::debug!(command = name, ?command, "executing command");

        command.execute(logic, &DispatchToken::new()).map_err(|source| {
            tracing::warn!(command = name, error = %source, "command failed");
            DispatchError::Logic {
                command: name,
                source,
            }
        })?;

        self.store.persist_all().map_err(|source| {
            tracing::error!(command = name, error = %source, "command applied but not persisted");
            DispatchError::Persistence {
                command: name,
                source,
            }
        })
    }

    /// Write every bag without running a command
    pub fn flush(&self) -> waypoint_store::Result<()> {
        self.store.persist_all()
    }
}
