//! The façade set handed to commands

use crate::app::AppLogic;
use crate::config::ProgressionConfig;
use crate::error::{Error, Result};
use crate::player::PlayerLogic;
use std::rc::Rc;
use waypoint_store::DomainStore;

/// Every domain façade, grouped
///
/// Commands receive `&mut GameLogic`, which is what keeps two commands from
/// ever running at the same time.
pub struct GameLogic {
    player: PlayerLogic,
    app: AppLogic,
    progression: Rc<ProgressionConfig>,
    initialized: bool,
}

impl GameLogic {
    /// Bind every façade to its bag
    ///
    /// Fails with a store error when a bag was never loaded, so a missing
    /// bag shows up at startup and never in the middle of a session.
    pub fn new(store: &DomainStore, progression: Rc<ProgressionConfig>) -> Result<Self> {
        Ok(Self {
            player: PlayerLogic::new(store, Rc::clone(&progression))?,
            app: AppLogic::new(store)?,
            progression,
            initialized: false,
        })
    }

    pub fn player(&self) -> &PlayerLogic {
        &self.player
    }

    pub fn app(&self) -> &AppLogic {
        &self.app
    }

    /// The progression tables the façades were built with
    pub fn progression(&self) -> &ProgressionConfig {
        &self.progression
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Finish startup once the bootstrap phase is over
    ///
    /// Normalizes the match history to its configured length and pushes the
    /// stored settings through their fields. Runs once per session.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::invariant("game logic is already initialized"));
        }
        self.initialized = true;
        self.player.normalize_history()?;
        self.app.republish_settings()?;
        tracing::info!(
            level = self.player.level().get(),
            first_session = self.app.is_first_session(),
            "game logic initialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ApplicationState, PlayerState};
    use waypoint_store::MemoryPersistence;

    fn loaded_store() -> DomainStore {
        let mut store = DomainStore::new(MemoryPersistence::new());
        store.load::<PlayerState>().unwrap();
        store.load::<ApplicationState>().unwrap();
        store
    }

    #[test]
    fn test_missing_bag_fails_at_construction() {
        let mut store = DomainStore::new(MemoryPersistence::new());
        store.load::<PlayerState>().unwrap();
        let err = GameLogic::new(&store, Rc::new(ProgressionConfig::default()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Store(waypoint_store::Error::BagNotLoaded(_))));
    }

    #[test]
    fn test_init_runs_once() {
        let store = loaded_store();
        let progression = ProgressionConfig {
            history_len: 8,
            ..ProgressionConfig::default()
        };
        let mut logic = GameLogic::new(&store, Rc::new(progression)).unwrap();

        logic.init().unwrap();
        assert!(logic.is_initialized());
        assert_eq!(logic.player().history().get().len(), 8);
        assert!(logic.init().unwrap_err().is_invariant());
    }
}
