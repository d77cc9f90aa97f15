//! The context the lifecycle chart runs against

use crate::auth::{AuthFailure, AuthProvider};
use crate::bus::{EventBus, LifecycleMessage};
use crate::config::LifecycleConfig;
use crate::error::{Error, Result};
use crate::loader::ContentLoader;
use chrono::{DateTime, Utc};
use std::rc::Rc;
use std::sync::Arc;
use waypoint_core::{Clock, Subscription, SystemClock};
use waypoint_logic::{
    ApplicationState, CommandDispatcher, DispatchError, GameCommand, GameLogic, PlayerState,
};
use waypoint_store::DomainStore;

/// Everything the lifecycle talks to outside the domain
pub struct Services {
    pub auth: Arc<dyn AuthProvider>,
    pub loader: Arc<dyn ContentLoader>,
    pub clock: Rc<dyn Clock>,
    pub bus: EventBus,
}

impl Services {
    /// Services on the system clock with a fresh bus
    pub fn new(auth: Arc<dyn AuthProvider>, loader: Arc<dyn ContentLoader>) -> Self {
        Self {
            auth,
            loader,
            clock: Rc::new(SystemClock),
            bus: EventBus::new(),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }
}

/// One game session: the façades, the dispatcher and the services
///
/// Lives on the task driving the lifecycle chart and never leaves it.
pub struct Session {
    logic: GameLogic,
    dispatcher: CommandDispatcher,
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) loader: Arc<dyn ContentLoader>,
    clock: Rc<dyn Clock>,
    bus: EventBus,
    config: LifecycleConfig,
    device_subscription: Option<Subscription>,
    last_auth_failure: Option<AuthFailure>,
}

impl Session {
    /// Load both bags and bind the façades to them
    pub fn new(
        mut store: DomainStore,
        config: LifecycleConfig,
        services: Services,
    ) -> Result<Self> {
        config.validate()?;
        let player = store.load::<PlayerState>()?;
        let app = store.load::<ApplicationState>()?;
        tracing::info!(
            fresh_player = player.is_fresh(),
            fresh_app = app.is_fresh(),
            "session bags loaded"
        );

        let store = Rc::new(store);
        let logic = GameLogic::new(&store, Rc::new(config.progression.clone()))?;
        Ok(Self {
            logic,
            dispatcher: CommandDispatcher::new(store),
            auth: services.auth,
            loader: services.loader,
            clock: services.clock,
            bus: services.bus,
            config,
            device_subscription: None,
            last_auth_failure: None,
        })
    }

    pub fn logic(&self) -> &GameLogic {
        &self.logic
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The failure that sent the lifecycle to the authentication fail state
    pub fn last_auth_failure(&self) -> Option<&AuthFailure> {
        self.last_auth_failure.as_ref()
    }

    /// Run a command through the dispatcher
    ///
    /// A command that fails is returned as an error. A command that was
    /// applied but could not be written is logged and treated as done; the
    /// next successful write or flush catches the store up.
    pub fn dispatch(&mut self, command: impl GameCommand) -> Result<()> {
        match self.dispatcher.execute(command, &mut self.logic) {
            Ok(()) => Ok(()),
            Err(DispatchError::Persistence { command, source }) => {
                tracing::warn!(command, error = %source, "continuing with unsaved state");
                Ok(())
            }
            Err(err) => Err(Error::Dispatch(err)),
        }
    }

    /// Write every bag, logging rather than failing
    pub fn flush(&self) {
        if let Err(err) = self.dispatcher.flush() {
            tracing::warn!(error = %err, "flush failed");
        }
    }

    pub(crate) fn init_logic(&mut self) -> Result<()> {
        Ok(self.logic.init()?)
    }

    pub(crate) fn publish(&self, message: LifecycleMessage) {
        self.bus.publish(message);
    }

    pub(crate) fn record_auth_failure(&mut self, failure: Option<AuthFailure>) {
        self.last_auth_failure = failure;
    }

    /// Announce every device link on the bus until unwatched
    pub(crate) fn watch_device_link(&mut self) {
        if self.device_subscription.is_some() {
            return;
        }
        let bus = self.bus.clone();
        let subscription = self.logic.app().device_id().subscribe(move |_, device_id| {
            if !device_id.is_empty() {
                bus.publish(LifecycleMessage::DeviceLinked {
                    device_id: device_id.clone(),
                });
            }
            Ok(())
        });
        self.device_subscription = Some(subscription);
    }

    pub(crate) fn unwatch_device_link(&mut self) {
        if let Some(subscription) = self.device_subscription.take() {
            self.logic.app().device_id().unsubscribe(subscription);
        }
    }

    pub fn is_watching_device_link(&self) -> bool {
        self.device_subscription.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthProvider;
    use crate::loader::NoopLoader;
    use waypoint_core::ManualClock;
    use waypoint_logic::{AddExperience, LinkDevice, SetNickname};
    use waypoint_store::MemoryPersistence;

    fn session_on(persistence: MemoryPersistence) -> Session {
        let services = Services::new(Arc::new(MockAuthProvider::new()), Arc::new(NoopLoader::new()))
            .with_clock(Rc::new(ManualClock::on_date(2024, 5, 1)));
        Session::new(
            DomainStore::new(persistence),
            LifecycleConfig::default(),
            services,
        )
        .unwrap()
    }

    #[test]
    fn test_dispatch_persists() {
        let persistence = MemoryPersistence::new();
        let mut session = session_on(persistence.clone());

        session.dispatch(AddExperience { amount: 40 }).unwrap();
        assert_eq!(session.logic().player().xp().get(), 40);
        assert_eq!(persistence.save_count(), 2);
    }

    #[test]
    fn test_logic_failure_is_an_error() {
        let mut session = session_on(MemoryPersistence::new());
        let err = session
            .dispatch(SetNickname {
                nickname: "   ".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch(DispatchError::Logic { .. })));
    }

    #[test]
    fn test_write_failure_is_tolerated() {
        let persistence = MemoryPersistence::new();
        let mut session = session_on(persistence.clone());
        persistence.fail_saves(true);

        session.dispatch(AddExperience { amount: 10 }).unwrap();
        assert_eq!(session.logic().player().xp().get(), 10);
        assert_eq!(persistence.save_count(), 0);
    }

    #[tokio::test]
    async fn test_device_link_watch() {
        let mut session = session_on(MemoryPersistence::new());
        let mut rx = session.bus().subscribe();

        session.watch_device_link();
        session.watch_device_link();
        assert!(session.is_watching_device_link());
        session
            .dispatch(LinkDevice {
                device_id: "dev-7".to_string(),
            })
            .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleMessage::DeviceLinked {
                device_id: "dev-7".to_string()
            }
        );

        session.unwatch_device_link();
        session
            .dispatch(LinkDevice {
                device_id: "dev-8".to_string(),
            })
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
