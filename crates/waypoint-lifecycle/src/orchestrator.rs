//! The game lifecycle as a statechart
//!
//! ```text
//! Bootstrap
//!   Initial ─▶ Auto Auth Check ──[device linked]──▶ Login Device Authentication
//!                     └──[otherwise]──▶ Final            │ AuthSuccess ─▶ Final
//!                                                        │ AuthFail ─▶ Authentication Fail
//!   Authentication Fail: Retry ─▶ Login Device Authentication, Skip ─▶ Final
//! Game
//!   Initial ─▶ Gameplay Loading ─▶ Gameplay
//!   Gameplay: Pause ─▶ Paused, Quit ─▶ Final
//!   Paused: Resume ─▶ Gameplay, Quit ─▶ Final, idle timeout ─▶ Final
//! Final
//! ```

use crate::auth::LoginMethod;
use crate::bus::{LifecycleMessage, Phase};
use crate::error::{Error, Result};
use crate::session::Session;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use waypoint_chart::{
    timer_then, ChartDriver, ChartError, ChartHandle, Completed, Completion, Event, JournalConfig,
    StateFactory, StateId, Statechart, WaitFuture, WaitOutcome,
};
use waypoint_logic::{BeginSession, Command, LinkDevice};

/// Reason recorded when the paused timer runs out
pub const IDLE_QUIT_REASON: &str = "idle timeout";

const PLAYER_QUIT_REASON: &str = "player quit";

/// The events the lifecycle chart reacts to
#[derive(Debug, Clone)]
pub struct LifecycleEvents {
    pub auth_success: Event,
    pub auth_fail: Event,
    pub retry: Event,
    pub skip: Event,
    pub pause: Event,
    pub resume: Event,
    pub quit: Event,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self {
            auth_success: Event::new("AuthSuccess"),
            auth_fail: Event::new("AuthFail"),
            retry: Event::new("Retry"),
            skip: Event::new("Skip"),
            pause: Event::new("Pause"),
            resume: Event::new("Resume"),
            quit: Event::new("Quit"),
        }
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the lifecycle chart over a [`Session`]
pub fn lifecycle_chart(
    events: &LifecycleEvents,
    idle_timeout: Duration,
) -> waypoint_chart::Result<Statechart<Session>> {
    Statechart::<Session>::build("lifecycle", |f| {
        let start = f.initial();
        let bootstrap = f.nest("Bootstrap", |b| define_bootstrap(b, events));
        let game = f.nest("Game", |g| define_game(g, events, idle_timeout));
        let end = f.final_state();

        f.transition(start, bootstrap);
        f.on_complete(bootstrap, game);
        f.on_complete(game, end);

        announce(f, bootstrap, Phase::Bootstrap);
        f.on_enter(bootstrap, |s| {
            s.watch_device_link();
            Ok(())
        });
        f.on_enter(end, |s| {
            s.flush();
            s.publish(LifecycleMessage::PhaseEntered {
                phase: Phase::Finished,
            });
            Ok(())
        });
    })
}

fn define_bootstrap(b: &mut StateFactory<'_, Session>, events: &LifecycleEvents) {
    let start = b.initial();
    let check = b.choice("Auto Auth Check");
    let login = b.wait("Login Device Authentication", device_login(events));
    let failed = b.state("Authentication Fail");
    let end = b.final_state();

    b.transition(start, check);
    b.on_enter(check, |s| {
        let command = BeginSession {
            now: s.now(),
            environment: Some(s.config().environment.clone()),
        };
        s.dispatch(command)?;
        Ok(())
    });
    b.condition(check, |s| s.logic().app().is_device_linked(), login);
    b.fallback(check, end);

    b.event(login, &events.auth_success, end);
    b.event(login, &events.auth_fail, failed);
    b.event(failed, &events.retry, login);
    b.event(failed, &events.skip, end);

    announce(b, login, Phase::Authenticating);
    announce(b, failed, Phase::AuthenticationFailed);
    b.on_enter(failed, |s| {
        if let Some(failure) = s.last_auth_failure() {
            s.publish(LifecycleMessage::AuthenticationFailed {
                retryable: failure.retryable(),
                reason: failure.to_string(),
            });
        }
        Ok(())
    });
    b.on_enter(end, |s| {
        s.init_logic()?;
        s.unwatch_device_link();
        Ok(())
    });
}

fn define_game(
    g: &mut StateFactory<'_, Session>,
    events: &LifecycleEvents,
    idle_timeout: Duration,
) {
    let start = g.initial();
    let loading = g.wait("Gameplay Loading", load_gameplay);
    let gameplay = g.state("Gameplay");
    let paused = g.wait(
        "Paused",
        timer_then(idle_timeout, |s: &mut Session| {
            s.logic().app().quit_game(IDLE_QUIT_REASON);
            Ok(())
        }),
    );
    let end = g.final_state();

    g.transition(start, loading);
    g.on_complete(loading, gameplay);
    g.event(gameplay, &events.pause, paused);
    g.event(gameplay, &events.quit, end);
    g.event(paused, &events.resume, gameplay);
    g.event(paused, &events.quit, end);
    g.on_complete(paused, end);

    announce(g, loading, Phase::Loading);
    announce(g, gameplay, Phase::Gameplay);
    announce(g, paused, Phase::Paused);
    g.on_enter(paused, |s| {
        s.flush();
        s.publish(LifecycleMessage::Paused { is_paused: true });
        Ok(())
    });
    g.on_exit(paused, |s| {
        s.publish(LifecycleMessage::Paused { is_paused: false });
        Ok(())
    });
    g.on_enter(end, |s| {
        let reason = s
            .logic()
            .app()
            .quit_reason()
            .unwrap_or_else(|| PLAYER_QUIT_REASON.to_string());
        s.publish(LifecycleMessage::PhaseEntered {
            phase: Phase::Quitting,
        });
        s.publish(LifecycleMessage::Quitting { reason });
        Ok(())
    });
}

fn announce(f: &mut StateFactory<'_, Session>, state: StateId, phase: Phase) {
    f.on_enter(state, move |s| {
        s.publish(LifecycleMessage::PhaseEntered { phase });
        Ok(())
    });
}

/// Log in with the stored device credential
///
/// Success links the returned device id through the dispatcher and raises
/// AuthSuccess. Failure is kept on the session and raises AuthFail.
fn device_login(
    events: &LifecycleEvents,
) -> impl FnMut(&mut Session) -> WaitFuture<Session> + 'static {
    let success = events.auth_success.clone();
    let fail = events.auth_fail.clone();
    move |s: &mut Session| {
        let auth = Arc::clone(&s.auth);
        let device_id = s.logic().app().device_id().get();
        let (success, fail) = (success.clone(), fail.clone());
        let future: WaitFuture<Session> = async move {
            let result = auth.login(LoginMethod::Device { device_id }).await;
            Completion::with(move |s: &mut Session| match result {
                Ok(linked) => {
                    tracing::info!(account = %linked.account_id, "device login succeeded");
                    s.record_auth_failure(None);
                    s.dispatch(LinkDevice {
                        device_id: linked.device_id,
                    })?;
                    Ok(WaitOutcome::Raise(success))
                }
                Err(failure) => {
                    tracing::warn!(
                        %failure,
                        retryable = failure.retryable(),
                        "device login failed"
                    );
                    s.record_auth_failure(Some(failure));
                    Ok(WaitOutcome::Raise(fail))
                }
            })
        }
        .boxed();
        future
    }
}

fn load_gameplay(s: &mut Session) -> WaitFuture<Session> {
    let loader = Arc::clone(&s.loader);
    async move {
        match loader.load_gameplay().await {
            Ok(()) => Completion::done(),
            Err(err) => Completion::with(move |_: &mut Session| Err(err.into())),
        }
    }
    .boxed()
}

/// The game lifecycle, ready to run
///
/// Owns the session until [`run`](Self::run) hands it back. Everything that
/// happens while it runs goes through a [`LifecycleHandle`].
pub struct Lifecycle {
    driver: ChartDriver<Session>,
    events: LifecycleEvents,
}

impl Lifecycle {
    pub fn new(session: Session) -> Result<Self> {
        let events = LifecycleEvents::new();
        let mut chart = lifecycle_chart(&events, session.config().idle_timeout())?;
        if session.config().record_transitions {
            chart = chart.with_journal(JournalConfig {
                recording_enabled: true,
                max_entries: 0,
            });
        }
        Ok(Self {
            driver: ChartDriver::new(chart, session),
            events,
        })
    }

    pub fn events(&self) -> &LifecycleEvents {
        &self.events
    }

    pub fn handle(&self) -> LifecycleHandle {
        LifecycleHandle {
            chart: self.driver.handle(),
            events: self.events.clone(),
        }
    }

    /// Receive lifecycle notifications published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleMessage> {
        self.driver.context().bus().subscribe()
    }

    pub fn session(&self) -> &Session {
        self.driver.context()
    }

    /// Run until the lifecycle reaches its final state
    ///
    /// Stops early with [`Error::Chart`] when an action fails, for example
    /// when `GameLogic::init` is refused or content fails to load.
    pub async fn run(self) -> Result<Completed<Session>> {
        let done = self.driver.run().await?;
        tracing::info!(
            quit_reason = ?done.context.logic().app().quit_reason(),
            "lifecycle finished"
        );
        Ok(done)
    }
}

/// Cloneable remote control for a running [`Lifecycle`]
#[derive(Clone)]
pub struct LifecycleHandle {
    chart: ChartHandle<Session>,
    events: LifecycleEvents,
}

impl LifecycleHandle {
    pub fn pause(&self) -> Result<()> {
        self.send(&self.events.pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(&self.events.resume)
    }

    /// Try device authentication again from the failure state
    pub fn retry(&self) -> Result<()> {
        self.send(&self.events.retry)
    }

    /// Continue without authentication from the failure state
    pub fn skip(&self) -> Result<()> {
        self.send(&self.events.skip)
    }

    /// Record `reason` and leave the game
    ///
    /// Quit is accepted from Gameplay and Paused. Before gameplay the event
    /// is dropped and the reason stays recorded for the session.
    pub fn quit(&self, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.chart.call(move |s| {
            s.logic().app().quit_game(reason);
            Ok(())
        })?;
        self.send(&self.events.quit)
    }

    /// Deliver any event to the active state
    pub fn send(&self, event: &Event) -> Result<()> {
        Ok(self.chart.send(event)?)
    }

    /// Run a command on the lifecycle's task and wait for its result
    ///
    /// A failing command is reported here and leaves the lifecycle running.
    pub async fn dispatch(&self, command: impl Into<Command>) -> Result<()> {
        let command = command.into();
        let (reply, response) = oneshot::channel();
        self.chart.call(move |s| {
            let _ = reply.send(s.dispatch(command));
            Ok(())
        })?;
        response
            .await
            .map_err(|_| Error::Chart(ChartError::DriverClosed))?
    }

    pub fn is_closed(&self) -> bool {
        self.chart.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_builds() {
        let events = LifecycleEvents::new();
        let chart = lifecycle_chart(&events, Duration::from_secs(5)).unwrap();
        assert_eq!(chart.name(), "lifecycle");
        assert!(!chart.is_started());
    }

    #[test]
    fn test_events_are_distinct() {
        let events = LifecycleEvents::new();
        assert_ne!(events.pause, events.resume);
        assert_ne!(LifecycleEvents::new().quit, events.quit);
        assert_eq!(events.retry.name(), "Retry");
    }
}
