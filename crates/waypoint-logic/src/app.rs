//! Installation, session and settings façade

use crate::error::{Error, Result};
use crate::state::{ApplicationState, QualityLevel};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use waypoint_core::{FieldReader, ReactiveField};
use waypoint_store::{BagHandle, DomainStore};

/// Sole gateway for changing the application bag
pub struct AppLogic {
    bag: BagHandle<ApplicationState>,
    device_id: ReactiveField<String>,
    haptic: ReactiveField<bool>,
    fps_target: ReactiveField<u32>,
    graphic_quality: ReactiveField<QualityLevel>,
    quit_reason: RefCell<Option<String>>,
}

impl AppLogic {
    /// Bind the façade to the application bag
    pub fn new(store: &DomainStore) -> Result<Self> {
        let bag = store.bag::<ApplicationState>()?;
        Ok(Self {
            device_id: bag.field(
                |a| a.device_auth_id.clone(),
                |a, v: String| a.device_auth_id = v.trim().to_string(),
            ),
            haptic: bag.field(|a| a.haptic_enabled, |a, v| a.haptic_enabled = v),
            fps_target: bag.field(|a| a.fps_target, |a, v| a.fps_target = v),
            graphic_quality: bag.field(|a| a.graphic_quality, |a, v| a.graphic_quality = v),
            bag,
            quit_reason: RefCell::new(None),
        })
    }

    /// Device credential linked to the backend account; blank when unlinked
    pub fn device_id(&self) -> FieldReader<String> {
        self.device_id.reader()
    }

    pub fn haptic(&self) -> FieldReader<bool> {
        self.haptic.reader()
    }

    pub fn fps_target(&self) -> FieldReader<u32> {
        self.fps_target.reader()
    }

    pub fn graphic_quality(&self) -> FieldReader<QualityLevel> {
        self.graphic_quality.reader()
    }

    /// Whether a device credential is stored
    pub fn is_device_linked(&self) -> bool {
        !self.device_id.get().is_empty()
    }

    /// Whether the current session is the first one ever
    pub fn is_first_session(&self) -> bool {
        self.bag.read(|a| a.is_first_session)
    }

    /// Whether the player already reviewed the game
    pub fn is_game_reviewed(&self) -> bool {
        self.bag.read(|a| a.game_review_date.is_some())
    }

    /// Backend environment the stored data belongs to
    pub fn environment(&self) -> String {
        self.bag.read(|a| a.environment.clone())
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.bag.read(|a| a.login_time)
    }

    pub fn last_login_time(&self) -> Option<DateTime<Utc>> {
        self.bag.read(|a| a.last_login_time)
    }

    pub fn first_login_time(&self) -> Option<DateTime<Utc>> {
        self.bag.read(|a| a.first_login_time)
    }

    /// Why the game is quitting, if it is
    pub fn quit_reason(&self) -> Option<String> {
        self.quit_reason.borrow().clone()
    }

    /// Record the reason the game is about to quit
    ///
    /// Kept for the rest of the session only; it is never persisted.
    pub fn quit_game(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::info!(%reason, "quit requested");
        *self.quit_reason.borrow_mut() = Some(reason);
    }

    /// Login bookkeeping for a new session
    ///
    /// A bag that never saw a login gets `now` as its first, previous and
    /// current login and is flagged as the first session. Otherwise the
    /// previous login moves to `last_login_time`.
    pub(crate) fn begin_session(&self, now: DateTime<Utc>, environment: Option<&str>) {
        self.bag.write(|a| {
            a.is_first_session = a.first_login_time.is_none();
            if a.is_first_session {
                a.first_login_time = Some(now);
                a.login_time = Some(now);
            }
            a.last_login_time = a.login_time;
            a.login_time = Some(now);
            if let Some(environment) = environment {
                a.environment = environment.to_string();
            }
        });
        tracing::debug!(first = self.is_first_session(), "session started");
    }

    pub(crate) fn link_device(&self, device_id: &str) -> Result<()> {
        if device_id.trim().is_empty() {
            return Err(Error::invariant("device id must not be blank"));
        }
        Ok(self.device_id.set(device_id.to_string())?)
    }

    pub(crate) fn unlink_device(&self) -> Result<()> {
        Ok(self.device_id.set(String::new())?)
    }

    pub(crate) fn mark_game_reviewed(&self, now: DateTime<Utc>) -> Result<()> {
        if self.is_game_reviewed() {
            return Err(Error::invariant("game was already reviewed"));
        }
        self.bag.write(|a| a.game_review_date = Some(now));
        Ok(())
    }

    pub(crate) fn set_haptic(&self, enabled: bool) -> Result<()> {
        Ok(self.haptic.set(enabled)?)
    }

    pub(crate) fn set_fps_target(&self, fps: u32) -> Result<()> {
        if fps == 0 {
            return Err(Error::invariant("fps target must be positive"));
        }
        Ok(self.fps_target.set(fps)?)
    }

    pub(crate) fn set_graphic_quality(&self, quality: QualityLevel) -> Result<()> {
        Ok(self.graphic_quality.set(quality)?)
    }

    /// Push the stored settings through their fields so listeners apply them
    pub(crate) fn republish_settings(&self) -> Result<()> {
        let mut notes = crate::error::Notifications::default();
        notes.track(self.haptic.set(self.haptic.get()));
        notes.track(self.fps_target.set(self.fps_target.get()));
        notes.track(self.graphic_quality.set(self.graphic_quality.get()));
        notes.finish()
    }
}
