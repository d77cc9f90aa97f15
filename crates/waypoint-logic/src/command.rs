//! Commands: the only way to mutate domain state

use crate::error::{Error, Result};
use crate::game::GameLogic;
use crate::state::QualityLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One mutation of domain state
///
/// A command carries only the data it needs. It is consumed by `execute`, so
/// it runs exactly once and is never replayed.
pub trait GameCommand: Debug {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Apply the mutation through the façades
    ///
    /// Only the [`CommandDispatcher`](crate::CommandDispatcher) holds a
    /// [`DispatchToken`], so a command cannot be applied around it:
    ///
    /// ```compile_fail
    /// use waypoint_logic::{AddExperience, DispatchToken, GameCommand, GameLogic};
    ///
    /// fn bypass(logic: &mut GameLogic) {
    ///     let _ = AddExperience { amount: 10 }.execute(logic, &DispatchToken(()));
    /// }
    /// ```
    fn execute(self, logic: &mut GameLogic, token: &DispatchToken) -> Result<()>;
}

/// Permission to run a command, only created by the dispatcher
#[derive(Debug)]
pub struct DispatchToken(());

impl DispatchToken {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

/// Record a finished match and award its XP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndGameResults {
    pub match_score: i64,
    /// Finishing position; 0 is first place
    pub match_rank: u32,
}

impl GameCommand for EndGameResults {
    fn name(&self) -> &'static str {
        "end_game_results"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        let reward = logic
            .progression()
            .rank_reward(self.match_rank)
            .ok_or_else(|| Error::invariant(format!("no XP reward for rank {}", self.match_rank)))?;

        let player = logic.player();
        let recorded = player.record_match_result(self.match_score, self.match_rank);
        let awarded = player.add_experience(reward);
        recorded.and(awarded)
    }
}

/// Grant XP outside of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddExperience {
    pub amount: i64,
}

impl GameCommand for AddExperience {
    fn name(&self) -> &'static str {
        "add_experience"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.player().add_experience(self.amount)
    }
}

/// Login bookkeeping at the start of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginSession {
    pub now: DateTime<Utc>,
    /// Backend environment to record, if known
    pub environment: Option<String>,
}

impl GameCommand for BeginSession {
    fn name(&self) -> &'static str {
        "begin_session"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.app().begin_session(self.now, self.environment.as_deref());
        Ok(())
    }
}

/// Store the device credential of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDevice {
    pub device_id: String,
}

impl GameCommand for LinkDevice {
    fn name(&self) -> &'static str {
        "link_device"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.app().link_device(&self.device_id)
    }
}

/// Forget the stored device credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkDevice;

impl GameCommand for UnlinkDevice {
    fn name(&self) -> &'static str {
        "unlink_device"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.app().unlink_device()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkGameReviewed {
    pub now: DateTime<Utc>,
}

impl GameCommand for MarkGameReviewed {
    fn name(&self) -> &'static str {
        "mark_game_reviewed"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.app().mark_game_reviewed(self.now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNickname {
    pub nickname: String,
}

impl GameCommand for SetNickname {
    fn name(&self) -> &'static str {
        "set_nickname"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.player().set_nickname(&self.nickname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFavoriteSkin {
    pub skin: u32,
}

impl GameCommand for SetFavoriteSkin {
    fn name(&self) -> &'static str {
        "set_favorite_skin"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        logic.player().set_favorite_skin(self.skin)
    }
}

/// Change any subset of the player settings
///
/// Every value is checked before the first one is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSettings {
    pub haptic_enabled: Option<bool>,
    pub fps_target: Option<u32>,
    pub graphic_quality: Option<QualityLevel>,
}

impl GameCommand for UpdateSettings {
    fn name(&self) -> &'static str {
        "update_settings"
    }

    fn execute(self, logic: &mut GameLogic, _: &DispatchToken) -> Result<()> {
        if self.fps_target == Some(0) {
            return Err(Error::invariant("fps target must be positive"));
        }
        let app = logic.app();
        if let Some(enabled) = self.haptic_enabled {
            app.set_haptic(enabled)?;
        }
        if let Some(fps) = self.fps_target {
            app.set_fps_target(fps)?;
        }
        if let Some(quality) = self.graphic_quality {
            app.set_graphic_quality(quality)?;
        }
        Ok(())
    }
}

/// Any command, as a single serializable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    EndGameResults(EndGameResults),
    AddExperience(AddExperience),
    BeginSession(BeginSession),
    LinkDevice(LinkDevice),
    UnlinkDevice(UnlinkDevice),
    MarkGameReviewed(MarkGameReviewed),
    SetNickname(SetNickname),
    SetFavoriteSkin(SetFavoriteSkin),
    UpdateSettings(UpdateSettings),
}

impl GameCommand for Command {
    fn name(&self) -> &'static str {
        match self {
            Command::EndGameResults(cmd) => cmd.name(),
            Command::AddExperience(cmd) => cmd.name(),
            Command::BeginSession(cmd) => cmd.name(),
            Command::LinkDevice(cmd) => cmd.name(),
            Command::UnlinkDevice(cmd) => cmd.name(),
            Command::MarkGameReviewed(cmd) => cmd.name(),
            Command::SetNickname(cmd) => cmd.name(),
            Command::SetFavoriteSkin(cmd) => cmd.name(),
            Command::UpdateSettings(cmd) => cmd.name(),
        }
    }

    fn execute(self, logic: &mut GameLogic, token: &DispatchToken) -> Result<()> {
        match self {
            Command::EndGameResults(cmd) => cmd.execute(logic, token),
            Command::AddExperience(cmd) => cmd.execute(logic, token),
            Command::BeginSession(cmd) => cmd.execute(logic, token),
            Command::LinkDevice(cmd) => cmd.execute(logic, token),
            Command::UnlinkDevice(cmd) => cmd.execute(logic, token),
            Command::MarkGameReviewed(cmd) => cmd.execute(logic, token),
            Command::SetNickname(cmd) => cmd.execute(logic, token),
            Command::SetFavoriteSkin(cmd) => cmd.execute(logic, token),
            Command::UpdateSettings(cmd) => cmd.execute(logic, token),
        }
    }
}

macro_rules! into_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(cmd: $variant) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*
    };
}

into_command!(
    EndGameResults,
    AddExperience,
    BeginSession,
    LinkDevice,
    UnlinkDevice,
    MarkGameReviewed,
    SetNickname,
    SetFavoriteSkin,
    UpdateSettings,
);
