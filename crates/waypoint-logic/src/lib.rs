//! Waypoint Logic - Domain rules behind the command dispatcher
//!
//! State lives in bags owned by the `DomainStore`. The only code allowed to
//! change a bag is a façade in this crate, and the only way to reach a
//! façade's mutating operations is a [`GameCommand`] run by the
//! [`CommandDispatcher`]:
//!
//! ```text
//! caller ──▶ CommandDispatcher::execute(cmd, &mut GameLogic)
//!                 │
//!                 ├─▶ cmd.execute(&mut GameLogic, &token) ─▶ PlayerLogic / AppLogic ─▶ bags
//!                 │                                        │
//!                 │                                        └─▶ ReactiveField listeners
//!                 └─▶ DomainStore::persist_all()   (only when the command succeeded)
//! ```
//!
//! Observers read state through [`FieldReader`](waypoint_core::FieldReader)s
//! and never write.

mod app;
mod command;
mod config;
mod dispatch;
mod error;
mod game;
mod player;
mod state;

pub use app::AppLogic;
pub use command::{
    AddExperience, BeginSession, Command, DispatchToken, EndGameResults, GameCommand, LinkDevice,
    MarkGameReviewed, SetFavoriteSkin, SetNickname, UnlinkDevice, UpdateSettings,
};
pub use config::ProgressionConfig;
pub use dispatch::CommandDispatcher;
pub use error::{DispatchError, Error, Result};
pub use game::GameLogic;
pub use player::PlayerLogic;
pub use state::{ApplicationState, PlayerState, QualityLevel};
