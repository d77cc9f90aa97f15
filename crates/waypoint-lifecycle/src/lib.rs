//! Waypoint Lifecycle - Bootstrap, authentication and gameplay orchestration
//!
//! Ties the other waypoint crates together:
//! - a [`Session`] owns the façades, the dispatcher and the external
//!   services ([`AuthProvider`], [`ContentLoader`], a clock and the
//!   [`EventBus`])
//! - a [`Lifecycle`] runs the lifecycle statechart over that session on a
//!   `ChartDriver`
//! - a [`LifecycleHandle`] lets the rest of the program pause, resume, quit
//!   and dispatch commands while the lifecycle runs
//!
//! Everything the lifecycle does that others may care about is published as
//! a [`LifecycleMessage`].

mod auth;
mod bus;
mod config;
mod error;
mod loader;
mod orchestrator;
mod session;

pub use auth::{AuthFailure, AuthProvider, AuthResult, AuthSession, LoginMethod, MockAuthProvider};
pub use bus::{EventBus, LifecycleMessage, Phase};
pub use config::LifecycleConfig;
pub use error::{Error, Result};
pub use loader::{ContentLoader, LoadError, NoopLoader};
pub use orchestrator::{
    lifecycle_chart, Lifecycle, LifecycleEvents, LifecycleHandle, IDLE_QUIT_REASON,
};
pub use session::{Services, Session};
pub use waypoint_chart::Completed;
