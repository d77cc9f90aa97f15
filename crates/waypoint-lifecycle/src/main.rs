//! Waypoint - runs one game session from bootstrap to quit
//!
//! Authentication and content loading are stand-ins; the session plays a
//! single scripted match and then quits, or pauses and lets the idle timer
//! end it.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypoint_lifecycle::{
    Lifecycle, LifecycleConfig, LifecycleHandle, LifecycleMessage, MockAuthProvider, NoopLoader,
    Phase, Services, Session,
};
use waypoint_logic::{EndGameResults, LinkDevice};
use waypoint_store::{DbPersistence, DomainStore};

#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(about = "Run a game session through the waypoint lifecycle", long_about = None)]
struct Args {
    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Backend environment, overriding the configuration
    #[arg(short, long)]
    env: Option<String>,

    /// Link this device id before starting
    #[arg(long)]
    device: Option<String>,

    /// Simulate a backend that cannot be reached
    #[arg(long)]
    offline: bool,

    /// Score of the scripted match
    #[arg(long, default_value = "1200")]
    score: i64,

    /// Finishing rank of the scripted match, 0 being first place
    #[arg(long, default_value = "0")]
    rank: u32,

    /// Pause after the match instead of quitting
    #[arg(long)]
    idle: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypoint=info,waypoint_lifecycle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LifecycleConfig::load_file(path)?,
        None => LifecycleConfig::default(),
    };
    if let Some(data) = args.data.clone() {
        config.data_path = data;
    }
    if let Some(env) = args.env.clone() {
        config.environment = env;
    }
    config.validate()?;
    tracing::info!(data = %config.data_path.display(), env = %config.environment, "starting");

    let auth = Arc::new(MockAuthProvider::new());
    auth.set_reachable(!args.offline);
    let services = Services::new(auth, Arc::new(NoopLoader::new()));
    let store = DomainStore::new(DbPersistence::open(&config.data_path)?);
    let mut session = Session::new(store, config, services)?;
    if let Some(device_id) = args.device.clone() {
        session.dispatch(LinkDevice { device_id })?;
    }

    let lifecycle = Lifecycle::new(session)?;
    let handle = lifecycle.handle();
    let mut messages = lifecycle.subscribe();

    // The script owns the only handle, so the lifecycle cannot outlive it
    let script = async move {
        let outcome = play(&handle, &mut messages, &args).await;
        if let Err(err) = &outcome {
            tracing::error!(error = %err, "session script failed, quitting");
            let _ = handle.quit("script failed");
        }
        outcome
    };

    let (done, script) = tokio::join!(lifecycle.run(), script);
    script?;
    let done = done?;

    let player = done.context.logic().player();
    tracing::info!(
        level = player.level().get(),
        xp = player.xp().get(),
        best_score = player.best_score().get(),
        history = ?player.history().get(),
        "session over"
    );
    Ok(())
}

/// Play one scripted match once gameplay starts
async fn play(
    handle: &LifecycleHandle,
    messages: &mut broadcast::Receiver<LifecycleMessage>,
    args: &Args,
) -> anyhow::Result<()> {
    loop {
        match messages.recv().await {
            Ok(LifecycleMessage::AuthenticationFailed { retryable, reason }) => {
                tracing::warn!(retryable, %reason, "playing offline");
                handle.skip()?;
            }
            Ok(LifecycleMessage::PhaseEntered {
                phase: Phase::Gameplay,
            }) => break,
            Ok(message) => tracing::info!(?message, "lifecycle"),
            Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "messages lost"),
            Err(RecvError::Closed) => return Ok(()),
        }
    }

    handle
        .dispatch(EndGameResults {
            match_score: args.score,
            match_rank: args.rank,
        })
        .await?;
    if args.idle {
        handle.pause()?;
    } else {
        handle.quit("player quit")?;
    }
    Ok(())
}
