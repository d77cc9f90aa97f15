//! Gameplay content loading seam

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Content could not be prepared
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load {asset}: {reason}")]
pub struct LoadError {
    pub asset: String,
    pub reason: String,
}

/// Prepares whatever gameplay needs before the player can start
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load_gameplay(&self) -> Result<(), LoadError>;
}

/// Loader with nothing to load, optionally taking some time about it
#[derive(Debug, Clone, Default)]
pub struct NoopLoader {
    delay: Duration,
}

impl NoopLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ContentLoader for NoopLoader {
    async fn load_gameplay(&self) -> Result<(), LoadError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(delay_ms = self.delay.as_millis() as u64, "gameplay content ready");
        Ok(())
    }
}
