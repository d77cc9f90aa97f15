//! Lifecycle configuration loaded once at startup

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use waypoint_logic::ProgressionConfig;

/// Settings for one run of the game lifecycle
///
/// Every field has a default, so a RON file only needs the values it
/// changes:
///
/// ```
/// use waypoint_lifecycle::LifecycleConfig;
///
/// let config = LifecycleConfig::from_ron_str(
///     r#"(environment: "staging", idle_timeout_secs: 30)"#,
/// )
/// .unwrap();
/// assert_eq!(config.environment, "staging");
/// assert_eq!(config.idle_timeout().as_secs(), 30);
/// assert_eq!(config.progression.history_len, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Database file holding the state bags
    pub data_path: PathBuf,
    /// Backend environment recorded with each session
    pub environment: String,
    /// How long the game may stay paused before it quits on its own
    pub idle_timeout_secs: u64,
    /// Whether the lifecycle chart keeps a transition journal
    pub record_transitions: bool,
    /// Progression tables for the player façade
    pub progression: ProgressionConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("waypoint.db"),
            environment: "production".to_string(),
            idle_timeout_secs: 300,
            record_transitions: false,
            progression: ProgressionConfig::default(),
        }
    }
}

impl LifecycleConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded lifecycle config");
        Self::from_ron_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_secs == 0 {
            return Err(Error::Config("idle_timeout_secs must be positive".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(Error::Config("environment must not be blank".to_string()));
        }
        self.progression.validate()?;
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
