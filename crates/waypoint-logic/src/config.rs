//! Progression tables loaded once at startup

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub(crate) const DEFAULT_HISTORY_LEN: usize = 5;

/// Fixed numbers that drive player progression
///
/// Loaded once, validated, then shared read-only with the façades.
///
/// # Example
///
/// ```
/// use waypoint_logic::ProgressionConfig;
///
/// let config = ProgressionConfig::from_ron_str(
///     "(history_len: 3, rank_xp: [50, 20], level_thresholds: [100, 150])",
/// )
/// .unwrap();
/// assert_eq!(config.threshold(1), 100);
/// assert_eq!(config.threshold(9), 150);
/// assert_eq!(config.rank_reward(1), Some(20));
/// assert_eq!(config.rank_reward(2), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// How many match results the player history keeps
    pub history_len: usize,
    /// XP awarded per finishing rank; index 0 is first place
    pub rank_xp: Vec<i64>,
    /// XP needed to leave each level; index 0 is level 1.
    /// Levels past the end reuse the last entry.
    pub level_thresholds: Vec<i64>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            rank_xp: vec![150, 100, 75, 50, 25],
            level_thresholds: vec![100, 150, 200, 250, 300, 350, 400, 450, 500, 550],
        }
    }
}

impl ProgressionConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Check the tables can drive the levelling loop
    pub fn validate(&self) -> Result<()> {
        if self.history_len == 0 {
            return Err(Error::Config("history_len must be at least 1".to_string()));
        }
        if self.level_thresholds.is_empty() {
            return Err(Error::Config("level_thresholds must not be empty".to_string()));
        }
        if let Some(bad) = self.level_thresholds.iter().find(|t| **t <= 0) {
            return Err(Error::Config(format!(
                "level thresholds must be positive, found {}",
                bad
            )));
        }
        if self.rank_xp.is_empty() {
            return Err(Error::Config("rank_xp must not be empty".to_string()));
        }
        Ok(())
    }

    /// XP required to advance from `level` to the next one
    pub fn threshold(&self, level: u32) -> i64 {
        let index = (level.max(1) - 1) as usize;
        self.level_thresholds
            .get(index)
            .or_else(|| self.level_thresholds.last())
            .copied()
            .unwrap_or(i64::MAX)
    }

    /// First level from which every threshold is the last listed one
    pub fn flat_from_level(&self) -> u32 {
        u32::try_from(self.level_thresholds.len())
            .unwrap_or(u32::MAX)
            .max(1)
    }

    /// XP awarded for finishing at `rank`
    pub fn rank_reward(&self, rank: u32) -> Option<i64> {
        self.rank_xp.get(rank as usize).copied()
    }
}
