//! State bags owned by the domain store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waypoint_core::BagKind;
use waypoint_store::Bag;

/// Graphics detail level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityLevel {
    High,
    #[default]
    Medium,
    Low,
}

/// Everything persisted about the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current level, starting at 1
    pub level: u32,
    /// Experience accumulated towards the next level
    pub xp: i64,
    /// Display name, stored trimmed
    pub nickname: String,
    /// Highest match score ever recorded
    pub best_score: i64,
    /// Skin preselected when a match starts
    pub favorite_skin: u32,
    /// Ranks of the most recent matches, newest first
    pub game_results: Vec<u32>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            nickname: String::new(),
            best_score: 0,
            favorite_skin: 0,
            game_results: vec![0; crate::config::DEFAULT_HISTORY_LEN],
        }
    }
}

impl Bag for PlayerState {
    const KIND: BagKind = BagKind("player");
}

/// Everything persisted about the app installation and its sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    /// First time the app was ever opened
    pub first_login_time: Option<DateTime<Utc>>,
    /// Start of the previous session
    pub last_login_time: Option<DateTime<Utc>>,
    /// Start of the current session
    pub login_time: Option<DateTime<Utc>>,
    /// Whether the current session is the first one
    pub is_first_session: bool,
    /// Backend environment the data belongs to
    pub environment: String,
    /// Device credential linked to a backend account; blank when unlinked
    pub device_auth_id: String,
    /// When the player reviewed the game, if ever
    pub game_review_date: Option<DateTime<Utc>>,
    pub haptic_enabled: bool,
    pub fps_target: u32,
    pub graphic_quality: QualityLevel,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            first_login_time: None,
            last_login_time: None,
            login_time: None,
            is_first_session: false,
            environment: String::new(),
            device_auth_id: String::new(),
            game_review_date: None,
            haptic_enabled: true,
            fps_target: 30,
            graphic_quality: QualityLevel::Medium,
        }
    }
}

impl Bag for ApplicationState {
    const KIND: BagKind = BagKind("application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use waypoint_store::{DomainStore, MemoryPersistence};

    #[test]
    fn test_defaults() {
        let player = PlayerState::default();
        assert_eq!(player.level, 1);
        assert_eq!(player.game_results.len(), 5);

        let app = ApplicationState::default();
        assert!(app.haptic_enabled);
        assert_eq!(app.fps_target, 30);
        assert_eq!(app.graphic_quality, QualityLevel::Medium);
    }

    #[test]
    fn test_bags_round_trip() {
        let backend = MemoryPersistence::new();
        let mut store = DomainStore::new(backend.clone());
        store.load::<PlayerState>().unwrap();
        store.load::<ApplicationState>().unwrap();

        let player = PlayerState {
            level: 7,
            xp: 12,
            nickname: "vex".to_string(),
            best_score: 4200,
            favorite_skin: 3,
            game_results: vec![1, 4, 2, 2, 9],
        };
        let login = Utc.with_ymd_and_hms(2024, 5, 4, 12, 30, 0).unwrap();
        let app = ApplicationState {
            first_login_time: Some(login),
            login_time: Some(login),
            device_auth_id: "device-1".to_string(),
            graphic_quality: QualityLevel::Low,
            ..ApplicationState::default()
        };
        store.add_or_replace(player.clone()).unwrap();
        store.add_or_replace(app.clone()).unwrap();
        store.persist_all().unwrap();

        let mut reopened = DomainStore::new(backend);
        reopened.load::<PlayerState>().unwrap();
        reopened.load::<ApplicationState>().unwrap();
        assert_eq!(reopened.bag::<PlayerState>().unwrap().snapshot(), player);
        assert_eq!(reopened.bag::<ApplicationState>().unwrap().snapshot(), app);
    }
}
