//! Player progression façade

use crate::config::ProgressionConfig;
use crate::error::{Error, Notifications, Result};
use crate::state::PlayerState;
use std::rc::Rc;
use waypoint_core::{FieldReader, ReactiveField};
use waypoint_store::{BagHandle, DomainStore};

/// Sole gateway for changing the player bag
///
/// Owns the reactive fields bound to [`PlayerState`] and hands out read-only
/// views of them. Mutating operations are only reachable through commands.
pub struct PlayerLogic {
    bag: BagHandle<PlayerState>,
    progression: Rc<ProgressionConfig>,
    level: ReactiveField<u32>,
    xp: ReactiveField<i64>,
    best_score: ReactiveField<i64>,
    nickname: ReactiveField<String>,
    favorite_skin: ReactiveField<u32>,
    history: ReactiveField<Vec<u32>>,
}

impl PlayerLogic {
    /// Bind the façade to the player bag
    pub fn new(store: &DomainStore, progression: Rc<ProgressionConfig>) -> Result<Self> {
        let bag = store.bag::<PlayerState>()?;
        Ok(Self {
            level: bag.field(|p| p.level, |p, v| p.level = v),
            xp: bag.field(|p| p.xp, |p, v| p.xp = v),
            best_score: bag.field(|p| p.best_score, |p, v| p.best_score = v),
            nickname: bag.field(|p| p.nickname.clone(), |p, v: String| {
                p.nickname = v.trim().to_string()
            }),
            favorite_skin: bag.field(|p| p.favorite_skin, |p, v| p.favorite_skin = v),
            history: bag.field(|p| p.game_results.clone(), |p, v| p.game_results = v),
            bag,
            progression,
        })
    }

    /// The player's level
    pub fn level(&self) -> FieldReader<u32> {
        self.level.reader()
    }

    /// Experience towards the next level
    pub fn xp(&self) -> FieldReader<i64> {
        self.xp.reader()
    }

    /// Highest score ever recorded
    pub fn best_score(&self) -> FieldReader<i64> {
        self.best_score.reader()
    }

    /// Display name
    pub fn nickname(&self) -> FieldReader<String> {
        self.nickname.reader()
    }

    /// Skin selected by default
    pub fn favorite_skin(&self) -> FieldReader<u32> {
        self.favorite_skin.reader()
    }

    /// Recent ranks, newest first
    pub fn history(&self) -> FieldReader<Vec<u32>> {
        self.history.reader()
    }

    /// Rank of the `index`-th most recent match
    pub fn game_result(&self, index: usize) -> Option<u32> {
        self.bag.read(|p| p.game_results.get(index).copied())
    }

    /// XP needed to leave the current level
    pub fn xp_to_next_level(&self) -> i64 {
        self.progression.threshold(self.level.get())
    }

    /// Add experience, levelling up as many times as it covers
    ///
    /// Each level-up inside the threshold table is published separately, so
    /// observers never see a listed level skipped. Past the table every level
    /// costs the same and the remaining levels are granted in one step. A
    /// negative amount only removes experience: the level never goes down
    /// and XP stops at zero.
    ///
    /// Nothing is written when the resulting level would not fit in a `u32`.
    pub(crate) fn add_experience(&self, amount: i64) -> Result<()> {
        let mut xp = self.xp.get().saturating_add(amount).max(0);
        let mut level = self.level.get();
        let flat_from = self.progression.flat_from_level();
        let mut reached = Vec::new();

        loop {
            let threshold = self.progression.threshold(level);
            if threshold <= 0 {
                return Err(Error::invariant(format!(
                    "threshold for level {level} must be positive"
                )));
            }
            if xp < threshold {
                break;
            }
            if level >= flat_from {
                let gained = xp / threshold;
                level = u32::try_from(gained)
                    .ok()
                    .and_then(|gained| level.checked_add(gained))
                    .ok_or_else(|| {
                        Error::invariant(format!("level {level} cannot rise by {gained}"))
                    })?;
                xp %= threshold;
                reached.push(level);
                break;
            }
            xp -= threshold;
            level += 1;
            reached.push(level);
        }

        let mut notes = Notifications::default();
        for level in reached {
            notes.track(self.level.set(level));
        }
        notes.track(self.xp.set(xp));

        tracing::debug!(amount, level, xp, "experience added");
        notes.finish()
    }

    /// Record the outcome of a finished match
    ///
    /// The best score is only replaced when beaten. The rank history keeps
    /// its length: every entry moves one slot towards the oldest end, the
    /// oldest falls off and `rank` becomes the newest.
    pub(crate) fn record_match_result(&self, score: i64, rank: u32) -> Result<()> {
        let mut notes = Notifications::default();
        if score > self.best_score.get() {
            notes.track(self.best_score.set(score));
        }

        let mut history = self.history.get();
        history.rotate_right(1);
        if let Some(newest) = history.first_mut() {
            *newest = rank;
        }
        notes.track(self.history.set(history));

        notes.finish()
    }

    /// Resize the stored history to the configured length
    ///
    /// Keeps the newest entries and pads with zeros, so the history is
    /// exactly `history_len` long from here on.
    pub(crate) fn normalize_history(&self) -> Result<()> {
        let mut history = self.history.get();
        if history.len() == self.progression.history_len {
            return Ok(());
        }
        history.resize(self.progression.history_len, 0);
        Ok(self.history.set(history)?)
    }

    pub(crate) fn set_nickname(&self, nickname: &str) -> Result<()> {
        if nickname.trim().is_empty() {
            return Err(Error::invariant("nickname must not be blank"));
        }
        Ok(self.nickname.set(nickname.to_string())?)
    }

    pub(crate) fn set_favorite_skin(&self, skin: u32) -> Result<()> {
        Ok(self.favorite_skin.set(skin)?)
    }
}
