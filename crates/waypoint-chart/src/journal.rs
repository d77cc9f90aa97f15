//! Transition journal for auditing and determinism checks
//!
//! The journal records, in order:
//! - every state entered and exited
//! - every transition with what caused it
//! - events that no active state handled
//! - wait completions that arrived after their state was left
//!
//! Two runs of the same chart fed the same inputs produce equal journals.

use serde::{Deserialize, Serialize};

/// Why a transition was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// Leaving an Initial state
    Initial,
    /// A Choice picked this branch
    Choice,
    /// An event matched the active leaf
    Event(String),
    /// A wait finished with `Done`
    WaitDone,
    /// A Nested state's sub-chart reached Final
    Completion,
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// A state was entered
    Entered {
        seq: u64,
        /// Qualified state name, e.g. `Game/Paused`
        state: String,
    },
    /// A state was exited
    Exited { seq: u64, state: String },
    /// A transition was taken
    Transition {
        seq: u64,
        from: String,
        to: String,
        cause: Cause,
    },
    /// An event reached a leaf with no transition for it
    Dropped {
        seq: u64,
        event: String,
        state: String,
    },
    /// A wait completion arrived for an entry that is no longer active
    Stale { seq: u64, state: String },
    /// The root chart reached Final
    Completed { seq: u64 },
}

impl JournalEntry {
    /// Sequence number of this entry
    pub fn seq(&self) -> u64 {
        match self {
            JournalEntry::Entered { seq, .. }
            | JournalEntry::Exited { seq, .. }
            | JournalEntry::Transition { seq, .. }
            | JournalEntry::Dropped { seq, .. }
            | JournalEntry::Stale { seq, .. }
            | JournalEntry::Completed { seq } => *seq,
        }
    }
}

/// Configuration for the journal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Whether recording is enabled
    pub recording_enabled: bool,
    /// Maximum number of entries to keep (0 = unlimited)
    pub max_entries: usize,
}

/// Ordered record of what a chart did
#[derive(Debug, Clone, Default)]
pub struct Journal {
    config: JournalConfig,
    entries: Vec<JournalEntry>,
    next_seq: u64,
}

impl Journal {
    /// Create a journal that is not recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: JournalConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn start_recording(&mut self) {
        self.config.recording_enabled = true;
    }

    pub fn stop_recording(&mut self) {
        self.config.recording_enabled = false;
    }

    pub fn is_recording(&self) -> bool {
        self.config.recording_enabled
    }

    pub(crate) fn entered(&mut self, state: String) {
        self.push(|seq| JournalEntry::Entered { seq, state });
    }

    pub(crate) fn exited(&mut self, state: String) {
        self.push(|seq| JournalEntry::Exited { seq, state });
    }

    pub(crate) fn transition(&mut self, from: String, to: String, cause: Cause) {
        self.push(|seq| JournalEntry::Transition {
            seq,
            from,
            to,
            cause,
        });
    }

    pub(crate) fn dropped(&mut self, event: String, state: String) {
        self.push(|seq| JournalEntry::Dropped { seq, event, state });
    }

    pub(crate) fn stale(&mut self, state: String) {
        self.push(|seq| JournalEntry::Stale { seq, state });
    }

    pub(crate) fn completed(&mut self) {
        self.push(|seq| JournalEntry::Completed { seq });
    }

    fn push(&mut self, entry: impl FnOnce(u64) -> JournalEntry) {
        if !self.config.recording_enabled {
            return;
        }
        self.entries.push(entry(self.next_seq));
        self.next_seq += 1;
        self.enforce_limits();
    }

    /// Get all entries
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Transitions only, as `(from, to, cause)`
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &Cause)> {
        self.entries.iter().filter_map(|e| match e {
            JournalEntry::Transition { from, to, cause, .. } => {
                Some((from.as_str(), to.as_str(), cause))
            }
            _ => None,
        })
    }

    /// Qualified names of every state entered, in order
    pub fn entered_states(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                JournalEntry::Entered { state, .. } => Some(state.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether a state with this qualified name was ever entered
    pub fn was_entered(&self, state: &str) -> bool {
        self.entered_states().contains(&state)
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }

    /// Get statistics about the journal
    pub fn stats(&self) -> JournalStats {
        let count = |f: fn(&JournalEntry) -> bool| self.entries.iter().filter(|e| f(e)).count();
        JournalStats {
            total_entries: self.entries.len(),
            transition_count: count(|e| matches!(e, JournalEntry::Transition { .. })),
            dropped_count: count(|e| matches!(e, JournalEntry::Dropped { .. })),
            stale_count: count(|e| matches!(e, JournalEntry::Stale { .. })),
        }
    }

    fn enforce_limits(&mut self) {
        if self.config.max_entries > 0 && self.entries.len() > self.config.max_entries {
            let excess = self.entries.len() - self.config.max_entries;
            self.entries.drain(0..excess);
        }
    }
}

/// Statistics about the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalStats {
    pub total_entries: usize,
    pub transition_count: usize,
    pub dropped_count: usize,
    /// Wait completions discarded by the token check
    pub stale_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_disabled() {
        let mut journal = Journal::new();
        journal.entered("Gameplay".to_string());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_journal_recording() {
        let mut journal = Journal::new();
        journal.start_recording();

        journal.entered("Initial".to_string());
        journal.transition("Initial".to_string(), "Menu".to_string(), Cause::Initial);
        journal.exited("Initial".to_string());
        journal.entered("Menu".to_string());
        journal.dropped("Resume".to_string(), "Menu".to_string());

        let stats = journal.stats();
        assert_eq!(stats.total_entries, 5);
        assert_eq!(stats.transition_count, 1);
        assert_eq!(stats.dropped_count, 1);
        assert_eq!(journal.entered_states(), vec!["Initial", "Menu"]);
        assert_eq!(journal.entries()[4].seq(), 4);
    }

    #[test]
    fn test_max_entries_limit() {
        let mut journal = Journal::with_config(JournalConfig {
            recording_enabled: true,
            max_entries: 3,
        });
        for n in 0..10 {
            journal.entered(format!("S{n}"));
        }

        assert_eq!(journal.entries().len(), 3);
        assert_eq!(journal.entries()[0].seq(), 7);
    }
}
