//! Poll domain types.
//!
//! A poll is a question with 2..=5 distinct options and a per-option tally
//! kept in insertion order. Closed polls are archived as immutable history
//! entries with monotonically increasing ids. The snapshot and history
//! types here are exactly what the persistence gateway stores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{PollError, PollResult};
use crate::notify::UserId;

/// Minimum number of options per poll.
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of options per poll.
pub const MAX_OPTIONS: usize = 5;

/// One option and its vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub label: String,
    #[serde(default)]
    pub votes: u32,
}

impl PollOption {
    /// Create an option with a zeroed tally.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            votes: 0,
        }
    }
}

/// The single possibly-active poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    /// Options in the order they were given at open time.
    pub options: Vec<PollOption>,
    /// Voter id -> chosen option label.
    #[serde(default)]
    pub votes: HashMap<UserId, String>,
    /// Seconds until automatic close; `None` when closing is manual only.
    /// May dip below zero transiently when a tick overshoots the close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

impl Poll {
    /// Validate and create a poll with zeroed tallies.
    ///
    /// The question must be non-empty and the options must be 2..=5
    /// non-empty, pairwise distinct labels.
    pub fn new(question: impl Into<String>, labels: Vec<String>) -> PollResult<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(PollError::InvalidPoll("question must not be empty".into()));
        }

        if labels.len() < MIN_OPTIONS || labels.len() > MAX_OPTIONS {
            return Err(PollError::InvalidPoll(format!(
                "expected {MIN_OPTIONS} to {MAX_OPTIONS} options, got {}",
                labels.len()
            )));
        }

        let mut options = Vec::with_capacity(labels.len());
        for label in labels {
            if label.trim().is_empty() {
                return Err(PollError::InvalidPoll("options must not be empty".into()));
            }
            if options.iter().any(|o: &PollOption| o.label == label) {
                return Err(PollError::InvalidPoll(format!(
                    "duplicate option: {label}"
                )));
            }
            options.push(PollOption::new(label));
        }

        Ok(Self {
            question,
            options,
            votes: HashMap::new(),
            remaining_seconds: None,
        })
    }

    /// Look up an option by label.
    pub fn option_mut(&mut self, label: &str) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|o| o.label == label)
    }

    /// Option labels in insertion order.
    pub fn labels(&self) -> Vec<String> {
        self.options.iter().map(|o| o.label.clone()).collect()
    }

    /// Multi-line results text: the question plus per-option vote counts.
    pub fn summary(&self) -> String {
        let mut out = format!("Poll question: {}", self.question);
        for option in &self.options {
            out.push_str(&format!("\n{}: {} votes", option.label, option.votes));
        }
        out
    }
}

/// Durable snapshot of the engine's poll state under the `poll` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub votes: HashMap<UserId, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

impl PollSnapshot {
    /// Capture the current poll state, or an inactive snapshot.
    pub fn capture(poll: Option<&Poll>) -> Self {
        match poll {
            Some(p) => Self {
                active: true,
                question: Some(p.question.clone()),
                options: p.options.clone(),
                votes: p.votes.clone(),
                remaining_seconds: p.remaining_seconds,
            },
            None => Self::default(),
        }
    }

    /// Rebuild the active poll, if the snapshot holds one.
    pub fn into_poll(self) -> Option<Poll> {
        if !self.active {
            return None;
        }
        Some(Poll {
            question: self.question?,
            options: self.options,
            votes: self.votes,
            remaining_seconds: self.remaining_seconds,
        })
    }
}

/// Immutable archive record of a closed poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u32,
    pub question: String,
    pub tally: Vec<PollOption>,
}

/// Archive of closed polls under the `poll_history` key, ascending by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollHistory {
    #[serde(default = "default_next_id")]
    pub next_id: u32,
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

fn default_next_id() -> u32 {
    1
}

impl Default for PollHistory {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

impl PollHistory {
    /// Archive a closed poll, assigning the next sequential id.
    ///
    /// Ids are `max(existing) + 1`, starting at 1 for an empty archive.
    pub fn archive(&mut self, question: String, tally: Vec<PollOption>) -> HistoryEntry {
        let id = self
            .entries
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(1, |max| max + 1);

        let entry = HistoryEntry {
            id,
            question,
            tally,
        };
        self.entries.push(entry.clone());
        self.next_id = id + 1;
        entry
    }

    /// Full entry by id.
    pub fn get(&self, id: u32) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// `(id, question)` pairs in ascending id order.
    pub fn list(&self) -> Vec<(u32, String)> {
        self.entries
            .iter()
            .map(|e| (e.id, e.question.clone()))
            .collect()
    }

    /// Drop all archived entries. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 1;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_new_zeroes_tally_for_valid_option_counts() {
        for count in MIN_OPTIONS..=MAX_OPTIONS {
            let labels: Vec<String> = (0..count).map(|i| format!("option {i}")).collect();
            let poll = Poll::new("Question?", labels.clone()).unwrap();

            assert_eq!(poll.options.len(), count);
            assert!(poll.options.iter().all(|o| o.votes == 0));
            assert_eq!(poll.labels(), labels);
            assert!(poll.votes.is_empty());
        }
    }

    #[test]
    fn test_poll_new_rejects_too_few_or_too_many_options() {
        let one = vec!["only".to_string()];
        assert!(matches!(
            Poll::new("Q?", one),
            Err(PollError::InvalidPoll(_))
        ));

        let six: Vec<String> = (0..6).map(|i| format!("o{i}")).collect();
        assert!(matches!(
            Poll::new("Q?", six),
            Err(PollError::InvalidPoll(_))
        ));
    }

    #[test]
    fn test_poll_new_rejects_duplicate_options() {
        let labels = vec!["Yes".to_string(), "No".to_string(), "Yes".to_string()];
        let err = Poll::new("Q?", labels).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_poll_new_rejects_empty_question_and_empty_option() {
        assert!(Poll::new("  ", vec!["a".into(), "b".into()]).is_err());
        assert!(Poll::new("Q?", vec!["a".into(), " ".into()]).is_err());
    }

    #[test]
    fn test_summary_lists_options_in_order() {
        let mut poll = Poll::new("Pizza?", vec!["Yes".into(), "No".into()]).unwrap();
        poll.option_mut("Yes").unwrap().votes = 2;

        assert_eq!(poll.summary(), "Poll question: Pizza?\nYes: 2 votes\nNo: 0 votes");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut poll = Poll::new("Pizza?", vec!["Yes".into(), "No".into()]).unwrap();
        poll.votes.insert(42, "Yes".to_string());
        poll.option_mut("Yes").unwrap().votes = 1;
        poll.remaining_seconds = Some(120);

        let snapshot = PollSnapshot::capture(Some(&poll));
        let json = serde_json::to_value(&snapshot).unwrap();
        let restored: PollSnapshot = serde_json::from_value(json).unwrap();

        assert_eq!(restored, snapshot);
        assert_eq!(restored.into_poll(), Some(poll));
    }

    #[test]
    fn test_inactive_snapshot_restores_no_poll() {
        let snapshot = PollSnapshot::capture(None);
        assert!(!snapshot.active);
        assert!(snapshot.into_poll().is_none());
    }

    #[test]
    fn test_history_ids_are_sequential_from_one() {
        let mut history = PollHistory::default();
        assert!(history.is_empty());

        let first = history.archive("First?".into(), vec![PollOption::new("a")]).id;
        let second = history.archive("Second?".into(), vec![PollOption::new("b")]).id;

        assert_eq!((first, second), (1, 2));
        assert_eq!(history.next_id, 3);
        assert_eq!(
            history.list(),
            vec![(1, "First?".to_string()), (2, "Second?".to_string())]
        );
    }

    #[test]
    fn test_history_clear_resets_ids() {
        let mut history = PollHistory::default();
        history.archive("Old?".into(), vec![PollOption::new("a")]);

        history.clear();
        history.clear();
        assert!(history.is_empty());

        let id = history.archive("New?".into(), vec![PollOption::new("a")]).id;
        assert_eq!(id, 1);
    }

    #[test]
    fn test_history_round_trip() {
        let mut history = PollHistory::default();
        history.archive(
            "Pizza?".into(),
            vec![
                PollOption {
                    label: "Yes".into(),
                    votes: 3,
                },
                PollOption {
                    label: "No".into(),
                    votes: 1,
                },
            ],
        );

        let json = serde_json::to_value(&history).unwrap();
        let restored: PollHistory = serde_json::from_value(json).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn test_history_get_unknown_id() {
        let history = PollHistory::default();
        assert!(history.get(7).is_none());
    }
}
