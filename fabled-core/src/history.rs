//! # History log
//!
//! Append-only record of everything a session has done. Entries are never
//! mutated or removed; only a full session reset clears the log, and the
//! caller holds the session's state lock while doing so, so readers never
//! see a partially-cleared log.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// How much observation text `recent` keeps per turn for display
const RECENT_OBSERVATION_LIMIT: usize = 200;

/// One completed turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Strictly increasing from 0, no gaps
    pub sequence_no: u64,
    pub command: String,
    pub observation: String,
    pub score: i32,
    /// Fingerprint of the world state after this turn
    pub state_hash: String,
    /// Unix seconds when the entry was appended
    pub timestamp: u64,
}

/// Trimmed view of a turn for agent-facing history listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTurn {
    pub turn: u64,
    pub command: String,
    pub result: String,
}

/// Append-only per-session log with a fingerprint membership index
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    hashes: HashSet<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn; the sequence number is assigned here
    pub fn append(
        &mut self,
        command: impl Into<String>,
        observation: impl Into<String>,
        score: i32,
        state_hash: impl Into<String>,
    ) -> &HistoryEntry {
        let state_hash = state_hash.into();
        self.hashes.insert(state_hash.clone());
        self.entries.push(HistoryEntry {
            sequence_no: self.entries.len() as u64,
            command: command.into(),
            observation: observation.into(),
            score,
            state_hash,
            timestamp: unix_now(),
        });
        self.entries.last().expect("just pushed")
    }

    /// The most recent `count` entries in chronological order
    /// (`None` = everything)
    pub fn entries(&self, count: Option<usize>) -> &[HistoryEntry] {
        match count {
            Some(n) => {
                let start = self.entries.len().saturating_sub(n);
                &self.entries[start..]
            }
            None => &self.entries,
        }
    }

    /// Has this exact world state been seen before in this session?
    pub fn contains_hash(&self, fingerprint: &str) -> bool {
        self.hashes.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The commands played so far, oldest first
    pub fn commands(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.command.clone()).collect()
    }

    /// Trimmed display view of the last `count` turns (0 = everything)
    pub fn recent(&self, count: usize) -> Vec<RecentTurn> {
        let slice = if count == 0 { self.entries(None) } else { self.entries(Some(count)) };
        slice
            .iter()
            .map(|e| RecentTurn {
                turn: e.sequence_no + 1,
                command: e.command.clone(),
                result: trim_observation(&e.observation),
            })
            .collect()
    }

    /// Drop every entry. Only a full session reset calls this.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hashes.clear();
    }
}

fn trim_observation(text: &str) -> String {
    if text.chars().count() <= RECENT_OBSERVATION_LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(RECENT_OBSERVATION_LIMIT).collect();
        format!("{}...", cut)
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> HistoryLog {
        let mut log = HistoryLog::new();
        for i in 0..n {
            log.append(format!("cmd {}", i), format!("obs {}", i), i as i32, format!("h{}", i));
        }
        log
    }

    #[test]
    fn test_sequence_numbers_have_no_gaps() {
        let log = filled(5);
        let seqs: Vec<u64> = log.entries(None).iter().map(|e| e.sequence_no).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_entries_returns_most_recent_in_order() {
        let log = filled(5);
        let last_two: Vec<&str> =
            log.entries(Some(2)).iter().map(|e| e.command.as_str()).collect();
        assert_eq!(last_two, vec!["cmd 3", "cmd 4"]);

        // Asking for more than exists returns everything
        assert_eq!(log.entries(Some(100)).len(), 5);
    }

    #[test]
    fn test_contains_hash() {
        let log = filled(3);
        assert!(log.contains_hash("h1"));
        assert!(!log.contains_hash("h9"));
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut log = filled(3);
        log.clear();
        assert!(log.is_empty());
        assert!(!log.contains_hash("h0"));

        // Sequence numbers restart after clear
        log.append("look", "West of House", 0, "h0");
        assert_eq!(log.entries(None)[0].sequence_no, 0);
    }

    #[test]
    fn test_recent_trims_long_observations() {
        let mut log = HistoryLog::new();
        let long = "x".repeat(500);
        log.append("read book", long, 0, "h");

        let recent = log.recent(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].turn, 1);
        assert!(recent[0].result.len() < 500);
        assert!(recent[0].result.ends_with("..."));
    }

    #[test]
    fn test_recent_zero_means_all() {
        let log = filled(7);
        assert_eq!(log.recent(0).len(), 7);
        assert_eq!(log.recent(3).len(), 3);
    }
}
