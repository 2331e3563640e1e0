//! # Walkthrough comparison
//!
//! Compares the session's played command sequence against the game's
//! reference solution using longest-common-prefix semantics. Matching is
//! token-exact after case/whitespace normalization - "Open  Mailbox" equals
//! "open mailbox", but no synonym or fuzzy matching is attempted: a command
//! differing in any token counts as divergence.

use serde::{Deserialize, Serialize};

/// Where the played sequence stands relative to the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WalkthroughReport {
    /// Played commands are a proper prefix of the reference
    OnTrack { matched: usize, remaining: usize },
    /// Played commands cover the whole reference with a matching prefix
    Complete { reference_len: usize, played: usize },
    /// First mismatch at `index` (0-based position in the reference)
    Diverged { index: usize, expected: String, actual: String },
}

/// Holds one game's normalized reference solution
#[derive(Debug, Clone)]
pub struct WalkthroughComparator {
    reference: Vec<String>,
}

impl WalkthroughComparator {
    pub fn new(reference: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            reference: reference.into_iter().map(|c| normalize(&c.into())).collect(),
        }
    }

    pub fn reference_len(&self) -> usize {
        self.reference.len()
    }

    /// The normalized reference commands, in order
    pub fn reference(&self) -> &[String] {
        &self.reference
    }

    /// Compare the played sequence (oldest first) against the reference
    pub fn compare(&self, played: &[String]) -> WalkthroughReport {
        for (index, reference) in self.reference.iter().enumerate() {
            match played.get(index) {
                None => {
                    return WalkthroughReport::OnTrack {
                        matched: index,
                        remaining: self.reference.len() - index,
                    }
                }
                Some(actual) if normalize(actual) != *reference => {
                    return WalkthroughReport::Diverged {
                        index,
                        expected: reference.clone(),
                        actual: normalize(actual),
                    }
                }
                Some(_) => {}
            }
        }

        WalkthroughReport::Complete {
            reference_len: self.reference.len(),
            played: played.len(),
        }
    }
}

/// Lowercase and collapse interior whitespace
fn normalize(command: &str) -> String {
    command
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> WalkthroughComparator {
        WalkthroughComparator::new(["open mailbox", "take leaflet", "north", "east"])
    }

    fn played(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_play_is_on_track_at_zero() {
        let report = reference().compare(&[]);
        assert_eq!(report, WalkthroughReport::OnTrack { matched: 0, remaining: 4 });
    }

    #[test]
    fn test_prefix_is_on_track() {
        let report = reference().compare(&played(&["open mailbox", "take leaflet"]));
        assert_eq!(report, WalkthroughReport::OnTrack { matched: 2, remaining: 2 });
    }

    #[test]
    fn test_divergence_at_k() {
        let report = reference().compare(&played(&["open mailbox", "take leaflet", "south"]));
        assert_eq!(
            report,
            WalkthroughReport::Diverged {
                index: 2,
                expected: "north".to_string(),
                actual: "south".to_string(),
            }
        );
    }

    #[test]
    fn test_any_token_difference_diverges() {
        let report = reference().compare(&played(&["open the mailbox"]));
        assert!(matches!(report, WalkthroughReport::Diverged { index: 0, .. }));
    }

    #[test]
    fn test_normalization_tolerates_case_and_spacing() {
        let report = reference().compare(&played(&["Open  MAILBOX", "take leaflet"]));
        assert_eq!(report, WalkthroughReport::OnTrack { matched: 2, remaining: 2 });
    }

    #[test]
    fn test_complete_when_reference_covered() {
        let exact = reference().compare(&played(&["open mailbox", "take leaflet", "north", "east"]));
        assert_eq!(exact, WalkthroughReport::Complete { reference_len: 4, played: 4 });

        // Extra commands past the reference still count as complete
        let extra = reference().compare(&played(&[
            "open mailbox",
            "take leaflet",
            "north",
            "east",
            "look",
        ]));
        assert_eq!(extra, WalkthroughReport::Complete { reference_len: 4, played: 5 });
    }

    #[test]
    fn test_empty_reference_is_always_complete() {
        let comparator = WalkthroughComparator::new(Vec::<String>::new());
        assert_eq!(
            comparator.compare(&played(&["look"])),
            WalkthroughReport::Complete { reference_len: 0, played: 1 }
        );
    }
}
