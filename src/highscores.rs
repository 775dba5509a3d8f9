//! High score board
//!
//! Mirror of the remote top-10 list. The last good copy is cached in
//! LocalStorage so a failed fetch still has something to show.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::platform::storage;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's name as typed at the prompt
    pub name: String,
    /// Player's score
    #[serde(deserialize_with = "floor_score")]
    pub score: u64,
}

impl HighScoreEntry {
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Scores arrive as JSON numbers; anything fractional is floored
fn floor_score<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let raw = f64::deserialize(de)?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(serde::de::Error::custom(format!("invalid score {}", raw)));
    }
    Ok(raw.floor() as u64)
}

/// Where the end-of-game flow asks for a name and sends the result
pub trait ScoreReporter {
    /// Ask the player for a name (None = cancelled)
    fn request_name(&mut self, score: u64) -> Option<String>;

    /// Fire-and-forget submission
    fn submit(&mut self, entry: HighScoreEntry);
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key for the cached board
    const STORAGE_KEY: &'static str = "maru_merge_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from an arbitrary list (sorted descending, trimmed to the top 10)
    pub fn from_entries(mut entries: Vec<HighScoreEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        Self { entries }
    }

    /// Parse a `GET /highscores` body. Rows that are not a valid record are skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(json).context("high score body is not a list")?;
        let entries = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match serde_json::from_value::<HighScoreEntry>(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping high score row {}: {}", i, e);
                    None
                }
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    /// Score to beat for a podium place (0 when fewer than `rank` entries exist)
    pub fn podium_threshold(&self, rank: usize) -> u64 {
        rank.checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| e.score)
            .unwrap_or(0)
    }

    /// Check if a score would take one of the top `rank` places
    pub fn qualifies(&self, score: u64, rank: usize) -> bool {
        score > self.podium_threshold(rank)
    }

    /// First `n` entries
    pub fn top(&self, n: usize) -> &[HighScoreEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Load the cached board (empty when nothing usable is stored)
    pub fn load_cached() -> Self {
        match storage::get(Self::STORAGE_KEY).map(|json| Self::from_json(&json)) {
            Some(Ok(scores)) => {
                log::info!("Loaded {} cached high scores", scores.entries.len());
                scores
            }
            Some(Err(e)) => {
                log::warn!("Ignoring cached high scores: {:#}", e);
                Self::new()
            }
            None => Self::new(),
        }
    }

    /// Cache this board for the next visit
    pub fn save_cached(&self) {
        match serde_json::to_string(&self.entries) {
            Ok(json) => {
                if storage::set(Self::STORAGE_KEY, &json) {
                    log::info!("High scores cached ({} entries)", self.entries.len());
                }
            }
            Err(e) => log::warn!("Failed to encode high scores: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(scores: &[u64]) -> HighScores {
        HighScores::from_entries(
            scores
                .iter()
                .map(|s| HighScoreEntry::new(format!("n{}", s), *s))
                .collect(),
        )
    }

    #[test]
    fn test_from_entries_sorts_and_trims() {
        let b = board(&[5, 50, 1, 500, 7, 8, 9, 10, 11, 12, 13, 14]);
        assert_eq!(b.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(b.entries[0].score, 500);
        assert!(b.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(b.entries.iter().all(|e| e.score != 1));
    }

    #[test]
    fn test_podium_threshold() {
        assert_eq!(HighScores::new().podium_threshold(3), 0);
        assert_eq!(board(&[300, 200]).podium_threshold(3), 0);
        assert_eq!(board(&[300, 200, 100, 50]).podium_threshold(3), 100);
        assert!(board(&[300, 200, 100]).qualifies(101, 3));
        assert!(!board(&[300, 200, 100]).qualifies(100, 3));
        assert_eq!(board(&[1]).podium_threshold(0), 0);
    }

    #[test]
    fn test_from_json_floors_scores() {
        let b = HighScores::from_json(
            r#"[{"id": 4, "name": "a", "score": 12.9}, {"name": "b", "score": 40}]"#,
        )
        .unwrap();
        assert_eq!(b.entries[0], HighScoreEntry::new("b", 40));
        assert_eq!(b.entries[1], HighScoreEntry::new("a", 12));
    }

    #[test]
    fn test_from_json_rejects_non_list() {
        assert!(HighScores::from_json(r#"{"error": "Internal Server Error"}"#).is_err());
        assert!(HighScores::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_skips_bad_rows() {
        let b = HighScores::from_json(
            r#"[{"name":"a","score":900},{"name":null,"score":500},{"name":"c","score":300}]"#,
        )
        .unwrap();
        assert_eq!(b.entries.len(), 2);
        assert_eq!(b.podium_threshold(2), 300);

        let b = HighScores::from_json(
            r#"[{"name":"x","score":-3},{"score":70},"junk",{"name":"ok","score":5}]"#,
        )
        .unwrap();
        assert_eq!(b.entries, vec![HighScoreEntry::new("ok", 5)]);
    }

    #[test]
    fn test_top() {
        let b = board(&[3, 2]);
        assert_eq!(b.top(3).len(), 2);
        assert_eq!(b.top(1)[0].score, 3);
    }
}
