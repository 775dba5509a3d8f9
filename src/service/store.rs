//! Score storage behind the high score service
//!
//! One table: `(id, name, score)`. Rows are only ever appended.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A persisted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScore {
    pub id: u64,
    pub name: String,
    pub score: u64,
}

pub trait ScoreStore {
    /// Rows ordered by score descending (ties oldest first), optionally limited
    fn top(&self, limit: Option<usize>) -> Result<Vec<StoredScore>>;

    /// Append one row and return it as stored
    fn insert(&mut self, name: &str, score: u64) -> Result<StoredScore>;
}

fn ranked(rows: &[StoredScore], limit: Option<usize>) -> Vec<StoredScore> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

/// Volatile store for tests and the headless runner
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<StoredScore>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ScoreStore for MemoryStore {
    fn top(&self, limit: Option<usize>) -> Result<Vec<StoredScore>> {
        Ok(ranked(&self.rows, limit))
    }

    fn insert(&mut self, name: &str, score: u64) -> Result<StoredScore> {
        let row = StoredScore {
            id: self.rows.len() as u64 + 1,
            name: name.to_string(),
            score,
        };
        self.rows.push(row.clone());
        Ok(row)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};

    use super::{ScoreStore, StoredScore, ranked};

    /// Whole table kept as one JSON array on disk
    #[derive(Debug, Clone)]
    pub struct JsonFileStore {
        path: PathBuf,
    }

    impl JsonFileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_rows(&self) -> Result<Vec<StoredScore>> {
            if !self.path.exists() {
                return Ok(Vec::new());
            }
            let json = fs::read_to_string(&self.path)
                .with_context(|| format!("reading {}", self.path.display()))?;
            serde_json::from_str(&json).with_context(|| format!("parsing {}", self.path.display()))
        }

        fn write_rows(&self, rows: &[StoredScore]) -> Result<()> {
            let json = serde_json::to_string_pretty(rows).context("encoding score table")?;
            let tmp = self.path.with_extension("tmp");
            fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
            fs::rename(&tmp, &self.path)
                .with_context(|| format!("replacing {}", self.path.display()))
        }
    }

    impl ScoreStore for JsonFileStore {
        fn top(&self, limit: Option<usize>) -> Result<Vec<StoredScore>> {
            Ok(ranked(&self.read_rows()?, limit))
        }

        fn insert(&mut self, name: &str, score: u64) -> Result<StoredScore> {
            let mut rows = self.read_rows()?;
            let row = StoredScore {
                id: rows.iter().map(|r| r.id).max().unwrap_or(0) + 1,
                name: name.to_string(),
                score,
            };
            rows.push(row.clone());
            self.write_rows(&rows)?;
            Ok(row)
        }
    }
}
