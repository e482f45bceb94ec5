//! Opt-in CSV log of finished sessions.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::session::Session;
use crate::stats::Stats;
use crate::util::mean;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("history file is malformed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub finished_at: DateTime<Local>,
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub accuracy: u32,
    pub max_combo: u32,
    pub seconds_played: u32,
}

impl SessionRecord {
    pub fn new(stats: &Stats, session: &Session, finished_at: DateTime<Local>) -> Self {
        Self {
            finished_at,
            score: stats.score,
            hits: stats.hits,
            misses: stats.misses,
            accuracy: stats.accuracy,
            max_combo: session.max_combo,
            seconds_played: session.seconds_played(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySummary {
    pub sessions: usize,
    pub best_score: u32,
    pub mean_accuracy: Option<f64>,
}

pub fn summarize(records: &[SessionRecord]) -> HistorySummary {
    let accuracies: Vec<f64> = records.iter().map(|r| f64::from(r.accuracy)).collect();

    HistorySummary {
        sessions: records.len(),
        best_score: records.iter().map(|r| r.score).max().unwrap_or(0),
        mean_accuracy: mean(&accuracies),
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn default_location() -> Option<Self> {
        AppDirs::history_path().map(|path| Self { path })
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // header only goes into a fresh file
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All recorded sessions, oldest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<SessionRecord>, csv::Error>>()?;
        Ok(records)
    }
}
