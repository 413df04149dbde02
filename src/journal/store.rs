//! Append-only commit log
//!
//! Every committed store transaction becomes one JSON line. A line is synced
//! to disk before the transaction's changes become visible.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{Change, CommitRecord, SnapshotMeta, StoredRecord};

use super::rotation::LogRotation;
use super::snapshot::SnapshotManager;

/// Configuration for the journal and the files next to it
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Path to the data directory
    pub data_dir: PathBuf,
    /// Number of commits after which a snapshot is taken
    pub snapshot_threshold: usize,
    /// Number of rotated archives to keep
    pub archive_keep: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_threshold: 1000,
            archive_keep: 5,
        }
    }
}

impl JournalConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the snapshot threshold
    pub fn with_snapshot_threshold(mut self, threshold: usize) -> Self {
        self.snapshot_threshold = threshold.max(1);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to journal.jsonl
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("journal.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn latest_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("latest.jsonl")
    }

    /// Get path to previous snapshot (backup)
    pub fn previous_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("previous.jsonl")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    /// Directory of the search index
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Errors that can occur in journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot corrupted: {0}")]
    SnapshotCorrupted(String),
    #[error("Journal unusable: a failed append could not be rolled back")]
    Poisoned,
}

/// State read back from disk at startup
#[derive(Debug, Default)]
pub struct Recovered {
    pub snapshot: Option<(SnapshotMeta, Vec<StoredRecord>)>,
    /// Commits after the snapshot, in commit order
    pub commits: Vec<CommitRecord>,
}

/// The journal manages the append-only commit log
pub struct Journal {
    config: JournalConfig,
    /// Next commit ID to assign
    next_commit_id: u64,
    /// Number of commits since last snapshot
    commits_since_snapshot: usize,
    /// Last commit ID included in most recent snapshot
    last_snapshot_commit_id: u64,
    /// Set when a failed append left bytes that could not be truncated away
    poisoned: bool,
}

impl Journal {
    pub fn with_config(config: JournalConfig) -> Self {
        Self {
            config,
            next_commit_id: 1,
            commits_since_snapshot: 0,
            last_snapshot_commit_id: 0,
            poisoned: false,
        }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn next_commit_id(&self) -> u64 {
        self.next_commit_id
    }

    pub fn last_snapshot_commit_id(&self) -> u64 {
        self.last_snapshot_commit_id
    }

    /// Check if snapshot should be created
    pub fn should_snapshot(&self) -> bool {
        self.commits_since_snapshot >= self.config.snapshot_threshold
    }

    /// Load the latest snapshot and every commit after it
    ///
    /// Also positions the commit counter after the highest commit seen.
    pub fn recover(&mut self) -> JournalResult<Recovered> {
        let snapshot = SnapshotManager::new(self.config.clone()).load()?;
        let after = snapshot
            .as_ref()
            .map(|(meta, _)| meta.last_commit_id)
            .unwrap_or(0);

        let commits = self.load_commits_after(after)?;

        self.last_snapshot_commit_id = after;
        self.commits_since_snapshot = commits.len();
        self.next_commit_id = commits
            .last()
            .map(|c| c.commit_id)
            .unwrap_or(after)
            + 1;

        Ok(Recovered { snapshot, commits })
    }

    /// Append one commit holding `changes`
    ///
    /// The line is synced before returning; a returned commit is durable.
    /// A failed write or sync truncates the log back to its previous length,
    /// so a commit reported as failed never replays.
    pub fn append(&mut self, changes: Vec<Change>) -> JournalResult<CommitRecord> {
        self.append_with(changes, File::sync_all)
    }

    fn append_with(
        &mut self,
        changes: Vec<Change>,
        sync: impl FnOnce(&File) -> io::Result<()>,
    ) -> JournalResult<CommitRecord> {
        if self.poisoned {
            return Err(JournalError::Poisoned);
        }

        let path = self.config.journal_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let commit = CommitRecord::new(self.next_commit_id, changes);
        let line = commit.to_json_line()?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len_before = file.metadata()?.len();

        let written = writeln!(file, "{}", line).and_then(|_| sync(&file));
        if let Err(e) = written {
            if let Err(truncate_err) = file.set_len(len_before).and_then(|_| file.sync_all()) {
                self.poisoned = true;
                tracing::error!(
                    commit_id = commit.commit_id,
                    error = %truncate_err,
                    "Could not roll back failed journal append"
                );
            } else {
                tracing::warn!(commit_id = commit.commit_id, error = %e, "Journal append rolled back");
            }
            return Err(e.into());
        }

        self.next_commit_id += 1;
        self.commits_since_snapshot += 1;

        Ok(commit)
    }

    /// Load every readable commit from the active log
    ///
    /// A line that fails to parse (e.g. torn by a crash mid-write) is skipped
    /// with a warning.
    pub fn load_commits(&self) -> JournalResult<Vec<CommitRecord>> {
        let path = self.config.journal_path();

        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut commits = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match CommitRecord::from_json_line(&line) {
                Ok(commit) => commits.push(commit),
                Err(e) => {
                    tracing::warn!(line = line_num + 1, error = %e, "skipping unreadable journal line");
                }
            }
        }

        Ok(commits)
    }

    /// Load commits after a specific commit ID
    pub fn load_commits_after(&self, after_commit_id: u64) -> JournalResult<Vec<CommitRecord>> {
        Ok(self
            .load_commits()?
            .into_iter()
            .filter(|c| c.commit_id > after_commit_id)
            .collect())
    }

    /// Write a snapshot covering every commit so far, then rotate the log
    pub fn snapshot(&mut self, records: &[StoredRecord]) -> JournalResult<SnapshotMeta> {
        let last_commit_id = self.next_commit_id - 1;

        let meta = SnapshotManager::new(self.config.clone()).create_snapshot(last_commit_id, records)?;

        self.last_snapshot_commit_id = last_commit_id;
        self.commits_since_snapshot = 0;

        let rotation = LogRotation::new(self.config.clone());
        if let Some(archive) = rotation.rotate_after_snapshot(last_commit_id)? {
            tracing::info!(archive = %archive.display(), "rotated journal");
        }
        rotation.cleanup_old_archives(self.config.archive_keep)?;

        Ok(meta)
    }
}
