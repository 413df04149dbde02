//! Snapshot Manager
//!
//! A snapshot is a point-in-time copy of every table that lets startup skip
//! replaying the commits it covers.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use crate::types::{SnapshotMeta, StoredRecord};
use crate::utils::{atomic_write_with, safe_rename};

use super::store::{JournalConfig, JournalError, JournalResult};

/// Snapshot Manager handles creating and loading snapshots
pub struct SnapshotManager {
    config: JournalConfig,
}

impl SnapshotManager {
    pub fn new(config: JournalConfig) -> Self {
        Self { config }
    }

    /// Check if a snapshot exists
    pub fn snapshot_exists(&self) -> bool {
        self.config.latest_snapshot_path().exists()
    }

    /// Create a new snapshot, keeping the replaced one as `previous.jsonl`
    ///
    /// The new file is fully written and synced under a temporary name before
    /// it replaces `latest.jsonl`.
    pub fn create_snapshot(
        &self,
        last_commit_id: u64,
        records: &[StoredRecord],
    ) -> JournalResult<SnapshotMeta> {
        let latest_path = self.config.latest_snapshot_path();
        let pending_path = self.config.snapshots_dir().join("pending.jsonl");

        let meta = SnapshotMeta::new(last_commit_id, records.len());

        atomic_write_with(&pending_path, |file| {
            writeln!(file, "{}", meta.to_json_line().map_err(std::io::Error::from)?)?;
            for record in records {
                let json = serde_json::to_string(record).map_err(std::io::Error::from)?;
                writeln!(file, "{}", json)?;
            }
            Ok(())
        })?;

        safe_rename(
            &pending_path,
            &latest_path,
            Some(self.config.previous_snapshot_path()),
        )?;

        tracing::info!(records = records.len(), last_commit_id, "created snapshot");

        Ok(meta)
    }

    /// Load the latest snapshot, if any
    pub fn load(&self) -> JournalResult<Option<(SnapshotMeta, Vec<StoredRecord>)>> {
        let path = self.config.latest_snapshot_path();

        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut lines = reader.lines();

        let meta_line = lines
            .next()
            .ok_or_else(|| JournalError::SnapshotCorrupted("empty snapshot".to_string()))??;
        let meta = SnapshotMeta::from_json_line(&meta_line)
            .map_err(|e| JournalError::SnapshotCorrupted(format!("bad metadata: {}", e)))?;

        let mut records = Vec::with_capacity(meta.record_count);
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<StoredRecord>(&line)?);
        }

        if records.len() != meta.record_count {
            return Err(JournalError::SnapshotCorrupted(format!(
                "expected {} records, found {}",
                meta.record_count,
                records.len()
            )));
        }

        Ok(Some((meta, records)))
    }
}
