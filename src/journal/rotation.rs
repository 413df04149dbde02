//! Journal rotation and archive management
//!
//! After a snapshot, the commits it covers are moved out of the active log
//! into `archive/commits_<first>_to_<last>.jsonl`; only the newest archives
//! are kept.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::store::{JournalConfig, JournalResult};

/// Log rotation manager for journal archives
pub struct LogRotation {
    config: JournalConfig,
}

impl LogRotation {
    pub fn new(config: JournalConfig) -> Self {
        Self { config }
    }

    /// Move commits up to `snapshot_commit_id` into an archive file
    ///
    /// # Returns
    /// * `Ok(Some(path))` - Path to the archive file if rotation occurred
    /// * `Ok(None)` - Nothing to archive
    pub fn rotate_after_snapshot(&self, snapshot_commit_id: u64) -> JournalResult<Option<PathBuf>> {
        let journal_path = self.config.journal_path();

        if !journal_path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&journal_path)?);
        let mut archived: Vec<(u64, String)> = Vec::new();
        let mut kept = Vec::new();

        for line_result in reader.lines() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match commit_id_of(&line) {
                Some(id) if id <= snapshot_commit_id => archived.push((id, line)),
                // Unparsable lines stay in the active log
                _ => kept.push(line),
            }
        }

        let Some(first_id) = archived.first().map(|(id, _)| *id) else {
            return Ok(None);
        };

        let archive_dir = self.config.archive_dir();
        fs::create_dir_all(&archive_dir)?;

        // Zero-padded so that file names sort in commit order
        let archive_path = archive_dir.join(format!(
            "commits_{:012}_to_{:012}.jsonl",
            first_id, snapshot_commit_id
        ));

        {
            let mut archive_file = File::create(&archive_path)?;
            for (_, line) in &archived {
                writeln!(archive_file, "{}", line)?;
            }
            archive_file.sync_all()?;
        }

        {
            let temp_path = journal_path.with_extension("tmp");
            let mut temp_file = File::create(&temp_path)?;
            for line in &kept {
                writeln!(temp_file, "{}", line)?;
            }
            temp_file.sync_all()?;
            fs::rename(&temp_path, &journal_path)?;
        }

        Ok(Some(archive_path))
    }

    /// List archive files in commit order
    pub fn list_archives(&self) -> JournalResult<Vec<ArchiveInfo>> {
        let archive_dir = self.config.archive_dir();

        if !archive_dir.exists() {
            return Ok(Vec::new());
        }

        let mut archives = Vec::new();

        for entry in fs::read_dir(&archive_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                let size = entry.metadata()?.len();
                let commit_count = count_lines(&path)?;
                archives.push(ArchiveInfo {
                    path,
                    size,
                    commit_count,
                });
            }
        }

        archives.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        Ok(archives)
    }

    /// Delete all but the `keep_count` newest archives
    ///
    /// # Returns
    /// * Number of archives deleted
    pub fn cleanup_old_archives(&self, keep_count: usize) -> JournalResult<usize> {
        let archives = self.list_archives()?;

        if archives.len() <= keep_count {
            return Ok(0);
        }

        let excess = archives.len() - keep_count;
        for archive in &archives[..excess] {
            fs::remove_file(&archive.path)?;
            tracing::debug!(path = %archive.path.display(), "deleted old journal archive");
        }

        Ok(excess)
    }
}

/// Information about an archive file
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    pub commit_count: usize,
}

fn commit_id_of(line: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("commitId")?.as_u64()
}

fn count_lines(path: &Path) -> JournalResult<usize> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader.lines().map_while(Result::ok).filter(|l| !l.trim().is_empty()).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use crate::types::Change;
    use tempfile::TempDir;

    #[test]
    fn test_rotate_after_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config = JournalConfig::new(temp_dir.path());

        let mut journal = Journal::with_config(config.clone());
        for seq in 1..=5 {
            journal.append(vec![Change::Ack(seq)]).unwrap();
        }

        let rotation = LogRotation::new(config.clone());
        let archive_path = rotation.rotate_after_snapshot(3).unwrap().unwrap();

        assert_eq!(count_lines(&archive_path).unwrap(), 3);
        assert_eq!(count_lines(&config.journal_path()).unwrap(), 2);
        assert_eq!(journal.load_commits().unwrap()[0].commit_id, 4);
    }

    #[test]
    fn test_rotate_without_covered_commits() {
        let temp_dir = TempDir::new().unwrap();
        let config = JournalConfig::new(temp_dir.path());

        let mut journal = Journal::with_config(config.clone());
        journal.append(vec![Change::Ack(1)]).unwrap();

        let rotation = LogRotation::new(config);
        assert!(rotation.rotate_after_snapshot(0).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_old_archives() {
        let temp_dir = TempDir::new().unwrap();
        let config = JournalConfig::new(temp_dir.path());

        let archive_dir = config.archive_dir();
        fs::create_dir_all(&archive_dir).unwrap();
        fs::write(archive_dir.join("commits_000000000001_to_000000000100.jsonl"), "{}\n").unwrap();
        fs::write(archive_dir.join("commits_000000000101_to_000000000200.jsonl"), "{}\n").unwrap();
        fs::write(archive_dir.join("commits_000000000201_to_000000000300.jsonl"), "{}\n").unwrap();

        let rotation = LogRotation::new(config);
        assert_eq!(rotation.cleanup_old_archives(2).unwrap(), 1);

        let remaining = rotation.list_archives().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining[0]
            .path
            .to_string_lossy()
            .contains("commits_000000000101"));
    }
}
