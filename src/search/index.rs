//! Inverted index and committed generations

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::types::EventId;
use crate::utils::atomic_write_with;

use super::document::{tokenize, IndexDocument};
use super::writer::IndexWriter;
use super::{IndexError, IndexResult};

pub(super) const DOCUMENTS_FILE: &str = "documents.jsonl";
pub(super) const LOCK_FILE: &str = "write.lock";

/// One version of the index: documents plus their postings
#[derive(Debug, Default, Clone)]
pub(super) struct Generation {
    documents: BTreeMap<EventId, IndexDocument>,
    /// token → (document → term frequency)
    postings: HashMap<String, HashMap<EventId, u32>>,
}

impl Generation {
    pub(super) fn add(&mut self, doc: IndexDocument) {
        self.remove(doc.id);
        for token in doc.tokens() {
            *self.postings.entry(token).or_default().entry(doc.id).or_default() += 1;
        }
        self.documents.insert(doc.id, doc);
    }

    pub(super) fn remove(&mut self, id: EventId) {
        if let Some(doc) = self.documents.remove(&id) {
            for token in doc.tokens() {
                if let Some(docs) = self.postings.get_mut(&token) {
                    docs.remove(&id);
                    if docs.is_empty() {
                        self.postings.remove(&token);
                    }
                }
            }
        }
    }

    fn search(&self, query: &str, limit: usize) -> Vec<EventId> {
        let total = self.documents.len() as f64;
        let mut scores: HashMap<EventId, f64> = HashMap::new();

        for token in tokenize(query) {
            if let Some(docs) = self.postings.get(&token) {
                let idf = (1.0 + total / docs.len() as f64).ln();
                for (id, tf) in docs {
                    *scores.entry(*id).or_default() += f64::from(*tf) * idf;
                }
            }
        }

        let mut ranked: Vec<(EventId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked.into_iter().map(|(id, _)| id).collect()
    }

    fn load(path: &Path) -> IndexResult<Self> {
        let mut generation = Self::default();
        if !path.exists() {
            return Ok(generation);
        }

        let reader = BufReader::new(File::open(path)?);
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<IndexDocument>(&line) {
                Ok(doc) => generation.add(doc),
                Err(e) => warn!(line = line_num + 1, error = %e, "Skipping unreadable index document"),
            }
        }
        Ok(generation)
    }

    pub(super) fn persist(&self, path: &Path) -> IndexResult<()> {
        let lines = self
            .documents
            .values()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        atomic_write_with(path, |file| {
            for line in &lines {
                writeln!(file, "{}", line)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}

#[derive(Debug)]
pub(super) struct Shared {
    pub(super) dir: Option<PathBuf>,
    pub(super) committed: RwLock<Arc<Generation>>,
    pub(super) gate: Arc<tokio::sync::Mutex<()>>,
}

impl Shared {
    pub(super) fn lock_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(LOCK_FILE))
    }

    pub(super) fn documents_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(DOCUMENTS_FILE))
    }
}

/// Index statistics
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub document_count: usize,
    pub unique_tokens: usize,
}

/// Handle to the search index; clones share the same index
#[derive(Clone)]
pub struct SearchIndex {
    shared: Arc<Shared>,
}

impl SearchIndex {
    /// An index that keeps committed generations in memory only
    pub fn in_memory() -> Self {
        Self::with_generation(None, Generation::default())
    }

    /// Open the index stored in `dir`, creating the directory if needed
    ///
    /// A `write.lock` left by a previous process is removed.
    pub fn open<P: AsRef<Path>>(dir: P) -> IndexResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let lock = dir.join(LOCK_FILE);
        if lock.exists() {
            warn!(path = %lock.display(), "Removing stale index write lock");
            std::fs::remove_file(&lock)?;
        }

        let generation = Generation::load(&dir.join(DOCUMENTS_FILE))?;
        info!(
            dir = %dir.display(),
            documents = generation.len(),
            "Search index opened"
        );
        Ok(Self::with_generation(Some(dir), generation))
    }

    fn with_generation(dir: Option<PathBuf>, generation: Generation) -> Self {
        Self {
            shared: Arc::new(Shared {
                dir,
                committed: RwLock::new(Arc::new(generation)),
                gate: Arc::new(tokio::sync::Mutex::new(())),
            }),
        }
    }

    /// Start a writer session
    ///
    /// Waits for any other writer in this process, then takes the directory
    /// lock. Fails with [`IndexError::LockHeld`] if the lock file exists.
    pub async fn open_writer(&self) -> IndexResult<IndexWriter> {
        let gate = Arc::clone(&self.shared.gate).lock_owned().await;

        let lock = match self.shared.lock_path() {
            Some(path) => {
                match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(_) => Some(path),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        return Err(IndexError::LockHeld(path));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => None,
        };

        let working = self.snapshot().as_ref().clone();
        Ok(IndexWriter::new(Arc::clone(&self.shared), gate, lock, working))
    }

    fn snapshot(&self) -> Arc<Generation> {
        Arc::clone(&self.shared.committed.read())
    }

    /// Ids of committed documents matching any query token, best first
    pub fn search(&self, query: &str, limit: usize) -> Vec<EventId> {
        if limit == 0 {
            return Vec::new();
        }
        self.snapshot().search(query, limit)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.snapshot().documents.contains_key(&id)
    }

    pub fn document(&self, id: EventId) -> Option<IndexDocument> {
        self.snapshot().documents.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        let generation = self.snapshot();
        IndexStats {
            document_count: generation.len(),
            unique_tokens: generation.postings.len(),
        }
    }
}
