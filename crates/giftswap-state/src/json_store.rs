use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::*;

/// On-disk layout of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    cohorts: BTreeMap<CohortId, Vec<ParticipantRecord>>,
    #[serde(default)]
    draws: Vec<DrawRecord>,
    /// Pairings imported from outside the store, per cohort
    #[serde(default)]
    history: BTreeMap<CohortId, Vec<HistoryEntry>>,
}

impl Document {
    fn position(&self, cohort_id: &CohortId, period: Period) -> Option<usize> {
        self.draws
            .iter()
            .position(|d| &d.cohort_id == cohort_id && d.period == period)
    }
}

/// Single-file JSON store implementing every storage trait.
///
/// Each mutation rewrites the whole document through a temp file in the same
/// directory followed by a rename, so a crash never leaves a half-written
/// file behind. A process-local mutex serializes read-modify-write cycles.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. The file is created on first write.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set (or overwrite) the roster of a cohort.
    pub fn set_roster(
        &self,
        cohort_id: CohortId,
        participants: Vec<ParticipantRecord>,
    ) -> StorageResult<()> {
        self.update(|doc| {
            doc.cohorts.insert(cohort_id, participants);
            Ok(())
        })
    }

    /// Append externally sourced history entries for a cohort.
    pub fn import_history(
        &self,
        cohort_id: CohortId,
        entries: Vec<HistoryEntry>,
    ) -> StorageResult<()> {
        self.update(|doc| {
            doc.history.entry(cohort_id).or_default().extend(entries);
            Ok(())
        })
    }

    fn load(&self) -> StorageResult<Document> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save(&self, doc: &Document) -> StorageResult<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let bytes = serde_json::to_vec_pretty(doc)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "store written");
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> StorageResult<T>) -> StorageResult<T> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let doc = self.load()?;
        f(&doc)
    }

    fn update<T>(&self, f: impl FnOnce(&mut Document) -> StorageResult<T>) -> StorageResult<T> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.load()?;
        let out = f(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }
}

#[async_trait]
impl RosterProvider for JsonFileStore {
    async fn roster(&self, cohort_id: &CohortId) -> StorageResult<Vec<ParticipantRecord>> {
        self.read(|doc| {
            doc.cohorts
                .get(cohort_id)
                .cloned()
                .ok_or_else(|| StorageError::CohortNotFound {
                    cohort_id: cohort_id.0.clone(),
                })
        })
    }
}

#[async_trait]
impl HistoryProvider for JsonFileStore {
    async fn history_since(
        &self,
        cohort_id: &CohortId,
        since: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<HistoryEntry>> {
        self.read(|doc| {
            let stored = doc
                .draws
                .iter()
                .filter(|d| &d.cohort_id == cohort_id)
                .flat_map(DrawRecord::history_entries);
            let imported = doc.history.get(cohort_id).into_iter().flatten().cloned();
            Ok(stored
                .chain(imported)
                .filter(|e| since.map_or(true, |cutoff| e.created_at >= cutoff))
                .collect())
        })
    }
}

#[async_trait]
impl AssignmentStore for JsonFileStore {
    async fn get(&self, cohort_id: &CohortId, period: Period) -> StorageResult<Option<DrawRecord>> {
        self.read(|doc| {
            Ok(doc
                .position(cohort_id, period)
                .map(|idx| doc.draws[idx].clone()))
        })
    }

    async fn insert(&self, record: DrawRecord) -> StorageResult<()> {
        self.update(|doc| {
            if doc.position(&record.cohort_id, record.period).is_some() {
                return Err(StorageError::Conflict {
                    cohort_id: record.cohort_id.0.clone(),
                    period: record.period,
                });
            }
            doc.draws.push(record);
            Ok(())
        })
    }

    async fn replace(&self, record: DrawRecord) -> StorageResult<DrawRecord> {
        self.update(|doc| match doc.position(&record.cohort_id, record.period) {
            Some(idx) => Ok(std::mem::replace(&mut doc.draws[idx], record)),
            None => Err(StorageError::DrawNotFound {
                cohort_id: record.cohort_id.0.clone(),
                period: record.period,
            }),
        })
    }

    async fn remove(&self, cohort_id: &CohortId, period: Period) -> StorageResult<DrawRecord> {
        self.update(|doc| match doc.position(cohort_id, period) {
            Some(idx) => Ok(doc.draws.remove(idx)),
            None => Err(StorageError::DrawNotFound {
                cohort_id: cohort_id.0.clone(),
                period,
            }),
        })
    }
}
