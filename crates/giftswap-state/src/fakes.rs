//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRosterProvider` and `MemoryAssignmentStore` that satisfy
//! the trait contracts without any external dependencies. The assignment
//! store doubles as a `HistoryProvider`: past draws are the history.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryRosterProvider
// ---------------------------------------------------------------------------

/// In-memory roster provider backed by a `HashMap<cohort, participants>`.
#[derive(Debug, Default)]
pub struct MemoryRosterProvider {
    cohorts: Mutex<HashMap<CohortId, Vec<ParticipantRecord>>>,
}

impl MemoryRosterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the roster of a cohort.
    pub fn set_roster(&self, cohort_id: CohortId, participants: Vec<ParticipantRecord>) {
        lock(&self.cohorts).insert(cohort_id, participants);
    }
}

#[async_trait]
impl RosterProvider for MemoryRosterProvider {
    async fn roster(&self, cohort_id: &CohortId) -> StorageResult<Vec<ParticipantRecord>> {
        lock(&self.cohorts)
            .get(cohort_id)
            .cloned()
            .ok_or_else(|| StorageError::CohortNotFound {
                cohort_id: cohort_id.0.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryAssignmentStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    draws: BTreeMap<(CohortId, Period), DrawRecord>,
    /// Pairings imported from outside this store (e.g. earlier systems)
    imported: HashMap<CohortId, Vec<HistoryEntry>>,
}

/// In-memory draw store keyed by `(cohort, period)`.
#[derive(Debug, Default)]
pub struct MemoryAssignmentStore {
    state: Mutex<StoreState>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add history entries that did not come from a stored draw.
    pub fn import_history(&self, cohort_id: CohortId, entries: Vec<HistoryEntry>) {
        lock(&self.state)
            .imported
            .entry(cohort_id)
            .or_default()
            .extend(entries);
    }

    /// Number of draws currently stored, across all cohorts.
    pub fn draw_count(&self) -> usize {
        lock(&self.state).draws.len()
    }
}

fn key_of(record: &DrawRecord) -> (CohortId, Period) {
    (record.cohort_id.clone(), record.period)
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn get(&self, cohort_id: &CohortId, period: Period) -> StorageResult<Option<DrawRecord>> {
        Ok(lock(&self.state)
            .draws
            .get(&(cohort_id.clone(), period))
            .cloned())
    }

    async fn insert(&self, record: DrawRecord) -> StorageResult<()> {
        let mut state = lock(&self.state);
        let key = key_of(&record);
        if state.draws.contains_key(&key) {
            return Err(StorageError::Conflict {
                cohort_id: key.0 .0,
                period: key.1,
            });
        }
        state.draws.insert(key, record);
        Ok(())
    }

    async fn replace(&self, record: DrawRecord) -> StorageResult<DrawRecord> {
        let mut state = lock(&self.state);
        let key = key_of(&record);
        match state.draws.get_mut(&key) {
            Some(slot) => Ok(std::mem::replace(slot, record)),
            None => Err(StorageError::DrawNotFound {
                cohort_id: key.0 .0,
                period: key.1,
            }),
        }
    }

    async fn remove(&self, cohort_id: &CohortId, period: Period) -> StorageResult<DrawRecord> {
        lock(&self.state)
            .draws
            .remove(&(cohort_id.clone(), period))
            .ok_or_else(|| StorageError::DrawNotFound {
                cohort_id: cohort_id.0.clone(),
                period,
            })
    }
}

#[async_trait]
impl HistoryProvider for MemoryAssignmentStore {
    async fn history_since(
        &self,
        cohort_id: &CohortId,
        since: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<HistoryEntry>> {
        let state = lock(&self.state);
        let stored = state
            .draws
            .values()
            .filter(|d| &d.cohort_id == cohort_id)
            .flat_map(DrawRecord::history_entries);
        let imported = state
            .imported
            .get(cohort_id)
            .into_iter()
            .flatten()
            .cloned();

        Ok(stored
            .chain(imported)
            .filter(|e| since.map_or(true, |cutoff| e.created_at >= cutoff))
            .collect())
    }
}
